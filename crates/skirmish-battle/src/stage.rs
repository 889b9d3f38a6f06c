//! Reference battlefield: a small voxel grid where units step and strike.

use std::time::Duration;

use serde::Serialize;
use skirmish_protocol::{Team, Vector};

use crate::{
    Action, BattleError, Battlefield, Entity, EntityId, Resoluble, TickObserver, Turn, TurnEvent,
};

/// How far an attack reaches, in Chebyshev distance.
const ATTACK_RANGE: u32 = 1;

/// A `width × height × layers` grid holding every unit of the match.
///
/// Only the grid, units and turn counter are part of the snapshot sent to
/// participants; queues and the last turn record stay server-side.
#[derive(Debug, Clone, Serialize)]
pub struct Stage {
    width: i32,
    height: i32,
    layers: i32,
    entities: Vec<Entity>,
    turn: u64,
    #[serde(skip)]
    delayed: Vec<Resoluble>,
    /// Events from immediate resolubles, folded into the next turn.
    #[serde(skip)]
    loose_events: Vec<TurnEvent>,
    #[serde(skip)]
    last_turn: Option<Turn>,
}

impl Stage {
    pub fn new(width: i32, height: i32, layers: i32) -> Self {
        Self {
            width,
            height,
            layers,
            entities: Vec::new(),
            turn: 0,
            delayed: Vec::new(),
            loose_events: Vec::new(),
            last_turn: None,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn layers(&self) -> i32 {
        self.layers
    }

    /// Number of resolved ticks.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.last_turn.as_ref()
    }

    /// Resolubles currently waiting for the next tick.
    pub fn delayed_resolubles(&self) -> &[Resoluble] {
        &self.delayed
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0 as usize)
    }

    fn resolve(&mut self, action: &Action) -> Option<TurnEvent> {
        match *action {
            Action::Attack { source } => self.resolve_attack(source),
            Action::Move { source, to } => self.resolve_move(source, to),
        }
    }

    fn resolve_attack(&mut self, source: EntityId) -> Option<TurnEvent> {
        let attacker = self.entity(source).filter(|e| e.alive)?;
        let (team, position) = (attacker.team, attacker.position);

        let target = self
            .entities
            .iter()
            .filter(|e| e.alive && e.team != team)
            .find(|e| e.position.chebyshev(position) <= ATTACK_RANGE)
            .map(|e| e.id)?;

        let killed = self.entity_mut(target)?.take_damage(1);
        tracing::trace!(%source, %target, killed, "attack resolved");
        Some(TurnEvent::Attacked {
            source,
            target,
            killed,
        })
    }

    fn resolve_move(&mut self, source: EntityId, to: Vector) -> Option<TurnEvent> {
        // Earlier moves in this tick may have filled the cell since validation.
        if !self.in_bounds(to) || self.occupant(to).is_some() {
            return None;
        }
        let mover = self.entity_mut(source).filter(|e| e.alive && !e.has_moved)?;
        let from = mover.position;
        mover.position = to;
        mover.has_moved = true;
        tracing::trace!(%source, %from, %to, "move resolved");
        Some(TurnEvent::Moved { source, from, to })
    }
}

impl Battlefield for Stage {
    fn in_bounds(&self, cell: Vector) -> bool {
        (0..self.width).contains(&cell.x)
            && (0..self.height).contains(&cell.y)
            && (0..self.layers).contains(&cell.z)
    }

    fn add_entity(&mut self, mut entity: Entity, team: Team) -> Result<EntityId, BattleError> {
        if !self.in_bounds(entity.position) {
            return Err(BattleError::OutOfBounds(entity.position));
        }
        if self.occupant(entity.position).is_some() {
            return Err(BattleError::Occupied(entity.position));
        }
        let id = EntityId(self.entities.len() as u32);
        entity.id = id;
        entity.team = team;
        self.entities.push(entity);
        Ok(id)
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0 as usize)
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn alive_entities(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| e.alive)
            .map(|e| e.id)
            .collect()
    }

    fn occupant(&self, cell: Vector) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|e| e.alive && e.position == cell)
            .map(|e| e.id)
    }

    fn call_resoluble(&mut self, action: Action, delayed: bool) -> Result<(), BattleError> {
        let source = action.source();
        if self.entity(source).is_none() {
            return Err(BattleError::UnknownEntity(source));
        }
        if delayed {
            self.delayed.push(Resoluble::new(action));
        } else if let Some(event) = self.resolve(&action) {
            self.loose_events.push(event);
        }
        Ok(())
    }

    fn deserialize_resoluble(
        &mut self,
        payload: serde_json::Value,
        team: Team,
    ) -> Result<(), BattleError> {
        let action: Action =
            serde_json::from_value(payload).map_err(BattleError::MalformedResoluble)?;
        let source = action.source();
        let owner = self
            .entity(source)
            .map(|e| e.team)
            .ok_or(BattleError::UnknownEntity(source))?;
        if owner != team {
            return Err(BattleError::NotOwned { entity: source, team });
        }
        self.delayed.push(Resoluble::new(action));
        Ok(())
    }

    fn take_delayed_resolubles(&mut self) -> Vec<Resoluble> {
        std::mem::take(&mut self.delayed)
    }

    fn submit_resolubles(&mut self, resolubles: Vec<Resoluble>) {
        self.delayed = resolubles;
    }

    fn advance<O>(&mut self, dt: Duration, observer: &mut O) -> Result<(), BattleError>
    where
        O: TickObserver<Self>,
    {
        for entity in &mut self.entities {
            entity.has_moved = false;
        }

        observer.before_tick(self)?;

        let pending = std::mem::take(&mut self.delayed);
        let mut turn = Turn::new(self.turn + 1, dt.as_secs_f64());
        turn.events.append(&mut self.loose_events);
        for resoluble in pending.iter().filter(|r| r.active) {
            if let Some(event) = self.resolve(&resoluble.action) {
                turn.events.push(event);
            }
        }

        self.turn += 1;
        turn.defeated = self.defeated_team();
        tracing::debug!(turn = self.turn, events = turn.events.len(), "tick resolved");
        self.last_turn = Some(turn);

        observer.after_tick(self)
    }

    fn defeated_team(&self) -> Option<Team> {
        Team::BOTH
            .into_iter()
            .find(|team| !self.entities.iter().any(|e| e.alive && e.team == *team))
    }

    fn serialize_stage(&self) -> Result<String, BattleError> {
        serde_json::to_string(self).map_err(BattleError::Serialize)
    }

    fn serialize_turn(&self) -> Result<String, BattleError> {
        let encoded = match &self.last_turn {
            Some(turn) => serde_json::to_string(turn),
            None => serde_json::to_string(&Turn::new(0, 0.0)),
        };
        encoded.map_err(BattleError::Serialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Records hook calls without touching the battlefield.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        pending_seen: usize,
    }

    impl TickObserver<Stage> for Recorder {
        fn before_tick(&mut self, stage: &mut Stage) -> Result<(), BattleError> {
            self.calls.push("before");
            self.pending_seen = stage.delayed_resolubles().len();
            Ok(())
        }

        fn after_tick(&mut self, _stage: &Stage) -> Result<(), BattleError> {
            self.calls.push("after");
            Ok(())
        }
    }

    fn unit(team: Team, x: i32, y: i32) -> Entity {
        Entity::deploy("soldier", Vector::new(x, y, 0), team)
    }

    #[test]
    fn test_add_entity_assigns_sequential_ids_and_team() {
        let mut stage = Stage::new(7, 7, 1);
        let a = stage.add_entity(unit(Team::Zero, 0, 0), Team::Zero).unwrap();
        let b = stage.add_entity(unit(Team::One, 6, 6), Team::One).unwrap();
        assert_eq!(a, EntityId(0));
        assert_eq!(b, EntityId(1));
        assert_eq!(stage.entity(b).unwrap().team, Team::One);
    }

    #[test]
    fn test_add_entity_rejects_out_of_bounds_and_occupied() {
        let mut stage = Stage::new(7, 7, 1);
        let err = stage.add_entity(unit(Team::Zero, 7, 0), Team::Zero).unwrap_err();
        assert!(matches!(err, BattleError::OutOfBounds(_)));

        stage.add_entity(unit(Team::Zero, 1, 1), Team::Zero).unwrap();
        let err = stage.add_entity(unit(Team::One, 1, 1), Team::One).unwrap_err();
        assert!(matches!(err, BattleError::Occupied(_)));
    }

    #[test]
    fn test_layers_bound_the_z_axis() {
        let stage = Stage::new(7, 7, 1);
        assert!(stage.in_bounds(Vector::new(6, 6, 0)));
        assert!(!stage.in_bounds(Vector::new(0, 0, 1)));
        assert!(!stage.in_bounds(Vector::new(-1, 0, 0)));
    }

    #[test]
    fn test_advance_calls_hooks_around_resolution() {
        let mut stage = Stage::new(7, 7, 1);
        stage.add_entity(unit(Team::Zero, 0, 0), Team::Zero).unwrap();
        stage
            .call_resoluble(Action::Attack { source: EntityId(0) }, true)
            .unwrap();

        let mut recorder = Recorder::default();
        stage.advance(Duration::from_secs(1), &mut recorder).unwrap();

        assert_eq!(recorder.calls, vec!["before", "after"]);
        assert_eq!(recorder.pending_seen, 1);
        assert!(stage.delayed_resolubles().is_empty());
        assert_eq!(stage.turn(), 1);
    }

    #[test]
    fn test_first_attacker_in_order_wins_a_mutual_exchange() {
        let mut stage = Stage::new(7, 7, 1);
        stage.add_entity(unit(Team::Zero, 0, 0), Team::Zero).unwrap();
        stage.add_entity(unit(Team::One, 1, 1), Team::One).unwrap();
        stage.call_resoluble(Action::Attack { source: EntityId(0) }, true).unwrap();
        stage.call_resoluble(Action::Attack { source: EntityId(1) }, true).unwrap();

        stage.advance(Duration::from_secs(1), &mut Recorder::default()).unwrap();

        let turn = stage.last_turn().unwrap();
        assert_eq!(
            turn.events,
            vec![TurnEvent::Attacked {
                source: EntityId(0),
                target: EntityId(1),
                killed: true
            }]
        );
        assert_eq!(turn.defeated, Some(Team::One));
        assert!(stage.team_wiped());
    }

    #[test]
    fn test_attack_out_of_range_does_nothing() {
        let mut stage = Stage::new(7, 7, 1);
        stage.add_entity(unit(Team::Zero, 0, 0), Team::Zero).unwrap();
        stage.add_entity(unit(Team::One, 4, 4), Team::One).unwrap();
        stage.call_resoluble(Action::Attack { source: EntityId(0) }, true).unwrap();

        stage.advance(Duration::from_secs(1), &mut Recorder::default()).unwrap();

        assert!(stage.last_turn().unwrap().events.is_empty());
        assert_eq!(stage.defeated_team(), None);
    }

    #[test]
    fn test_inactive_resolubles_are_skipped() {
        let mut stage = Stage::new(7, 7, 1);
        stage.add_entity(unit(Team::Zero, 0, 0), Team::Zero).unwrap();
        let mut blocked = Resoluble::new(Action::Move {
            source: EntityId(0),
            to: Vector::new(1, 0, 0),
        });
        blocked.deactivate();
        stage.submit_resolubles(vec![blocked]);

        stage.advance(Duration::from_secs(1), &mut Recorder::default()).unwrap();

        assert_eq!(stage.entity(EntityId(0)).unwrap().position, Vector::new(0, 0, 0));
    }

    #[test]
    fn test_move_sets_has_moved_until_next_tick() {
        let mut stage = Stage::new(7, 7, 1);
        stage.add_entity(unit(Team::Zero, 0, 0), Team::Zero).unwrap();
        stage
            .deserialize_resoluble(
                json!({"kind": "move", "source": 0, "to": {"x": 1, "y": 0, "z": 0}}),
                Team::Zero,
            )
            .unwrap();

        stage.advance(Duration::from_secs(1), &mut Recorder::default()).unwrap();
        let moved = stage.entity(EntityId(0)).unwrap();
        assert_eq!(moved.position, Vector::new(1, 0, 0));
        assert!(moved.has_moved);

        stage.advance(Duration::from_secs(1), &mut Recorder::default()).unwrap();
        assert!(!stage.entity(EntityId(0)).unwrap().has_moved);
    }

    #[test]
    fn test_malformed_payload_is_an_error_and_queues_nothing() {
        let mut stage = Stage::new(7, 7, 1);
        let err = stage
            .deserialize_resoluble(json!({"kind": "teleport"}), Team::Zero)
            .unwrap_err();
        assert!(matches!(err, BattleError::MalformedResoluble(_)));
        assert!(stage.delayed_resolubles().is_empty());
    }

    #[test]
    fn test_payload_for_other_team_unit_is_refused() {
        let mut stage = Stage::new(7, 7, 1);
        stage.add_entity(unit(Team::Zero, 0, 0), Team::Zero).unwrap();
        stage.add_entity(unit(Team::One, 2, 2), Team::One).unwrap();

        let err = stage
            .deserialize_resoluble(
                json!({"kind": "move", "source": 1, "to": {"x": 1, "y": 1, "z": 0}}),
                Team::Zero,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            BattleError::NotOwned { entity: EntityId(1), team: Team::Zero }
        ));

        let err = stage
            .deserialize_resoluble(json!({"kind": "attack", "source": 9}), Team::Zero)
            .unwrap_err();
        assert!(matches!(err, BattleError::UnknownEntity(EntityId(9))));
        assert!(stage.delayed_resolubles().is_empty());
    }

    #[test]
    fn test_call_resoluble_for_unknown_entity_fails() {
        let mut stage = Stage::new(7, 7, 1);
        let err = stage
            .call_resoluble(Action::Attack { source: EntityId(5) }, true)
            .unwrap_err();
        assert!(matches!(err, BattleError::UnknownEntity(EntityId(5))));
    }

    #[test]
    fn test_immediate_resoluble_lands_in_next_turn() {
        let mut stage = Stage::new(7, 7, 1);
        stage.add_entity(unit(Team::Zero, 0, 0), Team::Zero).unwrap();
        stage.add_entity(unit(Team::One, 0, 1), Team::One).unwrap();
        stage.call_resoluble(Action::Attack { source: EntityId(1) }, false).unwrap();
        assert!(!stage.entity(EntityId(0)).unwrap().alive);

        stage.advance(Duration::from_secs(1), &mut Recorder::default()).unwrap();
        assert_eq!(stage.last_turn().unwrap().events.len(), 1);
    }

    #[test]
    fn test_empty_team_counts_as_defeated() {
        let mut stage = Stage::new(7, 7, 1);
        stage.add_entity(unit(Team::One, 3, 3), Team::One).unwrap();
        assert_eq!(stage.defeated_team(), Some(Team::Zero));
    }

    #[test]
    fn test_snapshot_omits_server_side_queues() {
        let mut stage = Stage::new(7, 7, 1);
        stage.add_entity(unit(Team::Zero, 2, 2), Team::Zero).unwrap();
        stage.call_resoluble(Action::Attack { source: EntityId(0) }, true).unwrap();

        let snapshot: serde_json::Value =
            serde_json::from_str(&stage.serialize_stage().unwrap()).unwrap();
        assert_eq!(snapshot["width"], 7);
        assert_eq!(snapshot["layers"], 1);
        assert_eq!(snapshot["entities"].as_array().unwrap().len(), 1);
        assert_eq!(snapshot["entities"][0]["facing"], json!({"x": 1, "y": -1, "z": 0}));
        assert!(snapshot.get("delayed").is_none());
    }

    #[test]
    fn test_turn_record_before_any_tick_is_empty() {
        let stage = Stage::new(7, 7, 1);
        let turn: serde_json::Value = serde_json::from_str(&stage.serialize_turn().unwrap()).unwrap();
        assert_eq!(turn["index"], 0);
        assert_eq!(turn["events"], json!([]));
    }
}
