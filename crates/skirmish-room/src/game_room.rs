//! The authoritative coordinator of one match.

use std::time::Duration;

use skirmish_battle::{ActionValidator, BattleError, Battlefield, Entity, GridValidator, Stage};
use skirmish_protocol::{ClientEvent, ParticipantId, ServerEvent, SessionKey, Team, UnitSpec};
use tracing::{debug, info, warn};

use crate::hooks::MatchObserver;
use crate::{DeploymentRules, MatchConfig, Participant, ParticipantStatus, RoomError, RoomPhase};

/// Status code sent with `error` for payloads that do not parse.
pub const ERROR_MALFORMED: u16 = 400;
/// Status code sent with `error` for actions on units the sender does not
/// control.
pub const ERROR_FORBIDDEN: u16 = 403;
/// Status code sent with `error` for deployments that break the rules.
pub const ERROR_REJECTED: u16 = 422;

/// One match between exactly two participants.
///
/// A plain synchronous state machine. Whoever owns it (normally the room
/// actor, see [`spawn_room`](crate::spawn_room)) must call every method from
/// a single task; nothing in here locks.
///
/// Events from participants only record what they said. Phase changes
/// happen exclusively in [`update`](Self::update), one phase per call.
pub struct GameRoom<B = Stage, V = GridValidator> {
    key: SessionKey,
    phase: RoomPhase,
    active: bool,
    participants: [Participant; 2],
    deployed: [bool; 2],
    rules: DeploymentRules,
    deployment_remaining: Option<Duration>,
    battle_ticks: u64,
    battlefield: B,
    validator: V,
}

impl GameRoom {
    /// Creates a match on a fresh [`Stage`] sized by `config` and tells
    /// both participants their team. `p1` plays team 0, `p2` team 1.
    pub fn new(
        key: SessionKey,
        p1: Participant,
        p2: Participant,
        config: &MatchConfig,
    ) -> Result<Self, RoomError> {
        let stage = Stage::new(config.grid_width, config.grid_height, config.layers);
        Self::with_battlefield(key, p1, p2, config, stage, GridValidator)
    }
}

impl<B, V> GameRoom<B, V>
where
    B: Battlefield,
    V: ActionValidator<B>,
{
    /// Creates a match on a caller-supplied battlefield and validator.
    pub fn with_battlefield(
        key: SessionKey,
        mut p1: Participant,
        mut p2: Participant,
        config: &MatchConfig,
        battlefield: B,
        validator: V,
    ) -> Result<Self, RoomError> {
        if p1.id() == p2.id() {
            return Err(RoomError::InvalidState(format!(
                "participant {} cannot play against itself",
                p1.id()
            )));
        }
        for participant in [&p1, &p2] {
            if let Some(room) = participant.room() {
                return Err(RoomError::AlreadyInRoom(participant.id(), room.clone()));
            }
        }

        let stage = battlefield.serialize_stage()?;
        for (participant, team) in [&mut p1, &mut p2].into_iter().zip(Team::BOTH) {
            participant.bind(key.clone(), team);
            participant.send(ServerEvent::Matched {
                team,
                stage: stage.clone(),
            });
        }

        info!(room = %key, p1 = %p1.id(), p2 = %p2.id(), "match created");

        Ok(Self {
            key,
            phase: RoomPhase::Created,
            active: true,
            participants: [p1, p2],
            deployed: [false; 2],
            rules: config.rules.clone(),
            deployment_remaining: config.deployment_timeout,
            battle_ticks: 0,
            battlefield,
            validator,
        })
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// `true` from construction until [`close`](Self::close) runs.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn battlefield(&self) -> &B {
        &self.battlefield
    }

    pub fn participants(&self) -> &[Participant; 2] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id() == id)
    }

    /// Time left before deployment is forced to end, if a timeout is set.
    pub fn deployment_remaining(&self) -> Option<Duration> {
        self.deployment_remaining
    }

    /// Number of battle ticks simulated so far.
    pub fn battle_ticks(&self) -> u64 {
        self.battle_ticks
    }

    /// Applies one inbound event from `from`.
    ///
    /// Ignored once the room is closed. Never changes the phase.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`] if `from` is not one of the two players.
    /// - [`RoomError::Battle`] if a resoluble payload does not parse or
    ///   names a unit the sender does not control.
    /// - [`RoomError::InvalidDeployment`] if a deployment is rejected,
    ///   including any deployment outside the Deployment phase.
    ///
    /// The sender is told about the last two through an `error` event.
    pub fn handle_event(&mut self, from: ParticipantId, event: ClientEvent) -> Result<(), RoomError> {
        if !self.active {
            debug!(room = %self.key, participant = %from, event = event.name(), "event after close ignored");
            return Ok(());
        }
        let slot = self
            .slot_of(from)
            .ok_or(RoomError::NotInRoom(from))?;

        match event {
            ClientEvent::Resoluble { resoluble } => {
                let team = Self::team_of(slot);
                if let Err(err) = self.battlefield.deserialize_resoluble(resoluble, team) {
                    let code = match err {
                        BattleError::MalformedResoluble(_) => Some(ERROR_MALFORMED),
                        BattleError::NotOwned { .. } | BattleError::UnknownEntity(_) => {
                            Some(ERROR_FORBIDDEN)
                        }
                        _ => None,
                    };
                    if let Some(code) = code {
                        self.participants[slot].send(ServerEvent::Error {
                            code,
                            message: err.to_string(),
                        });
                    }
                    warn!(room = %self.key, participant = %from, %team, error = %err, "resoluble refused");
                    return Err(err.into());
                }
            }
            ClientEvent::DeploymentReady {} => {
                let participant = &mut self.participants[slot];
                if participant.status == ParticipantStatus::Idle {
                    participant.status = ParticipantStatus::Deployment;
                    debug!(room = %self.key, participant = %from, "deployment ready");
                } else {
                    debug!(
                        room = %self.key,
                        participant = %from,
                        status = ?participant.status,
                        "repeated deployment ready ignored"
                    );
                }
            }
            ClientEvent::DeploymentComplete { entities } => {
                if let Err(reason) = self.deploy(slot, &entities) {
                    self.participants[slot].send(ServerEvent::Error {
                        code: ERROR_REJECTED,
                        message: reason.clone(),
                    });
                    warn!(room = %self.key, participant = %from, %reason, "deployment rejected");
                    return Err(RoomError::InvalidDeployment {
                        participant: from,
                        reason,
                    });
                }
                self.participants[slot].status = ParticipantStatus::Battle;
            }
        }
        Ok(())
    }

    /// Runs the logic of the current phase once.
    ///
    /// In battle, `dt` is forwarded to the battlefield as the tick step.
    /// If that tick leaves a team without units the room closes before
    /// this call returns.
    ///
    /// # Errors
    /// Any battlefield failure. The room is left as it was at the failure
    /// point; callers are expected to close it.
    pub fn update(&mut self, dt: Duration) -> Result<(), RoomError> {
        if !self.active {
            return Ok(());
        }

        match self.phase {
            RoomPhase::Created => {
                if self.all_in(ParticipantStatus::Deployment) {
                    self.transition(RoomPhase::Deployment);
                    self.broadcast(ServerEvent::DeploymentStarted {});
                }
            }
            RoomPhase::Deployment => {
                if let Some(remaining) = &mut self.deployment_remaining {
                    *remaining = remaining.saturating_sub(dt);
                }
                let expired = self.deployment_remaining == Some(Duration::ZERO);
                let ready = self.all_in(ParticipantStatus::Battle);

                if ready || expired {
                    if !ready {
                        warn!(
                            room = %self.key,
                            deployed = ?self.deployed,
                            "deployment timed out, starting battle"
                        );
                    }
                    let stage = self.battlefield.serialize_stage()?;
                    self.broadcast(ServerEvent::BattleStarted { stage });
                    self.transition(RoomPhase::Battle);
                }
            }
            RoomPhase::Battle => {
                let mut observer = MatchObserver {
                    key: &self.key,
                    validator: &self.validator,
                    participants: &self.participants,
                };
                self.battlefield.advance(dt, &mut observer)?;
                self.battle_ticks += 1;

                if let Some(team) = self.battlefield.defeated_team() {
                    info!(
                        room = %self.key,
                        defeated = %team,
                        winner = %team.opponent(),
                        ticks = self.battle_ticks,
                        "team wiped"
                    );
                    self.close();
                }
            }
            RoomPhase::Closed => {}
        }
        Ok(())
    }

    /// Ends the match. Safe to call any number of times; only the first
    /// call does anything.
    pub fn close(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.transition(RoomPhase::Closed);

        for participant in &mut self.participants {
            participant.release();
            if participant.is_connected() {
                participant.send(ServerEvent::RoomClosed {});
            }
        }
        info!(room = %self.key, "room closed");
    }

    /// The first participant plays team 0, the second team 1.
    fn team_of(slot: usize) -> Team {
        Team::BOTH[slot]
    }

    fn slot_of(&self, id: ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| p.id() == id)
    }

    fn all_in(&self, status: ParticipantStatus) -> bool {
        self.participants.iter().all(|p| p.status == status)
    }

    fn broadcast(&self, event: ServerEvent) {
        for participant in &self.participants {
            participant.send(event.clone());
        }
    }

    fn transition(&mut self, target: RoomPhase) {
        debug_assert!(self.phase.can_transition_to(target));
        info!(room = %self.key, from = %self.phase, to = %target, "phase changed");
        self.phase = target;
    }

    /// Checks and places one participant's units. Nothing is added unless
    /// the whole submission is accepted.
    fn deploy(&mut self, slot: usize, units: &[UnitSpec]) -> Result<(), String> {
        if self.deployed[slot] {
            return Err("deployment already completed".into());
        }
        if self.phase != RoomPhase::Deployment {
            return Err(format!("cannot deploy during {}", self.phase));
        }
        self.rules.check(units, &self.battlefield)?;

        let team = Self::team_of(slot);
        for unit in units {
            let entity = Entity::deploy(unit.class_key(), unit.position(), team);
            self.battlefield
                .add_entity(entity, team)
                .map_err(|err| err.to_string())?;
        }
        self.deployed[slot] = true;

        info!(room = %self.key, %team, units = units.len(), "units deployed");
        Ok(())
    }
}
