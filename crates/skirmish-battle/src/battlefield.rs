//! The seams between a match room and its simulation.
//!
//! A room owns exactly one [`Battlefield`] and drives it one tick at a
//! time. The battlefield calls back into the room through a
//! [`TickObserver`] it receives on every [`Battlefield::advance`], so the
//! dependency is visible in the types instead of hidden in registered
//! closures. Legality of pending actions is decided by an
//! [`ActionValidator`], kept separate so rules can change without touching
//! resolution.

use std::time::Duration;

use skirmish_protocol::{Team, Vector};

use crate::{Action, BattleError, Entity, EntityId, Resoluble};

/// Authoritative simulation state for one match.
pub trait Battlefield {
    /// Whether `cell` lies inside the grid.
    fn in_bounds(&self, cell: Vector) -> bool;

    /// Places a unit under `team` and returns its assigned id.
    ///
    /// # Errors
    /// [`BattleError::OutOfBounds`] or [`BattleError::Occupied`] if the
    /// unit's cell is unusable.
    fn add_entity(&mut self, entity: Entity, team: Team) -> Result<EntityId, BattleError>;

    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Every entity, in id order.
    fn entities(&self) -> &[Entity];

    /// Ids of alive entities, in id order.
    fn alive_entities(&self) -> Vec<EntityId>;

    /// The alive entity standing on `cell`, if any.
    fn occupant(&self, cell: Vector) -> Option<EntityId>;

    /// Issues an action. `delayed` actions wait for the next tick;
    /// others resolve immediately.
    fn call_resoluble(&mut self, action: Action, delayed: bool) -> Result<(), BattleError>;

    /// Parses a payload sent by the participant playing `team` into the
    /// delayed queue.
    ///
    /// # Errors
    /// [`BattleError::MalformedResoluble`] if the payload does not parse,
    /// [`BattleError::UnknownEntity`] or [`BattleError::NotOwned`] if the
    /// acting unit does not exist or belongs to the other team. Nothing is
    /// queued on error.
    fn deserialize_resoluble(
        &mut self,
        payload: serde_json::Value,
        team: Team,
    ) -> Result<(), BattleError>;

    /// Removes and returns every delayed resoluble.
    fn take_delayed_resolubles(&mut self) -> Vec<Resoluble>;

    /// Hands prepared and validated resolubles back for resolution in the
    /// current tick. Inactive ones are ignored.
    fn submit_resolubles(&mut self, resolubles: Vec<Resoluble>);

    /// Runs one tick: `before_tick`, resolution, then `after_tick`.
    fn advance<O>(&mut self, dt: Duration, observer: &mut O) -> Result<(), BattleError>
    where
        O: TickObserver<Self>,
        Self: Sized;

    /// A team with no alive units left, if any.
    fn defeated_team(&self) -> Option<Team>;

    fn team_wiped(&self) -> bool {
        self.defeated_team().is_some()
    }

    /// JSON text of the whole battlefield.
    fn serialize_stage(&self) -> Result<String, BattleError>;

    /// JSON text of the most recently resolved tick.
    fn serialize_turn(&self) -> Result<String, BattleError>;
}

/// Hooks a battlefield invokes around the resolution of every tick.
///
/// `before_tick` runs to completion before any pending action is resolved;
/// `after_tick` runs after resolution and before `advance` returns.
pub trait TickObserver<B: ?Sized> {
    fn before_tick(&mut self, battlefield: &mut B) -> Result<(), BattleError>;

    fn after_tick(&mut self, battlefield: &B) -> Result<(), BattleError>;
}

/// Decides which pending actions may run this tick.
pub trait ActionValidator<B: ?Sized> {
    /// Normalizes the whole batch: drops stale actions and fixes the order
    /// they resolve in.
    fn prepare(&self, battlefield: &B, pending: &mut Vec<Resoluble>);

    /// Checks the still-active actions against the battlefield and
    /// deactivates illegal ones.
    fn validate(&self, battlefield: &B, active: &mut [&mut Resoluble]);
}
