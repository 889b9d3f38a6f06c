//! Errors raised by a battlefield.

use skirmish_protocol::{Team, Vector};

use crate::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    /// A participant's action payload did not parse.
    #[error("malformed resoluble: {0}")]
    MalformedResoluble(#[source] serde_json::Error),

    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    /// A participant tried to command a unit of the other team.
    #[error("entity {entity} is not controlled by team {team}")]
    NotOwned { entity: EntityId, team: Team },

    #[error("cell {0} is outside the battlefield")]
    OutOfBounds(Vector),

    #[error("cell {0} is already occupied")]
    Occupied(Vector),

    /// Producing a snapshot or turn record failed.
    #[error("serialize failed: {0}")]
    Serialize(#[source] serde_json::Error),
}
