//! Error types for the room layer.

use skirmish_battle::BattleError;
use skirmish_protocol::{ParticipantId, SessionKey};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No match is registered under this key.
    #[error("room {0} not found")]
    NotFound(SessionKey),

    /// The participant does not belong to this match.
    #[error("participant {0} is not in this room")]
    NotInRoom(ParticipantId),

    /// The participant is already playing in another match.
    #[error("participant {0} already in room {1}")]
    AlreadyInRoom(ParticipantId, SessionKey),

    /// A `deployment-complete` submission broke the deployment rules.
    #[error("deployment from {participant} rejected: {reason}")]
    InvalidDeployment {
        participant: ParticipantId,
        reason: String,
    },

    /// The room is in a state that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(SessionKey),

    #[error(transparent)]
    Battle(#[from] BattleError),
}
