//! Unified error type for the Skirmish server.

use skirmish_battle::BattleError;
use skirmish_protocol::ProtocolError;
use skirmish_room::RoomError;
use skirmish_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, rejected deployment, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A simulation error surfaced outside a room.
    #[error(transparent)]
    Battle(#[from] BattleError),

    /// Bad server settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::{ParticipantId, SessionKey, Vector};

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Transport(_)));
        assert!(skirmish_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(SessionKey::new("M-1"));
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Room(_)));
        assert!(skirmish_err.to_string().contains("M-1"));

        let err = RoomError::NotInRoom(ParticipantId(3));
        assert!(SkirmishError::from(err).to_string().contains("P-3"));
    }

    #[test]
    fn test_from_battle_error() {
        let err = BattleError::OutOfBounds(Vector::new(9, 0, 0));
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Battle(_)));
        assert!(skirmish_err.to_string().contains("(9, 0, 0)"));
    }
}
