//! One connected player as seen by a match.

use std::fmt;

use serde::{Deserialize, Serialize};
use skirmish_protocol::{ParticipantId, ServerEvent, SessionKey, Team};
use tokio::sync::mpsc;

/// Channel end the room pushes outbound events into. The connection
/// handler owns the receiving half and writes to the socket.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Where a participant says it is in the match flow.
///
/// Self-reported and advisory: the room reads it to decide phase exits
/// but never trusts it for anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticipantStatus {
    #[default]
    Idle,
    Deployment,
    Battle,
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Deployment => "deployment",
            Self::Battle => "battle",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    pub(crate) status: ParticipantStatus,
    team: Option<Team>,
    matched: bool,
    room: Option<SessionKey>,
    initialized: bool,
    outbox: Outbox,
}

impl Participant {
    pub fn new(id: ParticipantId, outbox: Outbox) -> Self {
        Self {
            id,
            status: ParticipantStatus::Idle,
            team: None,
            matched: false,
            room: None,
            initialized: true,
            outbox,
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn status(&self) -> ParticipantStatus {
        self.status
    }

    /// Unset until the participant is bound to a match; fixed afterwards.
    pub fn team(&self) -> Option<Team> {
        self.team
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    pub fn room(&self) -> Option<&SessionKey> {
        self.room.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the connection behind the outbox is still around.
    pub fn is_connected(&self) -> bool {
        !self.outbox.is_closed()
    }

    /// Queues an event for delivery. Returns `false` if the connection is
    /// gone; the event is dropped in that case.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }

    pub(crate) fn bind(&mut self, key: SessionKey, team: Team) {
        if self.team.is_none() {
            self.team = Some(team);
        }
        self.matched = true;
        self.room = Some(key);
    }

    pub(crate) fn release(&mut self) {
        self.matched = false;
        self.room = None;
        self.initialized = false;
    }
}
