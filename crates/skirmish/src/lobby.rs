//! Arrival-order pairing of connected participants.

use skirmish_protocol::ParticipantId;
use skirmish_room::Participant;

/// Holds at most one participant waiting for an opponent.
///
/// The next participant to arrive is paired with the waiting one: the
/// earlier arrival plays team 0.
#[derive(Debug, Default)]
pub struct Lobby {
    waiting: Option<Participant>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant and returns a pair once two are present.
    ///
    /// A waiting participant whose connection has gone away is discarded
    /// instead of being paired.
    pub fn enqueue(&mut self, participant: Participant) -> Option<(Participant, Participant)> {
        if let Some(waiting) = self.waiting.take() {
            if waiting.is_connected() && waiting.id() != participant.id() {
                return Some((waiting, participant));
            }
            tracing::debug!(participant = %waiting.id(), "dropping stale lobby entry");
        }
        self.waiting = Some(participant);
        None
    }

    /// Removes `id` if it is the one waiting. Returns whether it was.
    pub fn remove(&mut self, id: ParticipantId) -> bool {
        if self.waiting.as_ref().is_some_and(|p| p.id() == id) {
            self.waiting = None;
            return true;
        }
        false
    }

    pub fn waiting(&self) -> Option<ParticipantId> {
        self.waiting.as_ref().map(Participant::id)
    }
}
