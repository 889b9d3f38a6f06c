//! Room manager: creates matches and routes participants to them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use skirmish_protocol::{ClientEvent, ParticipantId, SessionKey};
use skirmish_tick::TickConfig;

use crate::{GameRoom, MatchConfig, Participant, RoomError, RoomHandle, RoomInfo, spawn_room};

/// Counter for generating unique match keys.
static NEXT_MATCH: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks every running match and which participant plays in which.
///
/// A participant is in at most one match at a time.
pub struct RoomManager {
    rooms: HashMap<SessionKey, RoomHandle>,
    participant_rooms: HashMap<ParticipantId, SessionKey>,
    config: MatchConfig,
}

impl RoomManager {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            participant_rooms: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Starts a match between two participants and returns its key.
    ///
    /// `p1` plays team 0 and `p2` team 1. Both get their `matched` event
    /// before this returns.
    pub fn create_match(&mut self, p1: Participant, p2: Participant) -> Result<SessionKey, RoomError> {
        for id in [p1.id(), p2.id()] {
            if let Some(current) = self.participant_rooms.get(&id) {
                return Err(RoomError::AlreadyInRoom(id, current.clone()));
            }
        }

        let key = SessionKey::new(format!("M-{}", NEXT_MATCH.fetch_add(1, Ordering::Relaxed)));
        let ids = [p1.id(), p2.id()];
        let room = GameRoom::new(key.clone(), p1, p2, &self.config)?;
        let handle = spawn_room(
            room,
            TickConfig::with_rate(self.config.tick_rate_hz),
            DEFAULT_CHANNEL_SIZE,
        );

        self.rooms.insert(key.clone(), handle);
        for id in ids {
            self.participant_rooms.insert(id, key.clone());
        }
        tracing::info!(room = %key, p1 = %ids[0], p2 = %ids[1], "match started");
        Ok(key)
    }

    /// Routes an event from a participant to its current match.
    pub async fn route_event(&self, participant: ParticipantId, event: ClientEvent) -> Result<(), RoomError> {
        self.handle_for(participant)?.send_event(participant, event).await
    }

    /// Reports a lost connection to the participant's match, if any, and
    /// forgets the participant.
    pub async fn disconnect(&mut self, participant: ParticipantId) -> Result<(), RoomError> {
        let Some(key) = self.participant_rooms.remove(&participant) else {
            return Ok(());
        };
        let Some(handle) = self.rooms.get(&key) else {
            return Ok(());
        };
        if handle.is_finished() {
            return Ok(());
        }
        handle.disconnect(participant).await
    }

    /// Drops bookkeeping for matches whose actor has stopped and returns
    /// their keys.
    pub fn reap_finished(&mut self) -> Vec<SessionKey> {
        let finished: Vec<SessionKey> = self
            .rooms
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &finished {
            self.rooms.remove(key);
            tracing::debug!(room = %key, "room reaped");
        }
        self.participant_rooms.retain(|_, key| !finished.contains(key));
        finished
    }

    /// Shuts down a match and forgets its participants.
    pub async fn destroy_match(&mut self, key: &SessionKey) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(key)
            .ok_or_else(|| RoomError::NotFound(key.clone()))?;
        let _ = handle.shutdown().await;
        self.participant_rooms.retain(|_, k| k != key);
        tracing::info!(room = %key, "match destroyed");
        Ok(())
    }

    /// Returns the match a participant is currently in.
    pub fn participant_room(&self, participant: ParticipantId) -> Option<&SessionKey> {
        self.participant_rooms.get(&participant)
    }

    pub async fn get_room_info(&self, key: &SessionKey) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(key)
            .ok_or_else(|| RoomError::NotFound(key.clone()))?;
        handle.get_info().await
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn handle_for(&self, participant: ParticipantId) -> Result<&RoomHandle, RoomError> {
        let key = self
            .participant_rooms
            .get(&participant)
            .ok_or(RoomError::NotInRoom(participant))?;
        self.rooms
            .get(key)
            .ok_or_else(|| RoomError::NotFound(key.clone()))
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
