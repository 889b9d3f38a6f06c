//! Room actor: the single task that owns a [`GameRoom`].
//!
//! Participant events, disconnects and ticks all arrive at the same
//! `select!` loop, so the room is only ever touched from one place.

use skirmish_battle::{ActionValidator, Battlefield};
use skirmish_protocol::{ClientEvent, ParticipantId, SessionKey};
use skirmish_tick::{TickConfig, TickScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::{GameRoom, RoomError, RoomPhase};

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// An inbound event from one of the participants.
    Event {
        from: ParticipantId,
        event: ClientEvent,
    },

    /// The host lost a participant's connection.
    Disconnect { participant: ParticipantId },

    GetInfo { reply: oneshot::Sender<RoomInfo> },

    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub key: SessionKey,
    pub phase: RoomPhase,
    pub active: bool,
    pub participants: [ParticipantId; 2],
    /// Battle ticks simulated so far.
    pub ticks: u64,
}

/// Handle to a running room actor.
///
/// Cheap to clone. The [`RoomManager`](crate::RoomManager) keeps one per
/// match.
#[derive(Clone)]
pub struct RoomHandle {
    key: SessionKey,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Forwards a participant event (fire-and-forget).
    pub async fn send_event(&self, from: ParticipantId, event: ClientEvent) -> Result<(), RoomError> {
        self.send(RoomCommand::Event { from, event }).await
    }

    /// Reports that a participant's connection is gone. The room closes.
    pub async fn disconnect(&self, participant: ParticipantId) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnect { participant }).await
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }

    /// Closes the room and stops the actor.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    /// `true` once the actor has stopped.
    pub fn is_finished(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }
}

struct RoomActor<B, V> {
    room: GameRoom<B, V>,
    ticks: TickScheduler,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<B, V> RoomActor<B, V>
where
    B: Battlefield,
    V: ActionValidator<B>,
{
    async fn run(mut self) {
        let key = self.room.key().clone();
        tracing::info!(room = %key, rate_hz = self.ticks.tick_rate_hz(), "room actor started");

        while self.room.is_active() {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        tracing::debug!(room = %key, "all handles dropped");
                        self.room.close();
                    }
                },
                tick = self.ticks.wait_for_tick() => {
                    if let Err(err) = self.room.update(tick.dt) {
                        tracing::error!(room = %key, tick = tick.tick, %err, "update failed, closing room");
                        self.room.close();
                    }
                    self.ticks.record_tick_end();
                }
            }
        }

        tracing::info!(room = %key, ticks = self.ticks.tick_count(), "room actor stopped");
    }

    fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Event { from, event } => {
                let name = event.name();
                if let Err(err) = self.room.handle_event(from, event) {
                    tracing::debug!(room = %self.room.key(), participant = %from, event = name, %err, "event rejected");
                }
            }
            RoomCommand::Disconnect { participant } => {
                tracing::info!(room = %self.room.key(), %participant, "participant disconnected");
                self.room.close();
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room = %self.room.key(), "room shutting down");
                self.room.close();
            }
        }
    }

    fn info(&self) -> RoomInfo {
        let [p1, p2] = self.room.participants();
        RoomInfo {
            key: self.room.key().clone(),
            phase: self.room.phase(),
            active: self.room.is_active(),
            participants: [p1.id(), p2.id()],
            ticks: self.room.battle_ticks(),
        }
    }
}

/// Spawns the actor for `room` and returns a handle to it.
///
/// The room is ticked at `tick_config`'s rate until it closes. Must be
/// called inside a Tokio runtime.
pub fn spawn_room<B, V>(room: GameRoom<B, V>, tick_config: TickConfig, channel_size: usize) -> RoomHandle
where
    B: Battlefield + Send + 'static,
    V: ActionValidator<B> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(channel_size);
    let key = room.key().clone();

    let actor = RoomActor {
        room,
        ticks: TickScheduler::new(tick_config),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { key, sender: tx }
}
