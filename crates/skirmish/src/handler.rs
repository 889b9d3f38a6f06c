//! Per-connection handler: pairing, event routing and teardown.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register the connection as a participant and start its writer
//!   2. Enter the lobby; start a match when an opponent is waiting
//!   3. Loop: decode inbound events and route them to the match
//!   4. On close: stop the writer, leave the lobby and report the
//!      disconnect to the match

use std::sync::Arc;

use skirmish_protocol::{ClientEvent, Codec, ParticipantId, ServerEvent};
use skirmish_room::{ERROR_MALFORMED, Outbox, Participant, RoomError};
use skirmish_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::SkirmishError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SkirmishError>
where
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let participant_id = ParticipantId(conn.id().into_inner());
    tracing::debug!(conn_id = %conn.id(), participant = %participant_id, "handling new connection");

    let (outbox, rx) = mpsc::unbounded_channel();
    let writer = spawn_writer(Arc::clone(&conn), state.codec.clone(), rx);

    enter_lobby(&state, Participant::new(participant_id, outbox.clone())).await;

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(participant = %participant_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(participant = %participant_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(participant = %participant_id, error = %e, "failed to decode event");
                reply_error(&outbox, ERROR_MALFORMED, format!("invalid event: {e}"));
                continue;
            }
        };

        let name = event.name();
        let result = state
            .rooms
            .lock()
            .await
            .route_event(participant_id, event)
            .await;
        if let Err(e) = result {
            tracing::debug!(participant = %participant_id, event = name, error = %e, "event not routed");
        }
    }

    let left = leave(&state, participant_id, outbox, writer).await;
    let _ = conn.close().await;

    left.map_err(SkirmishError::from)
}

/// Tears down a participant whose connection is gone.
///
/// The writer is stopped first so the outbox reads as closed by the time
/// the match hears about the disconnect. The match then closes without
/// queueing `room-closed` for a peer that can no longer receive it.
async fn leave<C: Codec>(
    state: &ServerState<C>,
    participant: ParticipantId,
    outbox: Outbox,
    writer: JoinHandle<()>,
) -> Result<(), RoomError> {
    drop(outbox);
    writer.abort();
    let _ = writer.await;

    state.lobby.lock().await.remove(participant);
    state.rooms.lock().await.disconnect(participant).await
}

/// Queues the participant and starts a match if that completed a pair.
async fn enter_lobby<C: Codec>(state: &ServerState<C>, participant: Participant) {
    let pair = state.lobby.lock().await.enqueue(participant);
    let Some((p1, p2)) = pair else {
        return;
    };

    let (id1, id2) = (p1.id(), p2.id());
    if let Err(e) = state.rooms.lock().await.create_match(p1, p2) {
        tracing::warn!(p1 = %id1, p2 = %id2, error = %e, "could not start match");
    }
}

/// Drains a participant's outbox onto its socket until the outbox closes
/// or the socket fails.
fn spawn_writer<C: Codec>(
    conn: Arc<WebSocketConnection>,
    codec: C,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(event = event.name(), error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = conn.send(&bytes).await {
                tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
                break;
            }
        }
    })
}

fn reply_error(outbox: &Outbox, code: u16, message: String) {
    let _ = outbox.send(ServerEvent::Error { code, message });
}
