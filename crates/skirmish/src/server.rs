//! `SkirmishServer` builder and server loop.
//!
//! Ties the layers together: transport → protocol → lobby → room.

use std::sync::Arc;
use std::time::Duration;

use skirmish_protocol::{Codec, JsonCodec};
use skirmish_room::{MatchConfig, RoomManager};
use skirmish_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::SkirmishError;
use crate::handler::handle_connection;
use crate::lobby::Lobby;

/// How often finished matches are dropped from the room manager.
const REAP_INTERVAL: Duration = Duration::from_secs(5);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) lobby: Mutex<Lobby>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Skirmish server.
///
/// ```rust,no_run
/// # async fn start() -> Result<(), skirmish::SkirmishError> {
/// use skirmish::prelude::*;
///
/// let server = SkirmishServer::builder()
///     .bind("0.0.0.0:8080")
///     .match_config(MatchConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SkirmishServerBuilder {
    bind_addr: String,
    match_config: MatchConfig,
}

impl SkirmishServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            match_config: MatchConfig::default(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the settings every match on this server uses.
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Checks the match settings and binds the listener.
    pub async fn build(self) -> Result<SkirmishServer<JsonCodec>, SkirmishError> {
        validate(&self.match_config)?;
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(self.match_config)),
            lobby: Mutex::new(Lobby::new()),
            codec: JsonCodec,
        });

        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(config: &MatchConfig) -> Result<(), SkirmishError> {
    if config.grid_width <= 0 || config.grid_height <= 0 || config.layers <= 0 {
        return Err(SkirmishError::Config(format!(
            "grid must be at least 1x1x1, got {}x{}x{}",
            config.grid_width, config.grid_height, config.layers
        )));
    }
    if config.tick_rate_hz == 0 {
        return Err(SkirmishError::Config("tick rate must be positive".into()));
    }
    if config.rules.max_units == 0 {
        return Err(SkirmishError::Config("max_units must be positive".into()));
    }
    Ok(())
}

/// A bound Skirmish server.
///
/// Call [`run()`](Self::run) to start accepting participants.
pub struct SkirmishServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SkirmishServer<JsonCodec> {
    pub fn builder() -> SkirmishServerBuilder {
        SkirmishServerBuilder::new()
    }
}

impl<C> SkirmishServer<C>
where
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Every accepted connection becomes a participant with its own
    /// handler task. A background task periodically forgets finished
    /// matches.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!("Skirmish server running");

        let reaper_state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(REAP_INTERVAL);
            loop {
                interval.tick().await;
                let reaped = reaper_state.rooms.lock().await.reap_finished();
                if !reaped.is_empty() {
                    tracing::debug!(count = reaped.len(), "reaped finished matches");
                }
            }
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
