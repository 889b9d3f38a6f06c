//! # Skirmish
//!
//! Authoritative match server for a two-player, turn-based tactics game.
//!
//! Participants connect over WebSocket, are paired in arrival order, place
//! their units during deployment, and then watch the server resolve the
//! battle tick by tick until one side has no units left.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn start() -> Result<(), SkirmishError> {
//! let server = SkirmishServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod lobby;
mod server;

pub use error::SkirmishError;
pub use lobby::Lobby;
pub use server::{SkirmishServer, SkirmishServerBuilder};

pub mod prelude {
    pub use crate::{SkirmishError, SkirmishServer, SkirmishServerBuilder};
    pub use skirmish_battle::{
        Action, ActionValidator, Battlefield, Entity, EntityId, GridValidator, Stage, TickObserver,
    };
    pub use skirmish_protocol::{
        ClientEvent, Codec, JsonCodec, ParticipantId, ServerEvent, SessionKey, Team, UnitSpec,
        Vector,
    };
    pub use skirmish_room::{
        DeploymentRules, GameRoom, MatchConfig, Participant, RoomManager, RoomPhase,
    };
    pub use skirmish_tick::{TickConfig, TickPolicy};
}
