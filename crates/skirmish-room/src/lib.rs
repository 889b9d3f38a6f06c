//! Match lifecycle for Skirmish.
//!
//! A match is a [`GameRoom`]: two participants, one battlefield, and a
//! phase machine that walks Created → Deployment → Battle → Closed. Each
//! room runs inside its own Tokio task (actor model) which feeds it
//! participant events and ticks.
//!
//! # Key types
//!
//! - [`GameRoom`]: the synchronous match state machine
//! - [`RoomManager`]: creates matches, routes participants
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomPhase`]: lifecycle state machine
//! - [`MatchConfig`]: grid size, deployment timeout, tick rate

mod config;
mod error;
mod game_room;
mod hooks;
mod manager;
mod participant;
mod room;

pub use config::{DeploymentRules, MatchConfig, RoomPhase};
pub use error::RoomError;
pub use game_room::{ERROR_FORBIDDEN, ERROR_MALFORMED, ERROR_REJECTED, GameRoom};
pub use manager::RoomManager;
pub use participant::{Outbox, Participant, ParticipantStatus};
pub use room::{RoomHandle, RoomInfo, spawn_room};
