//! Battlefield simulation for Skirmish.
//!
//! A match room treats the simulation as a collaborator behind three
//! traits:
//!
//! - [`Battlefield`]: grid, units, pending actions and tick resolution
//! - [`TickObserver`]: the room's hooks around each resolved tick
//! - [`ActionValidator`]: legality of pending actions
//!
//! [`Stage`] and [`GridValidator`] are the implementations the server
//! runs matches with.

mod action;
mod battlefield;
mod entity;
mod error;
mod stage;
mod turn;
mod validator;

pub use action::{Action, Resoluble};
pub use battlefield::{ActionValidator, Battlefield, TickObserver};
pub use entity::{Entity, EntityId};
pub use error::BattleError;
pub use stage::Stage;
pub use turn::{Turn, TurnEvent};
pub use validator::GridValidator;
