//! The record of one resolved tick, broadcast to both participants.

use serde::{Deserialize, Serialize};
use skirmish_protocol::{Team, Vector};

use crate::EntityId;

/// Something that happened while a tick was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnEvent {
    Moved {
        source: EntityId,
        from: Vector,
        to: Vector,
    },
    Attacked {
        source: EntityId,
        target: EntityId,
        killed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// 1 for the first resolved tick.
    pub index: u64,
    /// Simulation step of this tick, in seconds.
    pub dt: f64,
    pub events: Vec<TurnEvent>,
    /// Set once a team has no alive units left.
    pub defeated: Option<Team>,
}

impl Turn {
    pub(crate) fn new(index: u64, dt: f64) -> Self {
        Self {
            index,
            dt,
            events: Vec::new(),
            defeated: None,
        }
    }
}
