//! Pending combat actions ("resolubles").
//!
//! A resoluble is created either by the battlefield itself (the attack
//! every alive unit attempts each tick) or from a participant's payload.
//! It waits in the battlefield's delayed queue until the next tick, where
//! it is prepared, validated, and finally resolved.

use serde::{Deserialize, Serialize};
use skirmish_protocol::Vector;

use crate::EntityId;

/// What a unit intends to do.
///
/// Participants send these as JSON, e.g.
/// `{"kind": "move", "source": 3, "to": {"x": 1, "y": 2, "z": 0}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Strike the nearest adjacent enemy, if any.
    Attack { source: EntityId },
    /// Step to a neighbouring cell.
    Move { source: EntityId, to: Vector },
}

impl Action {
    pub fn source(&self) -> EntityId {
        match self {
            Self::Attack { source } | Self::Move { source, .. } => *source,
        }
    }

    /// Resolution order within a tick: lower goes first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Move { .. } => 0,
            Self::Attack { .. } => 1,
        }
    }
}

/// An action awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resoluble {
    pub action: Action,
    /// Cleared by preparation or validation when the action must not run.
    pub active: bool,
}

impl Resoluble {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            active: true,
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}
