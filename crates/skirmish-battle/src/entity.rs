//! Units on the battlefield.

use std::fmt;

use serde::{Deserialize, Serialize};
use skirmish_protocol::{Team, Vector};

/// Index of an entity within its battlefield. Assigned on insertion, in
/// insertion order, and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

/// A placed combat unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub class_key: String,
    pub team: Team,
    pub alive: bool,
    pub current_health: i32,
    pub position: Vector,
    pub facing: Vector,
    pub has_moved: bool,
}

impl Entity {
    /// Health every freshly deployed unit starts with.
    pub const DEPLOY_HEALTH: i32 = 1;

    /// Builds a unit as it enters the match: alive, at full health, facing
    /// the opposing side. The id is a placeholder until the battlefield
    /// assigns one.
    pub fn deploy(class_key: impl Into<String>, position: Vector, team: Team) -> Self {
        Self {
            id: EntityId(0),
            class_key: class_key.into(),
            team,
            alive: true,
            current_health: Self::DEPLOY_HEALTH,
            position,
            facing: team.facing(),
            has_moved: false,
        }
    }

    /// Applies damage and reports whether this hit killed the unit.
    pub(crate) fn take_damage(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.current_health -= amount;
        if self.current_health <= 0 {
            self.alive = false;
            return true;
        }
        false
    }
}
