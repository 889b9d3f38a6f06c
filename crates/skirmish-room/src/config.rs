//! Match configuration and the room phase machine.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skirmish_battle::Battlefield;
use skirmish_protocol::UnitSpec;

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Settings shared by every match a server hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    pub grid_width: i32,
    pub grid_height: i32,
    pub layers: i32,

    /// How long deployment may last before battle starts regardless of
    /// readiness. `None` waits for both participants forever.
    pub deployment_timeout: Option<Duration>,

    /// Ticks per second while the match runs.
    pub tick_rate_hz: u32,

    pub rules: DeploymentRules,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            grid_width: 7,
            grid_height: 7,
            layers: 1,
            deployment_timeout: Some(Duration::from_secs(60)),
            tick_rate_hz: 1,
            rules: DeploymentRules::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeploymentRules
// ---------------------------------------------------------------------------

/// What a `deployment-complete` submission must satisfy to be honored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRules {
    /// Upper bound on units per participant. At least one is required.
    pub max_units: usize,
}

impl Default for DeploymentRules {
    fn default() -> Self {
        Self { max_units: 7 }
    }
}

impl DeploymentRules {
    /// Checks a submission against the battlefield it will land on.
    ///
    /// Returns a human-readable reason on rejection.
    pub fn check<B: Battlefield>(&self, units: &[UnitSpec], battlefield: &B) -> Result<(), String> {
        if units.is_empty() {
            return Err("deployment must contain at least one unit".into());
        }
        if units.len() > self.max_units {
            return Err(format!(
                "deployment has {} units, at most {} allowed",
                units.len(),
                self.max_units
            ));
        }

        let mut cells = HashSet::with_capacity(units.len());
        for unit in units {
            let cell = unit.position();
            if unit.class_key().is_empty() {
                return Err("unit class key must not be empty".into());
            }
            if !battlefield.in_bounds(cell) {
                return Err(format!("cell {cell} is outside the battlefield"));
            }
            if battlefield.occupant(cell).is_some() || !cells.insert(cell) {
                return Err(format!("cell {cell} is already taken"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Lifecycle of a match room.
///
/// ```text
/// Created → Deployment → Battle → Closed
///    └──────────┴──────────┴──────→ Closed   (disconnect / shutdown)
/// ```
///
/// Phases never move backwards and `Closed` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomPhase {
    /// Both participants have been told their team; waiting for both to
    /// signal `deployment-ready`.
    Created,
    /// Units are being placed; waiting for both `deployment-complete`
    /// signals or the deployment timeout.
    Deployment,
    /// The simulation is ticking.
    Battle,
    Closed,
}

impl RoomPhase {
    /// The regular successor, or `None` for `Closed`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Deployment),
            Self::Deployment => Some(Self::Battle),
            Self::Battle => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Valid moves are the regular successor, or closing early from any
    /// open phase.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target) || (target == Self::Closed && self != Self::Closed)
    }

    pub fn is_open(self) -> bool {
        self != Self::Closed
    }
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Deployment => "deployment",
            Self::Battle => "battle",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
