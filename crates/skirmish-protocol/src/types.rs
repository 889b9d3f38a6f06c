//! Everything that travels on the wire between a match server and its two
//! participants.
//!
//! Each message is one JSON object naming the event and carrying its data:
//!
//! ```text
//! { "event": "deployment-complete",
//!   "data":  { "entities": [["archer", {"x": 1, "y": 2, "z": 0}]] } }
//! ```
//!
//! Event names are kebab-case so browser clients can bind handlers by the
//! same names they emit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one connected participant for the lifetime of its connection.
///
/// Serialized as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The opaque key of one match. Unique per match, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// One of the two sides of a match. On the wire a team is `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Team {
    Zero,
    One,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::Zero, Team::One];

    pub fn index(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }

    /// The direction a freshly deployed unit of this team faces.
    ///
    /// Opposing teams face each other along the same diagonal. Clients
    /// depend on this exact mapping.
    pub fn facing(self) -> Vector {
        match self {
            Self::Zero => Vector::new(1, -1, 0),
            Self::One => Vector::new(-1, 1, 0),
        }
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> u8 {
        team.index() as u8
    }
}

impl TryFrom<u8> for Team {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            other => Err(ProtocolError::InvalidMessage(format!(
                "team must be 0 or 1, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A grid cell or direction in battlefield space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vector {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chebyshev distance: the number of king-moves between two cells.
    pub fn chebyshev(self, other: Vector) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx.max(dy).max(dz)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One unit a participant wants deployed: a class key and a cell.
///
/// Encoded as a two-element array `["archer", {"x":0,"y":1,"z":0}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec(pub String, pub Vector);

impl UnitSpec {
    pub fn new(class_key: impl Into<String>, position: Vector) -> Self {
        Self(class_key.into(), position)
    }

    pub fn class_key(&self) -> &str {
        &self.0
    }

    pub fn position(&self) -> Vector {
        self.1
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Participant → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// A combat intent. The payload is opaque here; only the battlefield
    /// knows its shape.
    Resoluble { resoluble: serde_json::Value },

    /// "I have the match screen up and am ready to place units."
    DeploymentReady {},

    /// "These are all my units." Sent once, at the end of deployment.
    DeploymentComplete { entities: Vec<UnitSpec> },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resoluble { .. } => "resoluble",
            Self::DeploymentReady {} => "deployment-ready",
            Self::DeploymentComplete { .. } => "deployment-complete",
        }
    }
}

/// Server → participant.
///
/// `stage` and `turn` are serialized JSON text produced by the
/// battlefield; they are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Sent once per participant when the match is created.
    Matched { team: Team, stage: String },

    DeploymentStarted {},

    BattleStarted { stage: String },

    /// The authoritative record of one resolved tick.
    PostTick { turn: String },

    RoomClosed {},

    /// Input was rejected. `code` follows HTTP conventions.
    Error { code: u16, message: String },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Matched { .. } => "matched",
            Self::DeploymentStarted {} => "deployment-started",
            Self::BattleStarted { .. } => "battle-started",
            Self::PostTick { .. } => "post-tick",
            Self::RoomClosed {} => "room-closed",
            Self::Error { .. } => "error",
        }
    }
}
