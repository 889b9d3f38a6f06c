//! Wire protocol for Skirmish.
//!
//! - **Types**: identifiers ([`ParticipantId`], [`SessionKey`]), the two
//!   sides of a match ([`Team`]), grid coordinates ([`Vector`]) and the
//!   named events exchanged with participants ([`ClientEvent`],
//!   [`ServerEvent`]).
//! - **Codec**: [`Codec`] and the default [`JsonCodec`].
//! - **Errors**: [`ProtocolError`].
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Room (match lifecycle)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientEvent, ParticipantId, ServerEvent, SessionKey, Team, UnitSpec, Vector,
};
