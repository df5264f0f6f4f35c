//! Wire protocol for Broadside.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Commands** ([`ClientCommand`]): what a player asks for.
//! - **Events** ([`ServerEvent`]) and the view records they carry
//!   ([`ShipView`], [`WeaponStatus`], [`StrikeReport`], ...).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages become
//!   bytes and back.
//! - **Errors** ([`ProtocolError`]).
//!
//! Every message is an internally tagged JSON object:
//!
//! ```text
//! → {"type":"attack","weapon":"LINE_BARRAGE","target":"B5","orientation":"VERTICAL"}
//! ← {"type":"attack_result","strike":{...},"enemy_board":[[...]],"log":[...]}
//! ```
//!
//! Command fields that name catalog entries (mode, weapon, orientation,
//! target) stay as raw strings here. Resolving them is the server's job, so
//! a typo becomes an `error` event instead of an undecodable frame.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientCommand, ConnectionId, FleetEntry, ModeInfo, ServerEvent, ShipView, StatsView,
    StrikeReport, WeaponStatus,
};
