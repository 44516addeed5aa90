//! Remote console (RCON) client.
//!
//! Factorio exposes the Source RCON protocol: length-prefixed little-endian
//! frames over TCP with a password handshake. The client here connects
//! lazily on the first command and parses the game's text replies strictly —
//! a reply that no longer matches the expected shape is surfaced as a
//! protocol error rather than silently tolerated, because it means the game
//! changed its output format.

mod client;
mod codec;
mod error;
mod parser;

pub use client::RconClient;
pub use error::{RconError, RconResult};
