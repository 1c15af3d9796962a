//! Shared vocabulary for Gatecrash.
//!
//! This crate defines everything the three core subsystems agree on:
//!
//! - **Identity** ([`PlayerId`], [`SessionId`], [`DoorId`],
//!   [`ResponseId`]) — newtype ids.
//! - **Model** ([`Session`], [`Player`], [`Door`], [`Response`],
//!   [`PlayerPath`], ...) — the entities the game is made of.
//! - **Events** ([`Event`], [`EventKind`]) — the envelope pushed to
//!   live connections.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — bytes at the transport
//!   edge.
//!
//! # Architecture
//!
//! ```text
//! registry (connections) ─┐
//! progress (derived views) ├── all speak gatecrash-protocol
//! session  (coordinator)  ─┘
//! ```
//!
//! The protocol layer has no opinion about concurrency, storage, or
//! transport — it is plain data.

mod codec;
mod error;
mod event;
mod model;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use event::{Event, EventKind};
pub use model::{
    Door, GameMode, LeaderboardEntry, Player, PlayerPath, Response, ScoreBreakdown, Session,
    SessionStatus,
};
pub use types::{DoorId, PlayerId, ResponseId, SessionId};
