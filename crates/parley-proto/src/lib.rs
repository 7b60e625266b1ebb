//! Parley protocol
//!
//! Typed event contract between the chat client and the messaging server,
//! and the wire codec that carries it.
//!
//! # Layers
//!
//! - [`OutboundEvent`] / [`InboundEvent`]: the named events with their payload
//!   shapes. Payloads are asymmetric (`typing` is a bare boolean outbound but
//!   a `{username, isTyping}` object inbound), so each direction has its own
//!   enum.
//! - [`EnginePacket`] / [`SocketPacket`]: Engine.IO v4 and Socket.IO v4 text
//!   packets. Events travel as `42["name",payload]` inside Engine.IO message
//!   packets.
//!
//! Decoding never panics: every malformed input maps to a [`ProtocolError`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod event;
mod packet;

pub use errors::{ProtocolError, Result};
pub use event::{HistoryEntry, InboundEvent, OutboundEvent, TypingSignal, names};
pub use packet::{EnginePacket, Handshake, SocketPacket};
