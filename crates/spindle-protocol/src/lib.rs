//! Shared types for the Spindle shell protocol.
//!
//! The shell protocol is the client-facing request/response protocol spoken
//! by a Spindle data node: queries, result retrieval, and batch submits. This
//! crate defines the pieces both sides of the wire agree on (message kinds,
//! the result-code space, and the fixed binary response records together with
//! their byte-order conversion) so the dispatch layer, the transport, and
//! test harnesses all encode and decode the same bytes.
//!
//! Multi-byte numeric fields travel big-endian on the wire, with one
//! deliberate exception: the query-handle field is transmitted in native
//! byte order. See [`wire`] for the details of that quirk.

mod message;
mod status;
pub mod wire;

pub use message::{ConnId, InboundMessage, MsgKind};
pub use status::Code;
