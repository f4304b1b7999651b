//! Inbound message kinds and the transport envelope.
//!
//! The transport hands every inbound client event to the dispatch layer as an
//! [`InboundMessage`]. The declared kind tag is parsed with [`MsgKind::from_wire`];
//! tags outside the enumerated set are not a parse error at this level, the
//! router decides what to do with them.

use crate::status::Code;

/// Request kinds the shell protocol enumerates.
///
/// The wire tags are part of the protocol and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgKind {
    /// Issue a query; the response carries a query handle.
    Query = 1,
    /// Fetch the result set of a previously issued query handle.
    Retrieve = 2,
    /// Submit a batch write.
    Submit = 3,
}

impl MsgKind {
    /// Parses a wire tag, returning `None` for tags outside the enumerated set.
    pub const fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Query),
            2 => Some(Self::Retrieve),
            3 => Some(Self::Submit),
            _ => None,
        }
    }

    /// The wire tag for this kind.
    pub const fn as_wire(self) -> u8 {
        self as u8
    }

    /// Canonical lower-case name, used in log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Retrieve => "retrieve",
            Self::Submit => "submit",
        }
    }
}

/// Opaque identifier for a client session, owned by the transport.
///
/// The dispatch layer never interprets or manages the lifetime of a
/// connection; it only carries the identifier through to the response send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(pub u64);

/// One inbound client event as delivered by the transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Declared request kind tag, unvalidated.
    pub kind_tag: u8,
    /// Request payload; empty for the resource-release signal.
    pub payload: Vec<u8>,
    /// Originating client session.
    pub conn: ConnId,
    /// Transport-level status accompanying the event.
    pub transport_code: Code,
}

impl InboundMessage {
    /// Builds a message with a successful transport status.
    pub fn new(kind_tag: u8, payload: Vec<u8>, conn: ConnId) -> Self {
        Self {
            kind_tag,
            payload,
            conn,
            transport_code: Code::SUCCESS,
        }
    }

    /// Whether this message is the empty-payload resource-release signal.
    pub fn is_release_signal(&self) -> bool {
        self.payload.is_empty()
    }
}
