//! Seam between the dispatch layer and the wire transport.
//!
//! The transport owns the sockets, sessions, framing, and worker threads; the
//! dispatch layer only ever sees it through [`ShellTransport`]. Responses are
//! built in transport-allocated buffers so the transport can account for (and
//! refuse) response memory under pressure.

use spindle_protocol::{Code, ConnId};

/// Response-side operations the transport offers the dispatch layer.
///
/// Implementations must be callable from any thread: completions invoke these
/// methods from engine threads, not from the thread that delivered the
/// request.
pub trait ShellTransport: Send + Sync {
    /// Allocates a zero-filled response buffer of exactly `len` bytes.
    ///
    /// Returns `None` when the transport refuses the allocation; callers
    /// respond with [`Code::OUT_OF_MEMORY`] or drop the completion, never
    /// panic.
    fn alloc_response(&self, len: usize) -> Option<Vec<u8>>;

    /// Sends a response on a client session.
    ///
    /// `status` is the transport-level result code; `payload` may be empty.
    /// The connection reference is only carried through; the transport owns
    /// its lifetime and silently drops responses for sessions that have
    /// disappeared.
    fn send_response(&self, conn: ConnId, status: Code, payload: Vec<u8>);
}
