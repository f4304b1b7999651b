//! Admission, routing, and the three request paths.
//!
//! Every inbound message passes the admission gate first: the empty payload
//! is the client's resource-release signal (no response), and a node that is
//! not running answers `NOT_READY` without routing. Admitted messages are
//! routed strictly by their declared kind to the query, retrieve, or submit
//! path; unrecognised kinds are logged and dropped without a response, a
//! long-standing protocol gap kept for client compatibility.
//!
//! Each path issues its engine call and returns; the rest of the work
//! happens in a completion continuation that the engine runs on a thread of
//! its own choosing. Completions build the fixed binary response records and
//! hand them to the transport. The submit completion additionally fires the
//! metadata-refresh repair side effects for stale-routing block failures
//! before converting the response to wire order.

mod errors;
mod gate;
mod query;
mod retrieve;
mod router;
mod submit;

pub use errors::DispatchError;
pub(crate) use gate::admit;
