//! Request-dispatch layer for a Spindle data node.
//!
//! This crate sits between the wire transport and the execution engines of a
//! data node. The transport delivers inbound client messages, concurrently
//! and from multiple worker threads, to [`Shell::handle_message`], which admits
//! or rejects them based on node readiness, routes them by declared kind, and
//! invokes the matching engine asynchronously. Engine completions run as
//! continuations on whichever thread the engine chooses; they marshal the
//! result into the fixed binary shell-protocol records and hand the response
//! back to the transport.
//!
//! The layer owns two pieces of state and nothing else: the request counters
//! reported through [`Shell::stats`], and the query-handle table that maps
//! wire-visible handles to engine-owned ones with explicit issue/release
//! tracking. Everything the layer talks to (run-state, query engine, write
//! engine, metadata client, transport, HTTP statistics) is a trait seam
//! injected at construction, so the whole dispatch surface is testable with
//! capturing fakes.
//!
//! Write failures caused by stale routing or schema metadata additionally
//! trigger a fire-and-forget refresh through the metadata client: the node
//! re-synchronizes its own caches so the client's retry can succeed, while
//! the failing write is still reported as failed.

mod config;
mod dispatch;
mod engines;
mod handles;
mod shell;
mod stats;
pub mod telemetry;
mod transport;

pub use config::{LogFormat, ShellConfig};
pub use dispatch::DispatchError;
pub use engines::{
    EngineHandle, HttpStats, MetaClient, QueryCompletion, QueryEngine, RetrieveCompletion,
    RunState, RunStateSource, SubmitCompletion, WriteEngine,
};
pub use handles::HandleError;
pub use shell::{Collaborators, Shell};
pub use stats::StatsSnapshot;
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ShellTransport;

#[cfg(test)]
mod tests;
