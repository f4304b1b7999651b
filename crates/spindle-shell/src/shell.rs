//! Shell construction, entry points, and lifecycle.
//!
//! A [`Shell`] is created at node start with its collaborators injected,
//! shared with the transport's worker threads, and shut down when the node
//! stops. There is no process-wide state: counters and the handle table live
//! inside the shell value and end with it.

use std::sync::Arc;

use tracing::{debug, info};

use spindle_protocol::InboundMessage;

use crate::config::ShellConfig;
use crate::dispatch;
use crate::engines::{HttpStats, MetaClient, QueryEngine, RunState, RunStateSource, WriteEngine};
use crate::handles::HandleTable;
use crate::stats::{RequestCounters, StatsSnapshot};
use crate::transport::ShellTransport;

/// Tracing target for lifecycle events.
const SHELL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shell");

/// The node services the dispatch layer talks to.
///
/// Everything is a shared trait object so tests can substitute capturing
/// fakes, and so completions can carry their dependencies onto whichever
/// thread an engine runs them on.
pub struct Collaborators {
    /// Source of the node's run state.
    pub run_state: Arc<dyn RunStateSource>,
    /// Query execution engine.
    pub query_engine: Arc<dyn QueryEngine>,
    /// Write/storage engine.
    pub write_engine: Arc<dyn WriteEngine>,
    /// Cluster metadata client for staleness repair.
    pub meta: Arc<dyn MetaClient>,
    /// HTTP subsystem statistics.
    pub http_stats: Arc<dyn HttpStats>,
    /// Wire transport.
    pub transport: Arc<dyn ShellTransport>,
}

/// Shared state behind a [`Shell`] and its in-flight completions.
pub(crate) struct ShellCore {
    pub(crate) run_state: Arc<dyn RunStateSource>,
    pub(crate) query_engine: Arc<dyn QueryEngine>,
    pub(crate) write_engine: Arc<dyn WriteEngine>,
    pub(crate) meta: Arc<dyn MetaClient>,
    pub(crate) http_stats: Arc<dyn HttpStats>,
    pub(crate) transport: Arc<dyn ShellTransport>,
    pub(crate) counters: RequestCounters,
    pub(crate) handles: HandleTable,
}

/// The client-facing request-dispatch layer of a data node.
///
/// Cheap to clone; all clones share one core. Every method is reentrant and
/// safe to call concurrently from transport worker threads.
#[derive(Clone)]
pub struct Shell {
    core: Arc<ShellCore>,
}

impl Shell {
    /// Wires up the dispatch layer.
    pub fn new(config: &ShellConfig, collaborators: Collaborators) -> Self {
        let core = Arc::new(ShellCore {
            run_state: collaborators.run_state,
            query_engine: collaborators.query_engine,
            write_engine: collaborators.write_engine,
            meta: collaborators.meta,
            http_stats: collaborators.http_stats,
            transport: collaborators.transport,
            counters: RequestCounters::default(),
            handles: HandleTable::new(config.handle_capacity),
        });
        info!(
            target: SHELL_TARGET,
            handle_capacity = config.handle_capacity,
            "shell dispatch layer ready"
        );
        Self { core }
    }

    /// Entry point for every inbound client message.
    ///
    /// Called by the transport from any of its worker threads. Never blocks
    /// on engine work and never panics on malformed input: each message ends
    /// in a response, a logged drop, or a handle release.
    pub fn handle_message(&self, msg: InboundMessage) {
        dispatch::admit(&self.core, msg);
    }

    /// Returns the request-volume statistics accumulated since the previous
    /// snapshot, resetting the query and submit counters.
    ///
    /// When the node is not running the reading is all zeros and nothing is
    /// reset. The HTTP count is cumulative and never reset here.
    pub fn stats(&self) -> StatsSnapshot {
        if self.core.run_state.run_state() != RunState::Running {
            return StatsSnapshot::default();
        }
        let (query_requests, submit_requests) = self.core.counters.take();
        StatsSnapshot {
            query_requests,
            submit_requests,
            http_requests: self.core.http_stats.request_count(),
        }
    }

    /// Releases every still-issued query handle through the engine.
    ///
    /// Called once when the node stops serving; clients with outstanding
    /// handles lose them, exactly as if each had sent a release signal.
    pub fn shutdown(&self) {
        let engines = self.core.handles.drain();
        let released = engines.len();
        for engine in engines {
            self.core.query_engine.release(engine);
        }
        debug!(target: SHELL_TARGET, released, "outstanding query handles released");
        info!(target: SHELL_TARGET, "shell dispatch layer stopped");
    }
}
