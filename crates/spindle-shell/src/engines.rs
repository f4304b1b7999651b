//! Seams between the dispatch layer and the node's execution collaborators.
//!
//! Query and write execution is asynchronous: the dispatch layer hands the
//! engine a request plus a boxed completion continuation and returns
//! immediately. The engine runs the work on its own thread pool and invokes
//! the continuation on a thread of its choosing. Continuations are `Send`,
//! capture everything they need, and assume no thread-local request context.

use spindle_protocol::Code;
use spindle_protocol::wire::SubmitOutcome;

/// Node run states as reported by the management layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// The node is still starting up.
    Starting,
    /// The node is serving requests.
    Running,
    /// The node is shutting down.
    Stopping,
    /// The node has stopped.
    Stopped,
}

/// Source of the node's current run state.
pub trait RunStateSource: Send + Sync {
    /// Returns the node's current run state.
    fn run_state(&self) -> RunState;
}

/// Engine-owned reference to an executing or executed query's result set.
///
/// The dispatch layer stores and forwards the value; only
/// [`QueryEngine::release`] ends its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(pub u64);

/// Continuation for a completed query submission.
///
/// Receives the engine's result code and, when the query was admitted, the
/// engine handle for retrieving its results.
pub type QueryCompletion = Box<dyn FnOnce(Code, Option<EngineHandle>) + Send>;

/// Continuation for a completed retrieve call.
pub type RetrieveCompletion = Box<dyn FnOnce(Code) + Send>;

/// Continuation for a completed batch write.
pub type SubmitCompletion = Box<dyn FnOnce(SubmitOutcome) + Send>;

/// The query execution engine.
pub trait QueryEngine: Send + Sync {
    /// Starts executing a query described by the opaque `descriptor` bytes.
    ///
    /// Returns immediately; `done` runs on an engine thread once execution
    /// has been admitted or rejected.
    fn submit_query(&self, descriptor: Vec<u8>, done: QueryCompletion);

    /// Starts fetching the result set behind `handle`.
    fn retrieve(&self, handle: EngineHandle, done: RetrieveCompletion);

    /// Size in bytes of the serialized result set, response header included.
    ///
    /// Always at least the retrieve header length.
    fn result_size(&self, handle: EngineHandle) -> usize;

    /// Serializes the result set into `out`, header fields in native byte
    /// order, and reports whether serialization succeeded.
    ///
    /// On failure the buffer may be partially filled; the caller decides
    /// what to do with it.
    fn serialize_result(&self, handle: EngineHandle, out: &mut [u8]) -> Code;

    /// Releases the engine-side resources behind `handle`.
    ///
    /// The dispatch layer calls this exactly once per issued handle.
    fn release(&self, handle: EngineHandle);
}

/// The write/storage engine.
pub trait WriteEngine: Send + Sync {
    /// Starts executing a batch write described by the opaque `batch` bytes.
    ///
    /// Returns immediately; `done` receives the per-batch outcome on an
    /// engine thread.
    fn submit_write(&self, batch: Vec<u8>, done: SubmitCompletion);
}

/// Client of the cluster metadata layer.
///
/// Both refresh calls are fire-and-forget: the dispatch layer never consumes
/// a result, it only nudges the node into re-synchronizing a cache it has
/// just observed to be stale.
pub trait MetaClient: Send + Sync {
    /// Requests a refresh of the routing configuration for one vnode.
    fn refresh_vnode_config(&self, vnode_id: i32);

    /// Requests a refresh of the schema configuration for one table.
    fn refresh_table_config(&self, vnode_id: i32, table_id: i32);
}

/// Read-only view of the HTTP subsystem's request accounting.
pub trait HttpStats: Send + Sync {
    /// Cumulative HTTP request count since node start; never reset here.
    fn request_count(&self) -> u64;
}
