//! The query request path and its completion.

use std::sync::Arc;

use tracing::{trace, warn};

use spindle_protocol::{Code, ConnId};
use spindle_protocol::wire::{QUERY_RSP_LEN, QueryHandle, QueryRsp};

use crate::engines::EngineHandle;
use crate::shell::ShellCore;

use super::router::DISPATCH_TARGET;

/// Dispatches a query to the engine; the payload is an opaque descriptor
/// the engine alone interprets.
pub(crate) fn handle(core: &Arc<ShellCore>, descriptor: Vec<u8>, conn: ConnId) {
    core.counters.record_query();
    trace!(target: DISPATCH_TARGET, conn = conn.0, "query dispatched");

    let completion_core = Arc::clone(core);
    core.query_engine.submit_query(
        descriptor,
        Box::new(move |code, engine_handle| {
            complete(&completion_core, code, engine_handle, conn);
        }),
    );
}

/// Builds and sends the query response. Runs on an engine thread.
///
/// The response always travels at transport status `SUCCESS`: the embedded
/// engine code, not the transport status, carries the query's outcome.
fn complete(
    core: &Arc<ShellCore>,
    code: Code,
    engine_handle: Option<EngineHandle>,
    conn: ConnId,
) {
    let (code, handle) = match engine_handle {
        None => (code, QueryHandle::NULL),
        Some(engine) => match core.handles.issue(conn, engine) {
            Ok(handle) => (code, handle),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    conn = conn.0,
                    %error,
                    "query handle not issued, releasing engine handle"
                );
                core.query_engine.release(engine);
                (Code::OUT_OF_QHANDLES, QueryHandle::NULL)
            }
        },
    };

    let Some(mut buf) = core.transport.alloc_response(QUERY_RSP_LEN) else {
        warn!(
            target: DISPATCH_TARGET,
            conn = conn.0,
            "query response dropped, buffer allocation failed"
        );
        return;
    };
    let rsp = QueryRsp { code, handle };
    if let Err(error) = rsp.encode_into(&mut buf) {
        warn!(target: DISPATCH_TARGET, conn = conn.0, %error, "query response dropped");
        return;
    }

    trace!(
        target: DISPATCH_TARGET,
        conn = conn.0,
        code = code.as_i32(),
        handle = handle.0,
        "query completed"
    );
    core.transport.send_response(conn, Code::SUCCESS, buf);
}
