//! The retrieve request path and its completion.

use std::sync::Arc;

use tracing::{trace, warn};

use spindle_protocol::{Code, ConnId};
use spindle_protocol::wire::{self, QueryHandle, RetrieveHeader};

use crate::engines::EngineHandle;
use crate::shell::ShellCore;

use super::errors::DispatchError;
use super::router::DISPATCH_TARGET;

/// Dispatches a retrieve against a previously issued query handle.
pub(crate) fn handle(core: &Arc<ShellCore>, payload: Vec<u8>, conn: ConnId) {
    let (handle, engine_handle) = match lookup(core, &payload) {
        Ok(resolved) => resolved,
        Err(error) => {
            warn!(target: DISPATCH_TARGET, conn = conn.0, %error, "retrieve rejected");
            core.transport
                .send_response(conn, error.status(), Vec::new());
            return;
        }
    };
    trace!(target: DISPATCH_TARGET, conn = conn.0, handle = handle.0, "retrieve dispatched");

    let completion_core = Arc::clone(core);
    core.query_engine.retrieve(
        engine_handle,
        Box::new(move |code| {
            complete(&completion_core, code, engine_handle, handle, conn);
        }),
    );
}

/// Reads the echoed wire handle out of the payload and resolves it.
fn lookup(
    core: &Arc<ShellCore>,
    payload: &[u8],
) -> Result<(QueryHandle, EngineHandle), DispatchError> {
    let handle = wire::decode_retrieve_request(payload)?;
    let engine_handle = core.handles.resolve(handle)?;
    Ok((handle, engine_handle))
}

/// Serializes and sends the result set. Runs on an engine thread.
fn complete(
    core: &Arc<ShellCore>,
    code: Code,
    engine_handle: EngineHandle,
    handle: QueryHandle,
    conn: ConnId,
) {
    if !code.is_success() {
        trace!(target: DISPATCH_TARGET, conn = conn.0, %code, "retrieve failed in engine");
        core.transport.send_response(conn, code, Vec::new());
        return;
    }

    let len = core.query_engine.result_size(engine_handle);
    let Some(mut buf) = core.transport.alloc_response(len) else {
        warn!(
            target: DISPATCH_TARGET,
            conn = conn.0,
            len,
            "retrieve buffer allocation failed"
        );
        core.transport
            .send_response(conn, Code::OUT_OF_MEMORY, Vec::new());
        return;
    };

    let serialize_code = core.query_engine.serialize_result(engine_handle, &mut buf);
    if !serialize_code.is_success() {
        // Deliberately no early return: the buffer is converted and sent
        // exactly as on success, partially filled or not. Long-standing
        // protocol behaviour; changing it is a protocol revision, not a
        // bug fix.
        warn!(
            target: DISPATCH_TARGET,
            conn = conn.0,
            code = serialize_code.as_i32(),
            "result serialization failed, sending buffer as-is"
        );
    }

    if let Err(error) = RetrieveHeader::to_wire_in_place(&mut buf) {
        warn!(
            target: DISPATCH_TARGET,
            conn = conn.0,
            %error,
            "retrieve response dropped, result buffer shorter than header"
        );
        return;
    }

    trace!(target: DISPATCH_TARGET, conn = conn.0, len, "retrieve completed");
    core.transport.send_response(conn, Code::SUCCESS, buf);
    retire(core, handle);
}

/// A retrieve that ran to completion releases the handle: table slot first,
/// then the engine-side resources, exactly once.
fn retire(core: &Arc<ShellCore>, handle: QueryHandle) {
    match core.handles.release(handle) {
        Ok(engine) => core.query_engine.release(engine),
        // The client's release signal can race this completion; the table
        // arbitrates and the loser backs off here.
        Err(error) => {
            trace!(target: DISPATCH_TARGET, handle = handle.0, %error, "handle already released");
        }
    }
}
