//! The submit request path, its completion, and the staleness repair hook.

use std::sync::Arc;

use tracing::{trace, warn};

use spindle_protocol::{Code, ConnId};
use spindle_protocol::wire::SubmitOutcome;

use crate::shell::ShellCore;

use super::router::DISPATCH_TARGET;

/// Dispatches a batch write to the engine; the payload is an opaque batch
/// the engine alone interprets.
pub(crate) fn handle(core: &Arc<ShellCore>, batch: Vec<u8>, conn: ConnId) {
    core.counters.record_submit();
    trace!(target: DISPATCH_TARGET, conn = conn.0, "submit dispatched");

    let completion_core = Arc::clone(core);
    core.write_engine.submit_write(
        batch,
        Box::new(move |outcome| {
            complete(&completion_core, &outcome, conn);
        }),
    );
}

/// Builds and sends the submit response. Runs on an engine thread.
fn complete(core: &Arc<ShellCore>, outcome: &SubmitOutcome, conn: ConnId) {
    if !outcome.code.is_success() {
        trace!(
            target: DISPATCH_TARGET,
            conn = conn.0,
            code = outcome.code.as_i32(),
            "submit failed in engine"
        );
        core.transport
            .send_response(conn, outcome.code, Vec::new());
        return;
    }

    let len = outcome.wire_len();
    let Some(mut buf) = core.transport.alloc_response(len) else {
        warn!(
            target: DISPATCH_TARGET,
            conn = conn.0,
            len,
            "submit buffer allocation failed"
        );
        core.transport
            .send_response(conn, Code::OUT_OF_MEMORY, Vec::new());
        return;
    };

    repair_stale_metadata(core, outcome);

    if let Err(error) = outcome.encode_into(&mut buf) {
        warn!(target: DISPATCH_TARGET, conn = conn.0, %error, "submit response dropped");
        return;
    }

    trace!(
        target: DISPATCH_TARGET,
        conn = conn.0,
        rows_affected = outcome.rows_affected,
        failed_blocks = outcome.blocks.len(),
        "submit completed"
    );
    core.transport.send_response(conn, Code::SUCCESS, buf);
}

/// Fires one metadata refresh per failed block whose code reports stale
/// routing or schema metadata.
///
/// This is the node's self-healing path: the failing write is still reported
/// as failed, but the node re-synchronizes the stale cache so the client's
/// retry can succeed without out-of-band detection. The calls are
/// fire-and-forget and happen before the outcome is converted to wire order.
fn repair_stale_metadata(core: &Arc<ShellCore>, outcome: &SubmitOutcome) {
    for block in &outcome.blocks {
        if block.code.is_stale_vnode() {
            trace!(
                target: DISPATCH_TARGET,
                vnode_id = block.vnode_id,
                code = block.code.as_i32(),
                "requesting vnode config refresh"
            );
            core.meta.refresh_vnode_config(block.vnode_id);
        } else if block.code.is_stale_table() {
            trace!(
                target: DISPATCH_TARGET,
                vnode_id = block.vnode_id,
                table_id = block.table_id,
                code = block.code.as_i32(),
                "requesting table config refresh"
            );
            core.meta.refresh_table_config(block.vnode_id, block.table_id);
        }
    }
}
