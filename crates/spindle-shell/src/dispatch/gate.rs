//! Admission gate in front of the router.

use std::sync::Arc;

use tracing::{debug, trace};

use spindle_protocol::{Code, ConnId, InboundMessage};

use crate::engines::RunState;
use crate::shell::ShellCore;

use super::router;
use super::router::DISPATCH_TARGET;

/// Admits one inbound message or disposes of it.
///
/// Order matters: the release signal is honoured in every run state, so a
/// stopping node still frees engine resources for disconnecting clients.
pub(crate) fn admit(core: &Arc<ShellCore>, msg: InboundMessage) {
    if msg.is_release_signal() {
        release_connection(core, msg.conn);
        return;
    }

    let state = core.run_state.run_state();
    if state != RunState::Running {
        debug!(
            target: DISPATCH_TARGET,
            conn = msg.conn.0,
            ?state,
            "request refused, node not running"
        );
        core.transport
            .send_response(msg.conn, Code::NOT_READY, Vec::new());
        return;
    }

    trace!(
        target: DISPATCH_TARGET,
        conn = msg.conn.0,
        tag = msg.kind_tag,
        transport_code = msg.transport_code.as_i32(),
        payload_len = msg.payload.len(),
        "message received"
    );
    router::route(core, msg);
}

/// Handles the empty-payload release signal: frees the query handle
/// associated with the connection. Silent when none exists; no response is
/// sent either way.
fn release_connection(core: &Arc<ShellCore>, conn: ConnId) {
    match core.handles.release_conn(conn) {
        Some(engine) => {
            core.query_engine.release(engine);
            trace!(target: DISPATCH_TARGET, conn = conn.0, "query handle released on signal");
        }
        None => {
            trace!(target: DISPATCH_TARGET, conn = conn.0, "release signal without handle");
        }
    }
}
