//! Strict routing by declared message kind.

use std::sync::Arc;

use tracing::warn;

use spindle_protocol::{InboundMessage, MsgKind};

use crate::shell::ShellCore;

use super::{query, retrieve, submit};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes an admitted message to its request path.
///
/// Kinds outside the enumerated set are logged and dropped without a
/// response. Clients time such requests out; answering them with an error
/// would itself be a protocol change, so the gap stays until the protocol
/// grows a version field.
pub(crate) fn route(core: &Arc<ShellCore>, msg: InboundMessage) {
    match MsgKind::from_wire(msg.kind_tag) {
        Some(MsgKind::Query) => query::handle(core, msg.payload, msg.conn),
        Some(MsgKind::Retrieve) => retrieve::handle(core, msg.payload, msg.conn),
        Some(MsgKind::Submit) => submit::handle(core, msg.payload, msg.conn),
        None => {
            warn!(
                target: DISPATCH_TARGET,
                conn = msg.conn.0,
                tag = msg.kind_tag,
                "unknown message kind dropped without response"
            );
        }
    }
}
