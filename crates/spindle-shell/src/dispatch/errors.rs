//! Error types for request-path rejections.

use thiserror::Error;

use spindle_protocol::Code;
use spindle_protocol::wire::WireError;

use crate::handles::HandleError;

/// Reasons a request is rejected before it reaches an engine.
///
/// Rejections are terminal for the request: the gate or handler logs the
/// error and answers the client with [`DispatchError::status`]. Nothing at
/// this layer is process-fatal.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The retrieve payload does not contain a readable query handle.
    #[error("unreadable retrieve payload: {0}")]
    RetrievePayload(#[from] WireError),

    /// The query handle failed table resolution.
    #[error(transparent)]
    Handle(#[from] HandleError),
}

impl DispatchError {
    /// The transport status reported to the client for this rejection.
    pub fn status(&self) -> Code {
        match self {
            Self::RetrievePayload(_) | Self::Handle(_) => Code::INVALID_QHANDLE,
        }
    }
}
