//! Result codes shared by the shell protocol and the execution engines.
//!
//! Codes form a single `i32` space. The constants below are the ones the
//! dispatch layer produces or inspects itself; engines may return any other
//! value, which the shell passes through to the client verbatim.

use std::fmt;

/// A shell-protocol result code.
///
/// Wraps a raw `i32` rather than enumerating every value because engine
/// failure codes are forwarded without interpretation. Only the named
/// constants are meaningful to the dispatch layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(i32);

impl Code {
    /// The request completed successfully.
    pub const SUCCESS: Self = Self(0);
    /// Response buffer allocation failed on the node.
    pub const OUT_OF_MEMORY: Self = Self(1);
    /// The node is not currently serving requests.
    pub const NOT_READY: Self = Self(2);
    /// The query handle is unknown, already released, or malformed.
    pub const INVALID_QHANDLE: Self = Self(3);
    /// The node's handle table is full; no new query handle can be issued.
    pub const OUT_OF_QHANDLES: Self = Self(4);
    /// The vnode exists but is not accepting writes on this node.
    pub const NOT_ACTIVE_VNODE: Self = Self(10);
    /// The vnode id does not exist on this node.
    pub const INVALID_VNODE_ID: Self = Self(11);
    /// The table id does not exist within the vnode.
    pub const INVALID_TABLE_ID: Self = Self(12);
    /// The table exists but is not active in the vnode.
    pub const NOT_ACTIVE_TABLE: Self = Self(13);

    /// Wraps a raw code received from an engine or the wire.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw `i32` value.
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Whether this code reports success.
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Whether a failed write block with this code indicates stale vnode
    /// routing metadata, repairable by a vnode configuration refresh.
    pub fn is_stale_vnode(self) -> bool {
        self == Self::NOT_ACTIVE_VNODE || self == Self::INVALID_VNODE_ID
    }

    /// Whether a failed write block with this code indicates stale table
    /// schema metadata, repairable by a table configuration refresh.
    pub fn is_stale_table(self) -> bool {
        self == Self::INVALID_TABLE_ID || self == Self::NOT_ACTIVE_TABLE
    }
}

impl Default for Code {
    /// Defaults to [`Code::SUCCESS`].
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::SUCCESS => "SUCCESS",
            Self::OUT_OF_MEMORY => "OUT_OF_MEMORY",
            Self::NOT_READY => "NOT_READY",
            Self::INVALID_QHANDLE => "INVALID_QHANDLE",
            Self::OUT_OF_QHANDLES => "OUT_OF_QHANDLES",
            Self::NOT_ACTIVE_VNODE => "NOT_ACTIVE_VNODE",
            Self::INVALID_VNODE_ID => "INVALID_VNODE_ID",
            Self::INVALID_TABLE_ID => "INVALID_TABLE_ID",
            Self::NOT_ACTIVE_TABLE => "NOT_ACTIVE_TABLE",
            Self(other) => return write!(f, "Code({other})"),
        };
        f.write_str(name)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
