//! Generation-tagged table of issued query handles.
//!
//! The wire-visible [`QueryHandle`] is not the engine's handle: it is a slot
//! index tagged with the slot's generation, `(generation << 32) | index`.
//! Releasing a slot bumps its generation, so a handle that was released
//! (by a retrieve running to completion, by the client's release signal, or
//! by shutdown) stops resolving from that moment on. Double release and
//! use-after-release are explicit [`HandleError`]s instead of undefined
//! behaviour, which also makes the release-signal/completion race on a
//! shared handle benign: whichever side loses the race gets an error and
//! backs off.
//!
//! Generations start at one and skip zero when they wrap, so the null
//! handle never resolves.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use spindle_protocol::ConnId;
use spindle_protocol::wire::QueryHandle;

use crate::engines::EngineHandle;

/// Errors surfaced by handle-table operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandleError {
    /// The table already holds its configured maximum of issued handles.
    #[error("handle table full: {capacity} handles issued")]
    Exhausted {
        /// Configured table capacity.
        capacity: usize,
    },
    /// The handle does not name a slot this table ever issued.
    #[error("unknown query handle {handle:#x}")]
    Unknown {
        /// Raw wire handle value.
        handle: u64,
    },
    /// The handle named a live slot once, but it has since been released.
    #[error("query handle {handle:#x} is stale or already released")]
    Stale {
        /// Raw wire handle value.
        handle: u64,
    },
}

struct Issued {
    engine: EngineHandle,
    conn: ConnId,
}

struct Slot {
    generation: u32,
    occupant: Option<Issued>,
}

#[derive(Default)]
struct TableInner {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Latest handle issued per connection, for the release signal.
    by_conn: HashMap<ConnId, u32>,
}

/// Table of issued query handles, shared across dispatch threads.
pub(crate) struct HandleTable {
    capacity: usize,
    inner: Mutex<TableInner>,
}

impl HandleTable {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(TableInner::default()),
        }
    }

    /// Issues a wire handle for an engine handle owned by `conn`.
    ///
    /// The connection's release-signal association moves to the new handle;
    /// an earlier handle of the same connection stays resolvable until its
    /// own retrieve completes.
    pub(crate) fn issue(
        &self,
        conn: ConnId,
        engine: EngineHandle,
    ) -> Result<QueryHandle, HandleError> {
        let mut inner = self.lock();
        let index = match inner.free.pop() {
            Some(index) => index,
            None => {
                if inner.slots.len() >= self.capacity {
                    return Err(HandleError::Exhausted {
                        capacity: self.capacity,
                    });
                }
                let index = u32::try_from(inner.slots.len()).map_err(|_| {
                    HandleError::Exhausted {
                        capacity: self.capacity,
                    }
                })?;
                inner.slots.push(Slot {
                    generation: 1,
                    occupant: None,
                });
                index
            }
        };
        let generation = {
            let slot = &mut inner.slots[index as usize];
            slot.occupant = Some(Issued { engine, conn });
            slot.generation
        };
        inner.by_conn.insert(conn, index);
        Ok(compose(index, generation))
    }

    /// Resolves a wire handle to the engine handle behind it.
    pub(crate) fn resolve(&self, handle: QueryHandle) -> Result<EngineHandle, HandleError> {
        let inner = self.lock();
        let (index, generation) = split(handle);
        let slot = inner
            .slots
            .get(index as usize)
            .ok_or(HandleError::Unknown { handle: handle.0 })?;
        if slot.generation != generation {
            return Err(HandleError::Stale { handle: handle.0 });
        }
        slot.occupant
            .as_ref()
            .map(|issued| issued.engine)
            .ok_or(HandleError::Stale { handle: handle.0 })
    }

    /// Releases a wire handle, returning the engine handle that backed it.
    ///
    /// The slot's generation is bumped, so the released handle stops
    /// resolving immediately; a second release reports [`HandleError::Stale`].
    pub(crate) fn release(&self, handle: QueryHandle) -> Result<EngineHandle, HandleError> {
        let mut inner = self.lock();
        let (index, generation) = split(handle);
        let issued = {
            let slot = inner
                .slots
                .get_mut(index as usize)
                .ok_or(HandleError::Unknown { handle: handle.0 })?;
            if slot.generation != generation {
                return Err(HandleError::Stale { handle: handle.0 });
            }
            let issued = slot
                .occupant
                .take()
                .ok_or(HandleError::Stale { handle: handle.0 })?;
            slot.generation = next_generation(slot.generation);
            issued
        };
        inner.free.push(index);
        if inner.by_conn.get(&issued.conn) == Some(&index) {
            inner.by_conn.remove(&issued.conn);
        }
        Ok(issued.engine)
    }

    /// Releases the handle currently associated with `conn`, if any.
    pub(crate) fn release_conn(&self, conn: ConnId) -> Option<EngineHandle> {
        let mut inner = self.lock();
        let index = inner.by_conn.remove(&conn)?;
        let engine = {
            let slot = inner.slots.get_mut(index as usize)?;
            let issued = slot.occupant.take()?;
            slot.generation = next_generation(slot.generation);
            issued.engine
        };
        inner.free.push(index);
        Some(engine)
    }

    /// Releases every issued handle, returning the engine handles behind
    /// them. Used on shutdown.
    pub(crate) fn drain(&self) -> Vec<EngineHandle> {
        let mut inner = self.lock();
        inner.by_conn.clear();
        let mut engines = Vec::new();
        let mut freed = Vec::new();
        for (index, slot) in inner.slots.iter_mut().enumerate() {
            if let Some(issued) = slot.occupant.take() {
                slot.generation = next_generation(slot.generation);
                engines.push(issued.engine);
                freed.push(index as u32);
            }
        }
        inner.free.extend(freed);
        engines
    }

    /// Table operations never panic while holding the lock, so a poisoned
    /// mutex still guards consistent data and is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, TableInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn compose(index: u32, generation: u32) -> QueryHandle {
    QueryHandle((u64::from(generation) << 32) | u64::from(index))
}

fn split(handle: QueryHandle) -> (u32, u32) {
    ((handle.0 & u64::from(u32::MAX)) as u32, (handle.0 >> 32) as u32)
}

fn next_generation(generation: u32) -> u32 {
    let next = generation.wrapping_add(1);
    if next == 0 { 1 } else { next }
}
