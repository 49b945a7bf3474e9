//! Buffer Table
//!
//! Maps sound identifiers to their decode status. Unlike the rest of
//! [`AudioState`](super::AudioState), a table is a shared mutable cell:
//! decode callbacks capture the table that existed when they were scheduled
//! and write their outcome straight into it.
//!
//! Aliasing rules:
//! - `Clone` aliases: both values see every later write.
//! - [`BufferTable::fork`] copies: the fork gets its own cell holding the
//!   same entries (decoded handles shared by reference). Decodes scheduled
//!   before the fork complete into the original only.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::engine::BufferHandle;

/// Decode status of one sound
#[derive(Debug, Clone)]
pub enum BufferStatus {
    /// Decode scheduled, not finished
    Pending,
    /// Payload or decode rejected
    Failed,
    /// Decoded and playable
    Ready(BufferHandle),
}

impl BufferStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, BufferStatus::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BufferStatus::Failed)
    }

    /// The decoded handle, if there is one
    pub fn handle(&self) -> Option<&BufferHandle> {
        match self {
            BufferStatus::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            BufferStatus::Pending => "pending",
            BufferStatus::Failed => "failed",
            BufferStatus::Ready(_) => "ready",
        }
    }
}

/// Ready entries compare by handle identity, not by sample content
impl PartialEq for BufferStatus {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BufferStatus::Pending, BufferStatus::Pending) => true,
            (BufferStatus::Failed, BufferStatus::Failed) => true,
            (BufferStatus::Ready(a), BufferStatus::Ready(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for BufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferStatus::Ready(buffer) => write!(
                f,
                "ready ({} ch, {} Hz, {:.3}s)",
                buffer.num_channels(),
                buffer.sample_rate(),
                buffer.duration_secs()
            ),
            other => f.write_str(other.label()),
        }
    }
}

/// Plain sound-id to status mapping
pub type BufferMap = HashMap<String, BufferStatus>;

/// Shared, mutable buffer table
#[derive(Debug, Clone, Default)]
pub struct BufferTable {
    cell: Rc<RefCell<BufferMap>>,
}

impl BufferTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new table holding a copy of `map`
    pub fn from_map(map: BufferMap) -> Self {
        Self {
            cell: Rc::new(RefCell::new(map)),
        }
    }

    /// A reference-distinct copy of this table
    pub fn fork(&self) -> Self {
        Self::from_map(self.snapshot())
    }

    /// Copy the current entries out
    pub fn snapshot(&self) -> BufferMap {
        self.cell.borrow().clone()
    }

    pub fn get(&self, id: &str) -> Option<BufferStatus> {
        self.cell.borrow().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cell.borrow().contains_key(id)
    }

    /// Write a status, visible through every alias of this table
    pub fn set(&self, id: impl Into<String>, status: BufferStatus) {
        self.cell.borrow_mut().insert(id.into(), status);
    }

    pub fn remove(&self, id: &str) -> Option<BufferStatus> {
        self.cell.borrow_mut().remove(id)
    }

    pub fn len(&self) -> usize {
        self.cell.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell.borrow().is_empty()
    }

    /// Sound identifiers, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cell.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Check whether two tables are the same cell
    pub fn is_same(&self, other: &BufferTable) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}
