//! Monotonic id allocation.
//!
//! Each `Scene` owns one allocator for object ids and each `Object` owns one
//! per part map. Values are handed out in increasing order and are never
//! reused for the lifetime of the owner, even after the part is deleted.

#[cfg(test)]
#[path = "ids_test.rs"]
mod ids_test;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Allocator whose first `allocate()` returns `first`.
    #[must_use]
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    pub fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }

    /// The value the next `allocate()` will return.
    #[must_use]
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Record an id that was assigned externally (snapshot load) so it is never handed out.
    pub fn observe(&mut self, used: u32) {
        if used >= self.next {
            self.next = used.saturating_add(1);
        }
    }
}
