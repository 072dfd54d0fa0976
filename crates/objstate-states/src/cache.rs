//! Per-tick memoization for cacheable states.
//!
//! A [`CachedValue`] is computed lazily on first read and then served from
//! the cell until [`CachedValue::invalidate`] is called. Reads only need
//! `&self`, so any number of dependents can read a cached dependency during
//! a tick; invalidation needs `&mut self` and happens in the scheduler's
//! single invalidation pass.

use std::cell::{Cell, OnceCell};

/// A lazily computed value that stays valid until invalidated.
#[derive(Debug)]
pub struct CachedValue<T> {
    cell: OnceCell<T>,
    computations: Cell<u64>,
}

impl<T> CachedValue<T> {
    /// An empty (invalid) cache.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            computations: Cell::new(0),
        }
    }

    /// Return the memoized value, computing it first if the cache is invalid.
    ///
    /// A failed computation leaves the cache invalid, so the next read
    /// retries.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `compute`.
    pub fn get_or_compute<E>(&self, compute: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }
        let value = compute()?;
        self.computations.set(self.computations.get().saturating_add(1));
        Ok(self.cell.get_or_init(|| value))
    }

    /// Drop the memoized value.
    pub fn invalidate(&mut self) {
        self.cell.take();
    }

    /// Whether a memoized value is present.
    pub fn is_valid(&self) -> bool {
        self.cell.get().is_some()
    }

    /// How many times the value has been computed since creation.
    pub fn computations(&self) -> u64 {
        self.computations.get()
    }
}

impl<T> Default for CachedValue<T> {
    fn default() -> Self {
        Self::new()
    }
}
