//! Compute-once caches for values derived lazily from an owner.
//!
//! A [`Memoized`] pairs an optional cached value with the function that
//! computes it from a context. Concurrent first access runs the function
//! exactly once and every caller sees the same value. A failed computation
//! leaves the cache empty. Invalidation needs `&mut self`, so it cannot
//! race with readers.

use once_cell::sync::OnceCell;
use std::fmt;

pub struct Memoized<C: ?Sized, T, E> {
    cell: OnceCell<T>,
    compute: fn(&C) -> Result<T, E>,
}

/// A memoized flag.
pub type MemoizedBool<C, E> = Memoized<C, bool, E>;

impl<C: ?Sized, T, E> Memoized<C, T, E> {
    pub fn new(compute: fn(&C) -> Result<T, E>) -> Self {
        Self {
            cell: OnceCell::new(),
            compute,
        }
    }

    /// The cached value, computing it from `ctx` on first use.
    pub fn get(&self, ctx: &C) -> Result<&T, E> {
        self.get_tracked(ctx).map(|(value, _)| value)
    }

    /// Like [`Memoized::get`], also reporting whether this call computed the value.
    pub fn get_tracked(&self, ctx: &C) -> Result<(&T, bool), E> {
        let mut computed = false;
        let value = self.cell.get_or_try_init(|| {
            computed = true;
            (self.compute)(ctx)
        })?;
        Ok((value, computed))
    }

    /// The cached value without computing it.
    pub fn peek(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_computed(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Drop the cached value; the next access recomputes it.
    pub fn invalidate(&mut self) {
        self.cell.take();
    }
}

impl<C: ?Sized, T: fmt::Debug, E> fmt::Debug for Memoized<C, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Memoized").field(value).finish(),
            None => f.write_str("Memoized(<pending>)"),
        }
    }
}
