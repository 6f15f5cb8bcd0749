// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Free-list pool for transient event objects.
//!
//! [`Pool::obtain`] returns a [`Pooled`] guard. The guard derefs to the
//! instance; dropping it resets the instance and pushes it back onto the free
//! list (up to the pool's capacity), so an event can never outlive the
//! dispatch that used it.
//!
//! ```
//! use understory_stage::event::Event;
//! use understory_stage::pool::Pool;
//!
//! let pool: Pool<Event> = Pool::new(4);
//! {
//!     let mut event = pool.obtain();
//!     event.cancel();
//! }
//! assert_eq!(pool.free_len(), 1);
//! assert!(!pool.obtain().is_cancelled());
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::ops::{Deref, DerefMut};

/// Types that can be recycled by a [`Pool`].
pub trait Poolable: Default {
    /// Return to the freshly-constructed state.
    fn reset(&mut self);
}

/// Pool of reusable instances.
pub struct Pool<T> {
    free: Rc<RefCell<Vec<T>>>,
    capacity: usize,
}

impl<T: Poolable> Pool<T> {
    /// Create a pool that retains at most `capacity` free instances.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Rc::new(RefCell::new(Vec::with_capacity(capacity))),
            capacity,
        }
    }

    /// Take a cleared instance, allocating only when the free list is empty.
    pub fn obtain(&self) -> Pooled<T> {
        let value = self.free.borrow_mut().pop().unwrap_or_default();
        Pooled {
            value,
            free: Rc::clone(&self.free),
            capacity: self.capacity,
        }
    }

    /// Number of instances waiting on the free list.
    pub fn free_len(&self) -> usize {
        self.free.borrow().len()
    }

    /// Maximum number of retained free instances.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("free", &self.free.try_borrow().map(|v| v.len()).ok())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// An instance on loan from a [`Pool`].
pub struct Pooled<T: Poolable> {
    value: T,
    free: Rc<RefCell<Vec<T>>>,
    capacity: usize,
}

impl<T: Poolable> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Poolable> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Poolable> Drop for Pooled<T> {
    fn drop(&mut self) {
        let mut value = core::mem::take(&mut self.value);
        value.reset();
        if let Ok(mut free) = self.free.try_borrow_mut()
            && free.len() < self.capacity
        {
            free.push(value);
        }
    }
}

impl<T: Poolable + fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug)]
    struct Scratch {
        dirty: bool,
    }

    impl Poolable for Scratch {
        fn reset(&mut self) {
            self.dirty = false;
        }
    }

    #[test]
    fn returned_instances_are_reset() {
        let pool: Pool<Scratch> = Pool::new(2);
        {
            let mut a = pool.obtain();
            a.dirty = true;
        }
        assert_eq!(pool.free_len(), 1);
        let b = pool.obtain();
        assert!(!b.dirty);
        assert_eq!(pool.free_len(), 0);
    }

    #[test]
    fn capacity_bounds_the_free_list() {
        let pool: Pool<Scratch> = Pool::new(1);
        let a = pool.obtain();
        let b = pool.obtain();
        drop(a);
        drop(b);
        assert_eq!(pool.free_len(), 1);
    }

    #[test]
    fn guard_returns_on_unwind() {
        extern crate std;
        let pool: Pool<Scratch> = Pool::new(2);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut a = pool.obtain();
            a.dirty = true;
            panic!("listener failed");
        }));
        assert!(result.is_err());
        assert_eq!(pool.free_len(), 1);
        assert!(!pool.obtain().dirty);
    }
}
