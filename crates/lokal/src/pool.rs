//! Reusable buffers for the evaluation hot path.
//!
//! Every rendered string tokenizes and evaluates at least one template, so
//! token arenas, scratch strings and tokenizer instances are rented from
//! pools instead of being allocated per call. Pools are plain values injected
//! into a [`Translator`](crate::Translator). The idle items sit in a bounded
//! lock-free queue, so several threads may rent from the same pool at once
//! without contending on a lock. Every rent is paired with a return by the
//! [`Pooled`] guard.

use std::any::type_name;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_queue::ArrayQueue;
use tracing::trace;

use crate::parser::{TokenTree, Tokenizer};

/// Default number of idle items a pool keeps.
pub const DEFAULT_MAX_IDLE: usize = 32;

/// Largest string capacity returned to a pool; bigger buffers are dropped.
const MAX_RETAINED_STRING: usize = 64 * 1024;

/// A value that can be reset to its default state and reused.
pub trait Reusable: Default {
    /// Clears the value while keeping its allocations.
    fn reset(&mut self);

    /// Returns false if the value grew too large to be worth keeping.
    fn retain(&self) -> bool {
        true
    }
}

impl Reusable for String {
    fn reset(&mut self) {
        self.clear();
    }

    fn retain(&self) -> bool {
        self.capacity() <= MAX_RETAINED_STRING
    }
}

/// Counters describing a pool's traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Items constructed because the pool was empty.
    pub created: usize,
    /// Total rents.
    pub rented: usize,
    /// Total returns.
    pub returned: usize,
    /// Items currently idle in the pool.
    pub idle: usize,
}

impl PoolStats {
    /// Items rented and not yet returned.
    pub fn outstanding(&self) -> usize {
        self.rented.saturating_sub(self.returned)
    }
}

/// A bag of reusable values.
pub struct Pool<T> {
    /// `None` when the pool keeps no idle items.
    idle: Option<ArrayQueue<T>>,
    created: AtomicUsize,
    rented: AtomicUsize,
    returned: AtomicUsize,
}

impl<T: Reusable> Default for Pool<T> {
    fn default() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }
}

impl<T: Reusable> Pool<T> {
    /// Create a pool keeping at most [`DEFAULT_MAX_IDLE`] idle items.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool keeping at most `max_idle` idle items.
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            idle: (max_idle > 0).then(|| ArrayQueue::new(max_idle)),
            created: AtomicUsize::new(0),
            rented: AtomicUsize::new(0),
            returned: AtomicUsize::new(0),
        }
    }

    /// Rents an item, returned to the pool when the guard drops.
    pub fn rent(&self) -> Pooled<'_, T> {
        Pooled {
            pool: self,
            item: Some(self.take()),
        }
    }

    fn take(&self) -> T {
        self.rented.fetch_add(1, Ordering::Relaxed);
        let reused = self.idle.as_ref().and_then(ArrayQueue::pop);
        reused.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            trace!(pool = type_name::<T>(), "allocating pooled item");
            T::default()
        })
    }

    fn give_back(&self, mut item: T) {
        self.returned.fetch_add(1, Ordering::Relaxed);
        if !item.retain() {
            return;
        }
        item.reset();
        let Some(idle) = &self.idle else {
            return;
        };
        if idle.push(item).is_err() {
            trace!(pool = type_name::<T>(), "pool full, dropping returned item");
        }
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            rented: self.rented.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            idle: self.idle.as_ref().map_or(0, ArrayQueue::len),
        }
    }
}

/// A rented item; derefs to `T` and goes back to its pool on drop.
pub struct Pooled<'p, T: Reusable> {
    pool: &'p Pool<T>,
    item: Option<T>,
}

impl<T: Reusable> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `drop` takes the item out.
        self.item.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Reusable> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Reusable> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.give_back(item);
        }
    }
}

/// The pools used by tokenization and evaluation.
#[derive(Default)]
pub struct Pools {
    /// Token arenas.
    pub trees: Pool<TokenTree>,
    /// Scratch string builders.
    pub strings: Pool<String>,
    /// Tokenizer instances (one per nesting level in flight).
    pub tokenizers: Pool<Tokenizer>,
}

impl Pools {
    /// Create empty pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if every rented item has been returned.
    pub fn is_balanced(&self) -> bool {
        self.trees.stats().outstanding() == 0
            && self.strings.stats().outstanding() == 0
            && self.tokenizers.stats().outstanding() == 0
    }
}
