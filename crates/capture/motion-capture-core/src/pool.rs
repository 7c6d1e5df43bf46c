//! Single-owner object pool for frame reuse.
//!
//! Objects move in and out by value: a released object is owned by the pool
//! again, so its former holder cannot keep a reference to it. Not thread-safe;
//! each engine owns its own pool.

/// Types that can be returned to a zeroed state for reuse.
pub trait Poolable: Default {
    fn reset(&mut self);
}

#[derive(Debug)]
pub struct Pool<T: Poolable> {
    free: Vec<T>,
    max_idle: usize,
}

impl<T: Poolable> Default for Pool<T> {
    fn default() -> Self {
        Self::new(64)
    }
}

impl<T: Poolable> Pool<T> {
    /// Pool keeping at most `max_idle` released objects around.
    pub fn new(max_idle: usize) -> Self {
        Self {
            free: Vec::new(),
            max_idle,
        }
    }

    /// Take a zeroed object, reusing a released one when available.
    pub fn acquire(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    /// Reset `item` and keep it for the next `acquire`.
    pub fn release(&mut self, mut item: T) {
        if self.free.len() >= self.max_idle {
            return;
        }
        item.reset();
        self.free.push(item);
    }

    pub fn idle(&self) -> usize {
        self.free.len()
    }

    pub fn clear(&mut self) {
        self.free.clear();
    }
}
