//! Size-keyed resource pool with least-recently-used eviction.
//!
//! Backends keep per-transform-size resources (plans, scratch buffers,
//! twiddle tables) here so repeated calls at the same size never allocate.
//! The pool holds at most `capacity` sizes; the least recently used entry is
//! dropped when a new size arrives at capacity.

/// Bounded pool of per-size resources.
#[derive(Debug)]
pub struct SizePool<T> {
    capacity: usize,
    entries: Vec<PoolEntry<T>>,
    clock: u64,
    evictions: u64,
}

#[derive(Debug)]
struct PoolEntry<T> {
    size: usize,
    last_used: u64,
    value: T,
}

impl<T> SizePool<T> {
    /// Creates a pool holding at most `capacity` sizes (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
            clock: 0,
            evictions: 0,
        }
    }

    /// Returns the entry for `size`, building it with `make` on a miss.
    pub fn get_or_insert_with(&mut self, size: usize, make: impl FnOnce() -> T) -> &mut T {
        self.clock += 1;

        if let Some(pos) = self.entries.iter().position(|e| e.size == size) {
            let entry = &mut self.entries[pos];
            entry.last_used = self.clock;
            return &mut entry.value;
        }

        if self.entries.len() >= self.capacity
            && let Some(lru) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(i, _)| i)
        {
            let evicted = self.entries.swap_remove(lru);
            self.evictions += 1;
            #[cfg(feature = "tracing")]
            tracing::debug!(size = evicted.size, "size_pool: evicted");
            drop(evicted);
        }

        self.entries.push(PoolEntry {
            size,
            last_used: self.clock,
            value: make(),
        });
        let last = self.entries.len() - 1;
        &mut self.entries[last].value
    }

    /// True if resources for `size` are resident.
    pub fn contains(&self, size: usize) -> bool {
        self.entries.iter().any(|e| e.size == size)
    }

    /// Number of resident sizes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of resident sizes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total entries evicted since creation.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Releases every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
