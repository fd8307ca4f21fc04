/// A free-list pool of reusable objects
///
/// Objects are created on demand with `Default` when the free list is empty and
/// are handed back after use. Callers are responsible for resetting an object
/// to a poolable state before giving it back.
#[derive(Debug)]
pub struct ResourcePool<T> {
    available: Vec<T>,
    created: usize,
}

impl<T: Default> ResourcePool<T> {
    /// Creates a new empty pool
    pub fn new() -> Self {
        Self {
            available: Vec::new(),
            created: 0,
        }
    }

    /// Creates a pool holding `count` pre-built objects
    pub fn with_preallocated(count: usize) -> Self {
        let mut pool = Self::new();
        for _ in 0..count {
            pool.available.push(T::default());
        }
        pool.created = count;
        pool
    }

    /// Takes an object from the pool, creating one if none are available
    pub fn take(&mut self) -> T {
        match self.available.pop() {
            Some(item) => item,
            None => {
                self.created += 1;
                T::default()
            }
        }
    }

    /// Returns an object to the pool
    pub fn give_back(&mut self, item: T) {
        self.available.push(item);
    }

    /// Returns the number of objects waiting in the pool
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Returns the number of objects this pool has ever created
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Drops every pooled object
    pub fn clear(&mut self) {
        self.available.clear();
    }
}

impl<T: Default> Default for ResourcePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_creates_when_empty() {
        let mut pool: ResourcePool<Vec<u32>> = ResourcePool::new();
        let item = pool.take();
        assert!(item.is_empty());
        assert_eq!(pool.created_count(), 1);
        assert_eq!(pool.available_count(), 0);
    }

    #[test]
    fn given_back_objects_are_reused() {
        let mut pool: ResourcePool<Vec<u32>> = ResourcePool::new();
        let mut item = pool.take();
        item.reserve(64);
        pool.give_back(item);
        assert_eq!(pool.available_count(), 1);

        let reused = pool.take();
        assert!(reused.capacity() >= 64);
        assert_eq!(pool.created_count(), 1);
    }

    #[test]
    fn preallocated_pool_does_not_create() {
        let mut pool: ResourcePool<String> = ResourcePool::with_preallocated(3);
        let _a = pool.take();
        let _b = pool.take();
        assert_eq!(pool.created_count(), 3);
        assert_eq!(pool.available_count(), 1);
        pool.clear();
        assert_eq!(pool.available_count(), 0);
    }
}
