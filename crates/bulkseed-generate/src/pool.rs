use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;

use bulkseed_core::{ProductRecord, UserRecord};

/// Append-only collection of inserted records of one kind.
///
/// Records are shared behind `Arc` so sampling never copies field data.
#[derive(Debug)]
pub struct EntityPool<T> {
    records: Mutex<Vec<Arc<T>>>,
}

impl<T> Default for EntityPool<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }
}

impl<T> EntityPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch and return the new pool size.
    pub fn append(&self, records: Vec<T>) -> usize {
        let mut pool = self.lock();
        pool.extend(records.into_iter().map(Arc::new));
        pool.len()
    }

    /// Uniformly sample one record; `None` when nothing was inserted yet.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<Arc<T>> {
        let pool = self.lock();
        if pool.is_empty() {
            return None;
        }
        let index = rng.random_range(0..pool.len());
        Some(Arc::clone(&pool[index]))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.lock().clone()
    }

    // Appends never leave the vector half-written, so a poisoned lock still
    // guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Vec<Arc<T>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Parent records available to the orders phase, one lock per kind.
#[derive(Debug, Default)]
pub struct SharedEntityPool {
    pub users: EntityPool<UserRecord>,
    pub products: EntityPool<ProductRecord>,
}

impl SharedEntityPool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn sampling_empty_pool_returns_none() {
        let pool: EntityPool<u64> = EntityPool::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(pool.sample(&mut rng).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn samples_come_from_appended_records() {
        let pool = EntityPool::new();
        assert_eq!(pool.append(vec![10_u64, 20, 30]), 3);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            let value = pool.sample(&mut rng).expect("pool is populated");
            assert!([10, 20, 30].contains(value.as_ref()));
        }
    }

    #[test]
    fn sampling_reaches_every_record() {
        let pool = EntityPool::new();
        pool.append((0..4_u64).collect());
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let value = pool.sample(&mut rng).expect("pool is populated");
            seen[*value as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }

    #[test]
    fn concurrent_appends_lose_nothing() {
        let pool = Arc::new(EntityPool::new());
        let handles: Vec<_> = (0..16_u64)
            .map(|worker| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for batch in 0..50_u64 {
                        pool.append(vec![worker * 1_000 + batch; 10]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("append worker");
        }
        assert_eq!(pool.len(), 16 * 50 * 10);
    }
}
