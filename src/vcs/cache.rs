use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type Slot<V> = Arc<Mutex<Option<V>>>;

/// Memoizes collaborator fetches by a two-part key, e.g. `(path, revision)`.
///
/// Each key has its own slot lock: a second request for a key waits for the
/// first fetch of that key only, while other keys proceed. Populated entries
/// are never replaced; failed fetches leave the slot empty for a retry.
pub struct FetchCache<V> {
    slots: Mutex<HashMap<(String, String), Slot<V>>>,
}

impl<V: Clone> FetchCache<V> {
    pub fn new() -> Self {
        FetchCache {
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_fetch<F>(&self, first: &str, second: &str, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(
                slots
                    .entry((first.to_string(), second.to_string()))
                    .or_default(),
            )
        };

        let mut value = slot.lock();
        if let Some(cached) = value.as_ref() {
            return Ok(cached.clone());
        }
        let fetched = fetch()?;
        *value = Some(fetched.clone());
        Ok(fetched)
    }
}

impl<V: Clone> Default for FetchCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn fetches_once_per_key() {
        let cache: FetchCache<Arc<[u8]>> = FetchCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let bytes = cache
                .get_or_fetch("a.rs", "r1", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::from(&b"blame"[..]))
                })
                .unwrap();
            assert_eq!(&bytes[..], b"blame");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache
            .get_or_fetch("a.rs", "r2", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::from(&b"other"[..]))
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache: FetchCache<u32> = FetchCache::new();
        let err = cache.get_or_fetch("k", "v", || Err(Error::Unsupported("test")));
        assert!(err.is_err());
        assert_eq!(cache.get_or_fetch("k", "v", || Ok(7)).unwrap(), 7);
        assert_eq!(cache.get_or_fetch("k", "v", || Ok(8)).unwrap(), 7);
    }

    #[test]
    fn different_keys_fetch_concurrently() {
        let cache: FetchCache<u32> = FetchCache::new();
        // Both fetches must be in flight at once to get past the barrier.
        let barrier = Barrier::new(2);
        std::thread::scope(|s| {
            let a = s.spawn(|| {
                cache.get_or_fetch("a", "1", || {
                    barrier.wait();
                    Ok(1)
                })
            });
            let b = s.spawn(|| {
                cache.get_or_fetch("b", "1", || {
                    barrier.wait();
                    Ok(2)
                })
            });
            assert_eq!(a.join().unwrap().unwrap(), 1);
            assert_eq!(b.join().unwrap().unwrap(), 2);
        });
    }

    #[test]
    fn same_key_fetched_by_one_thread() {
        let cache: FetchCache<usize> = FetchCache::new();
        let calls = AtomicUsize::new(0);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        cache.get_or_fetch("f", "r", || {
                            std::thread::sleep(std::time::Duration::from_millis(5));
                            Ok(calls.fetch_add(1, Ordering::SeqCst))
                        })
                    })
                })
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap().unwrap(), 0);
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
