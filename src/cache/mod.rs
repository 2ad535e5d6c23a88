//! Deduplicating cache: concurrent requests for the same key share one
//! in-flight computation instead of starting their own.

pub mod completion;

pub use completion::CachedChatClient;

use futures::future::{ BoxFuture, FutureExt, Shared };
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::{ Mutex, PoisonError };
use std::time::{ Duration, Instant };

type SharedResult<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

enum Entry<V, E> {
    Pending {
        generation: u64,
        future: SharedResult<V, E>,
    },
    Resolved {
        value: V,
        stored_at: Instant,
    },
}

pub struct SingleFlight<K, V, E> {
    entries: Mutex<HashMap<K, Entry<V, E>>>,
    ttl: Duration,
    generation: AtomicU64,
}

impl<K, V, E> SingleFlight<K, V, E>
    where
        K: Eq + Hash + Clone,
        V: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static
{
    /// `ttl` is how long a successful value is served from the cache. A zero
    /// ttl only joins callers whose requests overlap in time.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the cached value for `key`, joins the computation already
    /// running for it, or starts `init` and publishes it to later callers.
    /// Failures are handed to every joined caller and then forgotten.
    pub async fn get_or_try_init<F, Fut>(&self, key: K, init: F) -> Result<V, E>
        where F: FnOnce() -> Fut, Fut: Future<Output = Result<V, E>> + Send + 'static
    {
        let (generation, future) = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&key) {
                Some(Entry::Resolved { value, stored_at }) if stored_at.elapsed() < self.ttl => {
                    return Ok(value.clone());
                }
                Some(Entry::Pending { generation, future }) => (*generation, future.clone()),
                _ => {
                    let ttl = self.ttl;
                    entries.retain(|_, e| {
                        !matches!(e, Entry::Resolved { stored_at, .. } if stored_at.elapsed() >= ttl)
                    });
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let future = init().boxed().shared();
                    entries.insert(key.clone(), Entry::Pending {
                        generation,
                        future: future.clone(),
                    });
                    (generation, future)
                }
            }
        };

        let result = future.await;
        self.settle(&key, generation, &result);
        result
    }

    fn settle(&self, key: &K, generation: u64, result: &Result<V, E>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let still_ours = matches!(
            entries.get(key),
            Some(Entry::Pending { generation: g, .. }) if *g == generation
        );
        if !still_ours {
            return;
        }

        match result {
            Ok(value) if !self.ttl.is_zero() => {
                entries.insert(key.clone(), Entry::Resolved {
                    value: value.clone(),
                    stored_at: Instant::now(),
                });
            }
            _ => {
                entries.remove(key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting(
        calls: &Arc<AtomicUsize>,
        result: Result<u32, String>,
        delay: Duration
    ) -> impl Future<Output = Result<u32, String>> + Send + 'static {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            result
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_computation() {
        let flights = Arc::new(SingleFlight::<String, u32, String>::new(Duration::ZERO));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let flights = flights.clone();
            let calls = calls.clone();
            handles.push(
                tokio::spawn(async move {
                    flights
                        .get_or_try_init("k".to_string(), || {
                            counting(&calls, Ok(42), Duration::from_millis(100))
                        }).await
                })
            );
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(flights.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_recomputes_sequential_calls() {
        let flights = SingleFlight::<&str, u32, String>::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let value = flights
                .get_or_try_init("k", || counting(&calls, Ok(1), Duration::ZERO)).await
                .unwrap();
            assert_eq!(value, 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn resolved_values_are_served_within_ttl() {
        let flights = SingleFlight::<&str, u32, String>::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = flights.get_or_try_init("k", || counting(&calls, Ok(5), Duration::ZERO)).await;
        let second = flights.get_or_try_init("k", || counting(&calls, Ok(6), Duration::ZERO)).await;

        assert_eq!(first, Ok(5));
        assert_eq!(second, Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flights.len(), 1);
    }

    #[tokio::test]
    async fn expired_values_are_recomputed() {
        let flights = SingleFlight::<&str, u32, String>::new(Duration::from_millis(20));
        let calls = Arc::new(AtomicUsize::new(0));

        flights.get_or_try_init("k", || counting(&calls, Ok(1), Duration::ZERO)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let again = flights.get_or_try_init("k", || counting(&calls, Ok(2), Duration::ZERO)).await;

        assert_eq!(again, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let flights = SingleFlight::<&str, u32, String>::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let failed = flights
            .get_or_try_init("k", || counting(&calls, Err("down".into()), Duration::ZERO)).await;
        assert_eq!(failed, Err("down".to_string()));
        assert!(flights.is_empty());

        let retried = flights.get_or_try_init("k", || counting(&calls, Ok(9), Duration::ZERO)).await;
        assert_eq!(retried, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn distinct_keys_run_independently() {
        let flights = Arc::new(SingleFlight::<u32, u32, String>::new(Duration::ZERO));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for key in 0..4u32 {
            let flights = flights.clone();
            let calls = calls.clone();
            handles.push(
                tokio::spawn(async move {
                    flights
                        .get_or_try_init(key, || {
                            counting(&calls, Ok(key * 10), Duration::from_millis(20))
                        }).await
                })
            );
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap());
        }
        values.sort();
        assert_eq!(values, vec![0, 10, 20, 30]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
