//! Keyed request cache shared by all views.
//!
//! A [QueryCache] remembers the result of every successful request by its
//! [QueryKey], shares requests that are already running, and retries failed
//! requests before reporting an error.
//!
//! The cache is single threaded: requests are driven by whichever task awaits
//! them, and the cached futures are not `Send`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use stockhub_catalog::{CatalogClientError, ProductId};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Errors are shared between every caller waiting on the same request.
pub type SharedError = Arc<CatalogClientError>;

type SharedQuery<V> = Shared<LocalBoxFuture<'static, Result<V, SharedError>>>;

/// Identifies one request: the operation and all of its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    List {
        limit: u32,
        skip: u64,
        category: Option<String>,
    },
    Search {
        query: String,
    },
    Product {
        id: ProductId,
    },
    Categories,
    CategoryProducts {
        category: String,
        limit: u32,
    },
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKey::List {
                limit,
                skip,
                category: None,
            } => write!(f, "products?limit={limit}&skip={skip}"),
            QueryKey::List {
                limit,
                skip,
                category: Some(category),
            } => write!(f, "products?limit={limit}&skip={skip}&category={category}"),
            QueryKey::Search { query } => write!(f, "products/search?q={query}"),
            QueryKey::Product { id } => write!(f, "products/{id}"),
            QueryKey::Categories => write!(f, "categories"),
            QueryKey::CategoryProducts { category, limit } => {
                write!(f, "products/category/{category}?limit={limit}")
            },
        }
    }
}

/// How the cache treats failures and cached results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPolicy {
    /// Number of additional attempts after a failed request.
    pub retries: u32,
    /// Pause before each retry.
    pub retry_delay: Duration,
    /// Age after which a cached result is fetched again.
    /// `None` keeps results for the lifetime of the cache.
    pub stale_after: Option<Duration>,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            retry_delay: Duration::from_secs(1),
            stale_after: None,
        }
    }
}

impl QueryPolicy {
    fn is_stale(&self, fetched_at: Instant) -> bool {
        self.stale_after
            .is_some_and(|stale_after| fetched_at.elapsed() >= stale_after)
    }
}

/// What the cache currently knows about a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Fresh,
    Stale,
    InFlight,
}

enum Entry<V> {
    Ready { value: V, fetched_at: Instant },
    InFlight(SharedQuery<V>),
}

enum Lookup<V> {
    Hit(V),
    Join(SharedQuery<V>),
    Miss,
}

pub struct QueryCache<V> {
    entries: RefCell<HashMap<QueryKey, Entry<V>>>,
    policy: QueryPolicy,
}

impl<V> std::fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.borrow().len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl<V: Clone + 'static> QueryCache<V> {
    pub fn new(policy: QueryPolicy) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            policy,
        }
    }

    /// Return the cached value for `key`, or run `fetcher` to get it.
    ///
    /// Concurrent calls with the same key share a single request.
    /// A failed request is retried [QueryPolicy::retries] times,
    /// and is not cached, so the next call for the same key starts over.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<V, SharedError>
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<V, CatalogClientError>> + 'static,
    {
        let query = match self.lookup(&key) {
            Lookup::Hit(value) => {
                trace!(%key, "query cache hit");
                return Ok(value);
            },
            Lookup::Join(query) => {
                debug!(%key, "joining request in flight");
                query
            },
            Lookup::Miss => {
                debug!(%key, "query cache miss");
                let query = run_with_retry(key.clone(), self.policy.clone(), fetcher)
                    .boxed_local()
                    .shared();
                self.entries
                    .borrow_mut()
                    .insert(key.clone(), Entry::InFlight(query.clone()));
                query
            },
        };

        let result = query.clone().await;

        // Only the request that is still registered for this key may settle it.
        // The entry could have been invalidated or replaced in the meantime.
        let mut entries = self.entries.borrow_mut();
        let is_current = matches!(
            entries.get(&key),
            Some(Entry::InFlight(current)) if current.ptr_eq(&query)
        );
        if is_current {
            match &result {
                Ok(value) => {
                    entries.insert(key, Entry::Ready {
                        value: value.clone(),
                        fetched_at: Instant::now(),
                    });
                },
                Err(_) => {
                    entries.remove(&key);
                },
            }
        }

        result
    }

    fn lookup(&self, key: &QueryKey) -> Lookup<V> {
        match self.entries.borrow().get(key) {
            Some(Entry::Ready { value, fetched_at }) if !self.policy.is_stale(*fetched_at) => {
                Lookup::Hit(value.clone())
            },
            Some(Entry::InFlight(query)) => Lookup::Join(query.clone()),
            _ => Lookup::Miss,
        }
    }

    pub fn state(&self, key: &QueryKey) -> Option<EntryState> {
        match self.entries.borrow().get(key)? {
            Entry::Ready { fetched_at, .. } if self.policy.is_stale(*fetched_at) => {
                Some(EntryState::Stale)
            },
            Entry::Ready { .. } => Some(EntryState::Fresh),
            Entry::InFlight(_) => Some(EntryState::InFlight),
        }
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.state(key) == Some(EntryState::Stale)
    }

    /// Forget `key`, returns whether anything was cached.
    ///
    /// A request in flight for `key` keeps running for its current callers,
    /// but its result will not be cached.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.entries.borrow_mut().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

async fn run_with_retry<V, F, Fut>(
    key: QueryKey,
    policy: QueryPolicy,
    fetcher: F,
) -> Result<V, SharedError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<V, CatalogClientError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.retries => {
                attempt += 1;
                warn!(%key, attempt, error = %err, "request failed, retrying");
                if !policy.retry_delay.is_zero() {
                    tokio::time::sleep(policy.retry_delay).await;
                }
            },
            Err(err) => {
                debug!(%key, error = %err, "request failed");
                return Err(Arc::new(err));
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn failure() -> CatalogClientError {
        CatalogClientError::Other("catalog unavailable".to_string())
    }

    fn policy() -> QueryPolicy {
        QueryPolicy {
            retries: 1,
            retry_delay: Duration::ZERO,
            stale_after: None,
        }
    }

    fn key(id: u64) -> QueryKey {
        QueryKey::Product { id: ProductId(id) }
    }

    /// A fetcher that counts its calls and answers with the call number,
    /// failing for the call numbers listed in `fail_on`.
    fn counting_fetcher(
        calls: Rc<Cell<u32>>,
        fail_on: &'static [u32],
        latency: Duration,
    ) -> impl Fn() -> LocalBoxFuture<'static, Result<u32, CatalogClientError>> + 'static {
        move || {
            let calls = calls.clone();
            async move {
                calls.set(calls.get() + 1);
                let call = calls.get();
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                if fail_on.contains(&call) {
                    Err(failure())
                } else {
                    Ok(call)
                }
            }
            .boxed_local()
        }
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let cache = QueryCache::new(policy());
        let calls = Rc::new(Cell::new(0));

        let first = cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[], Duration::ZERO))
            .await
            .unwrap();
        let second = cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[], Duration::ZERO))
            .await
            .unwrap();

        assert_eq!((first, second), (1, 1));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.state(&key(1)), Some(EntryState::Fresh));
    }

    #[tokio::test]
    async fn different_keys_are_fetched_separately() {
        let cache = QueryCache::new(policy());
        let calls = Rc::new(Cell::new(0));

        cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[], Duration::ZERO))
            .await
            .unwrap();
        cache
            .fetch(key(2), counting_fetcher(calls.clone(), &[], Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_share_one_request() {
        let cache = QueryCache::new(policy());
        let calls = Rc::new(Cell::new(0));
        let latency = Duration::from_millis(100);

        let (first, second) = tokio::join!(
            cache.fetch(key(1), counting_fetcher(calls.clone(), &[], latency)),
            cache.fetch(key(1), counting_fetcher(calls.clone(), &[], latency)),
        );

        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn failed_request_is_retried_once() {
        let cache = QueryCache::new(policy());
        let calls = Rc::new(Cell::new(0));

        let value = cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[1], Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn error_surfaces_after_retry() {
        let cache = QueryCache::new(policy());
        let calls = Rc::new(Cell::new(0));

        let result = cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[1, 2], Duration::ZERO))
            .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.state(&key(1)), None, "errors must not be cached");
    }

    #[tokio::test]
    async fn fetch_after_error_issues_a_new_request() {
        let cache = QueryCache::new(QueryPolicy {
            retries: 0,
            ..policy()
        });
        let calls = Rc::new(Cell::new(0));

        let failed = cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[1], Duration::ZERO))
            .await;
        let retried = cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[1], Duration::ZERO))
            .await;

        assert!(failed.is_err());
        assert_eq!(retried.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_for_retry_delay() {
        let cache = QueryCache::new(QueryPolicy {
            retry_delay: Duration::from_secs(1),
            ..policy()
        });
        let calls = Rc::new(Cell::new(0));
        let start = Instant::now();

        cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[1], Duration::ZERO))
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_are_fetched_again() {
        let cache = QueryCache::new(QueryPolicy {
            stale_after: Some(Duration::from_secs(60)),
            ..policy()
        });
        let calls = Rc::new(Cell::new(0));

        cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[], Duration::ZERO))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.state(&key(1)), Some(EntryState::Stale));
        assert!(cache.is_stale(&key(1)));

        let value = cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[], Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(value, 2);
        assert_eq!(cache.state(&key(1)), Some(EntryState::Fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidated_request_does_not_overwrite_newer_entry() {
        let cache = QueryCache::new(policy());
        let calls = Rc::new(Cell::new(0));

        let slow = cache.fetch(
            key(1),
            counting_fetcher(calls.clone(), &[], Duration::from_millis(500)),
        );
        let fast = async {
            // let the slow request start, then replace it
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert_eq!(cache.state(&key(1)), Some(EntryState::InFlight));
            assert!(cache.invalidate(&key(1)));
            cache
                .fetch(
                    key(1),
                    counting_fetcher(calls.clone(), &[], Duration::from_millis(10)),
                )
                .await
        };

        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(slow.unwrap(), 1);
        assert_eq!(fast.unwrap(), 2);

        // the cache holds the newer value
        let cached = cache
            .fetch(key(1), counting_fetcher(calls.clone(), &[], Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(cached, 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn keys_render_as_request_paths() {
        assert_eq!(
            QueryKey::List {
                limit: 20,
                skip: 40,
                category: Some("beauty".to_string())
            }
            .to_string(),
            "products?limit=20&skip=40&category=beauty"
        );
        assert_eq!(
            QueryKey::CategoryProducts {
                category: "laptops".to_string(),
                limit: 7
            }
            .to_string(),
            "products/category/laptops?limit=7"
        );
        assert_eq!(key(3).to_string(), "products/3");
    }
}
