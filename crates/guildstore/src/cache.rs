//! Short-TTL read cache for slowly-changing collections.
//!
//! Each cached collection lives in its own [`TtlCell`]. Reads go through
//! [`TtlCell::read_through`], which serves a fresh value when one exists,
//! refetches otherwise, and on a failed refetch falls back to the last known
//! value rather than surfacing an error. Writers call
//! [`TtlCell::invalidate`] so the next read refetches instead of waiting out
//! the TTL.

use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

struct CellState<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
    /// Bumped by every invalidation. A refetch that started before the bump
    /// is discarded instead of repopulating the slot with pre-write data.
    epoch: u64,
}

/// A single named cache slot with time-based expiry and explicit
/// invalidation.
pub struct TtlCell<T> {
    name: &'static str,
    ttl: Duration,
    state: Mutex<CellState<T>>,
}

impl<T> TtlCell<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            state: Mutex::new(CellState {
                value: None,
                fetched_at: None,
                epoch: 0,
            }),
        }
    }

    /// Marks the slot stale so the next read refetches. The old value is
    /// kept as a fallback for failed refetches.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.epoch = state.epoch.wrapping_add(1);
        state.fetched_at = None;
        debug!(cache = self.name, "cache invalidated");
    }

    fn fill(&self, epoch: u64, value: T) {
        let mut state = self.lock();
        if state.epoch != epoch {
            debug!(cache = self.name, "cache fill discarded, slot was invalidated during refetch");
            return;
        }
        state.value = Some(value);
        state.fetched_at = Some(Instant::now());
    }

    fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    // Values are only ever replaced whole, so the state inside a poisoned
    // lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, CellState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> TtlCell<T> {
    /// The cached value, if it was populated less than the TTL ago.
    pub fn fresh(&self) -> Option<T> {
        let state = self.lock();
        let fetched_at = state.fetched_at?;
        if fetched_at.elapsed() < self.ttl {
            state.value.clone()
        } else {
            None
        }
    }

    /// The most recently populated value regardless of age.
    pub fn last_known(&self) -> Option<T> {
        self.lock().value.clone()
    }

    /// Serves the fresh cached value, or refetches through `fetch`.
    ///
    /// A failed refetch never surfaces: the last known value is returned if
    /// one exists, the type's default otherwise.
    pub async fn read_through<E, F, Fut>(&self, fetch: F) -> T
    where
        T: Default,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh() {
            debug!(cache = self.name, "cache hit");
            return value;
        }

        let epoch = self.epoch();
        match fetch().await {
            Ok(value) => {
                self.fill(epoch, value.clone());
                value
            }
            Err(err) => {
                warn!(
                    cache = self.name,
                    error = %err,
                    "cache refetch failed, serving last known value"
                );
                self.last_known().unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TTL: Duration = Duration::from_millis(40);

    fn cell() -> TtlCell<Vec<i64>> {
        TtlCell::new("test", TTL)
    }

    #[test]
    fn test_empty_cell_is_stale() {
        let cell = cell();
        assert_eq!(cell.fresh(), None);
        assert_eq!(cell.last_known(), None);
    }

    #[tokio::test]
    async fn test_read_through_populates_and_serves() {
        let cell = cell();
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let value = cell
                .read_through(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, &str>(vec![1, 2, 3]) }
                })
                .await;
            assert_eq!(value, vec![1, 2, 3]);
        }

        // First read fetches, the next two hit the cache
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_value_expires_after_ttl() {
        let cell = cell();
        let calls = AtomicU32::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, &str>(vec![7]) }
        };

        cell.read_through(fetch).await;
        assert!(cell.fresh().is_some());

        tokio::time::sleep(TTL + Duration::from_millis(10)).await;
        assert_eq!(cell.fresh(), None);

        cell.read_through(fetch).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch_inside_ttl() {
        let cell = cell();
        let calls = AtomicU32::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, &str>(vec![7]) }
        };

        cell.read_through(fetch).await;
        cell.invalidate();
        cell.read_through(fetch).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refetch_serves_last_known() {
        let cell = cell();

        cell.read_through(|| async { Ok::<_, &str>(vec![1, 2]) })
            .await;
        cell.invalidate();

        let value = cell
            .read_through(|| async { Err::<Vec<i64>, _>("connection reset") })
            .await;
        assert_eq!(value, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failed_first_fetch_serves_default() {
        let cell = cell();
        let value = cell
            .read_through(|| async { Err::<Vec<i64>, _>("connection reset") })
            .await;
        assert_eq!(value, Vec::<i64>::new());
    }

    #[test]
    fn test_stale_fill_is_discarded() {
        let cell = cell();
        let epoch = cell.epoch();

        // A write lands while the refetch is in flight
        cell.invalidate();
        cell.fill(epoch, vec![9]);

        // The pre-write data must not have repopulated the slot
        assert_eq!(cell.fresh(), None);
    }

    #[test]
    fn test_current_fill_is_kept() {
        let cell = cell();
        let epoch = cell.epoch();
        cell.fill(epoch, vec![9]);
        assert_eq!(cell.fresh(), Some(vec![9]));
    }
}
