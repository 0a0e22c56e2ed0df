//! Local view state with optimistic mutations.
//!
//! A mutation snapshots the entity, shows the predicted result right away,
//! performs the write, then replaces the prediction with a fresh read from
//! the backend. Any failure puts the snapshot back.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tideline_shared::{Habit, Task};
use tracing::{debug, warn};

use crate::error::ApiError;

pub trait Keyed {
    fn key(&self) -> i64;
}

impl Keyed for Task {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Habit {
    fn key(&self) -> i64 {
        self.id
    }
}

/// Per-entity "request in flight" flags.
#[derive(Debug, Clone, Default)]
pub struct BusySet {
    busy: Arc<Mutex<HashSet<i64>>>,
}

impl BusySet {
    pub fn try_acquire(&self, key: i64) -> Option<BusyGuard> {
        if !self.busy.lock().insert(key) {
            return None;
        }
        Some(BusyGuard {
            busy: Arc::clone(&self.busy),
            key,
        })
    }

    pub fn is_busy(&self, key: i64) -> bool {
        self.busy.lock().contains(&key)
    }
}

/// Releases its entity when dropped, whichever way the mutation ended.
#[derive(Debug)]
pub struct BusyGuard {
    busy: Arc<Mutex<HashSet<i64>>>,
    key: i64,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.lock().remove(&self.key);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Written and reconciled with the backend's copy.
    Applied,
    /// Another mutation of the same entity is still in flight.
    Busy,
    /// The entity is not in the local list.
    NotLoaded,
    /// Nothing to write.
    Unchanged,
}

#[derive(Debug)]
pub struct ViewState<E> {
    items: Mutex<Vec<E>>,
    busy: BusySet,
    error: Mutex<Option<String>>,
}

impl<E> Default for ViewState<E> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            busy: BusySet::default(),
            error: Mutex::new(None),
        }
    }
}

impl<E: Keyed + Clone> ViewState<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<E> {
        self.items.lock().clone()
    }

    pub fn get(&self, key: i64) -> Option<E> {
        self.items.lock().iter().find(|item| item.key() == key).cloned()
    }

    pub fn replace_all(&self, items: Vec<E>) {
        *self.items.lock() = items;
    }

    pub fn upsert(&self, item: E) {
        let mut items = self.items.lock();
        match items.iter_mut().find(|existing| existing.key() == item.key()) {
            Some(slot) => *slot = item,
            None => items.push(item),
        }
    }

    pub fn remove(&self, key: i64) -> Option<E> {
        let mut items = self.items.lock();
        let idx = items.iter().position(|item| item.key() == key)?;
        Some(items.remove(idx))
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        *self.error.lock() = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.error.lock().take();
    }

    pub fn is_busy(&self, key: i64) -> bool {
        self.busy.is_busy(key)
    }

    pub fn busy(&self) -> &BusySet {
        &self.busy
    }

    /// Records `err` as the feature's message unless the session expired;
    /// in that case the expiry notice speaks for itself.
    pub fn report(&self, err: &ApiError, message: &str) {
        if err.is_session_expired() {
            return;
        }
        warn!(error = %err, message, "view action failed");
        self.set_error(message);
    }

    /// Optimistic mutation of one entity.
    ///
    /// `predict` produces what the entity should look like after the write,
    /// `write` performs it (given the pre-mutation snapshot), `reconcile`
    /// reads the canonical copy back.
    pub async fn mutate<P, W, WF, R, RF>(
        &self,
        key: i64,
        predict: P,
        write: W,
        reconcile: R,
        failure_message: &str,
    ) -> Result<Outcome, ApiError>
    where
        P: FnOnce(&E) -> E,
        W: FnOnce(&E) -> WF,
        WF: Future<Output = Result<(), ApiError>>,
        R: FnOnce() -> RF,
        RF: Future<Output = Result<E, ApiError>>,
    {
        let Some(_guard) = self.busy.try_acquire(key) else {
            debug!(key, "mutation already in flight; ignoring");
            return Ok(Outcome::Busy);
        };
        let Some(snapshot) = self.get(key) else {
            return Ok(Outcome::NotLoaded);
        };

        self.clear_error();
        self.upsert(predict(&snapshot));

        let result = async {
            write(&snapshot).await?;
            reconcile().await
        }
        .await;

        match result {
            Ok(canonical) => {
                self.upsert(canonical);
                Ok(Outcome::Applied)
            }
            Err(err) => {
                debug!(key, "rolling back optimistic update");
                self.upsert(snapshot);
                self.report(&err, failure_message);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        id: i64,
        value: i32,
    }

    impl Keyed for Counter {
        fn key(&self) -> i64 {
            self.id
        }
    }

    fn run_async<T>(future: impl Future<Output = T>) -> T {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime")
            .block_on(future)
    }

    #[test]
    fn busy_guard_releases_on_drop() {
        let busy = BusySet::default();
        let guard = busy.try_acquire(1).expect("first acquire");
        assert!(busy.try_acquire(1).is_none());
        assert!(busy.try_acquire(2).is_some());
        drop(guard);
        assert!(!busy.is_busy(1));
        assert!(busy.try_acquire(1).is_some());
    }

    #[test]
    fn reconciled_value_replaces_the_prediction() {
        let view = ViewState::new();
        view.replace_all(vec![Counter { id: 1, value: 0 }]);

        let outcome = run_async(view.mutate(
            1,
            |c| Counter { value: c.value + 1, ..c.clone() },
            |_| async { Ok::<_, ApiError>(()) },
            || async { Ok::<_, ApiError>(Counter { id: 1, value: 5 }) },
            "failed",
        ))
        .expect("mutation");

        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(view.get(1), Some(Counter { id: 1, value: 5 }));
        assert_eq!(view.error(), None);
        assert!(!view.is_busy(1));
    }

    #[test]
    fn failed_reconcile_rolls_back() {
        let view = ViewState::new();
        view.replace_all(vec![Counter { id: 1, value: 0 }]);

        let result = run_async(view.mutate(
            1,
            |c| Counter { value: 9, ..c.clone() },
            |_| async { Ok::<_, ApiError>(()) },
            || async { Err::<Counter, _>(ApiError::Transport(TransportError::new("offline"))) },
            "Failed to bump",
        ));

        assert!(result.is_err());
        assert_eq!(view.get(1), Some(Counter { id: 1, value: 0 }));
        assert_eq!(view.error().as_deref(), Some("Failed to bump"));
        assert!(!view.is_busy(1));
    }

    #[test]
    fn session_expiry_rolls_back_without_a_local_message() {
        let view = ViewState::new();
        view.replace_all(vec![Counter { id: 1, value: 0 }]);

        let result = run_async(view.mutate(
            1,
            |c| Counter { value: 9, ..c.clone() },
            |_| async { Err::<(), _>(ApiError::SessionExpired) },
            || async { Ok::<_, ApiError>(Counter { id: 1, value: 9 }) },
            "Failed to bump",
        ));

        assert!(matches!(result, Err(ApiError::SessionExpired)));
        assert_eq!(view.get(1), Some(Counter { id: 1, value: 0 }));
        assert_eq!(view.error(), None);
    }

    #[test]
    fn missing_entity_is_reported_not_written() {
        let view: ViewState<Counter> = ViewState::new();
        let outcome = run_async(view.mutate(
            7,
            |c| c.clone(),
            |_| async { Err::<(), _>(ApiError::SessionExpired) },
            || async { Err::<Counter, _>(ApiError::SessionExpired) },
            "failed",
        ))
        .expect("mutation");
        assert_eq!(outcome, Outcome::NotLoaded);
    }
}
