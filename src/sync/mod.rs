//! Local list synchronizer.
//!
//! A [`ListSync`] holds the list a screen is currently showing and keeps it
//! consistent with the backend:
//!
//! - **Load** replaces the whole list with the server's answer for a [`Scope`].
//!   Each load carries a generation number; an answer that arrives after a
//!   newer load started is dropped. So is an answer to a load that was
//!   already in flight when a mutation was confirmed, since that snapshot
//!   predates the change.
//! - **Mutations** (star toggle, rename, delete) are confirm-then-mutate: the
//!   local list changes only after the server accepts the change. Mutations on
//!   the same item id run one at a time, so a double tap observes the result
//!   of the first tap instead of racing it.
//! - **Close** ties the list to its owner's lifetime. Remote calls still in
//!   flight are abandoned and their answers never applied.
//!
//! Every visible state change bumps a revision counter published through a
//! `tokio::sync::watch` channel; renderers [`subscribe`](ListSync::subscribe)
//! to it to know when to redraw.

mod order;
mod scope;

pub use order::{sort_by_priority, sorted_by_priority};
pub use scope::Scope;

use crate::error::OperationError;
use crate::model::{Article, Keyed, Prioritized};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

// ============================================================================
// Remote Seams
// ============================================================================

/// Read side of a backend collection.
#[async_trait]
pub trait Remote: Send + Sync {
    type Item: Keyed + Send + Sync + 'static;

    /// Fetch the full collection for `scope`.
    async fn fetch(&self, scope: &Scope) -> Result<Vec<Self::Item>, OperationError>;
}

/// Write side of the article collection.
#[async_trait]
pub trait ArticleRemote: Remote<Item = Article> {
    async fn set_priority(&self, article_id: &str, prioritized: bool)
        -> Result<(), OperationError>;

    async fn rename(&self, article_id: &str, title: &str) -> Result<(), OperationError>;

    async fn delete(&self, article_id: &str) -> Result<(), OperationError>;
}

// ============================================================================
// Outcome
// ============================================================================

/// What happened to the local list as a result of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server confirmed and the local list now reflects it.
    Applied,
    /// No entry with that id; nothing was sent or changed.
    NotFound,
    /// A newer load started before this one finished; its answer was dropped.
    Superseded,
    /// The list was closed; any answer was dropped.
    Discarded,
}

// ============================================================================
// ListSync
// ============================================================================

struct State<T> {
    items: Vec<Arc<T>>,
    loading: bool,
    load_generation: u64,
    /// Bumped whenever a confirmed mutation lands in `items`.
    mutation_epoch: u64,
    last_error: Option<String>,
}

/// State container for one synchronized list. See the module docs.
pub struct ListSync<R: Remote> {
    name: &'static str,
    remote: R,
    state: Mutex<State<R::Item>>,
    item_locks: ItemLocks,
    revision: watch::Sender<u64>,
    closed: watch::Sender<bool>,
}

/// Lock a std mutex, recovering the data if a previous holder panicked.
/// None of the critical sections leave the state half-updated.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R: Remote> ListSync<R> {
    /// `name` labels log lines ("articles", "categories").
    pub fn new(name: &'static str, remote: R) -> Self {
        let (revision, _) = watch::channel(0);
        let (closed, _) = watch::channel(false);
        Self {
            name,
            remote,
            state: Mutex::new(State {
                items: Vec::new(),
                loading: false,
                load_generation: 0,
                mutation_epoch: 0,
                last_error: None,
            }),
            item_locks: Mutex::new(HashMap::new()),
            revision,
            closed,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    // ------------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------------

    /// Snapshot of the list in server order.
    pub fn items(&self) -> Vec<Arc<R::Item>> {
        lock(&self.state).items.clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<R::Item>> {
        lock(&self.state)
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    /// Receiver whose value increments on every visible change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Tear down: abandon in-flight calls and refuse further operations.
    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            tracing::debug!(list = self.name, "List closed");
            lock(&self.state).loading = false;
            self.notify();
        }
    }

    // ------------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------------

    /// Replace the list with the server's collection for `scope`.
    pub async fn load(&self, scope: &Scope) -> Result<Outcome, OperationError> {
        if let Err(e) = scope.validate() {
            return Err(self.fail("load", None, e));
        }
        if self.is_closed() {
            return Ok(Outcome::Discarded);
        }

        let (generation, epoch) = {
            let mut state = lock(&self.state);
            state.load_generation += 1;
            state.loading = true;
            (state.load_generation, state.mutation_epoch)
        };
        self.notify();
        tracing::debug!(list = self.name, %scope, generation, "Loading list");

        let fetched = self.until_closed(self.remote.fetch(scope)).await;

        let outcome = {
            let mut state = lock(&self.state);
            let latest = state.load_generation == generation;
            if latest || fetched.is_none() {
                state.loading = false;
            }
            match fetched {
                None => Ok(Outcome::Discarded),
                Some(_) if !latest => {
                    tracing::debug!(
                        list = self.name,
                        expected = state.load_generation,
                        got = generation,
                        "Ignoring stale load (generation mismatch)"
                    );
                    Ok(Outcome::Superseded)
                }
                Some(Ok(_)) if state.mutation_epoch != epoch => {
                    tracing::debug!(
                        list = self.name,
                        %scope,
                        "Ignoring stale load (mutation confirmed while in flight)"
                    );
                    Ok(Outcome::Superseded)
                }
                Some(Ok(items)) => {
                    state.items = dedupe(self.name, items);
                    state.last_error = None;
                    tracing::info!(
                        list = self.name,
                        %scope,
                        count = state.items.len(),
                        "List loaded"
                    );
                    Ok(Outcome::Applied)
                }
                Some(Err(e)) => {
                    tracing::warn!(list = self.name, %scope, error = %e, "Failed to load list");
                    state.last_error = Some(e.to_string());
                    Err(e)
                }
            }
        };
        self.notify();
        outcome
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Runs `fut` unless the list is closed first, in which case `None`.
    async fn until_closed<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut closed = self.closed.subscribe();
        tokio::select! {
            biased;
            _ = closed.wait_for(|c| *c) => None,
            out = fut => Some(out),
        }
    }

    /// Runs `op` while holding the lock for `item_id`.
    async fn serialized<F>(&self, item_id: &str, op: F) -> Result<Outcome, OperationError>
    where
        F: Future<Output = Result<Outcome, OperationError>>,
    {
        if self.is_closed() {
            return Ok(Outcome::Discarded);
        }
        let slot = ItemLockSlot::acquire(&self.item_locks, item_id);

        let result = match self.until_closed(slot.lock.lock()).await {
            Some(_guard) => op.await,
            None => Ok(Outcome::Discarded),
        };
        result
    }

    /// Apply a confirmed change to the entry `id`. Returns `NotFound` if the
    /// entry vanished while the call was in flight.
    fn apply_confirmed<F>(&self, op: &'static str, id: &str, change: F) -> Outcome
    where
        F: FnOnce(&mut Vec<Arc<R::Item>>, usize),
    {
        let outcome = {
            let mut state = lock(&self.state);
            if self.is_closed() {
                return Outcome::Discarded;
            }
            state.last_error = None;
            match state.items.iter().position(|item| item.id() == id) {
                Some(index) => {
                    change(&mut state.items, index);
                    state.mutation_epoch += 1;
                    Outcome::Applied
                }
                None => {
                    tracing::debug!(list = self.name, op, id, "Entry gone before confirmation");
                    Outcome::NotFound
                }
            }
        };
        self.notify();
        outcome
    }

    fn not_found(&self, op: &'static str, id: &str) -> Outcome {
        tracing::debug!(list = self.name, op, id, "No entry with this id, ignoring");
        Outcome::NotFound
    }

    fn fail(&self, op: &'static str, id: Option<&str>, error: OperationError) -> OperationError {
        tracing::warn!(list = self.name, op, id = ?id, error = %error, "Operation failed");
        lock(&self.state).last_error = Some(error.to_string());
        self.notify();
        error
    }
}

impl<R> ListSync<R>
where
    R: Remote,
    R::Item: Prioritized,
{
    /// Snapshot with prioritized entries first, otherwise in server order.
    pub fn sorted_by_priority(&self) -> Vec<Arc<R::Item>> {
        sorted_by_priority(&lock(&self.state).items)
    }
}

impl<R: ArticleRemote> ListSync<R> {
    /// Flip the star on `article_id` once the server confirms the new value.
    pub async fn toggle_priority(&self, article_id: &str) -> Result<Outcome, OperationError> {
        self.serialized(article_id, async {
            let Some(current) = self.get(article_id) else {
                return Ok(self.not_found("toggle_priority", article_id));
            };
            let target = !current.prioritized;

            let Some(result) = self
                .until_closed(self.remote.set_priority(article_id, target))
                .await
            else {
                return Ok(Outcome::Discarded);
            };
            if let Err(e) = result {
                return Err(self.fail("toggle_priority", Some(article_id), e));
            }

            tracing::debug!(article_id, prioritized = target, "Priority confirmed");
            Ok(self.apply_confirmed("toggle_priority", article_id, |items, i| {
                let mut updated = Article::clone(&items[i]);
                updated.prioritized = target;
                items[i] = Arc::new(updated);
            }))
        })
        .await
    }

    /// Rename `article_id` once the server accepts `new_title`.
    pub async fn update_title(
        &self,
        article_id: &str,
        new_title: &str,
    ) -> Result<Outcome, OperationError> {
        let title = new_title.trim();

        self.serialized(article_id, async {
            if self.get(article_id).is_none() {
                return Ok(self.not_found("update_title", article_id));
            }
            if title.is_empty() {
                return Err(self.fail(
                    "update_title",
                    Some(article_id),
                    OperationError::precondition("Title must not be empty"),
                ));
            }

            let Some(result) = self.until_closed(self.remote.rename(article_id, title)).await
            else {
                return Ok(Outcome::Discarded);
            };
            if let Err(e) = result {
                return Err(self.fail("update_title", Some(article_id), e));
            }

            tracing::debug!(article_id, "Title update confirmed");
            Ok(self.apply_confirmed("update_title", article_id, |items, i| {
                let mut updated = Article::clone(&items[i]);
                updated.title = title.to_owned();
                items[i] = Arc::new(updated);
            }))
        })
        .await
    }

    /// Delete `article_id` remotely, then drop it from the list.
    pub async fn remove(&self, article_id: &str) -> Result<Outcome, OperationError> {
        self.serialized(article_id, async {
            if self.get(article_id).is_none() {
                return Ok(self.not_found("remove", article_id));
            }

            let Some(result) = self.until_closed(self.remote.delete(article_id)).await else {
                return Ok(Outcome::Discarded);
            };
            if let Err(e) = result {
                return Err(self.fail("remove", Some(article_id), e));
            }

            tracing::info!(article_id, "Article deleted");
            Ok(self.apply_confirmed("remove", article_id, |items, i| {
                items.remove(i);
            }))
        })
        .await
    }
}

type ItemLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// A registered per-id lock. Dropping the slot removes the map entry once
/// no other caller holds it, including when the owning future is cancelled.
struct ItemLockSlot<'a> {
    locks: &'a ItemLocks,
    id: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> ItemLockSlot<'a> {
    fn acquire(locks: &'a ItemLocks, id: &str) -> Self {
        let handle = lock(locks).entry(id.to_owned()).or_default().clone();
        Self {
            locks,
            id: id.to_owned(),
            lock: handle,
        }
    }
}

impl Drop for ItemLockSlot<'_> {
    fn drop(&mut self) {
        let mut locks = lock(self.locks);
        // Map entry + ours: nobody else is waiting on this id.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.id);
        }
    }
}

/// Wrap items in `Arc`, keeping only the first entry for each id.
fn dedupe<T: Keyed>(list: &'static str, items: Vec<T>) -> Vec<Arc<T>> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.id().to_owned()) {
            unique.push(Arc::new(item));
        } else {
            tracing::warn!(list, id = %item.id(), "Dropping duplicate id from server response");
        }
    }
    unique
}
