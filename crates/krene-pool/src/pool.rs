// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The pool: deduplicated checkout, reference counting, and disposal.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use krene_core::pool::{Disposer, PoolError, PoolKey, PooledResource};
use tokio::sync::oneshot;

use crate::entry::EntryState;
use crate::lease::Lease;
use crate::stats::{PoolStats, PoolStatsSnapshot};

/// A pool of reference-counted resources, deduplicated by key.
///
/// The pool guarantees that at most one construction is in flight per key:
/// every checkout issued while an episode is pending awaits that episode's
/// shared outcome, and every checkout of a `Ready` entry is served
/// immediately. A resource is disposed exactly once, when its last
/// outstanding [`Lease`] is returned; checking the key out again afterwards
/// constructs it from scratch.
///
/// `ResourcePool` is a cheaply cloneable handle around shared internals.
/// It is an explicitly constructed, explicitly owned value: thread it
/// through whatever owns the lifetime (a renderer, a hub, a test) instead
/// of stashing it in process-wide state.
pub struct ResourcePool<K: PoolKey, R: PooledResource> {
    inner: Arc<PoolInner<K, R>>,
}

impl<K: PoolKey, R: PooledResource> ResourcePool<K, R> {
    /// Creates an empty pool with the default label.
    pub fn new() -> Self {
        Self::with_label("resources")
    }

    /// Creates an empty pool labelled for log output.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                label: label.into(),
                entries: Mutex::new(HashMap::new()),
                stats: PoolStats::default(),
            }),
        }
    }

    /// The pool's log label.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Checks out the resource identified by `key`, constructing it if
    /// absent.
    ///
    /// `factory` is the construction episode for the key: a future that
    /// produces the resource together with its [`Disposer`]. Futures are
    /// lazy, so passing one costs nothing unless this call is the one that
    /// starts construction; on a `Ready` hit or while another episode is
    /// already pending, the factory is dropped unpolled. A started episode
    /// runs on its own task: abandoning this call does not cancel it, and
    /// its outcome (resource or error) is shared by every concurrent
    /// checkout of the same key.
    ///
    /// On success the returned [`Lease`] holds exactly one reference to the
    /// entry; dropping it returns the reference.
    ///
    /// # Errors
    /// - [`PoolError::ConstructionFailed`] if the episode's factory fails.
    ///   The entry is removed, so a later checkout retries from scratch.
    /// - [`PoolError::ConstructionAborted`] if the factory task panicked or
    ///   was torn down before settling.
    pub async fn checkout<Fut>(&self, key: K, factory: Fut) -> Result<Lease<K, R>, PoolError>
    where
        Fut: Future<Output = anyhow::Result<(R, Disposer<R>)>> + Send + 'static,
    {
        let (outcome_rx, won) = {
            let mut entries = self.inner.lock_entries();
            self.inner.stats.record_checkout();
            match entries.entry(key.clone()) {
                MapEntry::Occupied(mut occupied) => match occupied.get_mut() {
                    EntryState::Ready { resource, refs, .. } => {
                        *refs += 1;
                        self.inner.stats.record_ready_hit();
                        return Ok(Lease::new(self.inner.clone(), key, resource.clone()));
                    }
                    EntryState::Pending { waiters } => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        self.inner.stats.record_coalesced_wait();
                        (rx, false)
                    }
                },
                MapEntry::Vacant(vacant) => {
                    let (tx, rx) = oneshot::channel();
                    vacant.insert(EntryState::Pending { waiters: vec![tx] });
                    self.inner.stats.record_construction();
                    (rx, true)
                }
            }
        };

        if won {
            log::debug!(
                "pool '{}': starting construction for key {:?}",
                self.inner.label,
                key
            );
            self.inner.clone().drive_construction(key.clone(), factory);
        }

        match outcome_rx.await {
            Ok(outcome) => outcome,
            // The settling task never drops a registered waiter without
            // sending; a lost sender means the runtime tore the episode
            // down mid-settle.
            Err(_) => Err(PoolError::construction_aborted(
                &key,
                "construction task dropped before settling",
            )),
        }
    }

    /// Returns one reference for `key`, disposing the resource if it was
    /// the last.
    ///
    /// This is the raw counterpart to dropping a [`Lease`], for callers
    /// that took over the obligation via [`Lease::detach`]. It never
    /// suspends; disposal runs synchronously on this call stack.
    ///
    /// # Errors
    /// - [`PoolError::UnknownResource`] if `key` has no live checked-out
    ///   entry, meaning a double return or a return of something never
    ///   checked out. This is reported loudly rather than ignored, since ignoring
    ///   it would mask refcounting bugs.
    /// - [`PoolError::DisposeFailed`] if this was the last reference and
    ///   the disposer failed. The entry is removed regardless; disposal is
    ///   not retried.
    pub fn release(&self, key: &K) -> Result<(), PoolError> {
        self.inner.release_ref(key)
    }

    /// Returns one reference for `key` if it has a live entry; does
    /// nothing otherwise.
    ///
    /// The teardown-path variant of [`release`](Self::release): shutdown
    /// code that may run before a resource was ever checked out, or after
    /// it was already drained, can call this without distinguishing those
    /// cases. Returns `true` if a reference was actually released.
    /// Disposal failures are logged, not returned.
    pub fn try_release(&self, key: &K) -> bool {
        match self.inner.release_ref(key) {
            Ok(()) => true,
            Err(PoolError::UnknownResource { .. }) => false,
            Err(err) => {
                // The reference was released and the entry removed; only
                // the disposer failed.
                log::error!("pool '{}': {err}", self.inner.label);
                true
            }
        }
    }

    /// The number of resident entries (pending and ready).
    pub fn len(&self) -> usize {
        self.inner.lock_entries().len()
    }

    /// Whether the pool has no resident entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock_entries().is_empty()
    }

    /// Whether `key` currently has an entry (pending or ready).
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock_entries().contains_key(key)
    }

    /// The live reference count for `key`, if it has a ready entry.
    pub fn ref_count(&self, key: &K) -> Option<u32> {
        match self.inner.lock_entries().get(key) {
            Some(EntryState::Ready { refs, .. }) => Some(*refs),
            _ => None,
        }
    }

    /// A snapshot of the pool's lifetime statistics.
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.inner.stats.snapshot()
    }

    #[cfg(test)]
    fn pending_waiter_count(&self, key: &K) -> usize {
        match self.inner.lock_entries().get(key) {
            Some(EntryState::Pending { waiters }) => waiters.len(),
            _ => 0,
        }
    }
}

impl<K: PoolKey, R: PooledResource> Clone for ResourcePool<K, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: PoolKey, R: PooledResource> Default for ResourcePool<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PoolKey, R: PooledResource> fmt::Debug for ResourcePool<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("label", &self.inner.label)
            .field("entries", &self.len())
            .finish()
    }
}

/// Shared pool internals. Leases hold an `Arc` to this, so the bookkeeping
/// outlives the last `ResourcePool` handle for as long as references are
/// outstanding.
pub(crate) struct PoolInner<K: PoolKey, R: PooledResource> {
    pub(crate) label: String,
    entries: Mutex<HashMap<K, EntryState<K, R>>>,
    stats: PoolStats,
}

impl<K: PoolKey, R: PooledResource> PoolInner<K, R> {
    /// The entry lock covers bookkeeping only (lookup, insert, waiter
    /// registration, refcount mutation, removal). Construction and disposal
    /// both run outside it.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<K, EntryState<K, R>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a construction episode to completion and settles its entry.
    ///
    /// The factory runs on its own task so that a panicking construction
    /// cannot strand the entry's waiters and an abandoned caller cannot
    /// cancel work other waiters are counting on. The settling task owns
    /// the episode's one transition: `Pending` becomes `Ready` on success
    /// and is removed on failure.
    fn drive_construction<Fut>(self: Arc<Self>, key: K, factory: Fut)
    where
        Fut: Future<Output = anyhow::Result<(R, Disposer<R>)>> + Send + 'static,
    {
        let inner = self;
        let episode = tokio::spawn(factory);
        tokio::spawn(async move {
            let outcome = match episode.await {
                Ok(Ok(built)) => Ok(built),
                Ok(Err(err)) => Err(PoolError::construction_failed(&key, err)),
                Err(join_err) => Err(PoolError::construction_aborted(&key, join_err.to_string())),
            };
            inner.settle(key, outcome);
        });
    }

    fn settle(self: Arc<Self>, key: K, outcome: Result<(R, Disposer<R>), PoolError>) {
        match outcome {
            Ok((resource, disposer)) => {
                let resource = Arc::new(resource);
                let waiters = {
                    let mut entries = self.lock_entries();
                    let Some(state) = entries.get_mut(&key) else {
                        log::error!(
                            "pool '{}': settle found no entry for key {:?}",
                            self.label,
                            key
                        );
                        return;
                    };
                    let EntryState::Pending { waiters } = state else {
                        log::error!(
                            "pool '{}': settle found key {:?} already settled",
                            self.label,
                            key
                        );
                        return;
                    };
                    let waiters = mem::take(waiters);
                    *state = EntryState::Ready {
                        resource: resource.clone(),
                        disposer,
                        refs: waiters.len() as u32,
                    };
                    waiters
                };
                log::debug!(
                    "pool '{}': key {:?} ready, delivering to {} waiter(s)",
                    self.label,
                    key,
                    waiters.len()
                );
                // Delivery happens outside the entry lock: a waiter that
                // has gone away drops its lease right here, and that drop
                // re-enters the lock to release the reference.
                for waiter in waiters {
                    let lease = Lease::new(self.clone(), key.clone(), resource.clone());
                    let _ = waiter.send(Ok(lease));
                }
            }
            Err(err) => {
                let waiters = {
                    let mut entries = self.lock_entries();
                    match entries.remove(&key) {
                        Some(EntryState::Pending { waiters }) => waiters,
                        Some(state) => {
                            log::error!(
                                "pool '{}': failed settle found key {:?} already settled",
                                self.label,
                                key
                            );
                            entries.insert(key.clone(), state);
                            return;
                        }
                        None => {
                            log::error!(
                                "pool '{}': failed settle found no entry for key {:?}",
                                self.label,
                                key
                            );
                            return;
                        }
                    }
                };
                self.stats.record_construction_failure();
                log::debug!(
                    "pool '{}': construction failed for key {:?}, notifying {} waiter(s): {err}",
                    self.label,
                    key,
                    waiters.len()
                );
                for waiter in waiters {
                    let _ = waiter.send(Err(err.clone()));
                }
            }
        }
    }

    /// Decrements the reference count for `key`, disposing on the 1 -> 0
    /// transition. See [`ResourcePool::release`] for the error contract.
    pub(crate) fn release_ref(&self, key: &K) -> Result<(), PoolError> {
        let drained = {
            let mut entries = self.lock_entries();
            let Some(EntryState::Ready { refs, .. }) = entries.get_mut(key) else {
                return Err(PoolError::unknown_resource(key));
            };
            // refs can only be 0 inside the settle delivery window, before
            // any lease for the entry exists; a release arriving then is a
            // stray return of something never checked out.
            if *refs == 0 {
                return Err(PoolError::unknown_resource(key));
            }
            *refs -= 1;
            if *refs == 0 {
                entries.remove(key)
            } else {
                None
            }
        };

        let Some(EntryState::Ready {
            resource, disposer, ..
        }) = drained
        else {
            return Ok(());
        };

        self.stats.record_disposal();
        log::debug!("pool '{}': disposing key {:?}", self.label, key);
        disposer.dispose(resource).map_err(|err| {
            self.stats.record_dispose_failure();
            PoolError::dispose_failed(key, err)
        })
    }
}

impl<K: PoolKey, R: PooledResource> Drop for PoolInner<K, R> {
    fn drop(&mut self) {
        let entries = self
            .entries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (key, state) in entries.drain() {
            match state {
                EntryState::Ready {
                    resource,
                    disposer,
                    refs,
                } => {
                    log::warn!(
                        "pool '{}': key {:?} still held {} reference(s) at pool teardown",
                        self.label,
                        key,
                        refs
                    );
                    if let Err(err) = disposer.dispose(resource) {
                        log::error!(
                            "pool '{}': disposing key {:?} at teardown failed: {err}",
                            self.label,
                            key
                        );
                    }
                }
                // Dropping the senders settles any still-live waiter with
                // a construction-aborted error.
                EntryState::Pending { .. } => {}
            }
        }
    }
}
