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

//! Per-key bookkeeping for a pool's entry map.

use std::sync::Arc;

use krene_core::pool::{Disposer, PoolError, PoolKey, PooledResource};
use tokio::sync::oneshot;

use crate::lease::Lease;

/// The channel end a registered waiter receives its checkout outcome on.
///
/// Successful episodes deliver a ready-made [`Lease`]; if the waiter has
/// gone away by delivery time, the undeliverable lease is dropped on the
/// spot and its reference released, so an abandoned checkout can never leak
/// a refcount.
pub(crate) type Delivery<K, R> = oneshot::Sender<Result<Lease<K, R>, PoolError>>;

/// The state of one key's entry. Exactly one entry exists per distinct key
/// at any time, owned exclusively by the pool's entry map.
pub(crate) enum EntryState<K: PoolKey, R: PooledResource> {
    /// A construction episode is in flight. Every checkout issued while in
    /// this state joins `waiters` and observes the episode's one outcome.
    Pending {
        /// Outcome channels of the episode's waiters, in arrival order.
        waiters: Vec<Delivery<K, R>>,
    },
    /// The resource is constructed and checked out `refs` times.
    Ready {
        /// The constructed value handed to callers.
        resource: Arc<R>,
        /// Release callback, invoked exactly once when `refs` reaches zero.
        disposer: Disposer<R>,
        /// Live reference count. The entry is removed on the 1 -> 0
        /// transition, never while references remain.
        refs: u32,
    },
}
