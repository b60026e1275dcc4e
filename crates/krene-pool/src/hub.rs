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

//! A typed registry of pools, one per `(key, resource)` pair, each bound
//! to the loader that constructs its resources.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};
use krene_core::pool::{PoolKey, PooledResource, ResourceLoader};

use crate::lease::Lease;
use crate::pool::ResourcePool;

/// One registered `(key, resource)` pair: its pool and its loader.
struct HubSlot<K: PoolKey, R: PooledResource> {
    pool: ResourcePool<K, R>,
    loader: Arc<dyn ResourceLoader<K, R>>,
}

/// Type-erased view of a slot, for bookkeeping that spans resource types.
trait PoolSlot: Send + Sync {
    fn describe(&self) -> String;
    fn as_any(&self) -> &dyn Any;
}

impl<K: PoolKey, R: PooledResource> PoolSlot for HubSlot<K, R> {
    fn describe(&self) -> String {
        let stats = self.pool.stats();
        format!(
            "{}: entries={} checkouts={} deduplicated={}",
            self.pool.label(),
            self.pool.len(),
            stats.checkouts,
            stats.deduplicated
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A registry of resource pools, keyed by `(key, resource)` type pair.
///
/// The hub is the facade the rest of an application talks to: each
/// resource family registers a loader once, and every checkout afterwards
/// routes through the pool bound to that family. Pools for distinct
/// families are fully independent: a slow texture load never blocks a
/// shader checkout.
///
/// The hub is an explicitly owned value; share it by reference or behind
/// an `Arc` as the owning system dictates.
#[derive(Default)]
pub struct ResourceHub {
    slots: Mutex<HashMap<TypeId, Box<dyn PoolSlot>>>,
}

impl ResourceHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<TypeId, Box<dyn PoolSlot>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a loader for the `(K, R)` family, creating its pool.
    ///
    /// `label` names the pool in log output and [`describe`](Self::describe)
    /// lines. Registering a family twice replaces the previous slot; any
    /// leases checked out of the old pool remain valid and keep their own
    /// bookkeeping alive until returned.
    pub fn register<K: PoolKey, R: PooledResource>(
        &self,
        label: &str,
        loader: Arc<dyn ResourceLoader<K, R>>,
    ) {
        let slot = HubSlot {
            pool: ResourcePool::with_label(label),
            loader,
        };
        let previous = self
            .lock_slots()
            .insert(TypeId::of::<HubSlot<K, R>>(), Box::new(slot));
        if previous.is_some() {
            log::warn!("hub: loader for pool '{label}' replaced an existing registration");
        }
    }

    /// Checks out the resource identified by `key` through the registered
    /// loader for `(K, R)`.
    ///
    /// # Errors
    /// Fails if no loader is registered for the family, or with the
    /// underlying pool error (construction failure, aborted episode).
    pub async fn checkout<K: PoolKey, R: PooledResource>(&self, key: K) -> Result<Lease<K, R>> {
        let (pool, loader) = self.slot::<K, R>().ok_or_else(|| {
            anyhow!(
                "No loader registered for {} keyed by {}",
                type_name::<R>(),
                type_name::<K>()
            )
        })?;

        let factory = {
            let key = key.clone();
            async move { loader.load(&key).await }
        };
        let lease = pool.checkout(key, factory).await?;
        Ok(lease)
    }

    /// The pool registered for `(K, R)`, if any.
    pub fn pool<K: PoolKey, R: PooledResource>(&self) -> Option<ResourcePool<K, R>> {
        self.slot::<K, R>().map(|(pool, _)| pool)
    }

    /// The number of registered `(key, resource)` families.
    pub fn type_count(&self) -> usize {
        self.lock_slots().len()
    }

    /// A one-line status summary across every registered pool.
    pub fn describe(&self) -> String {
        let slots = self.lock_slots();
        let mut lines: Vec<String> = slots.values().map(|slot| slot.describe()).collect();
        lines.sort();
        format!("pools={} [{}]", slots.len(), lines.join("; "))
    }

    fn slot<K: PoolKey, R: PooledResource>(
        &self,
    ) -> Option<(ResourcePool<K, R>, Arc<dyn ResourceLoader<K, R>>)> {
        let slots = self.lock_slots();
        let slot = slots.get(&TypeId::of::<HubSlot<K, R>>())?;
        let slot = slot.as_any().downcast_ref::<HubSlot<K, R>>()?;
        Some((slot.pool.clone(), slot.loader.clone()))
    }
}

impl fmt::Debug for ResourceHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHub")
            .field("registered", &self.type_count())
            .finish()
    }
}
