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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use krene_core::pool::{Disposer, PooledResource};
use krene_pool::ResourcePool;

// --- DUMMY RESOURCE FOR THIS TEST ---
#[derive(Debug)]
struct TextureSet {
    name: String,
}
impl PooledResource for TextureSet {}

fn factory(
    name: &str,
    loads: &Arc<AtomicUsize>,
    disposals: &Arc<AtomicUsize>,
) -> impl std::future::Future<Output = anyhow::Result<(TextureSet, Disposer<TextureSet>)>> {
    let name = name.to_string();
    let loads = loads.clone();
    let disposals = disposals.clone();
    async move {
        loads.fetch_add(1, Ordering::SeqCst);
        let disposer = Disposer::new(move |_| {
            disposals.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        Ok((TextureSet { name }, disposer))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn n_checkouts_need_n_returns_before_disposal() {
    // --- 1. ARRANGE ---
    let pool: ResourcePool<String, TextureSet> = ResourcePool::with_label("textures");
    let loads = Arc::new(AtomicUsize::new(0));
    let disposals = Arc::new(AtomicUsize::new(0));
    let key = "grass-albedo".to_string();

    // --- 2. ACT ---
    // Check the same key out three times, sequentially.
    let mut leases = Vec::new();
    for _ in 0..3 {
        let lease = pool
            .checkout(key.clone(), factory("grass-albedo", &loads, &disposals))
            .await
            .expect("checkout should succeed");
        leases.push(lease);
    }

    // --- 3. ASSERT ---
    assert_eq!(loads.load(Ordering::SeqCst), 1, "one construction episode");
    assert_eq!(pool.ref_count(&key), Some(3));
    assert_eq!(leases[0].name, "grass-albedo");

    // Returning all but the last reference must not dispose.
    leases.pop();
    leases.pop();
    assert_eq!(disposals.load(Ordering::SeqCst), 0);
    assert_eq!(pool.ref_count(&key), Some(1));

    // The final return disposes exactly once and removes the entry.
    leases.pop();
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert!(!pool.contains(&key));
    assert!(pool.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn drained_key_is_reconstructed_on_next_checkout() {
    // --- 1. ARRANGE ---
    let pool: ResourcePool<String, TextureSet> = ResourcePool::with_label("textures");
    let loads = Arc::new(AtomicUsize::new(0));
    let disposals = Arc::new(AtomicUsize::new(0));
    let key = "rock-normal".to_string();

    // --- 2. ACT ---
    // First generation: checkout and drain to zero.
    let first = pool
        .checkout(key.clone(), factory("rock-normal", &loads, &disposals))
        .await
        .expect("first checkout should succeed");
    drop(first);

    // Second generation: the key must be built from scratch, not served
    // from a stale cache.
    let second = pool
        .checkout(key.clone(), factory("rock-normal", &loads, &disposals))
        .await
        .expect("second checkout should succeed");

    // --- 3. ASSERT ---
    assert_eq!(loads.load(Ordering::SeqCst), 2, "two construction episodes");
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert_eq!(pool.ref_count(&key), Some(1));

    drop(second);
    assert_eq!(disposals.load(Ordering::SeqCst), 2);

    let stats = pool.stats();
    assert_eq!(stats.constructions, 2);
    assert_eq!(stats.disposals, 2);
    assert_eq!(stats.deduplicated, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn explicit_release_surfaces_the_detached_contract() {
    // --- 1. ARRANGE ---
    let pool: ResourcePool<String, TextureSet> = ResourcePool::with_label("textures");
    let loads = Arc::new(AtomicUsize::new(0));
    let disposals = Arc::new(AtomicUsize::new(0));
    let key = "sand-albedo".to_string();

    let lease = pool
        .checkout(key.clone(), factory("sand-albedo", &loads, &disposals))
        .await
        .expect("checkout should succeed");

    // --- 2. ACT ---
    // Detach hands the reference obligation to the caller.
    let shared = lease.detach();
    assert_eq!(shared.name, "sand-albedo");
    assert_eq!(pool.ref_count(&key), Some(1), "detach must not release");

    // The caller pays its debt through the raw release path.
    pool.release(&key).expect("release should succeed");

    // --- 3. ASSERT ---
    assert!(!pool.contains(&key));
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    // The detached Arc keeps the value alive past entry disposal.
    assert_eq!(shared.name, "sand-albedo");
}
