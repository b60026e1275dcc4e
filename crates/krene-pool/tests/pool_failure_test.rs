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

use anyhow::anyhow;
use krene_core::pool::{Disposer, PoolError, PooledResource};
use krene_pool::ResourcePool;
use tokio::sync::oneshot;

// --- DUMMY RESOURCE FOR THIS TEST ---
#[derive(Debug)]
struct ShaderVariant {
    entry_point: String,
}
impl PooledResource for ShaderVariant {}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn construction_failure_reaches_every_waiter_and_leaves_no_entry() {
    // --- 1. ARRANGE ---
    let pool: ResourcePool<String, ShaderVariant> = ResourcePool::with_label("shaders");
    let key = "lit.slang#SKINNED".to_string();
    let loads = Arc::new(AtomicUsize::new(0));
    let (gate_tx, gate_rx) = oneshot::channel::<()>();

    // First caller starts the episode; the factory holds at the gate so a
    // second caller can join before the failure lands.
    let first = tokio::spawn({
        let pool = pool.clone();
        let key = key.clone();
        let loads = loads.clone();
        async move {
            pool.checkout(key, async move {
                loads.fetch_add(1, Ordering::SeqCst);
                gate_rx.await.ok();
                Err(anyhow!("shader compilation failed: syntax error at line 5"))
            })
            .await
        }
    });
    while !pool.contains(&key) {
        tokio::task::yield_now().await;
    }

    let second = tokio::spawn({
        let pool = pool.clone();
        let key = key.clone();
        async move {
            pool.checkout(key, async move { panic!("episode already pending") })
                .await
        }
    });
    while pool.stats().coalesced_waits < 1 {
        tokio::task::yield_now().await;
    }

    // --- 2. ACT ---
    gate_tx.send(()).expect("factory is waiting on the gate");
    let first_err = first.await.unwrap().unwrap_err();
    let second_err = second.await.unwrap().unwrap_err();

    // --- 3. ASSERT ---
    // Both waiters observe the same construction failure.
    for err in [&first_err, &second_err] {
        assert!(matches!(err, PoolError::ConstructionFailed { .. }));
        assert!(err.to_string().contains("syntax error at line 5"));
    }

    // No poisoned entry remains: the key is absent, and a now-succeeding
    // factory builds it from scratch.
    assert!(!pool.contains(&key));
    let lease = pool
        .checkout(key.clone(), async move {
            Ok((
                ShaderVariant {
                    entry_point: "vs_main".to_string(),
                },
                Disposer::noop(),
            ))
        })
        .await
        .expect("retry after failure should succeed");
    assert_eq!(lease.entry_point, "vs_main");
    assert_eq!(loads.load(Ordering::SeqCst), 1, "failed episode ran once");

    let stats = pool.stats();
    assert_eq!(stats.constructions, 2);
    assert_eq!(stats.construction_failures, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_factory_aborts_the_episode_without_stranding_waiters() {
    // --- 1. ARRANGE ---
    let pool: ResourcePool<String, ShaderVariant> = ResourcePool::with_label("shaders");
    let key = "lit.slang".to_string();

    // --- 2. ACT ---
    let err = pool
        .checkout(key.clone(), async move {
            panic!("loader bug");
        })
        .await
        .unwrap_err();

    // --- 3. ASSERT ---
    assert!(matches!(err, PoolError::ConstructionAborted { .. }));
    assert!(!pool.contains(&key), "aborted episode must not leave an entry");

    // The key is still usable afterwards.
    let lease = pool
        .checkout(key.clone(), async move {
            Ok((
                ShaderVariant {
                    entry_point: "fs_main".to_string(),
                },
                Disposer::noop(),
            ))
        })
        .await
        .expect("checkout after aborted episode should succeed");
    assert_eq!(lease.entry_point, "fs_main");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn double_release_fails_loudly_and_try_release_stays_quiet() {
    // --- 1. ARRANGE ---
    let pool: ResourcePool<String, ShaderVariant> = ResourcePool::with_label("shaders");
    let key = "unlit.slang".to_string();

    let lease = pool
        .checkout(key.clone(), async move {
            Ok((
                ShaderVariant {
                    entry_point: "vs_main".to_string(),
                },
                Disposer::noop(),
            ))
        })
        .await
        .expect("checkout should succeed");

    // --- 2. ACT ---
    let _shared = lease.detach();
    pool.release(&key).expect("first release pays the debt");

    // --- 3. ASSERT ---
    // A second return of the same reference is a caller bug and must not
    // be silently ignored.
    assert!(matches!(
        pool.release(&key),
        Err(PoolError::UnknownResource { .. })
    ));
    // A key that was never checked out is just as unknown.
    assert!(matches!(
        pool.release(&"never-seen.slang".to_string()),
        Err(PoolError::UnknownResource { .. })
    ));

    // The teardown variant reports the same situations as a no-op.
    assert!(!pool.try_release(&key));
    assert!(!pool.try_release(&"never-seen.slang".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dispose_failure_propagates_but_bookkeeping_is_cleaned_up() {
    // --- 1. ARRANGE ---
    let pool: ResourcePool<String, ShaderVariant> = ResourcePool::with_label("shaders");
    let key = "post.slang".to_string();

    let lease = pool
        .checkout(key.clone(), async move {
            let disposer = Disposer::new(|_| Err(anyhow!("device lost")));
            Ok((
                ShaderVariant {
                    entry_point: "cs_main".to_string(),
                },
                disposer,
            ))
        })
        .await
        .expect("checkout should succeed");

    // --- 2. ACT ---
    let err = lease.release().unwrap_err();

    // --- 3. ASSERT ---
    assert!(matches!(err, PoolError::DisposeFailed { .. }));
    assert!(err.to_string().contains("device lost"));
    // The entry is gone despite the failed disposer; disposal is never
    // retried.
    assert!(!pool.contains(&key));
    assert_eq!(pool.stats().dispose_failures, 1);
}
