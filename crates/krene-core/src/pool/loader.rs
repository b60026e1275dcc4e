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

//! The asynchronous, key-driven constructor interface.

use async_trait::async_trait;

use super::{Disposer, PoolKey, PooledResource};

/// A trait for types that can construct a specific kind of pooled resource
/// from its key.
///
/// Implementors are responsible for the potentially slow work of fetching
/// source data and building an engine-ready resource (e.g., reading a
/// texture set from disk and creating its GPU binding). A pool invokes a
/// loader at most once per construction episode, on a dedicated task, so
/// implementations may block on I/O futures freely without stalling
/// checkouts of unrelated keys.
///
/// Each `ResourceLoader` is specialized for a single `(key, resource)`
/// pair.
#[async_trait]
pub trait ResourceLoader<K: PoolKey, R: PooledResource>: Send + Sync {
    /// Constructs the resource identified by `key`.
    ///
    /// # Parameters
    /// - `key`: the identity of the resource to construct.
    ///
    /// # Returns
    /// A `Result` containing the constructed resource together with the
    /// [`Disposer`] that releases it, or the construction error that will
    /// be propagated to every waiter of the episode.
    async fn load(&self, key: &K) -> anyhow::Result<(R, Disposer<R>)>;
}
