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

//! The RAII handle returned by a successful checkout.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use krene_core::pool::{PoolError, PoolKey, PooledResource};

use crate::pool::PoolInner;

/// A checked-out reference to a pooled resource.
///
/// Each lease represents exactly one reference in its entry's count.
/// Dropping the lease returns that reference; when the last lease for a key
/// is returned, the pool removes the entry and runs its disposer. This
/// makes the common case safe by construction: a lease cannot be returned
/// twice, and forgetting to return it is only possible by explicitly
/// [`detach`](Lease::detach)ing.
///
/// A lease dereferences to the resource. The resource itself is shared
/// behind an [`Arc`], so reads are cheap; whatever internal mutability the
/// resource offers is governed by its own thread-safety contract, not by
/// the pool.
pub struct Lease<K: PoolKey, R: PooledResource> {
    inner: Arc<PoolInner<K, R>>,
    key: K,
    resource: Arc<R>,
    returned: bool,
}

impl<K: PoolKey, R: PooledResource> Lease<K, R> {
    pub(crate) fn new(inner: Arc<PoolInner<K, R>>, key: K, resource: Arc<R>) -> Self {
        Self {
            inner,
            key,
            resource,
            returned: false,
        }
    }

    /// The key this lease was checked out under.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The shared reference to the underlying resource.
    pub fn resource(&self) -> &Arc<R> {
        &self.resource
    }

    /// Returns the lease's reference explicitly, surfacing disposal errors.
    ///
    /// Equivalent to dropping the lease, except that a failing disposer is
    /// reported to the caller as [`PoolError::DisposeFailed`] instead of
    /// being logged. The entry's bookkeeping is cleaned up either way.
    pub fn release(mut self) -> Result<(), PoolError> {
        self.returned = true;
        self.inner.release_ref(&self.key)
    }

    /// Detaches the resource from the lease without returning its
    /// reference.
    ///
    /// The caller takes over the return obligation: the reference now leaks
    /// unless [`ResourcePool::release`](crate::ResourcePool::release) is
    /// eventually called with this lease's key. This is the raw path for
    /// callers that cannot tie the reference to a scope.
    pub fn detach(mut self) -> Arc<R> {
        self.returned = true;
        self.resource.clone()
    }
}

impl<K: PoolKey, R: PooledResource> Deref for Lease<K, R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl<K: PoolKey, R: PooledResource> Drop for Lease<K, R> {
    fn drop(&mut self) {
        if self.returned {
            return;
        }
        // Disposal failures have no caller to land on here; use
        // Lease::release to observe them.
        if let Err(err) = self.inner.release_ref(&self.key) {
            log::error!(
                "pool '{}': releasing dropped lease failed: {err}",
                self.inner.label
            );
        }
    }
}

impl<K: PoolKey, R: PooledResource> fmt::Debug for Lease<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("key", &self.key)
            .field("pool", &self.inner.label)
            .finish_non_exhaustive()
    }
}
