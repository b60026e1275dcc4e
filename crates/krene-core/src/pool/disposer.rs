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

//! The release callback paired with a constructed resource.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

/// An opaque callback capturing how to release a pooled resource once its
/// last reference has been returned.
///
/// A disposer is supplied by the factory together with the resource it
/// releases. The two are deliberately separate values: the usable resource
/// is not always the owning object (a GPU binding handed to callers may be
/// a view into a larger allocation that the disposer tears down).
///
/// Disposal is synchronous and fallible. The pool invokes a disposer
/// exactly once, after the reference count for its entry has returned to
/// zero, passing in the pool's final shared reference to the resource.
pub struct Disposer<R> {
    release: Box<dyn FnOnce(Arc<R>) -> Result<()> + Send + 'static>,
}

impl<R> Disposer<R> {
    /// Wraps a release callback.
    ///
    /// The callback receives the pool's last `Arc` to the resource. If the
    /// caller contract was honored, that is the only strong reference left
    /// and the callback may unwrap it; detached references may still be
    /// alive, in which case the underlying value outlives disposal of the
    /// pool entry.
    pub fn new(release: impl FnOnce(Arc<R>) -> Result<()> + Send + 'static) -> Self {
        Self {
            release: Box::new(release),
        }
    }

    /// A disposer that does nothing.
    ///
    /// Suitable for resources whose teardown is fully covered by their
    /// `Drop` implementation.
    pub fn noop() -> Self {
        Self::new(|_| Ok(()))
    }

    /// Consumes the disposer and releases the resource.
    pub fn dispose(self, resource: Arc<R>) -> Result<()> {
        (self.release)(resource)
    }
}

impl<R> fmt::Debug for Disposer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer").finish_non_exhaustive()
    }
}
