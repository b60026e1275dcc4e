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

//! Defines the hierarchy of error types for the pooling subsystem.

use std::fmt;
use std::sync::Arc;

/// An error produced between checkout and return of a pooled resource.
///
/// Construction failures are shared by every waiter of the failed episode,
/// so the variants carrying a source error hold it behind an `Arc` and the
/// whole enum is cheaply cloneable.
#[derive(Debug, Clone)]
pub enum PoolError {
    /// The factory for a construction episode returned an error.
    ///
    /// The entry has been removed from the pool; a subsequent checkout of
    /// the same key retries construction from scratch.
    ConstructionFailed {
        /// Debug rendering of the key whose construction failed.
        key: String,
        /// The factory's error, shared across all waiters of the episode.
        source: Arc<anyhow::Error>,
    },
    /// The factory task ended without producing an outcome (it panicked or
    /// its runtime was shut down mid-construction).
    ConstructionAborted {
        /// Debug rendering of the key whose construction was aborted.
        key: String,
        /// Description of how the task ended.
        details: String,
    },
    /// A release was requested for a key with no live checked-out entry.
    ///
    /// This is a caller error: either the resource was never checked out,
    /// or it has already been returned. It is reported loudly because
    /// silently ignoring it would mask reference-counting bugs that lead to
    /// premature disposal or permanent leaks.
    UnknownResource {
        /// Debug rendering of the unrecognized key.
        key: String,
    },
    /// The disposer reported a failure while releasing the underlying
    /// resource.
    ///
    /// The entry's bookkeeping has still been cleaned up; disposal is not
    /// retried.
    DisposeFailed {
        /// Debug rendering of the key whose disposal failed.
        key: String,
        /// The disposer's error.
        source: Arc<anyhow::Error>,
    },
}

impl PoolError {
    /// Builds a [`PoolError::ConstructionFailed`] for `key`.
    pub fn construction_failed(key: &impl fmt::Debug, source: anyhow::Error) -> Self {
        Self::ConstructionFailed {
            key: format!("{key:?}"),
            source: Arc::new(source),
        }
    }

    /// Builds a [`PoolError::ConstructionAborted`] for `key`.
    pub fn construction_aborted(key: &impl fmt::Debug, details: impl Into<String>) -> Self {
        Self::ConstructionAborted {
            key: format!("{key:?}"),
            details: details.into(),
        }
    }

    /// Builds a [`PoolError::UnknownResource`] for `key`.
    pub fn unknown_resource(key: &impl fmt::Debug) -> Self {
        Self::UnknownResource {
            key: format!("{key:?}"),
        }
    }

    /// Builds a [`PoolError::DisposeFailed`] for `key`.
    pub fn dispose_failed(key: &impl fmt::Debug, source: anyhow::Error) -> Self {
        Self::DisposeFailed {
            key: format!("{key:?}"),
            source: Arc::new(source),
        }
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::ConstructionFailed { key, source } => {
                write!(f, "Construction failed for key {key}: {source}")
            }
            PoolError::ConstructionAborted { key, details } => {
                write!(f, "Construction aborted for key {key}: {details}")
            }
            PoolError::UnknownResource { key } => {
                write!(
                    f,
                    "No checked-out resource for key {key} (double return or never checked out)"
                )
            }
            PoolError::DisposeFailed { key, source } => {
                write!(f, "Disposal failed for key {key}: {source}")
            }
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::ConstructionFailed { source, .. }
            | PoolError::DisposeFailed { source, .. } => {
                let source: &(dyn std::error::Error + 'static) = source.as_ref().as_ref();
                Some(source)
            }
            _ => None,
        }
    }
}
