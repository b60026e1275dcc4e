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

//! Provides the foundational traits and primitive types for Krene's
//! resource pooling system.
//!
//! This module defines the "common language" for all pooling operations. It
//! contains the core contracts that other crates implement or consume, but
//! it has no knowledge of how pools store entries or drive construction.
//!
//! The key components are:
//! - The [`PooledResource`] trait: a marker for all types that can live in
//!   a pool.
//! - The [`PoolKey`] trait: the deduplication identity a pool caches by.
//! - The [`ResourceLoader`] trait: an asynchronous, key-driven constructor.
//! - The [`Disposer`] type: the release callback paired with a constructed
//!   resource.
//! - The [`PoolError`] hierarchy for everything that can go wrong between
//!   checkout and return.
//!
//! These low-level primitives are the foundation upon which the pool
//! implementation itself is built in the `krene-pool` crate.

mod disposer;
mod error;
mod keys;
mod loader;

pub use disposer::*;
pub use error::*;
pub use keys::*;
pub use loader::*;

use std::fmt::Debug;
use std::hash::Hash;

/// A marker trait for types that can be managed by a resource pool.
///
/// This trait's primary purpose is to categorize a type, making it eligible
/// for use within the pooling infrastructure (e.g., behind a checkout
/// lease).
///
/// The supertraits enforce critical safety guarantees:
/// - `Send` + `Sync`: the resource can be safely shared between the tasks
///   that checked it out and the task driving its construction.
/// - `'static`: the resource does not contain any non-static references,
///   ensuring it can be retained for as long as references to it exist.
///
/// # Examples
///
/// ```
/// use krene_core::pool::PooledResource;
///
/// // A CPU-side stand-in for a set of texture maps.
/// struct TextureSet {
///     // ... fields
/// }
///
/// // By implementing PooledResource, `TextureSet` can now be pooled.
/// impl PooledResource for TextureSet {}
/// ```
pub trait PooledResource: Send + Sync + 'static {}

/// The deduplication identity a pool caches resources by.
///
/// Two checkouts with equal keys refer to the same logical resource and are
/// served from the same entry. Keys are cloned into the pool's bookkeeping
/// and into spawned construction tasks, and appear in log output and error
/// messages via their `Debug` representation.
///
/// This is a trait alias: any type with the required capabilities is a
/// valid key, including plain `String`s and the engine key types in this
/// module.
pub trait PoolKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> PoolKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
