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

//! # Krene Pool
//!
//! Reference-counted, deduplicating checkout/return pools.
//!
//! A [`ResourcePool`] maps a deduplication key to a lazily-constructed,
//! asynchronously-loaded, reference-counted resource. At most one
//! construction is ever in flight per key; concurrent requesters share the
//! in-flight episode's outcome, and the underlying resource is released
//! only when its last reference is returned.
//!
//! Checkouts yield a [`Lease`], an RAII handle that returns its reference
//! automatically on drop. The [`ResourceHub`] layers a typed, loader-driven
//! registry over per-type pools.

#![warn(missing_docs)]

mod entry;
mod hub;
mod lease;
mod pool;
mod stats;

pub use hub::ResourceHub;
pub use lease::Lease;
pub use pool::ResourcePool;
pub use stats::PoolStatsSnapshot;
