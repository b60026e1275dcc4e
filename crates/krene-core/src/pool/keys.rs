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

//! Concrete key types for the resource families the engine pools.

use serde::{Deserialize, Serialize};

/// Identifies a logical set of texture maps (albedo, normal, roughness...)
/// that are loaded and bound together.
///
/// The key names the "idea" of the texture set, decoupled from the physical
/// files backing it. Two checkouts with the same name share one GPU-side
/// binding regardless of which materials requested them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureSetKey(String);

impl TextureSetKey {
    /// Creates a key naming a texture set.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The texture set's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TextureSetKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identifies a compiled shader variant: a source path plus the ordered
/// list of preprocessor defines it was specialized with.
///
/// Equal keys mean an identical compiled module, so a pool deduplicates
/// variant compilations across every material that requests the same
/// combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderVariantKey {
    path: String,
    defines: Vec<(String, String)>,
}

impl ShaderVariantKey {
    /// Creates a key for `path` with no defines.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            defines: Vec::new(),
        }
    }

    /// Adds a preprocessor define to the variant.
    ///
    /// Define order is part of the identity; callers composing keys from
    /// unordered sources should sort before building the key.
    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((name.into(), value.into()));
        self
    }

    /// The shader source path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The variant's defines, in identity order.
    pub fn defines(&self) -> &[(String, String)] {
        &self.defines
    }
}
