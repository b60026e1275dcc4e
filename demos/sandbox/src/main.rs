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

// Krene Sandbox
// Main binary for testing and demos

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use krene_core::pool::{
    Disposer, PooledResource, ResourceLoader, ShaderVariantKey, TextureSetKey,
};
use krene_pool::ResourceHub;

const TEXTURE_SETS: &[&str] = &["grass", "rock", "sand"];
const HOT_KEY: &str = "grass";
const HOT_CHECKOUTS: usize = 8;

/// CPU-side stand-in for a set of decoded texture maps.
struct TextureSet {
    name: String,
    texels: Vec<u8>,
}
impl PooledResource for TextureSet {}

/// CPU-side stand-in for a compiled shader module.
struct ShaderVariant {
    entry_point: String,
    define_count: usize,
}
impl PooledResource for ShaderVariant {}

struct DemoTextureLoader;

#[async_trait]
impl ResourceLoader<TextureSetKey, TextureSet> for DemoTextureLoader {
    async fn load(&self, key: &TextureSetKey) -> Result<(TextureSet, Disposer<TextureSet>)> {
        log::info!("loading texture set '{}'", key.name());
        // Stand-in for decode + upload: derive a deterministic texel block
        // from the name.
        let texels = key
            .name()
            .bytes()
            .cycle()
            .take(64 * 64)
            .collect::<Vec<u8>>();
        let set = TextureSet {
            name: key.name().to_string(),
            texels,
        };
        let disposer = Disposer::new(|set: Arc<TextureSet>| {
            log::info!("releasing texture set '{}'", set.name);
            Ok(())
        });
        Ok((set, disposer))
    }
}

struct DemoShaderLoader;

#[async_trait]
impl ResourceLoader<ShaderVariantKey, ShaderVariant> for DemoShaderLoader {
    async fn load(&self, key: &ShaderVariantKey) -> Result<(ShaderVariant, Disposer<ShaderVariant>)> {
        log::info!("compiling shader variant '{}'", key.path());
        let variant = ShaderVariant {
            entry_point: "vs_main".to_string(),
            define_count: key.defines().len(),
        };
        Ok((variant, Disposer::noop()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let hub = Arc::new(ResourceHub::new());
    hub.register::<TextureSetKey, TextureSet>("textures", Arc::new(DemoTextureLoader));
    hub.register::<ShaderVariantKey, ShaderVariant>("shaders", Arc::new(DemoShaderLoader));

    // Many concurrent materials requesting the same hot texture set: one
    // load serves them all.
    let mut requests = Vec::new();
    for material in 0..HOT_CHECKOUTS {
        let hub = hub.clone();
        requests.push(tokio::spawn(async move {
            let lease = hub
                .checkout::<TextureSetKey, TextureSet>(TextureSetKey::new(HOT_KEY))
                .await?;
            log::info!(
                "material {material} bound '{}' ({} texels)",
                lease.name,
                lease.texels.len()
            );
            anyhow::Ok(lease)
        }));
    }
    let mut leases = Vec::new();
    for request in requests {
        leases.push(request.await??);
    }

    // The rest of the catalog, once each.
    for name in TEXTURE_SETS {
        let lease = hub
            .checkout::<TextureSetKey, TextureSet>(TextureSetKey::new(*name))
            .await?;
        leases.push(lease);
    }

    let skinned = hub
        .checkout::<ShaderVariantKey, ShaderVariant>(
            ShaderVariantKey::new("shaders/lit.slang").with_define("SKINNED", "1"),
        )
        .await?;
    log::info!(
        "shader '{}' ready with {} define(s)",
        skinned.entry_point,
        skinned.define_count
    );

    log::info!("hub before returns: {}", hub.describe());

    // Returning every lease drains the refcounts and triggers disposal of
    // each texture set exactly once.
    drop(skinned);
    leases.clear();

    log::info!("hub after returns: {}", hub.describe());

    if let Some(pool) = hub.pool::<TextureSetKey, TextureSet>() {
        let stats = pool.stats();
        log::info!(
            "texture pool: {} checkouts, {} constructions, {} disposals, dedup ratio {:.2}",
            stats.checkouts,
            stats.constructions,
            stats.disposals,
            stats.dedup_ratio
        );
    }

    Ok(())
}
