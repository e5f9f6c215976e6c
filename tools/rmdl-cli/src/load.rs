//! Load command - resolve and load a model through the model cache

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rmdl_runtime::{CacheConfig, ModelCache};

/// Arguments for the load command
#[derive(Args)]
pub struct LoadArgs {
    /// Asset root; the model is read from `<root>/<models_dir>/<base>_<LE|BE>.<ext>`
    pub root: PathBuf,

    /// Model base name, e.g. `crate` for `models/crate_LE.rmdl`
    pub base: String,

    /// Cache key (default: the base name)
    #[arg(long)]
    pub key: Option<String>,

    /// Cache configuration file (TOML, `[cache]` section)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the load command
pub fn execute(args: LoadArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => CacheConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => CacheConfig::default(),
    };
    let key = args.key.unwrap_or_else(|| args.base.clone());
    tracing::debug!(root = %args.root.display(), models_dir = %config.models_dir.display(), "Cache config");

    let mut cache = ModelCache::with_root(&args.root, config);
    let path = args.root.join(cache.model_path(&args.base));
    println!("=== Load ===");
    println!("  File: {}", path.display());
    println!("  Key:  {key}");

    let model = cache
        .load_or_fetch(&args.base, &key)
        .with_context(|| format!("Failed to load model: {}", path.display()))?;
    println!(
        "  Loaded {} meshes, {} materials, {} bones, {} animations",
        model.meshes().len(),
        model.materials().len(),
        model.skeleton().num_bones(),
        model.num_animations()
    );
    let id = model.id();

    // Second request must come back from the cache
    let cached = cache.load_or_fetch(&args.base, &key)?;
    anyhow::ensure!(cached.id() == id, "Cache returned a different instance");
    println!("  Cached entries: {}", cache.len());

    cache.destroy();
    Ok(())
}
