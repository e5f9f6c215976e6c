//! rmdl - inspect .rmdl model files
//!
//! # Commands
//!
//! - `rmdl info <file>` - Header, meshes, materials and animations
//! - `rmdl tree <file>` - Bone hierarchy
//! - `rmdl load <root> <base>` - Load through the model cache using the
//!   platform path (`<root>/models/<base>_LE.rmdl` on little-endian targets)
//!
//! Set `RUST_LOG=debug` to see cache and construction logging.

mod info;
mod load;
mod source;
mod tree;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// rmdl - model file inspector
#[derive(Parser)]
#[command(name = "rmdl")]
#[command(about = "Inspect .rmdl model files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header, meshes, materials and animations
    Info(info::InfoArgs),

    /// Print the bone hierarchy
    Tree(tree::TreeArgs),

    /// Load a model through the model cache
    Load(load::LoadArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info(args) => info::execute(args),
        Commands::Tree(args) => tree::execute(args),
        Commands::Load(args) => load::execute(args),
    }
}
