//! Tree command - print the bone hierarchy

use std::fmt::Write;

use anyhow::Result;
use clap::Args;
use rmdl_runtime::Skeleton;

use crate::source::{ModelFileArgs, read_model};

/// Arguments for the tree command
#[derive(Args)]
pub struct TreeArgs {
    #[command(flatten)]
    pub source: ModelFileArgs,
}

/// Execute the tree command
pub fn execute(args: TreeArgs) -> Result<()> {
    let model = read_model(&args.source)?;
    print!("{}", render(model.skeleton())?);
    Ok(())
}

/// Indented hierarchy, root first. Parentless bones whose subtree does not
/// hold the root are printed afterwards as detached subtrees. A root that has
/// a parent is printed inside its ancestor's tree and marked.
pub fn render(skeleton: &Skeleton) -> Result<String> {
    let mut out = String::new();
    if skeleton.is_empty() {
        writeln!(out, "(no bones)")?;
        return Ok(out);
    }

    let root = skeleton.root_id();
    let root_top = root.map(|id| skeleton.top_of(id));
    for start in skeleton.top_level() {
        for (depth, bone) in skeleton.walk_from(start) {
            let marker = if Some(bone.id()) == root && depth > 0 {
                " (root)"
            } else if depth == 0 && Some(start) != root_top {
                " (detached)"
            } else {
                ""
            };
            writeln!(
                out,
                "{:indent$}[{}] {}{marker}",
                "",
                bone.index(),
                bone.name(),
                indent = depth * 2
            )?;
        }
    }
    Ok(out)
}
