use anyhow::{Context, Result};
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

// Loose game data (2DA tables, templates) in ./assets is bundled next to the
// build output, where `EngineConfig::default` looks for it.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.is_dir() {
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[&assets_src], &out_dir, &copy_options)
        .with_context(|| format!("copying {} to {}", assets_src.display(), out_dir))?;

    Ok(())
}
