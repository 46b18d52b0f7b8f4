/* src/cli/core/src/clean.rs */

// `extbuild clean` command: removes build output, artifacts and the build cache.

use std::path::Path;

use anyhow::Result;

use crate::build::fs::remove_dir_if_exists;
use crate::config::ExtbuildConfig;
use crate::ui;

pub fn run_clean(config: &ExtbuildConfig, base_dir: &Path) -> Result<()> {
  ui::arrow("cleaning project");
  let build = &config.build;
  for dir in [&build.out_dir, &build.artifacts_dir, &build.cache_dir] {
    let path = base_dir.join(dir);
    if remove_dir_if_exists(&path)? {
      ui::detail(&format!("deleted {}", path.display()));
    }
  }
  ui::ok("clean complete");
  Ok(())
}
