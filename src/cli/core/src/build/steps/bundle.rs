/* src/cli/core/src/build/steps/bundle.rs */

use std::path::Path;

use anyhow::{Context, Result};

use crate::build::context::TargetContext;
use crate::build::fs::{blocking, copy_tree, has_extension, list_files, write_file, write_json};
use crate::define::inline_script;
use crate::env::EnvironmentMap;
use crate::shell::run_command;

pub(crate) const JS_DIR: &str = "js";
pub(crate) const DEFINE_FILE: &str = "define.json";

/// Bundle (or copy) the scripts, then inline the build constants into every emitted `.js`.
pub(crate) async fn run(ctx: &TargetContext) -> Result<()> {
  let dest = ctx.out_dir.join(JS_DIR);
  let define_path = ctx.cache_dir.join(DEFINE_FILE);
  {
    let env = ctx.env.clone();
    let define_path = define_path.clone();
    blocking(move || write_json(&define_path, &env)).await?;
  }

  if let Some(command) = ctx.session.config.build.bundler_command.as_deref() {
    let mut env = ctx.command_env();
    env.push(("EXTBUILD_OUT_DIR", dest.to_string_lossy().to_string()));
    env.push(("EXTBUILD_DEFINE", define_path.to_string_lossy().to_string()));
    let env: Vec<(&str, &str)> = env.iter().map(|(k, v)| (*k, v.as_str())).collect();
    run_command(&ctx.session.base_dir, command, "bundler", &env).await?;
  } else {
    let src = ctx.session.path(&ctx.session.config.source.scripts_dir);
    let dest = dest.clone();
    blocking(move || copy_tree(&src, &dest, |p| has_extension(p, "js")).map(drop)).await?;
  }

  let env = ctx.env.clone();
  blocking(move || inline_tree(&dest, &env)).await
}

fn inline_tree(dir: &Path, env: &EnvironmentMap) -> Result<()> {
  for (path, _) in list_files(dir, |p| has_extension(p, "js"))? {
    let source = std::fs::read_to_string(&path)
      .with_context(|| format!("failed to read {}", path.display()))?;
    let inlined = inline_script(&source, env).with_context(|| format!("in {}", path.display()))?;
    if inlined != source {
      write_file(&path, &inlined)?;
    }
  }
  Ok(())
}
