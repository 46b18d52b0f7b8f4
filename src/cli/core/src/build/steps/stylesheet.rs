/* src/cli/core/src/build/steps/stylesheet.rs */

use anyhow::Result;

use crate::build::context::TargetContext;
use crate::build::fs::{blocking, copy_tree, has_extension};
use crate::shell::run_command;

pub(crate) const CSS_DIR: &str = "css";

/// External style compiler when configured, otherwise a plain copy of the `.css` sources.
pub(crate) async fn run(ctx: &TargetContext) -> Result<()> {
  let dest = ctx.out_dir.join(CSS_DIR);
  if let Some(command) = ctx.session.config.build.style_command.as_deref() {
    let out_dir = dest.to_string_lossy().to_string();
    let mut env = ctx.command_env();
    env.push(("EXTBUILD_OUT_DIR", out_dir));
    let env: Vec<(&str, &str)> = env.iter().map(|(k, v)| (*k, v.as_str())).collect();
    return run_command(&ctx.session.base_dir, command, "style compiler", &env).await;
  }

  let src = ctx.session.path(&ctx.session.config.source.styles_dir);
  blocking(move || copy_tree(&src, &dest, |p| has_extension(p, "css")).map(drop)).await
}
