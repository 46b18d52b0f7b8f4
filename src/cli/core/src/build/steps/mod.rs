/* src/cli/core/src/build/steps/mod.rs */

pub(crate) mod assets;
pub(crate) mod bundle;
pub(crate) mod locales;
pub(crate) mod manifest;
pub(crate) mod markup;
pub(crate) mod rules;
pub(crate) mod stylesheet;

use anyhow::Result;

use super::context::TargetContext;
use crate::shell::run_command;

/// Run `build.apple_wrap_command` against the finished output, if configured.
pub(crate) async fn apple_wrap(ctx: &TargetContext) -> Result<()> {
  let Some(command) = ctx.session.config.build.apple_wrap_command.as_deref() else {
    return Ok(());
  };
  let out_dir = ctx.out_dir.to_string_lossy().to_string();
  let mut env = ctx.command_env();
  env.push(("EXTBUILD_OUT_DIR", out_dir));
  let env: Vec<(&str, &str)> = env.iter().map(|(k, v)| (*k, v.as_str())).collect();
  run_command(&ctx.session.base_dir, command, "apple wrapper", &env).await
}
