/* src/cli/core/src/build/steps/assets.rs */

use anyhow::Result;

use crate::build::context::TargetContext;
use crate::build::fs::{blocking, copy_tree};

pub(crate) async fn run(ctx: &TargetContext) -> Result<()> {
  let src = ctx.session.path(&ctx.session.config.source.assets_dir);
  let dest = ctx.out_dir.clone();
  blocking(move || copy_tree(&src, &dest, |_| true).map(drop)).await
}
