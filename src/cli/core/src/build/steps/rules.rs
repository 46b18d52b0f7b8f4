/* src/cli/core/src/build/steps/rules.rs */

use anyhow::Result;

use crate::build::context::TargetContext;
use crate::build::fs::{blocking, write_json};
use crate::rules;

pub(crate) const RULES_FILE: &str = "rules.json";

pub(crate) async fn run(ctx: &TargetContext) -> Result<()> {
  let session = &ctx.session;
  let config = &session.config;
  let rules = rules::generate(&config.domains, &config.rules, &session.params, &ctx.identity())?;
  let path = ctx.out_dir.join(RULES_FILE);
  blocking(move || write_json(&path, &rules)).await
}
