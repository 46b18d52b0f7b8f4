/* src/cli/core/src/build/mod.rs */

pub mod context;
pub(crate) mod fs;
pub mod orchestrator;
pub mod package;
pub mod release;
pub mod sign;
pub(crate) mod steps;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use extbuild_manifest::{Target, validate};

use crate::probe::resolve_mode;
use crate::session::Session;
use crate::ui::{self, DIM, RESET};
use context::TargetContext;
use orchestrator::{FsStepRunner, StepKind, run_target};

/// Reject a source manifest that some requested target cannot accept. Runs before any output
/// directory is touched.
pub(crate) fn check_manifest(session: &Session, targets: &[Target]) -> Result<()> {
  for target in targets {
    let base = target.base();
    validate(&session.manifest, base)
      .with_context(|| format!("manifest does not meet {base} requirements ({target})"))?;
  }
  Ok(())
}

/// Write the message type declarations and report where they went.
pub(crate) async fn refresh_type_declarations(session: &Session) -> Result<()> {
  let written = ui::timed("types", steps::locales::write_type_declarations(session)).await?;
  if let Some(path) = written {
    ui::detail(&format!("{DIM}{}{RESET}", path.display()));
  }
  Ok(())
}

/// `extbuild build`: one target, dev unless `release`.
pub async fn run_build(session: Arc<Session>, target: Target, release: bool) -> Result<()> {
  let started = Instant::now();
  check_manifest(&session, &[target])?;
  refresh_type_declarations(&session).await?;
  let mode = resolve_mode(!release, &session.config.dev).await;
  if mode.is_dev {
    let s = mode.dev_servers;
    ui::detail(&format!(
      "{DIM}dev servers: api={} website={} hot-reload={}{RESET}",
      s.api, s.website, s.hot_reload
    ));
  }

  let ctx = TargetContext::new(session, target, mode);
  let report = run_target(&ctx, &FsStepRunner).await?;
  if !report.succeeded() {
    let failed: Vec<&str> = report.failed_steps().into_iter().map(StepKind::as_str).collect();
    if failed.is_empty() {
      bail!("{target} post-processing failed");
    }
    bail!("{target} build failed: {}", failed.join(", "));
  }

  ui::blank();
  ui::ok(&format!(
    "{target} ({}) built in {} {DIM}{}{RESET}",
    mode.label(),
    ui::format_elapsed(started.elapsed()),
    ctx.out_dir.display()
  ));
  Ok(())
}
