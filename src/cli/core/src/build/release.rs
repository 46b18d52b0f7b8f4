/* src/cli/core/src/build/release.rs */

// Release driver: every requested target built side by side, then packaged.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Result, bail};
use extbuild_manifest::{BuildMode, Target, TargetBase};
use futures_util::future::join_all;

use super::check_manifest;
use super::context::TargetContext;
use super::fs::blocking;
use super::orchestrator::{StepKind, StepRunner, TargetReport, run_target};
use super::package::{Archive, archive_name, zip_dir};
use super::sign;
use crate::session::Session;
use crate::ui::{self, DIM, RESET};

#[derive(Debug)]
pub struct ReleaseReport {
  pub target: Target,
  /// `None` when the output directory could not even be prepared.
  pub report: Option<TargetReport>,
  pub archive: Option<Archive>,
}

impl ReleaseReport {
  pub fn succeeded(&self) -> bool {
    self.archive.is_some()
  }
}

async fn package(ctx: &TargetContext) -> Result<Archive> {
  let session = &ctx.session;
  let project = &session.config.project.name;
  let name = archive_name(project, &session.manifest.version, ctx.target.as_str());
  let dest = session.artifacts_dir().join(name);
  let src = ctx.out_dir.clone();
  blocking(move || zip_dir(&src, &dest, |_| true)).await
}

/// Failures are reported and swallowed.
async fn sign_archive(ctx: &TargetContext, archive: &Archive) {
  let credentials = match sign::credentials(&ctx.session.config.signing) {
    Ok(Some(c)) => c,
    Ok(None) => return,
    Err(e) => {
      ui::warn(&format!("{} skipped: {e:#}", ctx.label("sign")));
      return;
    }
  };
  let (url, token) = credentials;
  let _ = ui::timed(&ctx.label("sign"), sign::upload(&url, &token, &archive.path)).await;
}

async fn release_target(
  session: Arc<Session>,
  target: Target,
  runner: &dyn StepRunner,
) -> ReleaseReport {
  let ctx = TargetContext::new(session, target, BuildMode::release());
  let report = match run_target(&ctx, runner).await {
    Ok(report) => report,
    Err(e) => {
      ui::fail(&format!("{} {e:#}", ctx.label("init")));
      return ReleaseReport { target, report: None, archive: None };
    }
  };
  if !report.succeeded() {
    return ReleaseReport { target, report: Some(report), archive: None };
  }

  let archive = ui::timed(&ctx.label("package"), package(&ctx)).await.ok();
  if let Some(archive) = &archive {
    ui::detail(&format!(
      "{DIM}{} {} sha256 {}{RESET}",
      archive.path.display(),
      ui::format_size(archive.size),
      archive.sha256
    ));
    if target.base() == TargetBase::Gecko {
      sign_archive(&ctx, archive).await;
    }
  }
  ReleaseReport { target, report: Some(report), archive }
}

/// Why a target produced no archive.
fn failure_reason(report: &ReleaseReport) -> String {
  match &report.report {
    None => "output directory could not be prepared".into(),
    Some(r) if r.succeeded() => "packaging failed".into(),
    Some(r) => {
      let steps: Vec<&str> = r.failed_steps().into_iter().map(StepKind::as_str).collect();
      if steps.is_empty() {
        "post-processing failed".into()
      } else {
        format!("failed steps: {}", steps.join(", "))
      }
    }
  }
}

/// Build and package `targets` concurrently (each target once). Errors when any target
/// failed; the others still produce their archives.
pub async fn build_all(
  session: Arc<Session>,
  targets: &[Target],
  runner: &dyn StepRunner,
) -> Result<Vec<ReleaseReport>> {
  let targets: BTreeSet<Target> = targets.iter().copied().collect();
  let targets: Vec<Target> = targets.into_iter().collect();
  check_manifest(&session, &targets)?;

  let reports =
    join_all(targets.iter().map(|&target| release_target(session.clone(), target, runner))).await;

  let failed: Vec<&ReleaseReport> = reports.iter().filter(|r| !r.succeeded()).collect();
  if !failed.is_empty() {
    ui::blank();
    for report in &failed {
      ui::fail(&format!("[{}] {}", report.target, failure_reason(report)));
    }
    let names: Vec<&str> = failed.iter().map(|r| r.target.as_str()).collect();
    bail!("{} of {} targets failed: {}", failed.len(), reports.len(), names.join(", "));
  }
  Ok(reports)
}
