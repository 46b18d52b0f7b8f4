/* src/cli/core/src/build/orchestrator.rs */

// Runs the independent steps of one target concurrently and collects every outcome.

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use extbuild_manifest::{Target, TargetBase};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};

use super::context::TargetContext;
use super::fs::{blocking, remove_dir_if_exists};
use super::steps;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepKind {
  Bundle,
  Stylesheet,
  Manifest,
  Assets,
  Locales,
  Markup,
  Rules,
}

impl StepKind {
  pub const ALL: [StepKind; 7] = [
    StepKind::Bundle,
    StepKind::Stylesheet,
    StepKind::Manifest,
    StepKind::Assets,
    StepKind::Locales,
    StepKind::Markup,
    StepKind::Rules,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Bundle => "bundle",
      Self::Stylesheet => "stylesheet",
      Self::Manifest => "manifest",
      Self::Assets => "assets",
      Self::Locales => "locales",
      Self::Markup => "markup",
      Self::Rules => "rules",
    }
  }
}

impl fmt::Display for StepKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug)]
pub struct StepOutcome {
  pub kind: StepKind,
  pub elapsed: Duration,
  pub result: Result<()>,
}

#[derive(Debug)]
pub struct TargetReport {
  pub target: Target,
  pub steps: Vec<StepOutcome>,
  /// Apple post-processing; `None` when it did not run.
  pub post_process: Option<Result<()>>,
}

impl TargetReport {
  pub fn succeeded(&self) -> bool {
    self.steps.iter().all(|s| s.result.is_ok())
      && self.post_process.as_ref().is_none_or(Result::is_ok)
  }

  pub fn failed_steps(&self) -> Vec<StepKind> {
    self.steps.iter().filter(|s| s.result.is_err()).map(|s| s.kind).collect()
  }
}

/// Executes build steps; swapped out in tests to isolate the orchestration.
pub trait StepRunner: Send + Sync {
  fn run<'a>(&'a self, ctx: &'a TargetContext, kind: StepKind) -> BoxFuture<'a, Result<()>>;

  /// Apple-family packaging wrapper, run after every step succeeded.
  fn post_process<'a>(&'a self, ctx: &'a TargetContext) -> BoxFuture<'a, Result<()>>;
}

/// Reads sources from the project tree and writes the target's output directory.
pub struct FsStepRunner;

impl StepRunner for FsStepRunner {
  fn run<'a>(&'a self, ctx: &'a TargetContext, kind: StepKind) -> BoxFuture<'a, Result<()>> {
    match kind {
      StepKind::Bundle => steps::bundle::run(ctx).boxed(),
      StepKind::Stylesheet => steps::stylesheet::run(ctx).boxed(),
      StepKind::Manifest => steps::manifest::run(ctx).boxed(),
      StepKind::Assets => steps::assets::run(ctx).boxed(),
      StepKind::Locales => steps::locales::run(ctx).boxed(),
      StepKind::Markup => steps::markup::run(ctx).boxed(),
      StepKind::Rules => steps::rules::run(ctx).boxed(),
    }
  }

  fn post_process<'a>(&'a self, ctx: &'a TargetContext) -> BoxFuture<'a, Result<()>> {
    steps::apple_wrap(ctx).boxed()
  }
}

/// Clear the target output, then run every step.
pub async fn run_target(ctx: &TargetContext, runner: &dyn StepRunner) -> Result<TargetReport> {
  let out_dir = ctx.out_dir.clone();
  blocking(move || {
    remove_dir_if_exists(&out_dir)?;
    std::fs::create_dir_all(&out_dir)?;
    Ok(())
  })
  .await?;

  let steps = run_steps(ctx, &StepKind::ALL, runner).await;
  let mut report = TargetReport { target: ctx.target, steps, post_process: None };

  if ctx.target.base() == TargetBase::Apple && report.succeeded() {
    let started = Instant::now();
    let result = runner.post_process(ctx).await;
    ui::report(&ctx.label("post-process"), started.elapsed(), &result);
    report.post_process = Some(result);
  }
  Ok(report)
}

/// Run `kinds` concurrently without clearing anything. Every step settles; none is cancelled.
pub async fn run_steps(
  ctx: &TargetContext,
  kinds: &[StepKind],
  runner: &dyn StepRunner,
) -> Vec<StepOutcome> {
  join_all(kinds.iter().map(|&kind| async move {
    let started = Instant::now();
    let result = runner.run(ctx, kind).await;
    let elapsed = started.elapsed();
    ui::report(&ctx.label(kind.as_str()), elapsed, &result);
    StepOutcome { kind, elapsed, result }
  }))
  .await
}

#[cfg(test)]
pub(crate) mod tests {
  use std::sync::Arc;
  use std::sync::Mutex;

  use anyhow::bail;
  use extbuild_manifest::BuildMode;

  use super::*;
  use crate::session::tests::load_project;

  /// Records calls and fails the configured (target, step) pairs.
  #[derive(Default)]
  pub(crate) struct ScriptedRunner {
    pub fail: Vec<(Target, StepKind)>,
    pub fail_post_process: bool,
    pub calls: Mutex<Vec<(Target, StepKind)>>,
    pub post_processed: Mutex<Vec<Target>>,
  }

  impl StepRunner for ScriptedRunner {
    fn run<'a>(&'a self, ctx: &'a TargetContext, kind: StepKind) -> BoxFuture<'a, Result<()>> {
      async move {
        self.calls.lock().unwrap().push((ctx.target, kind));
        if self.fail.contains(&(ctx.target, kind)) {
          bail!("{kind} exploded");
        }
        let marker = ctx.out_dir.join(format!("{kind}.txt"));
        std::fs::write(marker, kind.as_str())?;
        Ok(())
      }
      .boxed()
    }

    fn post_process<'a>(&'a self, ctx: &'a TargetContext) -> BoxFuture<'a, Result<()>> {
      async move {
        self.post_processed.lock().unwrap().push(ctx.target);
        if self.fail_post_process {
          bail!("wrapper failed");
        }
        Ok(())
      }
      .boxed()
    }
  }

  async fn context(dir: &std::path::Path, target: Target) -> TargetContext {
    let session = Arc::new(load_project(dir).await);
    TargetContext::new(session, target, BuildMode::release())
  }

  #[tokio::test]
  async fn all_steps_run_even_after_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Target::Chrome).await;
    let runner = ScriptedRunner {
      fail: vec![(Target::Chrome, StepKind::Stylesheet)],
      ..ScriptedRunner::default()
    };

    let report = run_target(&ctx, &runner).await.unwrap();
    assert!(!report.succeeded());
    assert_eq!(report.failed_steps(), vec![StepKind::Stylesheet]);
    assert_eq!(report.steps.len(), StepKind::ALL.len());
    assert_eq!(runner.calls.lock().unwrap().len(), StepKind::ALL.len());
    assert!(ctx.out_dir.join("rules.txt").is_file());
  }

  #[tokio::test]
  async fn init_clears_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Target::Edge).await;
    std::fs::create_dir_all(&ctx.out_dir).unwrap();
    std::fs::write(ctx.out_dir.join("stale.js"), "old").unwrap();

    let report = run_target(&ctx, &ScriptedRunner::default()).await.unwrap();
    assert!(report.succeeded());
    assert!(!ctx.out_dir.join("stale.js").exists());
    assert!(report.post_process.is_none());
  }

  #[tokio::test]
  async fn apple_post_process_only_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Target::Safari).await;

    let ok = ScriptedRunner::default();
    let report = run_target(&ctx, &ok).await.unwrap();
    assert!(report.succeeded());
    assert_eq!(*ok.post_processed.lock().unwrap(), vec![Target::Safari]);

    let broken = ScriptedRunner {
      fail: vec![(Target::Safari, StepKind::Markup)],
      ..ScriptedRunner::default()
    };
    let report = run_target(&ctx, &broken).await.unwrap();
    assert!(report.post_process.is_none());
    assert!(broken.post_processed.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn failed_post_process_fails_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Target::Safari).await;
    let runner = ScriptedRunner { fail_post_process: true, ..ScriptedRunner::default() };
    let report = run_target(&ctx, &runner).await.unwrap();
    assert!(report.failed_steps().is_empty());
    assert!(!report.succeeded());
  }

  #[tokio::test]
  async fn run_steps_runs_only_the_subset() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Target::Opera).await;
    std::fs::create_dir_all(&ctx.out_dir).unwrap();
    std::fs::write(ctx.out_dir.join("keep.js"), "x").unwrap();

    let runner = ScriptedRunner::default();
    let outcomes = run_steps(&ctx, &[StepKind::Stylesheet], &runner).await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(*runner.calls.lock().unwrap(), vec![(Target::Opera, StepKind::Stylesheet)]);
    assert!(ctx.out_dir.join("keep.js").exists());
  }

  #[tokio::test]
  async fn targets_do_not_share_output() {
    let dir = tempfile::tempdir().unwrap();
    let session = Arc::new(load_project(dir.path()).await);
    let chrome = TargetContext::new(session.clone(), Target::Chrome, BuildMode::release());
    let firefox = TargetContext::new(session, Target::Firefox, BuildMode::release());
    let runner = ScriptedRunner {
      fail: vec![(Target::Firefox, StepKind::Stylesheet)],
      ..ScriptedRunner::default()
    };

    let (a, b) = tokio::join!(run_target(&chrome, &runner), run_target(&firefox, &runner));
    assert!(a.unwrap().succeeded());
    assert!(!b.unwrap().succeeded());
    assert!(chrome.out_dir.join("stylesheet.txt").is_file());
    assert!(!firefox.out_dir.join("stylesheet.txt").exists());
  }
}
