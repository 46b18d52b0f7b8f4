/* src/cli/core/src/dev/mod.rs */

// `extbuild dev`: live-reload socket, one full build, then incremental rebuilds.

pub mod server;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use extbuild_manifest::{BuildMode, Target};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::signal;
use tokio::sync::mpsc;

use crate::build::context::TargetContext;
use crate::build::orchestrator::{FsStepRunner, StepKind, run_steps, run_target};
use crate::build::{check_manifest, refresh_type_declarations};
use crate::probe::resolve_mode;
use crate::session::Session;
use crate::ui::{self, CYAN, DIM, GREEN, RED, RESET};

use server::Clients;
use watch::{RebuildPlan, RebuildTable};

const DEBOUNCE: Duration = Duration::from_millis(300);

fn setup_watcher() -> Result<(RecommendedWatcher, mpsc::Receiver<Vec<PathBuf>>)> {
  let (tx, rx) = mpsc::channel(16);
  let watcher = RecommendedWatcher::new(
    move |res: std::result::Result<notify::Event, notify::Error>| {
      if let Ok(event) = res {
        let _ = tx.blocking_send(event.paths);
      }
    },
    notify::Config::default(),
  )?;
  Ok((watcher, rx))
}

/// Watch every existing rule prefix; returns the labels of what is watched.
fn watch_sources(watcher: &mut RecommendedWatcher, session: &Session) -> Result<Vec<String>> {
  let mut watched = Vec::new();
  for rule in RebuildTable::for_session(session).rules() {
    let path = &rule.prefix;
    if !path.exists() {
      continue;
    }
    let mode = if path.is_dir() { RecursiveMode::Recursive } else { RecursiveMode::NonRecursive };
    watcher.watch(path, mode).with_context(|| format!("failed to watch {}", path.display()))?;
    let rel = path.strip_prefix(&session.base_dir).unwrap_or(path);
    watched.push(rel.display().to_string());
  }
  Ok(watched)
}

struct DevState {
  session: Arc<Session>,
  target: Target,
  mode: BuildMode,
  ctx: TargetContext,
}

impl DevState {
  fn new(session: Arc<Session>, target: Target, mode: BuildMode) -> Self {
    let ctx = TargetContext::new(session.clone(), target, mode);
    Self { session, target, mode, ctx }
  }

  async fn rebuild(&mut self, plan: &RebuildPlan, clients: &Clients) {
    let started = Instant::now();
    println!("  {CYAN}[{}]{RESET} rebuilding {}...", self.target, describe(plan));

    if plan.reload_manifest {
      match self.session.reload_manifest() {
        Ok(session) => *self = Self::new(Arc::new(session), self.target, self.mode),
        Err(e) => ui::fail(&format!("{e:#}")),
      }
    }
    if plan.regenerate_types {
      let _ = refresh_type_declarations(&self.session).await;
    }

    let kinds: Vec<StepKind> = plan.steps.iter().copied().collect();
    let outcomes = run_steps(&self.ctx, &kinds, &FsStepRunner).await;
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    let took = ui::format_elapsed(started.elapsed());
    if failed == 0 {
      println!("  {GREEN}[{}]{RESET} rebuild complete ({took})", self.target);
    } else {
      let target = self.target;
      println!("  {RED}[{target}]{RESET} rebuild finished with {failed} failed step(s) ({took})");
    }

    let message = plan.message();
    let reached = clients.broadcast(message);
    ui::detail(&format!("{DIM}{} sent to {reached} client(s){RESET}", message.to_json()));
  }
}

fn describe(plan: &RebuildPlan) -> String {
  plan.steps.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}

pub async fn run_dev(session: Arc<Session>, target: Target) -> Result<()> {
  check_manifest(&session, &[target])?;
  let clients = Arc::new(Clients::default());
  let addr = server::start(session.config.dev.port, clients.clone()).await?;
  ui::arrow(&format!("live reload on ws://{addr}{}", server::LIVERELOAD_PATH));

  let mode = resolve_mode(true, &session.config.dev).await;
  let s = mode.dev_servers;
  ui::detail(&format!(
    "{DIM}dev servers: api={} website={} hot-reload={}{RESET}",
    s.api, s.website, s.hot_reload
  ));

  refresh_type_declarations(&session).await?;
  let mut state = DevState::new(session, target, mode);
  let report = run_target(&state.ctx, &FsStepRunner).await?;
  if !report.succeeded() {
    ui::warn("initial build failed; fix the errors above and save to rebuild");
  }

  let (mut watcher, mut rx) = setup_watcher()?;
  let watched = watch_sources(&mut watcher, &state.session)?;
  let table = RebuildTable::for_session(&state.session);
  ui::blank();
  println!("  {DIM}watching {}{RESET}", watched.join(", "));
  println!("  {DIM}press ctrl-c to stop{RESET}");
  ui::blank();

  loop {
    tokio::select! {
      _ = signal::ctrl_c() => {
        println!();
        println!("  {DIM}shutting down...{RESET}");
        break;
      }
      Some(first) = rx.recv() => {
        tokio::time::sleep(DEBOUNCE).await;
        let mut paths = first;
        while let Ok(more) = rx.try_recv() {
          paths.extend(more);
        }
        let plan = table.plan(paths.iter().map(PathBuf::as_path));
        if plan.is_empty() {
          continue;
        }
        state.rebuild(&plan, &clients).await;
      }
    }
  }

  drop(watcher);
  Ok(())
}
