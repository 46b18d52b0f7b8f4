/* src/cli/core/src/main.rs */

mod build;
mod clean;
mod config;
mod define;
mod dev;
mod env;
mod params;
mod probe;
mod rules;
mod session;
mod shell;
mod snapshot;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use extbuild_manifest::{SourceManifest, Target};

use build::orchestrator::FsStepRunner;
use config::{ExtbuildConfig, find_config, load_config};
use session::Session;

#[derive(Parser)]
#[command(name = "extbuild", about = "Build one extension source tree for every browser family")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Build a single target (development mode unless --release)
  Build {
    /// Path to extbuild.toml (auto-detected if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Browser to build for
    #[arg(short, long, default_value_t = Target::default())]
    target: Target,
    /// Build in release mode (no dev server probing)
    #[arg(long)]
    release: bool,
  },
  /// Build, package and optionally sign release archives for several targets
  Release {
    /// Path to extbuild.toml (auto-detected if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Browsers to release (all when omitted; repeatable)
    #[arg(short, long = "target")]
    targets: Vec<Target>,
  },
  /// Build once, then rebuild on change and push live-reload events
  Dev {
    /// Path to extbuild.toml (auto-detected if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Browser to develop against
    #[arg(short, long, default_value_t = Target::default())]
    target: Target,
  },
  /// Archive the source tree and drop the pinned runtime parameters
  Snapshot {
    /// Path to extbuild.toml (auto-detected if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
  },
  /// Remove build output, artifacts and the build cache
  Clean {
    /// Path to extbuild.toml (auto-detected if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
  },
}

/// Resolve config path (explicit or auto-detected) and parse it
fn resolve_config(explicit: Option<PathBuf>) -> Result<(PathBuf, ExtbuildConfig)> {
  let path = match explicit {
    Some(p) => {
      p.canonicalize().with_context(|| format!("failed to resolve {}", p.display()))?
    }
    None => {
      let cwd = std::env::current_dir().context("failed to get cwd")?;
      find_config(&cwd)?
    }
  };
  let config = load_config(&path)?;
  Ok((path, config))
}

async fn open_session(explicit: Option<PathBuf>, cmd: &str) -> Result<Arc<Session>> {
  let (path, config) = resolve_config(explicit)?;
  ui::banner(cmd, Some(&config.project.name));
  Ok(Arc::new(Session::load(&path, config).await?))
}

fn base_dir(config_path: &Path) -> &Path {
  config_path.parent().unwrap_or_else(|| Path::new("."))
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  match cli.command {
    Command::Build { config, target, release } => {
      let session = open_session(config, "build").await?;
      build::run_build(session, target, release).await?;
    }
    Command::Release { config, targets } => {
      let targets = if targets.is_empty() { Target::ALL.to_vec() } else { targets };
      let session = open_session(config, "release").await?;
      build::check_manifest(&session, &targets)?;
      build::refresh_type_declarations(&session).await?;
      let reports = build::release::build_all(session, &targets, &FsStepRunner).await?;
      ui::blank();
      ui::ok(&format!("{} archive(s) ready", reports.len()));
    }
    Command::Dev { config, target } => {
      let session = open_session(config, "dev").await?;
      dev::run_dev(session, target).await?;
    }
    Command::Snapshot { config } => {
      let (path, config) = resolve_config(config)?;
      ui::banner("snapshot", Some(&config.project.name));
      let base = base_dir(&path);
      let manifest_path = base.join(&config.source.manifest);
      let manifest = SourceManifest::load(&manifest_path)
        .with_context(|| format!("failed to load {}", manifest_path.display()))?;
      snapshot::run_snapshot(base, &config, &manifest.version).await?;
    }
    Command::Clean { config } => {
      let (path, config) = resolve_config(config)?;
      clean::run_clean(&config, base_dir(&path))?;
    }
  }

  Ok(())
}
