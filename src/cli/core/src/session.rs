/* src/cli/core/src/session.rs */

// Everything a command resolves once before any target builds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use extbuild_manifest::{SourceManifest, Target};

use crate::config::ExtbuildConfig;
use crate::env::EnvFacts;
use crate::params::{ParamsCache, RuntimeParams};
use crate::ui;

#[derive(Debug, Clone)]
pub struct Session {
  pub base_dir: PathBuf,
  pub config: ExtbuildConfig,
  pub manifest: SourceManifest,
  /// Locale fallback order, default locale first.
  pub locales: Vec<String>,
  pub params: RuntimeParams,
}

impl Session {
  /// Read the manifest, settle the locale order and fetch runtime params.
  /// The params cache is only ever written from here.
  pub async fn load(config_path: &Path, config: ExtbuildConfig) -> Result<Self> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let manifest = read_manifest(&base_dir, &config)?;
    let locales = resolve_locale_order(&base_dir, &config)?;
    let cache = ParamsCache::new(base_dir.join(&config.params.cache_file));
    let params = ui::timed("runtime params", cache.fetch(&config.params)).await?;
    Ok(Self { base_dir, config, manifest, locales, params })
  }

  /// Same session with the source manifest read again from disk.
  pub fn reload_manifest(&self) -> Result<Self> {
    let manifest = read_manifest(&self.base_dir, &self.config)?;
    Ok(Self { manifest, ..self.clone() })
  }

  pub fn path(&self, rel: &str) -> PathBuf {
    self.base_dir.join(rel)
  }

  pub fn out_dir(&self, target: Target) -> PathBuf {
    self.path(&self.config.build.out_dir).join(target.as_str())
  }

  pub fn cache_dir(&self, target: Target) -> PathBuf {
    self.path(&self.config.build.cache_dir).join(target.as_str())
  }

  pub fn artifacts_dir(&self) -> PathBuf {
    self.path(&self.config.build.artifacts_dir)
  }

  pub fn env_facts(&self) -> EnvFacts {
    EnvFacts::new(&self.config, &self.manifest, &self.locales)
  }
}

fn read_manifest(base_dir: &Path, config: &ExtbuildConfig) -> Result<SourceManifest> {
  let path = base_dir.join(&config.source.manifest);
  SourceManifest::load(&path).with_context(|| format!("failed to load {}", path.display()))
}

/// Configured order, or the locale directories found on disk (sorted); default moved first.
fn resolve_locale_order(base_dir: &Path, config: &ExtbuildConfig) -> Result<Vec<String>> {
  let default = &config.locales.default;
  let mut order = if config.locales.order.is_empty() {
    let dir = base_dir.join(&config.source.locales_dir);
    let found = discover_locales(&dir)?;
    if !found.contains(default) {
      bail!("default locale \"{default}\" has no directory in {}", dir.display());
    }
    found
  } else {
    config.locales.order.clone()
  };
  order.retain(|l| l != default);
  order.insert(0, default.clone());
  Ok(order)
}

fn discover_locales(dir: &Path) -> Result<Vec<String>> {
  let entries =
    std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
  let mut found = Vec::new();
  for entry in entries {
    let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
    if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false)
      && let Some(name) = entry.file_name().to_str()
    {
      found.push(name.to_string());
    }
  }
  found.sort();
  Ok(found)
}
