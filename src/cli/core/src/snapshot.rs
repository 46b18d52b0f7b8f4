/* src/cli/core/src/snapshot.rs */

// `extbuild snapshot`: archive the source tree, then forget the pinned runtime params.

use std::path::{Component, Path};

use anyhow::Result;

use crate::build::fs::blocking;
use crate::build::package::{Archive, archive_name, zip_dir};
use crate::config::ExtbuildConfig;
use crate::params::ParamsCache;
use crate::ui::{self, DIM, RESET};

const ALWAYS_EXCLUDED: [&str; 2] = [".git", "node_modules"];

/// Build outputs and caches, relative to the project root.
fn excluded_roots(config: &ExtbuildConfig) -> Vec<String> {
  let mut roots = Vec::new();
  for dir in [&config.build.out_dir, &config.build.artifacts_dir, &config.build.cache_dir] {
    roots.push(dir.trim_start_matches("./").trim_end_matches('/').to_string());
  }
  roots.push(config.params.cache_file.trim_start_matches("./").to_string());
  roots
}

fn is_excluded(rel: &Path, roots: &[String]) -> bool {
  let vcs_or_deps = |c: Component<'_>| ALWAYS_EXCLUDED.iter().any(|x| c.as_os_str() == *x);
  if rel.components().any(vcs_or_deps) {
    return true;
  }
  roots.iter().any(|root| rel.starts_with(root))
}

pub async fn run_snapshot(
  base_dir: &Path,
  config: &ExtbuildConfig,
  version: &str,
) -> Result<Archive> {
  let roots = excluded_roots(config);
  let src = base_dir.to_path_buf();
  let dest = base_dir
    .join(&config.build.artifacts_dir)
    .join(archive_name(&config.project.name, version, "source"));
  let archive = ui::timed(
    "source snapshot",
    blocking(move || zip_dir(&src, &dest, |rel| !is_excluded(rel, &roots))),
  )
  .await?;
  ui::detail(&format!(
    "{DIM}{} {} sha256 {}{RESET}",
    archive.path.display(),
    ui::format_size(archive.size),
    archive.sha256
  ));

  let cache = ParamsCache::new(base_dir.join(&config.params.cache_file));
  if cache.clear()? {
    ui::detail(&format!("{DIM}removed {}{RESET}", cache.path().display()));
  }
  Ok(archive)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::build::fs::write_file;
  use crate::session::tests::write_project;

  #[tokio::test]
  async fn snapshot_skips_outputs_and_clears_params() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_project(dir.path());
    let config = crate::config::load_config(&config_path).unwrap();
    write_file(&dir.path().join("src/scripts/a.js"), "a();").unwrap();
    write_file(&dir.path().join("dist/chrome/manifest.json"), "{}").unwrap();
    write_file(&dir.path().join(".git/HEAD"), "ref").unwrap();
    write_file(&dir.path().join("src/node_modules/x/index.js"), "x").unwrap();
    write_file(&dir.path().join(".extbuild/runtime-params.json"), "{}").unwrap();
    write_file(&dir.path().join(".extbuild/cache/chrome/define.json"), "{}").unwrap();

    let archive = run_snapshot(dir.path(), &config, "1.4.2").await.unwrap();
    assert!(archive.path.ends_with("artifacts/rater-1.4.2-source.zip"));

    let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive.path).unwrap()).unwrap();
    let names: Vec<String> =
      (0..zip.len()).map(|i| zip.by_index(i).unwrap().name().to_string()).collect();
    assert!(names.contains(&"src/scripts/a.js".to_string()));
    assert!(names.contains(&"extbuild.toml".to_string()));
    assert!(names.iter().all(|n| !n.starts_with("dist/")));
    assert!(names.iter().all(|n| !n.starts_with(".git/") && !n.contains("node_modules")));
    assert!(names.iter().all(|n| !n.starts_with(".extbuild/")));
    assert!(names.iter().all(|n| !n.starts_with("artifacts/")));
    assert!(!dir.path().join(".extbuild/runtime-params.json").exists());
  }
}
