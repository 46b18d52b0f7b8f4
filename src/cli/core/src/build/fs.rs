/* src/cli/core/src/build/fs.rs */

// Thin file helpers for the build steps. All of them block; steps call them
// through `blocking`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

/// Run blocking file work off the async worker threads.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
  T: Send + 'static,
  F: FnOnce() -> Result<T> + Send + 'static,
{
  tokio::task::spawn_blocking(f).await.context("build task panicked")?
}

/// Files below `root` accepted by `keep`, as (absolute, relative) pairs in sorted order.
/// A missing root yields nothing.
pub(crate) fn list_files(
  root: &Path,
  keep: impl Fn(&Path) -> bool,
) -> Result<Vec<(PathBuf, PathBuf)>> {
  if !root.exists() {
    return Ok(Vec::new());
  }
  let mut files = Vec::new();
  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
    if !entry.file_type().is_file() {
      continue;
    }
    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();
    if keep(&rel) {
      files.push((entry.path().to_path_buf(), rel));
    }
  }
  Ok(files)
}

/// Copy the accepted files of `src` into `dest`, keeping relative paths. Returns the count.
pub(crate) fn copy_tree(src: &Path, dest: &Path, keep: impl Fn(&Path) -> bool) -> Result<usize> {
  let files = list_files(src, keep)?;
  for (abs, rel) in &files {
    let target = dest.join(rel);
    ensure_parent(&target)?;
    std::fs::copy(abs, &target)
      .with_context(|| format!("failed to copy {} to {}", abs.display(), target.display()))?;
  }
  Ok(files.len())
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
  path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  Ok(())
}

pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
  ensure_parent(path)?;
  std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Pretty JSON with a trailing newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
  let mut json = serde_json::to_string_pretty(value)
    .with_context(|| format!("failed to serialize {}", path.display()))?;
  json.push('\n');
  write_file(path, &json)
}

pub(crate) fn remove_dir_if_exists(path: &Path) -> Result<bool> {
  match std::fs::remove_dir_all(path) {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
  }
}
