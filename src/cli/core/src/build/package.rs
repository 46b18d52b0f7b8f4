/* src/cli/core/src/build/package.rs */

// Deterministic zip archives: sorted entries, fixed timestamps and permissions.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::fs::{ensure_parent, list_files};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
  pub path: PathBuf,
  pub sha256: String,
  pub size: u64,
}

/// `<project>-<version>-<suffix>.zip`
pub fn archive_name(project: &str, version: &str, suffix: &str) -> String {
  format!("{project}-{version}-{suffix}.zip")
}

/// Zip every file under `src_dir` accepted by `keep` into `dest`.
pub fn zip_dir(src_dir: &Path, dest: &Path, keep: impl Fn(&Path) -> bool) -> Result<Archive> {
  ensure_parent(dest)?;
  let file = std::fs::File::create(dest)
    .with_context(|| format!("failed to create {}", dest.display()))?;
  let mut zip = ZipWriter::new(file);
  let options = SimpleFileOptions::default()
    .compression_method(zip::CompressionMethod::Deflated)
    .last_modified_time(zip::DateTime::default())
    .unix_permissions(0o644);

  for (abs, rel) in list_files(src_dir, keep)? {
    let name = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>();
    let bytes =
      std::fs::read(&abs).with_context(|| format!("failed to read {}", abs.display()))?;
    zip
      .start_file(name.join("/"), options)
      .with_context(|| format!("failed to add {} to archive", rel.display()))?;
    zip.write_all(&bytes)?;
  }
  zip.finish().with_context(|| format!("failed to finish {}", dest.display()))?;

  let bytes = std::fs::read(dest).with_context(|| format!("failed to read {}", dest.display()))?;
  Ok(Archive {
    path: dest.to_path_buf(),
    sha256: hex::encode(Sha256::digest(&bytes)),
    size: bytes.len() as u64,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::build::fs::write_file;

  fn fixture(dir: &Path) -> PathBuf {
    let src = dir.join("out");
    write_file(&src.join("manifest.json"), "{}\n").unwrap();
    write_file(&src.join("js/background.js"), "run();").unwrap();
    write_file(&src.join("css/popup.css"), "p{}").unwrap();
    src
  }

  #[test]
  fn entries_are_sorted_with_forward_slashes() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let archive = zip_dir(&src, &dir.path().join("a.zip"), |_| true).unwrap();

    let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive.path).unwrap()).unwrap();
    let names: Vec<String> =
      (0..zip.len()).map(|i| zip.by_index(i).unwrap().name().to_string()).collect();
    assert_eq!(names, vec!["css/popup.css", "js/background.js", "manifest.json"]);
  }

  #[test]
  fn same_input_gives_same_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let a = zip_dir(&src, &dir.path().join("a.zip"), |_| true).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let b = zip_dir(&src, &dir.path().join("nested/b.zip"), |_| true).unwrap();
    assert_eq!(a.sha256, b.sha256);
    assert_eq!(a.size, b.size);
    assert_eq!(a.sha256.len(), 64);
  }

  #[test]
  fn filter_excludes_entries() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let archive =
      zip_dir(&src, &dir.path().join("a.zip"), |p| !p.starts_with("css")).unwrap();
    let zip = zip::ZipArchive::new(std::fs::File::open(&archive.path).unwrap()).unwrap();
    assert_eq!(zip.len(), 2);
  }

  #[test]
  fn archive_names() {
    assert_eq!(archive_name("rater", "1.4.2", "firefox"), "rater-1.4.2-firefox.zip");
  }
}
