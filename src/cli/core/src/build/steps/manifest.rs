/* src/cli/core/src/build/steps/manifest.rs */

use anyhow::{Context, Result};
use extbuild_manifest::{transform, validate};

use crate::build::context::TargetContext;
use crate::build::fs::{blocking, write_file};

pub(crate) const MANIFEST_FILE: &str = "manifest.json";

pub(crate) async fn run(ctx: &TargetContext) -> Result<()> {
  let base = ctx.target.base();
  let source = &ctx.session.manifest;
  validate(source, base).with_context(|| format!("manifest does not meet {base} requirements"))?;
  let json = transform(source, base, ctx.mode).to_json_pretty()?;
  let path = ctx.out_dir.join(MANIFEST_FILE);
  blocking(move || write_file(&path, &json)).await
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use extbuild_manifest::{BuildMode, Target};
  use serde_json::Value;

  use super::*;
  use crate::session::tests::load_project;

  async fn build(target: Target) -> Value {
    let dir = tempfile::tempdir().unwrap();
    let session = Arc::new(load_project(dir.path()).await);
    let ctx = TargetContext::new(session, target, BuildMode::release());
    run(&ctx).await.unwrap();
    let content = std::fs::read_to_string(ctx.out_dir.join(MANIFEST_FILE)).unwrap();
    assert!(content.ends_with('\n'));
    serde_json::from_str(&content).unwrap()
  }

  #[tokio::test]
  async fn writes_family_dialects() {
    let chrome = build(Target::Chrome).await;
    assert_eq!(chrome["manifest_version"], 3);
    assert!(chrome.get("browser_specific_settings").is_none());

    let firefox = build(Target::Firefox).await;
    assert_eq!(firefox["manifest_version"], 2);
    assert!(firefox.get("host_permissions").is_none());
    assert_eq!(firefox["background"]["scripts"][0], "js/background.js");
  }

  #[tokio::test]
  async fn invalid_manifest_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = load_project(dir.path()).await;
    session.manifest.version = "one".into();
    let ctx = TargetContext::new(Arc::new(session), Target::Chrome, BuildMode::release());
    assert!(run(&ctx).await.is_err());
    assert!(!ctx.out_dir.join(MANIFEST_FILE).exists());
  }
}
