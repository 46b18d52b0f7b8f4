/* src/cli/core/src/build/context.rs */

use std::path::PathBuf;
use std::sync::Arc;

use extbuild_manifest::{BuildMode, Target};

use crate::env::{self, EnvironmentMap};
use crate::rules::BuildIdentity;
use crate::session::Session;

/// Inputs of one target build. Steps only write below `out_dir` and `cache_dir`.
#[derive(Debug, Clone)]
pub struct TargetContext {
  pub session: Arc<Session>,
  pub target: Target,
  pub mode: BuildMode,
  pub env: EnvironmentMap,
  pub out_dir: PathBuf,
  pub cache_dir: PathBuf,
}

impl TargetContext {
  pub fn new(session: Arc<Session>, target: Target, mode: BuildMode) -> Self {
    let env = env::resolve(target, mode, &session.params, &session.env_facts());
    let out_dir = session.out_dir(target);
    let cache_dir = session.cache_dir(target);
    Self { session, target, mode, env, out_dir, cache_dir }
  }

  /// `[firefox] manifest`
  pub fn label(&self, what: &str) -> String {
    format!("[{}] {what}", self.target)
  }

  pub fn identity(&self) -> BuildIdentity {
    BuildIdentity {
      project: self.session.config.project.name.clone(),
      target: self.target,
      mode: self.mode,
    }
  }

  /// Variables handed to external commands.
  pub fn command_env(&self) -> Vec<(&'static str, String)> {
    vec![
      ("EXTBUILD_TARGET", self.target.as_str().to_string()),
      ("EXTBUILD_MODE", self.mode.label().to_string()),
    ]
  }
}
