/* src/cli/core/src/dev/watch.rs */

// Changed source path -> build steps to rerun.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::build::orchestrator::StepKind;
use crate::session::Session;

use super::server::ReloadMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildRule {
  pub prefix: PathBuf,
  pub steps: Vec<StepKind>,
  pub reload_manifest: bool,
  pub regenerate_types: bool,
}

impl RebuildRule {
  fn new(prefix: PathBuf, steps: &[StepKind]) -> Self {
    Self { prefix, steps: steps.to_vec(), reload_manifest: false, regenerate_types: false }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildPlan {
  pub steps: BTreeSet<StepKind>,
  pub reload_manifest: bool,
  pub regenerate_types: bool,
}

impl RebuildPlan {
  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn message(&self) -> ReloadMessage {
    if self.steps.len() == 1 && self.steps.contains(&StepKind::Stylesheet) {
      ReloadMessage::Css
    } else {
      ReloadMessage::Reload
    }
  }
}

/// Path prefixes mapped to steps; the longest matching prefix wins.
#[derive(Debug, Clone, Default)]
pub struct RebuildTable {
  rules: Vec<RebuildRule>,
}

impl RebuildTable {
  pub fn new(rules: Vec<RebuildRule>) -> Self {
    Self { rules }
  }

  pub fn for_session(session: &Session) -> Self {
    let source = &session.config.source;
    let at = |rel: &str| session.path(rel);
    let locales = RebuildRule {
      regenerate_types: true,
      ..RebuildRule::new(at(&source.locales_dir), &[StepKind::Bundle, StepKind::Locales])
    };
    let manifest = RebuildRule {
      reload_manifest: true,
      ..RebuildRule::new(at(&source.manifest), &[StepKind::Manifest])
    };
    Self::new(vec![
      RebuildRule::new(at(&source.styles_dir), &[StepKind::Stylesheet]),
      RebuildRule::new(at(&source.scripts_dir), &[StepKind::Bundle, StepKind::Locales]),
      locales,
      RebuildRule::new(at(&source.pages_dir), &[StepKind::Markup]),
      manifest,
      RebuildRule::new(at(&source.assets_dir), &[StepKind::Assets]),
    ])
  }

  pub fn rules(&self) -> &[RebuildRule] {
    &self.rules
  }

  pub fn lookup(&self, path: &Path) -> Option<&RebuildRule> {
    self
      .rules
      .iter()
      .filter(|rule| path.starts_with(&rule.prefix))
      .max_by_key(|rule| rule.prefix.components().count())
  }

  /// Union of the steps for a batch of changed paths. Unmatched paths are ignored.
  pub fn plan<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) -> RebuildPlan {
    let mut plan = RebuildPlan::default();
    for rule in paths.into_iter().filter_map(|p| self.lookup(p)) {
      plan.steps.extend(rule.steps.iter().copied());
      plan.reload_manifest |= rule.reload_manifest;
      plan.regenerate_types |= rule.regenerate_types;
    }
    plan
  }
}
