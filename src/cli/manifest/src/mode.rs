/* src/cli/manifest/src/mode.rs */

use serde::{Deserialize, Serialize};

/// Which local development endpoints answered the reachability probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevServersAvailable {
  pub api: bool,
  pub website: bool,
  pub hot_reload: bool,
}

/// Names one of the probed development endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevServerKind {
  Api,
  Website,
  HotReload,
}

impl DevServersAvailable {
  pub fn get(&self, kind: DevServerKind) -> bool {
    match kind {
      DevServerKind::Api => self.api,
      DevServerKind::Website => self.website,
      DevServerKind::HotReload => self.hot_reload,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMode {
  pub is_dev: bool,
  pub dev_servers: DevServersAvailable,
}

impl BuildMode {
  pub fn release() -> Self {
    Self { is_dev: false, dev_servers: DevServersAvailable::default() }
  }

  pub fn dev(dev_servers: DevServersAvailable) -> Self {
    Self { is_dev: true, dev_servers }
  }

  /// A dev server flag only counts in development builds.
  pub fn has(&self, kind: DevServerKind) -> bool {
    self.is_dev && self.dev_servers.get(kind)
  }

  pub fn label(&self) -> &'static str {
    if self.is_dev { "dev" } else { "release" }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn release_ignores_reachable_servers() {
    let mode = BuildMode {
      is_dev: false,
      dev_servers: DevServersAvailable { api: true, website: true, hot_reload: true },
    };
    assert!(!mode.has(DevServerKind::Api));
    assert_eq!(mode.label(), "release");
  }

  #[test]
  fn dev_reads_individual_flags() {
    let mode = BuildMode::dev(DevServersAvailable { api: true, website: false, hot_reload: true });
    assert!(mode.has(DevServerKind::Api));
    assert!(!mode.has(DevServerKind::Website));
    assert!(mode.has(DevServerKind::HotReload));
    assert_eq!(mode.label(), "dev");
  }
}
