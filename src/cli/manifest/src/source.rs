/* src/cli/manifest/src/source.rs */

// Authoring-time manifest as written in the repository.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::target::TargetBase;

/// Token replaced by the manifest version inside `version_name`.
pub const VERSION_PLACEHOLDER: &str = "{version}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceManifest {
  #[serde(default = "default_manifest_version")]
  pub manifest_version: u8,
  pub name: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version_name: Option<String>,
  /// Chromium store version override; authoring-only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub store_version: Option<String>,
  #[serde(default)]
  pub beta: bool,
  #[serde(default)]
  pub permissions: Vec<String>,
  #[serde(default)]
  pub optional_permissions: Vec<String>,
  #[serde(default)]
  pub host_permissions: Vec<String>,
  #[serde(default)]
  pub optional_host_permissions: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub background: Option<Background>,
  #[serde(default)]
  pub web_accessible_resources: Vec<ResourceGroup>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub action: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options_ui: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub incognito: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub browser_specific_settings: Option<FamilySettings>,
  /// Keys the pipeline does not interpret (icons, content_scripts, ...).
  #[serde(flatten)]
  pub rest: BTreeMap<String, Value>,
}

fn default_manifest_version() -> u8 {
  3
}

/// Background entry in either the worker or the scripts-array convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Background {
  Worker {
    service_worker: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
  },
  Scripts {
    scripts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    persistent: Option<bool>,
  },
}

/// One `web_accessible_resources` group: resources exposed to matching origins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
  pub resources: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub matches: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub extension_ids: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub use_dynamic_url: Option<bool>,
}

/// Per-family settings block, keyed by browser family in the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilySettings {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub chrome: Option<ChromiumSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gecko: Option<GeckoSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub safari: Option<AppleSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChromiumSettings {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub minimum_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeckoSettings {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub beta_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub update_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub beta_update_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub strict_min_version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub strict_max_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppleSettings {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub strict_min_version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub strict_max_version: Option<String>,
}

/// The settings entry that applies to one target family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetSettings<'a> {
  Chromium(&'a ChromiumSettings),
  Gecko(&'a GeckoSettings),
  Apple(&'a AppleSettings),
}

impl FamilySettings {
  pub fn for_base(&self, base: TargetBase) -> Option<TargetSettings<'_>> {
    match base {
      TargetBase::Chromium => self.chrome.as_ref().map(TargetSettings::Chromium),
      TargetBase::Gecko => self.gecko.as_ref().map(TargetSettings::Gecko),
      TargetBase::Apple => self.safari.as_ref().map(TargetSettings::Apple),
    }
  }
}

impl SourceManifest {
  pub fn from_jsonc(content: &str) -> Result<Self> {
    crate::jsonc::parse(content)
  }

  pub fn load(path: &Path) -> Result<Self> {
    crate::jsonc::read(path)
  }

  /// Version name with the version token substituted; the plain version when unset.
  pub fn rendered_version_name(&self) -> String {
    match &self.version_name {
      Some(template) => template.replace(VERSION_PLACEHOLDER, &self.version),
      None => self.version.clone(),
    }
  }

  pub fn settings_for(&self, base: TargetBase) -> Option<TargetSettings<'_>> {
    self.browser_specific_settings.as_ref().and_then(|s| s.for_base(base))
  }
}
