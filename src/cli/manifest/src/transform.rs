/* src/cli/manifest/src/transform.rs */

// Source manifest -> per-family manifest document.
// Cross-cutting edits run first, then the family dialect, then the settings fan-out.


use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::mode::{BuildMode, DevServerKind};
use crate::source::{Background, ResourceGroup, SourceManifest, TargetSettings};
use crate::target::TargetBase;

pub const LOCAL_API_HOST_PERMISSION: &str = "http://localhost/*";
pub const BETA_NAME_SUFFIX: &str = " (Beta)";
const SOURCE_MAP_SUFFIX: &str = ".map";

/// Output keys produced by the transformer; authored copies are ignored.
const DERIVED_KEYS: &[&str] = &["minimum_chrome_version", "browser_action"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedManifest {
  pub manifest_version: u8,
  pub name: String,
  pub version: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub minimum_chrome_version: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub permissions: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub optional_permissions: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub host_permissions: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub optional_host_permissions: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub background: Option<Background>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub web_accessible_resources: Option<WebAccessibleResources>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub action: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub browser_action: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub options_ui: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub incognito: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub browser_specific_settings: Option<IdentityBlock>,
  #[serde(flatten)]
  pub rest: BTreeMap<String, Value>,
}

/// Grouped (Chromium/Apple) or flat (Gecko MV2) resource exposure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WebAccessibleResources {
  Grouped(Vec<ResourceGroup>),
  Flat(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdentityBlock {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gecko: Option<GeckoIdentity>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub safari: Option<SafariIdentity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeckoIdentity {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub update_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub strict_min_version: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub strict_max_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SafariIdentity {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub strict_min_version: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub strict_max_version: Option<String>,
}

impl TransformedManifest {
  pub fn to_json_pretty(&self) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(self)?;
    out.push('\n');
    Ok(out)
  }
}

// -- Entry point --

pub fn transform(
  source: &SourceManifest,
  base: TargetBase,
  mode: BuildMode,
) -> TransformedManifest {
  let manifest = source.clone();
  let release_beta = manifest.beta && !mode.is_dev;
  let mut out = apply_cross_cutting(&manifest, mode, release_beta);

  match base {
    TargetBase::Chromium => apply_chromium(&mut out, &manifest),
    TargetBase::Gecko => apply_gecko(&mut out),
    TargetBase::Apple => apply_apple(&mut out),
  }

  out.browser_specific_settings = identity_block(&manifest, base, mode, release_beta);
  if base == TargetBase::Chromium {
    out.minimum_chrome_version = match manifest.settings_for(base) {
      Some(TargetSettings::Chromium(s)) => s.minimum_version.clone(),
      _ => None,
    };
  }
  out
}

fn apply_cross_cutting(
  manifest: &SourceManifest,
  mode: BuildMode,
  release_beta: bool,
) -> TransformedManifest {
  let mut host_permissions = manifest.host_permissions.clone();
  if mode.has(DevServerKind::Api) {
    push_unique(&mut host_permissions, LOCAL_API_HOST_PERMISSION);
  }

  let groups = if mode.is_dev {
    manifest.web_accessible_resources.clone()
  } else {
    strip_source_maps(&manifest.web_accessible_resources)
  };

  let name = if release_beta {
    format!("{}{BETA_NAME_SUFFIX}", manifest.name)
  } else {
    manifest.name.clone()
  };

  TransformedManifest {
    manifest_version: manifest.manifest_version,
    name,
    version: manifest.version.clone(),
    minimum_chrome_version: None,
    permissions: manifest.permissions.clone(),
    optional_permissions: manifest.optional_permissions.clone(),
    host_permissions,
    optional_host_permissions: manifest.optional_host_permissions.clone(),
    background: manifest.background.clone(),
    web_accessible_resources: if groups.is_empty() {
      None
    } else {
      Some(WebAccessibleResources::Grouped(groups))
    },
    action: manifest.action.clone(),
    browser_action: None,
    options_ui: manifest.options_ui.clone(),
    incognito: manifest.incognito.clone(),
    browser_specific_settings: None,
    rest: manifest
      .rest
      .iter()
      .filter(|(key, _)| !DERIVED_KEYS.contains(&key.as_str()))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect(),
  }
}

/// Drop source-map resources, then drop groups left with nothing to expose.
fn strip_source_maps(groups: &[ResourceGroup]) -> Vec<ResourceGroup> {
  groups
    .iter()
    .filter_map(|group| {
      let resources: Vec<String> =
        group.resources.iter().filter(|r| !r.ends_with(SOURCE_MAP_SUFFIX)).cloned().collect();
      if resources.is_empty() { None } else { Some(ResourceGroup { resources, ..group.clone() }) }
    })
    .collect()
}

fn apply_chromium(out: &mut TransformedManifest, manifest: &SourceManifest) {
  if let Some(store_version) = &manifest.store_version {
    out.version = store_version.clone();
  }
  out.options_ui = None;
}

fn apply_gecko(out: &mut TransformedManifest) {
  out.manifest_version = 2;

  for host in std::mem::take(&mut out.host_permissions) {
    push_unique(&mut out.permissions, &host);
  }
  for host in std::mem::take(&mut out.optional_host_permissions) {
    push_unique(&mut out.optional_permissions, &host);
  }

  out.background = out.background.take().map(|bg| match bg {
    Background::Worker { service_worker, .. } => {
      Background::Scripts { scripts: vec![service_worker], persistent: None }
    }
    scripts @ Background::Scripts { .. } => scripts,
  });

  out.web_accessible_resources = match out.web_accessible_resources.take() {
    Some(WebAccessibleResources::Grouped(groups)) => {
      let mut flat = Vec::new();
      for resource in groups.iter().flat_map(|g| &g.resources) {
        push_unique(&mut flat, resource);
      }
      if flat.is_empty() { None } else { Some(WebAccessibleResources::Flat(flat)) }
    }
    other => other,
  };

  out.browser_action = out.action.take();
}

fn apply_apple(out: &mut TransformedManifest) {
  out.incognito = None;
  out.options_ui = None;
  out.optional_permissions.retain(|p| p != "cookies");
}

fn identity_block(
  manifest: &SourceManifest,
  base: TargetBase,
  mode: BuildMode,
  release_beta: bool,
) -> Option<IdentityBlock> {
  match manifest.settings_for(base)? {
    TargetSettings::Chromium(_) => None,
    TargetSettings::Gecko(gecko) => {
      let (id, update_url) = if mode.is_dev {
        (gecko.id.clone(), gecko.update_url.clone())
      } else if release_beta {
        (gecko.beta_id.clone(), gecko.beta_update_url.clone())
      } else {
        (None, None)
      };
      Some(IdentityBlock {
        gecko: Some(GeckoIdentity {
          id,
          update_url,
          strict_min_version: gecko.strict_min_version.clone(),
          strict_max_version: gecko.strict_max_version.clone(),
        }),
        safari: None,
      })
    }
    TargetSettings::Apple(safari) => Some(IdentityBlock {
      gecko: None,
      safari: Some(SafariIdentity {
        strict_min_version: safari.strict_min_version.clone(),
        strict_max_version: safari.strict_max_version.clone(),
      }),
    }),
  }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
  if !list.iter().any(|v| v == value) {
    list.push(value.to_string());
  }
}
