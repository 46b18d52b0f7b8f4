/* src/cli/core/src/config/types.rs */

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use extbuild_manifest::DevServerKind;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ExtbuildConfig {
  pub project: ProjectConfig,
  #[serde(default)]
  pub source: SourceSection,
  #[serde(default)]
  pub build: BuildSection,
  #[serde(default)]
  pub locales: LocalesSection,
  #[serde(default)]
  pub domains: BTreeMap<String, DomainEntry>,
  #[serde(default)]
  pub params: ParamsSection,
  #[serde(default)]
  pub rules: RulesSection,
  #[serde(default)]
  pub dev: DevSection,
  #[serde(default)]
  pub signing: SigningSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSection {
  #[serde(default = "default_manifest")]
  pub manifest: String,
  #[serde(default = "default_scripts_dir")]
  pub scripts_dir: String,
  #[serde(default = "default_styles_dir")]
  pub styles_dir: String,
  #[serde(default = "default_pages_dir")]
  pub pages_dir: String,
  #[serde(default = "default_assets_dir")]
  pub assets_dir: String,
  #[serde(default = "default_locales_dir")]
  pub locales_dir: String,
}

impl Default for SourceSection {
  fn default() -> Self {
    Self {
      manifest: default_manifest(),
      scripts_dir: default_scripts_dir(),
      styles_dir: default_styles_dir(),
      pages_dir: default_pages_dir(),
      assets_dir: default_assets_dir(),
      locales_dir: default_locales_dir(),
    }
  }
}

fn default_manifest() -> String {
  "manifest.jsonc".to_string()
}

fn default_scripts_dir() -> String {
  "src/scripts".to_string()
}

fn default_styles_dir() -> String {
  "src/styles".to_string()
}

fn default_pages_dir() -> String {
  "src/pages".to_string()
}

fn default_assets_dir() -> String {
  "src/assets".to_string()
}

fn default_locales_dir() -> String {
  "locales".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
  #[serde(default = "default_out_dir")]
  pub out_dir: String,
  #[serde(default = "default_artifacts_dir")]
  pub artifacts_dir: String,
  #[serde(default = "default_cache_dir")]
  pub cache_dir: String,
  pub bundler_command: Option<String>,
  pub style_command: Option<String>,
  pub apple_wrap_command: Option<String>,
}

impl Default for BuildSection {
  fn default() -> Self {
    Self {
      out_dir: default_out_dir(),
      artifacts_dir: default_artifacts_dir(),
      cache_dir: default_cache_dir(),
      bundler_command: None,
      style_command: None,
      apple_wrap_command: None,
    }
  }
}

fn default_out_dir() -> String {
  "dist".to_string()
}

fn default_artifacts_dir() -> String {
  "artifacts".to_string()
}

fn default_cache_dir() -> String {
  ".extbuild/cache".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalesSection {
  #[serde(default = "default_locale")]
  pub default: String,
  /// Fallback order; discovered from the locales directory when empty.
  #[serde(default)]
  pub order: Vec<String>,
  /// Where the generated message type declarations go.
  pub types_out: Option<String>,
}

impl Default for LocalesSection {
  fn default() -> Self {
    Self { default: default_locale(), order: Vec::new(), types_out: None }
  }
}

fn default_locale() -> String {
  "en".to_string()
}

/// One named origin, e.g. `[domains.api]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainEntry {
  pub production: String,
  pub development: Option<String>,
  /// Dev server whose reachability selects the development origin.
  pub server: Option<DevServerKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamsSection {
  pub version_url: Option<String>,
  #[serde(default = "default_version_field")]
  pub version_field: String,
  pub policy_url: Option<String>,
  #[serde(default = "default_cache_file")]
  pub cache_file: String,
  /// Pinned values skip the corresponding request.
  pub app_version: Option<String>,
  pub security_policy: Option<String>,
}

impl Default for ParamsSection {
  fn default() -> Self {
    Self {
      version_url: None,
      version_field: default_version_field(),
      policy_url: None,
      cache_file: default_cache_file(),
      app_version: None,
      security_policy: None,
    }
  }
}

fn default_version_field() -> String {
  "version".to_string()
}

fn default_cache_file() -> String {
  ".extbuild/runtime-params.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RulesSection {
  #[serde(default = "default_web_domain")]
  pub web_domain: String,
  #[serde(default)]
  pub image_origins: Vec<String>,
}

impl Default for RulesSection {
  fn default() -> Self {
    Self { web_domain: default_web_domain(), image_origins: Vec::new() }
  }
}

fn default_web_domain() -> String {
  "web".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevSection {
  #[serde(default = "default_dev_port")]
  pub port: u16,
  #[serde(default = "default_api_port")]
  pub api_port: u16,
  #[serde(default = "default_website_port")]
  pub website_port: u16,
  #[serde(default = "default_probe_timeout_ms")]
  pub probe_timeout_ms: u64,
}

impl Default for DevSection {
  fn default() -> Self {
    Self {
      port: default_dev_port(),
      api_port: default_api_port(),
      website_port: default_website_port(),
      probe_timeout_ms: default_probe_timeout_ms(),
    }
  }
}

fn default_dev_port() -> u16 {
  35729
}

fn default_api_port() -> u16 {
  3000
}

fn default_website_port() -> u16 {
  8080
}

fn default_probe_timeout_ms() -> u64 {
  500
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SigningSection {
  pub url: Option<String>,
  /// Name of the environment variable holding the bearer credential.
  pub credential_env: Option<String>,
}

impl ExtbuildConfig {
  pub fn validate(&self) -> Result<()> {
    if self.project.name.trim().is_empty() {
      bail!("project.name must not be empty");
    }
    if !self.domains.contains_key(&self.rules.web_domain) {
      let known: Vec<_> = self.domains.keys().collect();
      bail!("rules.web_domain \"{}\" is not in [domains] {known:?}", self.rules.web_domain);
    }
    for (name, entry) in &self.domains {
      if entry.server.is_some() && entry.development.is_none() {
        bail!("domains.{name}.server is set but domains.{name}.development is missing");
      }
    }
    if self.rules.image_origins.len() != 2 {
      bail!(
        "rules.image_origins must list exactly two origins (got {})",
        self.rules.image_origins.len()
      );
    }
    if !self.locales.order.is_empty() && !self.locales.order.contains(&self.locales.default) {
      bail!(
        "locales.default \"{}\" is not in locales.order {:?}",
        self.locales.default,
        self.locales.order
      );
    }
    if self.params.app_version.is_none() && self.params.version_url.is_none() {
      bail!("either params.app_version or params.version_url must be set");
    }
    if self.params.security_policy.is_none() && self.params.policy_url.is_none() {
      bail!("either params.security_policy or params.policy_url must be set");
    }
    Ok(())
  }
}
