/* src/cli/core/src/env.rs */

// Build-time constants for one (target, mode) pair.

use std::collections::BTreeMap;

use extbuild_manifest::{BuildMode, SourceManifest, Target};
use serde_json::{Value, json};

use crate::config::{DomainEntry, ExtbuildConfig};
use crate::params::RuntimeParams;

pub const ENV_PREFIX: &str = "EXT_";

/// Sorted so the serialized form is byte-identical across builds.
pub type EnvironmentMap = BTreeMap<String, Value>;

/// Session facts the resolver reads; everything else comes from target and mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFacts {
  pub version: String,
  pub version_name: String,
  pub beta: bool,
  pub domains: BTreeMap<String, DomainEntry>,
  pub locales: Vec<String>,
  pub default_locale: String,
  pub hot_reload_port: u16,
}

impl EnvFacts {
  pub fn new(config: &ExtbuildConfig, manifest: &SourceManifest, locales: &[String]) -> Self {
    Self {
      version: manifest.version.clone(),
      version_name: manifest.rendered_version_name(),
      beta: manifest.beta,
      domains: config.domains.clone(),
      locales: locales.to_vec(),
      default_locale: config.locales.default.clone(),
      hot_reload_port: config.dev.port,
    }
  }
}

pub fn domain_key(name: &str) -> String {
  format!("{ENV_PREFIX}{}_DOMAIN", name.to_ascii_uppercase().replace('-', "_"))
}

/// Development origin only when the gating dev server answered; production otherwise.
pub fn domain_origin<'a>(entry: &'a DomainEntry, mode: BuildMode) -> &'a str {
  match (&entry.development, entry.server) {
    (Some(dev), Some(kind)) if mode.has(kind) => dev.as_str(),
    _ => entry.production.as_str(),
  }
}

pub fn resolve(
  target: Target,
  mode: BuildMode,
  params: &RuntimeParams,
  facts: &EnvFacts,
) -> EnvironmentMap {
  let mut env = EnvironmentMap::new();
  let mut set = |key: &str, value: Value| {
    env.insert(format!("{ENV_PREFIX}{key}"), value);
  };

  set("TARGET", json!(target.as_str()));
  set("TARGET_BASE", json!(target.base().as_str()));
  set("DEV", json!(mode.is_dev));
  set("BETA", json!(facts.beta));
  set("MODE", json!(mode.label()));
  set("VERSION", json!(facts.version));
  set("VERSION_NAME", json!(facts.version_name));
  set("REFERENCE_APP_VERSION", json!(params.reference_app_version));
  set("LOCALES", json!(facts.locales));
  set("DEFAULT_LOCALE", json!(facts.default_locale));

  let hot_reload = if mode.has(extbuild_manifest::DevServerKind::HotReload) {
    json!(format!("ws://localhost:{}", facts.hot_reload_port))
  } else {
    Value::Null
  };
  set("HOT_RELOAD_URL", hot_reload);

  for (name, entry) in &facts.domains {
    env.insert(domain_key(name), json!(domain_origin(entry, mode)));
  }
  env
}
