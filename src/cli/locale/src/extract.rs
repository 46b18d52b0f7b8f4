/* src/cli/locale/src/extract.rs */

// Nested per-locale message trees -> flat dotted-key catalogs.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Properties starting with this character are directives, not namespaces.
pub const DIRECTIVE_MARKER: char = '$';
const TYPES_DIRECTIVE: &str = "$types";
const MESSAGE_DIRECTIVE: &str = "$message";
const CONTEXT_DIRECTIVE: &str = "$context";

pub const MAIN_TAG: &str = "main";
pub const MANIFEST_TAG: &str = "manifest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub context: Option<String>,
}

/// Which nodes of a tree an extraction call keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractProfile {
  pub tags: BTreeSet<String>,
  /// Tag set assumed for nodes that declare no `$types`. `None` = applies everywhere.
  pub untagged: Option<BTreeSet<String>>,
  /// Manifest catalogs cannot use `.` in message names.
  pub manifest_keys: bool,
}

impl ExtractProfile {
  pub fn new<I, S>(tags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self { tags: tags.into_iter().map(Into::into).collect(), untagged: None, manifest_keys: false }
  }

  pub fn main() -> Self {
    Self::new([MAIN_TAG])
  }

  pub fn manifest() -> Self {
    Self { manifest_keys: true, ..Self::new([MANIFEST_TAG]) }
  }

  pub fn with_untagged<I, S>(mut self, tags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.untagged = Some(tags.into_iter().map(Into::into).collect());
    self
  }

  fn applies(&self, node: &Map<String, Value>) -> bool {
    match node.get(TYPES_DIRECTIVE).and_then(Value::as_array) {
      Some(types) => types.iter().filter_map(Value::as_str).any(|t| self.tags.contains(t)),
      None => match &self.untagged {
        Some(defaults) => !defaults.is_disjoint(&self.tags),
        None => true,
      },
    }
  }
}

/// key -> message for a single locale.
pub type LocaleMessages = BTreeMap<String, Message>;

/// key -> locale -> message, both levels sorted.
pub type LocaleCatalog = BTreeMap<String, BTreeMap<String, Message>>;

/// locale -> namespace (None = root) -> tree.
pub type LocaleForest = BTreeMap<String, Vec<(Option<String>, Value)>>;

// -- Extraction --

/// Messages of one tree. Two paths producing the same key (a literal `a.b` property next to
/// `a: { b }`, or `a.b` next to `a_b` in a manifest catalog) are an error.
pub fn extract(
  tree: &Value,
  profile: &ExtractProfile,
  namespace: Option<&str>,
) -> Result<LocaleMessages> {
  let mut found = Vec::new();
  walk(tree, profile, namespace.unwrap_or_default(), &mut found);

  let mut out = LocaleMessages::new();
  let mut sources: BTreeMap<String, String> = BTreeMap::new();
  for (path, message) in found {
    let key = if profile.manifest_keys { path.replace('.', "_") } else { path.clone() };
    if let Some(previous) = sources.insert(key.clone(), path.clone()) {
      bail!("\"{previous}\" and \"{path}\" both produce message key \"{key}\"");
    }
    out.insert(key, message);
  }
  Ok(out)
}

fn walk(node: &Value, profile: &ExtractProfile, path: &str, out: &mut Vec<(String, Message)>) {
  match node {
    Value::String(s) => {
      if !s.is_empty() && !path.is_empty() {
        out.push((path.to_string(), Message { message: s.clone(), context: None }));
      }
    }
    Value::Object(obj) => {
      if !profile.applies(obj) {
        return;
      }
      if let Some(message) = obj.get(MESSAGE_DIRECTIVE).and_then(Value::as_str) {
        if !message.is_empty() && !path.is_empty() {
          let context = obj.get(CONTEXT_DIRECTIVE).and_then(Value::as_str).map(str::to_string);
          out.push((path.to_string(), Message { message: message.to_string(), context }));
        }
      }
      for (key, child) in obj {
        if key.starts_with(DIRECTIVE_MARKER) {
          continue;
        }
        let child_path = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
        walk(child, profile, &child_path, out);
      }
    }
    _ => {}
  }
}

/// Extract every locale of a forest and merge into one catalog. A key defined by two
/// namespaces of the same locale is an error.
pub fn flatten(forest: &LocaleForest, profile: &ExtractProfile) -> Result<LocaleCatalog> {
  let mut catalog: LocaleCatalog = BTreeMap::new();
  for (locale, trees) in forest {
    for (namespace, tree) in trees {
      let ns = namespace.as_deref();
      let messages = extract(tree, profile, ns)
        .with_context(|| format!("locale {locale}, namespace {}", ns.unwrap_or("messages")))?;
      for (key, message) in messages {
        if catalog.entry(key.clone()).or_default().insert(locale.clone(), message).is_some() {
          bail!("message key \"{key}\" is defined more than once for locale {locale}");
        }
      }
    }
  }
  Ok(catalog)
}

/// All messages of one locale from a merged catalog.
pub fn messages_for(catalog: &LocaleCatalog, locale: &str) -> LocaleMessages {
  catalog
    .iter()
    .filter_map(|(key, per_locale)| per_locale.get(locale).map(|m| (key.clone(), m.clone())))
    .collect()
}
