/* src/cli/locale/src/arguments.rs */

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};

use crate::extract::LocaleCatalog;
use crate::icu::{self, ArgKind, Node};

/// Argument name -> kind, for a single message.
pub type ArgumentSet = BTreeMap<String, ArgKind>;

pub fn message_arguments(message: &str) -> Result<ArgumentSet> {
  let nodes = icu::parse(message)?;
  let mut out = ArgumentSet::new();
  collect(&nodes, &mut out);
  Ok(out)
}

fn collect(nodes: &[Node], out: &mut ArgumentSet) {
  for node in nodes {
    if let Node::Argument { name, kind, branches } = node {
      // A typed use is more informative than a plain one.
      let entry = out.entry(name.clone()).or_insert(*kind);
      if *entry == ArgKind::Plain {
        *entry = *kind;
      }
      for branch in branches {
        collect(&branch.value, out);
      }
    }
  }
}

/// Arguments per key, read from the reference locale's messages.
pub fn collect_arguments(
  catalog: &LocaleCatalog,
  reference_locale: &str,
) -> Result<BTreeMap<String, ArgumentSet>> {
  let mut out = BTreeMap::new();
  for (key, per_locale) in catalog {
    let set = match per_locale.get(reference_locale) {
      Some(message) => message_arguments(&message.message)
        .with_context(|| format!("invalid message \"{key}\" in locale \"{reference_locale}\""))?,
      None => ArgumentSet::new(),
    };
    out.insert(key.clone(), set);
  }
  Ok(out)
}

// -- Verification --

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
  pub key: String,
  pub locale: String,
  pub detail: String,
}

impl fmt::Display for CatalogIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} [{}]: {}", self.key, self.locale, self.detail)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
  /// Messages that do not parse. Fatal for the locale step.
  pub invalid: Vec<CatalogIssue>,
  /// Arguments missing from the reference message. Reported as warnings.
  pub unknown_arguments: Vec<CatalogIssue>,
}

impl Verification {
  pub fn is_clean(&self) -> bool {
    self.invalid.is_empty() && self.unknown_arguments.is_empty()
  }
}

pub fn verify_catalog(catalog: &LocaleCatalog, reference_locale: &str) -> Verification {
  let mut report = Verification::default();
  for (key, per_locale) in catalog {
    let reference =
      per_locale.get(reference_locale).and_then(|m| message_arguments(&m.message).ok());
    for (locale, message) in per_locale {
      let issue =
        |detail: String| CatalogIssue { key: key.clone(), locale: locale.clone(), detail };
      match message_arguments(&message.message) {
        Err(e) => report.invalid.push(issue(format!("{e:#}"))),
        Ok(args) => {
          let Some(reference) = &reference else { continue };
          for name in args.keys().filter(|name| !reference.contains_key(*name)) {
            report.unknown_arguments.push(issue(format!(
              "argument \"{name}\" is not used by the {reference_locale} message"
            )));
          }
        }
      }
    }
  }
  report
}
