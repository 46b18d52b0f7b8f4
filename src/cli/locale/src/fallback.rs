/* src/cli/locale/src/fallback.rs */

use std::collections::{BTreeMap, BTreeSet};

use crate::extract::LocaleCatalog;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCatalogs {
  /// locale -> key -> message text; every locale carries every key.
  pub locales: BTreeMap<String, BTreeMap<String, String>>,
  /// Keys with no message in any listed locale; they resolve to the key itself.
  pub unresolved: BTreeSet<String>,
}

/// Resolve the fallback chain so every locale has every key.
///
/// Per key per locale: the locale's own message, else the first listed locale that
/// has one (in `order`), else the key itself.
pub fn resolve_fallback(catalog: &LocaleCatalog, order: &[String]) -> ResolvedCatalogs {
  let mut resolved = ResolvedCatalogs::default();
  for locale in order {
    let mut messages = BTreeMap::new();
    for (key, per_locale) in catalog {
      let found = per_locale
        .get(locale)
        .or_else(|| order.iter().find_map(|other| per_locale.get(other)))
        .map(|m| m.message.clone());
      let text = found.unwrap_or_else(|| {
        resolved.unresolved.insert(key.clone());
        key.clone()
      });
      messages.insert(key.clone(), text);
    }
    resolved.locales.insert(locale.clone(), messages);
  }
  resolved
}
