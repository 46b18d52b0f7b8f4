/* src/cli/core/src/build/steps/locales.rs */

// Locale forest on disk -> `_locales/<l>/messages.json` plus runtime catalogs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use extbuild_locale::{
  ExtractProfile, LocaleCatalog, LocaleForest, collect_arguments, flatten, generate_typescript,
  messages_for, resolve_fallback, verify_catalog,
};
use extbuild_manifest::jsonc;
use serde::Serialize;
use serde_json::Value;

use crate::build::context::TargetContext;
use crate::build::fs::{blocking, has_extension, list_files, write_file, write_json};
use crate::session::Session;
use crate::ui;

/// File stem that holds root-namespace messages.
const ROOT_NAMESPACE: &str = "messages";
const MANIFEST_LOCALES_DIR: &str = "_locales";
const RUNTIME_LOCALES_DIR: &str = "locales";

#[derive(Serialize)]
struct ManifestMessage<'a> {
  message: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  description: Option<&'a str>,
}

/// `<dir>/<locale>/*.jsonc`, one tree per file; the file stem is the namespace.
pub(crate) fn read_forest(dir: &Path, locales: &[String]) -> Result<LocaleForest> {
  let mut forest = LocaleForest::new();
  for locale in locales {
    let mut trees = Vec::new();
    let locale_dir = dir.join(locale);
    let files = list_files(&locale_dir, |p| {
      p.parent().is_some_and(|d| d.as_os_str().is_empty())
        && (has_extension(p, "jsonc") || has_extension(p, "json"))
    })?;
    for (path, _) in files {
      let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
      let namespace = (stem != ROOT_NAMESPACE).then_some(stem);
      trees.push((namespace, jsonc::read::<Value>(&path)?));
    }
    forest.insert(locale.clone(), trees);
  }
  Ok(forest)
}

/// Browser locale folders use `_` where BCP 47 uses `-`.
fn manifest_locale_dir(locale: &str) -> String {
  locale.replace('-', "_")
}

fn write_catalogs(
  out_dir: &Path,
  locales: &[String],
  main: &LocaleCatalog,
  manifest: &LocaleCatalog,
) -> Result<Vec<String>> {
  for locale in locales {
    let messages = messages_for(manifest, locale);
    if messages.is_empty() {
      continue;
    }
    let entries: BTreeMap<&str, ManifestMessage<'_>> = messages
      .iter()
      .map(|(key, m)| {
        (key.as_str(), ManifestMessage { message: &m.message, description: m.context.as_deref() })
      })
      .collect();
    let path =
      out_dir.join(MANIFEST_LOCALES_DIR).join(manifest_locale_dir(locale)).join("messages.json");
    write_json(&path, &entries)?;
  }

  let resolved = resolve_fallback(main, locales);
  for (locale, messages) in &resolved.locales {
    write_json(&out_dir.join(RUNTIME_LOCALES_DIR).join(format!("{locale}.json")), messages)?;
  }
  Ok(resolved.unresolved.into_iter().collect())
}

pub(crate) async fn run(ctx: &TargetContext) -> Result<()> {
  let session = &ctx.session;
  let dir = session.path(&session.config.source.locales_dir);
  let locales = session.locales.clone();
  let forest = blocking(move || read_forest(&dir, &locales)).await?;

  let main = flatten(&forest, &ExtractProfile::main())?;
  let manifest = flatten(&forest, &ExtractProfile::manifest())?;

  let report = verify_catalog(&main, &session.config.locales.default);
  if !report.invalid.is_empty() {
    let lines: Vec<String> = report.invalid.iter().map(ToString::to_string).collect();
    bail!("invalid messages:\n{}", lines.join("\n"));
  }
  for issue in &report.unknown_arguments {
    ui::warn(&format!("{} {issue}", ctx.label("locales")));
  }

  let out_dir = ctx.out_dir.clone();
  let locales = session.locales.clone();
  let unresolved =
    blocking(move || write_catalogs(&out_dir, &locales, &main, &manifest)).await?;
  for key in unresolved {
    ui::warn(&format!("{} no locale has \"{key}\", using the key", ctx.label("locales")));
  }
  Ok(())
}

/// Write the message type declarations to `locales.types_out`, when configured.
pub(crate) async fn write_type_declarations(session: &Session) -> Result<Option<PathBuf>> {
  let Some(types_out) = session.config.locales.types_out.as_deref() else {
    return Ok(None);
  };
  let path = session.path(types_out);
  let dir = session.path(&session.config.source.locales_dir);
  let locales = session.locales.clone();
  let default = session.config.locales.default.clone();
  blocking(move || {
    let forest = read_forest(&dir, &locales)?;
    let main = flatten(&forest, &ExtractProfile::main())?;
    let arguments = collect_arguments(&main, &default)?;
    write_file(&path, &generate_typescript(&arguments))?;
    Ok(Some(path))
  })
  .await
}
