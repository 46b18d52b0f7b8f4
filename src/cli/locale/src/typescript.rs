/* src/cli/locale/src/typescript.rs */

use std::collections::BTreeMap;

use crate::arguments::ArgumentSet;
use crate::icu::ArgKind;

const HEADER: &str = "// Generated by extbuild. Do not edit.\n\n";

fn ts_type(kind: ArgKind) -> &'static str {
  match kind {
    ArgKind::Number | ArgKind::Plural | ArgKind::SelectOrdinal => "number",
    ArgKind::Date | ArgKind::Time => "Date | number",
    ArgKind::Select => "string",
    ArgKind::Plain => "string | number",
  }
}

/// Quote a key unless it is a valid JS identifier.
fn quote_key(name: &str) -> String {
  let mut chars = name.chars();
  let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
  if first_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
    name.to_string()
  } else {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
  }
}

fn render_arguments(args: &ArgumentSet) -> String {
  if args.is_empty() {
    return "Record<string, never>".to_string();
  }
  let fields: Vec<String> =
    args.iter().map(|(name, kind)| format!("{}: {}", quote_key(name), ts_type(*kind))).collect();
  format!("{{ {} }}", fields.join("; "))
}

/// Declarations for the message catalog: a key union and per-key argument shapes.
pub fn generate_typescript(arguments: &BTreeMap<String, ArgumentSet>) -> String {
  let mut out = String::from(HEADER);

  out.push_str("export interface MessageArguments {\n");
  for (key, args) in arguments {
    out.push_str(&format!("  {}: {};\n", quote_key(key), render_arguments(args)));
  }
  out.push_str("}\n\n");

  if arguments.is_empty() {
    out.push_str("export type MessageKey = never;\n");
  } else {
    out.push_str("export type MessageKey = keyof MessageArguments;\n");
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn set(entries: &[(&str, ArgKind)]) -> ArgumentSet {
    entries.iter().map(|(n, k)| (n.to_string(), *k)).collect()
  }

  #[test]
  fn renders_interface_with_quoted_dotted_keys() {
    let mut args = BTreeMap::new();
    args.insert("a.b".to_string(), set(&[("name", ArgKind::Plain)]));
    args.insert("title".to_string(), ArgumentSet::new());
    let ts = generate_typescript(&args);
    assert!(ts.contains("  \"a.b\": { name: string | number };\n"), "{ts}");
    assert!(ts.contains("  title: Record<string, never>;\n"), "{ts}");
    assert!(ts.contains("export type MessageKey = keyof MessageArguments;"));
  }

  #[test]
  fn maps_kinds_to_types() {
    let mut args = BTreeMap::new();
    args.insert(
      "k".to_string(),
      set(&[
        ("count", ArgKind::Plural),
        ("day", ArgKind::Date),
        ("gender", ArgKind::Select),
        ("rank", ArgKind::SelectOrdinal),
        ("total", ArgKind::Number),
      ]),
    );
    let ts = generate_typescript(&args);
    assert!(ts.contains(
      "k: { count: number; day: Date | number; gender: string; rank: number; total: number };"
    ));
  }

  #[test]
  fn empty_catalog_has_never_key() {
    let ts = generate_typescript(&BTreeMap::new());
    assert!(ts.contains("export interface MessageArguments {\n}\n"));
    assert!(ts.contains("export type MessageKey = never;"));
  }

  #[test]
  fn output_is_stable() {
    let mut args = BTreeMap::new();
    args.insert("z".to_string(), ArgumentSet::new());
    args.insert("a".to_string(), set(&[("x", ArgKind::Time)]));
    let first = generate_typescript(&args);
    assert_eq!(first, generate_typescript(&args));
    assert!(first.find("  a:").unwrap() < first.find("  z:").unwrap());
  }
}
