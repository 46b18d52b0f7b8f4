/* src/cli/core/src/define.rs */

// Compile-time substitution of build constants into emitted scripts and markup.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use anyhow::{Result, bail};
use regex::{Captures, Regex};
use serde_json::Value;

use crate::env::{ENV_PREFIX, EnvironmentMap};

fn markup_token_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"%(EXT_[A-Z0-9_]+)%").unwrap())
}

fn is_ident_start(c: char) -> bool {
  c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '$'
}

/// Index just past the string literal opening at `start`.
fn skip_string(chars: &[char], start: usize) -> usize {
  let quote = chars[start];
  let mut i = start + 1;
  while i < chars.len() {
    match chars[i] {
      '\\' => i += 2,
      c if c == quote => return i + 1,
      _ => i += 1,
    }
  }
  chars.len()
}

/// Index just past the regex literal opening at `start`, flags included.
fn skip_regex(chars: &[char], start: usize) -> usize {
  let mut in_class = false;
  let mut i = start + 1;
  while i < chars.len() {
    match chars[i] {
      '\\' => i += 1,
      '\n' => return i,
      '[' => in_class = true,
      ']' => in_class = false,
      '/' if !in_class => {
        i += 1;
        while i < chars.len() && is_ident_char(chars[i]) {
          i += 1;
        }
        return i;
      }
      _ => {}
    }
    i += 1;
  }
  chars.len()
}

fn find_from(chars: &[char], start: usize, pattern: &[char]) -> Option<usize> {
  chars[start..].windows(pattern.len()).position(|w| w == pattern).map(|p| start + p)
}

fn unknown_error(unknown: &BTreeSet<String>) -> Result<()> {
  if unknown.is_empty() {
    return Ok(());
  }
  let names: Vec<_> = unknown.iter().map(String::as_str).collect();
  bail!("undefined build constants: {}", names.join(", "))
}

/// Keywords after which a `/` opens a regex literal rather than dividing.
const REGEX_KEYWORDS: &[&str] = &[
  "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
  "else", "yield", "await",
];

/// What the last significant token was, as far as `/` and member access care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
  Operator,
  Value,
  Dot,
}

struct Inliner<'a> {
  chars: Vec<char>,
  env: &'a EnvironmentMap,
  out: String,
  unknown: BTreeSet<String>,
  i: usize,
}

impl Inliner<'_> {
  fn copy_to(&mut self, end: usize) {
    let end = end.min(self.chars.len());
    self.out.extend(&self.chars[self.i..end]);
    self.i = end;
  }

  /// Copy code up to the end of input, or up to the `}` closing a template substitution.
  fn code(&mut self, nested: bool) {
    let mut depth = 0usize;
    let mut prev = Prev::Operator;
    while self.i < self.chars.len() {
      let c = self.chars[self.i];
      let next = self.chars.get(self.i + 1).copied();
      prev = match c {
        '}' if nested && depth == 0 => return,
        '"' | '\'' => {
          self.copy_to(skip_string(&self.chars, self.i));
          Prev::Value
        }
        '`' => {
          self.template();
          Prev::Value
        }
        '/' if next == Some('/') => {
          let end = find_from(&self.chars, self.i, &['\n']).unwrap_or(self.chars.len());
          self.copy_to(end);
          prev
        }
        '/' if next == Some('*') => {
          let end = find_from(&self.chars, self.i + 2, &['*', '/']).map_or(usize::MAX, |p| p + 2);
          self.copy_to(end);
          prev
        }
        '/' if prev == Prev::Operator => {
          self.copy_to(skip_regex(&self.chars, self.i));
          Prev::Value
        }
        c if is_ident_start(c) || c.is_ascii_digit() => self.word(prev),
        '.' if next == Some('.') => {
          let mut end = self.i;
          while self.chars.get(end) == Some(&'.') {
            end += 1;
          }
          self.copy_to(end);
          Prev::Operator
        }
        c => {
          self.copy_to(self.i + 1);
          match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
          }
          match c {
            c if c.is_whitespace() => prev,
            '.' => Prev::Dot,
            ')' | ']' => Prev::Value,
            _ => Prev::Operator,
          }
        }
      };
    }
  }

  fn template(&mut self) {
    self.copy_to(self.i + 1);
    while self.i < self.chars.len() {
      match self.chars[self.i] {
        '\\' => self.copy_to(self.i + 2),
        '`' => {
          self.copy_to(self.i + 1);
          return;
        }
        '$' if self.chars.get(self.i + 1) == Some(&'{') => {
          self.copy_to(self.i + 2);
          self.code(true);
          self.copy_to(self.i + 1);
        }
        _ => self.copy_to(self.i + 1),
      }
    }
  }

  fn word(&mut self, prev: Prev) -> Prev {
    let start = self.i;
    let mut end = start;
    while end < self.chars.len() && is_ident_char(self.chars[end]) {
      end += 1;
    }
    let word: String = self.chars[start..end].iter().collect();
    self.i = end;
    if word.starts_with(ENV_PREFIX) && prev != Prev::Dot {
      match self.env.get(&word) {
        Some(value) => self.out.push_str(&value.to_string()),
        None => {
          self.out.push_str(&word);
          self.unknown.insert(word);
        }
      }
      return Prev::Value;
    }
    self.out.push_str(&word);
    if REGEX_KEYWORDS.contains(&word.as_str()) { Prev::Operator } else { Prev::Value }
  }
}

/// Replace every free `EXT_*` identifier with its JSON literal, including inside template
/// substitutions. Strings, comments, regex literals and property accesses (`a.EXT_X`) are
/// left alone.
pub fn inline_script(source: &str, env: &EnvironmentMap) -> Result<String> {
  let mut inliner = Inliner {
    chars: source.chars().collect(),
    env,
    out: String::with_capacity(source.len()),
    unknown: BTreeSet::new(),
    i: 0,
  };
  inliner.code(false);
  unknown_error(&inliner.unknown)?;
  Ok(inliner.out)
}

/// Replace `%EXT_NAME%` tokens: strings verbatim, other values as JSON text.
pub fn substitute_markup(html: &str, env: &EnvironmentMap) -> Result<String> {
  let mut unknown = BTreeSet::new();
  let out = markup_token_re().replace_all(html, |caps: &Captures| match env.get(&caps[1]) {
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
    None => {
      unknown.insert(caps[1].to_string());
      caps[0].to_string()
    }
  });
  unknown_error(&unknown)?;
  Ok(out.into_owned())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn env() -> EnvironmentMap {
    let mut env = EnvironmentMap::new();
    env.insert("EXT_TARGET".into(), json!("firefox"));
    env.insert("EXT_DEV".into(), json!(false));
    env.insert("EXT_LOCALES".into(), json!(["en", "de"]));
    env.insert("EXT_HOT_RELOAD_URL".into(), Value::Null);
    env
  }

  #[test]
  fn inlines_free_identifiers() {
    let out = inline_script("if (EXT_DEV) { connect(EXT_HOT_RELOAD_URL); }", &env()).unwrap();
    assert_eq!(out, "if (false) { connect(null); }");
    let out = inline_script("const t = EXT_TARGET, l = EXT_LOCALES;", &env()).unwrap();
    assert_eq!(out, r#"const t = "firefox", l = ["en","de"];"#);
  }

  #[test]
  fn leaves_strings_comments_and_members_alone() {
    let src = "// EXT_NOPE\nconst a = \"EXT_TARGET\" + 'EXT_X' + `EXT_Y`; /* EXT_Z */ o.EXT_W;";
    assert_eq!(inline_script(src, &env()).unwrap(), src);
  }

  #[test]
  fn longer_identifiers_are_not_prefix_matched() {
    let src = "MY_EXT_TARGET + EXT_TARGETS_x";
    let err = inline_script(src, &env()).unwrap_err();
    assert!(err.to_string().contains("EXT_TARGETS_x"));
    assert!(!err.to_string().contains("MY_EXT"));
  }

  #[test]
  fn unknown_constants_are_errors() {
    let err = inline_script("use(EXT_MISSING, EXT_ALSO, EXT_MISSING)", &env()).unwrap_err();
    assert_eq!(err.to_string(), "undefined build constants: EXT_ALSO, EXT_MISSING");
  }

  #[test]
  fn escaped_quotes_stay_inside_strings() {
    let src = r#"const s = "say \"EXT_TARGET\""; f(EXT_TARGET);"#;
    let out = inline_script(src, &env()).unwrap();
    assert_eq!(out, r#"const s = "say \"EXT_TARGET\""; f("firefox");"#);
  }

  #[test]
  fn template_substitutions_are_code() {
    let src = "fetch(`${EXT_TARGET}/ratings?dev=${ { a: EXT_DEV }.a }`);";
    let out = inline_script(src, &env()).unwrap();
    assert_eq!(out, "fetch(`${\"firefox\"}/ratings?dev=${ { a: false }.a }`);");

    let nested = "`outer ${`inner ${EXT_DEV}`} EXT_TARGET`";
    assert_eq!(inline_script(nested, &env()).unwrap(), "`outer ${`inner ${false}`} EXT_TARGET`");
  }

  #[test]
  fn unknown_constant_in_template_is_an_error() {
    let err = inline_script("f(`${EXT_UNDEFINED_X}`);", &env()).unwrap_err();
    assert_eq!(err.to_string(), "undefined build constants: EXT_UNDEFINED_X");
  }

  #[test]
  fn regex_literals_do_not_open_strings() {
    let src = "s.replace(/'/g, EXT_TARGET); return /[/\"]x/.test(v) && EXT_DEV;";
    let out = inline_script(src, &env()).unwrap();
    assert_eq!(out, "s.replace(/'/g, \"firefox\"); return /[/\"]x/.test(v) && false;");
  }

  #[test]
  fn division_and_spread_still_inline() {
    let out = inline_script("const r = a / 2 / (b) / EXT_DEV; f(...EXT_LOCALES);", &env());
    assert_eq!(out.unwrap(), "const r = a / 2 / (b) / false; f(...[\"en\",\"de\"]);");
  }

  #[test]
  fn markup_tokens_use_raw_strings() {
    let html = r#"<html data-target="%EXT_TARGET%" data-dev="%EXT_DEV%"></html>"#;
    let out = substitute_markup(html, &env()).unwrap();
    assert_eq!(out, r#"<html data-target="firefox" data-dev="false"></html>"#);
  }

  #[test]
  fn unknown_markup_token_is_an_error() {
    let err = substitute_markup("<p>%EXT_NOPE%</p>", &env()).unwrap_err();
    assert!(err.to_string().contains("EXT_NOPE"));
  }
}
