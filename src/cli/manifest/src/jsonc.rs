/* src/cli/manifest/src/jsonc.rs */

// JSON-with-comments reader shared by the manifest and locale sources.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Strip `//` and `/* */` comments and trailing commas, leaving string contents intact.
pub fn strip(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut chars = input.chars().peekable();
  let mut in_string = false;

  while let Some(c) = chars.next() {
    if in_string {
      out.push(c);
      match c {
        '\\' => {
          if let Some(next) = chars.next() {
            out.push(next);
          }
        }
        '"' => in_string = false,
        _ => {}
      }
      continue;
    }
    match c {
      '"' => {
        in_string = true;
        out.push(c);
      }
      '/' if chars.peek() == Some(&'/') => {
        for next in chars.by_ref() {
          if next == '\n' {
            out.push('\n');
            break;
          }
        }
      }
      '/' if chars.peek() == Some(&'*') => {
        chars.next();
        let mut prev = '\0';
        for next in chars.by_ref() {
          if next == '\n' {
            out.push('\n');
          }
          if prev == '*' && next == '/' {
            break;
          }
          prev = next;
        }
      }
      _ => out.push(c),
    }
  }

  remove_trailing_commas(&out)
}

fn remove_trailing_commas(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut in_string = false;
  let mut escaped = false;
  let chars: Vec<char> = input.chars().collect();

  for (i, &c) in chars.iter().enumerate() {
    if in_string {
      out.push(c);
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == '"' {
        in_string = false;
      }
      continue;
    }
    if c == '"' {
      in_string = true;
    }
    if c == ',' {
      let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
      if matches!(next, Some('}' | ']')) {
        continue;
      }
    }
    out.push(c);
  }
  out
}

pub fn parse<T: DeserializeOwned>(input: &str) -> Result<T> {
  let cleaned = strip(input);
  serde_json::from_str(&cleaned).context("invalid JSON")
}

pub fn read<T: DeserializeOwned>(path: &std::path::Path) -> Result<T> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  parse(&content).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{Value, json};

  #[test]
  fn strips_line_and_block_comments() {
    let src = r#"{
      // name of the thing
      "name": "x", /* inline */ "n": 1
    }"#;
    let v: Value = parse(src).unwrap();
    assert_eq!(v, json!({"name": "x", "n": 1}));
  }

  #[test]
  fn keeps_comment_markers_inside_strings() {
    let src = r#"{"url": "https://example.com/*", "note": "a // b /* c */"}"#;
    let v: Value = parse(src).unwrap();
    assert_eq!(v["url"], "https://example.com/*");
    assert_eq!(v["note"], "a // b /* c */");
  }

  #[test]
  fn drops_trailing_commas() {
    let src = r#"{"a": [1, 2, 3,], "b": {"c": true,},}"#;
    let v: Value = parse(src).unwrap();
    assert_eq!(v, json!({"a": [1, 2, 3], "b": {"c": true}}));
  }

  #[test]
  fn escaped_quotes_do_not_end_strings() {
    let src = r#"{"q": "say \"hi\", // not a comment",}"#;
    let v: Value = parse(src).unwrap();
    assert_eq!(v["q"], "say \"hi\", // not a comment");
  }

  #[test]
  fn invalid_json_is_an_error() {
    assert!(parse::<Value>("{\"a\": }").is_err());
  }
}
