/* src/cli/locale/src/icu.rs */

// Minimal ICU MessageFormat reader: enough structure to find arguments and their kinds.

use std::fmt;

use anyhow::{Result, anyhow, bail};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
  Plain,
  Number,
  Date,
  Time,
  Plural,
  SelectOrdinal,
  Select,
}

impl ArgKind {
  fn from_keyword(keyword: &str) -> Option<Self> {
    match keyword {
      "number" => Some(Self::Number),
      "date" => Some(Self::Date),
      "time" => Some(Self::Time),
      "plural" => Some(Self::Plural),
      "selectordinal" => Some(Self::SelectOrdinal),
      "select" => Some(Self::Select),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Plain => "plain",
      Self::Number => "number",
      Self::Date => "date",
      Self::Time => "time",
      Self::Plural => "plural",
      Self::SelectOrdinal => "selectordinal",
      Self::Select => "select",
    }
  }

  fn is_plural(self) -> bool {
    matches!(self, Self::Plural | Self::SelectOrdinal)
  }

  fn has_branches(self) -> bool {
    matches!(self, Self::Plural | Self::SelectOrdinal | Self::Select)
  }
}

impl fmt::Display for ArgKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  Text(String),
  /// `#` inside a plural branch.
  Pound,
  Argument { name: String, kind: ArgKind, branches: Vec<Branch> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
  pub selector: String,
  pub value: Vec<Node>,
}

pub fn parse(message: &str) -> Result<Vec<Node>> {
  let mut parser = Parser { chars: message.chars().collect(), pos: 0 };
  let nodes = parser.message(false)?;
  if parser.pos < parser.chars.len() {
    bail!("unmatched '}}' at offset {}", parser.pos);
  }
  Ok(nodes)
}

struct Parser {
  chars: Vec<char>,
  pos: usize,
}

impl Parser {
  fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).copied()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek();
    if c.is_some() {
      self.pos += 1;
    }
    c
  }

  fn skip_ws(&mut self) {
    while self.peek().is_some_and(char::is_whitespace) {
      self.pos += 1;
    }
  }

  fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
    let start = self.pos;
    while self.peek().is_some_and(&keep) {
      self.pos += 1;
    }
    self.chars[start..self.pos].iter().collect()
  }

  fn identifier(&mut self) -> String {
    self.take_while(|c| c.is_alphanumeric() || c == '_')
  }

  /// Text and arguments up to (not including) an unmatched `}` or end of input.
  fn message(&mut self, in_plural: bool) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut text = String::new();
    while let Some(c) = self.peek() {
      match c {
        '}' => break,
        '{' => {
          flush(&mut text, &mut nodes);
          nodes.push(self.argument(in_plural)?);
        }
        '#' if in_plural => {
          flush(&mut text, &mut nodes);
          self.pos += 1;
          nodes.push(Node::Pound);
        }
        '\'' => self.quoted(&mut text, in_plural),
        _ => {
          text.push(c);
          self.pos += 1;
        }
      }
    }
    flush(&mut text, &mut nodes);
    Ok(nodes)
  }

  // `''` is a literal apostrophe; `'` before a syntax char opens a literal run.
  fn quoted(&mut self, text: &mut String, in_plural: bool) {
    match self.chars.get(self.pos + 1).copied() {
      Some('\'') => {
        text.push('\'');
        self.pos += 2;
      }
      Some(next) if next == '{' || next == '}' || (in_plural && next == '#') => {
        self.pos += 1;
        while let Some(c) = self.bump() {
          if c != '\'' {
            text.push(c);
          } else if self.peek() == Some('\'') {
            text.push('\'');
            self.pos += 1;
          } else {
            return;
          }
        }
      }
      _ => {
        text.push('\'');
        self.pos += 1;
      }
    }
  }

  fn argument(&mut self, in_plural: bool) -> Result<Node> {
    let start = self.pos;
    self.pos += 1;
    self.skip_ws();
    let name = self.identifier();
    if name.is_empty() {
      bail!("expected argument name at offset {}", self.pos);
    }
    self.skip_ws();
    match self.bump() {
      Some('}') => return Ok(Node::Argument { name, kind: ArgKind::Plain, branches: vec![] }),
      Some(',') => {}
      _ => bail!("unterminated argument \"{name}\" at offset {start}"),
    }

    self.skip_ws();
    let keyword = self.identifier();
    let kind = ArgKind::from_keyword(&keyword)
      .ok_or_else(|| anyhow!("unknown type \"{keyword}\" for argument \"{name}\""))?;
    self.skip_ws();

    if !kind.has_branches() {
      match self.bump() {
        Some('}') => {}
        Some(',') => self.skip_style(&name)?,
        _ => bail!("unterminated {kind} argument \"{name}\""),
      }
      return Ok(Node::Argument { name, kind, branches: vec![] });
    }

    if self.bump() != Some(',') {
      bail!("{kind} argument \"{name}\" needs branches");
    }
    let branches = self.branches(&name, kind, in_plural || kind.is_plural())?;
    Ok(Node::Argument { name, kind, branches })
  }

  fn skip_style(&mut self, name: &str) -> Result<()> {
    let mut depth = 0usize;
    while let Some(c) = self.bump() {
      match c {
        '{' => depth += 1,
        '}' if depth == 0 => return Ok(()),
        '}' => depth -= 1,
        _ => {}
      }
    }
    bail!("unterminated style for argument \"{name}\"")
  }

  fn branches(&mut self, name: &str, kind: ArgKind, in_plural: bool) -> Result<Vec<Branch>> {
    let mut branches = Vec::new();
    loop {
      self.skip_ws();
      match self.peek() {
        Some('}') => {
          self.pos += 1;
          break;
        }
        None => bail!("unterminated {kind} argument \"{name}\""),
        _ => {}
      }

      let selector = self.take_while(|c| !c.is_whitespace() && c != '{' && c != '}');
      if selector.is_empty() {
        bail!("expected selector in {kind} argument \"{name}\" at offset {}", self.pos);
      }
      if kind.is_plural() && selector.starts_with("offset:") {
        if selector == "offset:" {
          self.skip_ws();
          self.identifier();
        }
        continue;
      }

      self.skip_ws();
      if self.bump() != Some('{') {
        bail!("expected '{{' after selector \"{selector}\" in argument \"{name}\"");
      }
      let value = self.message(in_plural)?;
      if self.bump() != Some('}') {
        bail!("unterminated branch \"{selector}\" in argument \"{name}\"");
      }
      branches.push(Branch { selector, value });
    }

    if !branches.iter().any(|b| b.selector == "other") {
      bail!("{kind} argument \"{name}\" has no \"other\" branch");
    }
    Ok(branches)
  }
}

fn flush(text: &mut String, nodes: &mut Vec<Node>) {
  if !text.is_empty() {
    nodes.push(Node::Text(std::mem::take(text)));
  }
}
