/* src/cli/manifest/src/target.rs */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A concrete browser product the extension is packaged for.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Target {
  #[default]
  Chrome,
  Edge,
  Opera,
  Firefox,
  Safari,
}

/// Extension platform dialect shared by one or more targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetBase {
  Chromium,
  Gecko,
  Apple,
}

impl Target {
  pub const ALL: [Target; 5] =
    [Target::Chrome, Target::Edge, Target::Opera, Target::Firefox, Target::Safari];

  pub fn base(self) -> TargetBase {
    match self {
      Self::Chrome | Self::Edge | Self::Opera => TargetBase::Chromium,
      Self::Firefox => TargetBase::Gecko,
      Self::Safari => TargetBase::Apple,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Chrome => "chrome",
      Self::Edge => "edge",
      Self::Opera => "opera",
      Self::Firefox => "firefox",
      Self::Safari => "safari",
    }
  }
}

impl TargetBase {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Chromium => "chromium",
      Self::Gecko => "gecko",
      Self::Apple => "apple",
    }
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl fmt::Display for TargetBase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Returned when a target selector names no known browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTarget(pub String);

impl fmt::Display for UnknownTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let valid: Vec<_> = Target::ALL.iter().map(|t| t.as_str()).collect();
    write!(f, "unknown target \"{}\" (expected one of: {})", self.0, valid.join(", "))
  }
}

impl std::error::Error for UnknownTarget {}

impl FromStr for Target {
  type Err = UnknownTarget;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Target::ALL
      .into_iter()
      .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| UnknownTarget(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_target_has_a_base() {
    assert_eq!(Target::Chrome.base(), TargetBase::Chromium);
    assert_eq!(Target::Edge.base(), TargetBase::Chromium);
    assert_eq!(Target::Opera.base(), TargetBase::Chromium);
    assert_eq!(Target::Firefox.base(), TargetBase::Gecko);
    assert_eq!(Target::Safari.base(), TargetBase::Apple);
  }

  #[test]
  fn default_is_first_chromium_target() {
    assert_eq!(Target::default(), Target::ALL[0]);
    assert_eq!(Target::default().base(), TargetBase::Chromium);
  }

  #[test]
  fn parse_round_trips_identifiers() {
    for t in Target::ALL {
      assert_eq!(t.as_str().parse::<Target>().unwrap(), t);
    }
    assert_eq!("Firefox".parse::<Target>().unwrap(), Target::Firefox);
  }

  #[test]
  fn unknown_target_lists_valid_choices() {
    let err = "netscape".parse::<Target>().unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("netscape"));
    assert!(msg.contains("chrome, edge, opera, firefox, safari"));
  }
}
