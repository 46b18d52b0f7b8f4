/* src/cli/core/src/rules.rs */

// Declarative request/response header rules shipped in rules.json.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use extbuild_manifest::{BuildMode, Target};
use serde::Serialize;

use crate::config::{DomainEntry, RulesSection};
use crate::params::RuntimeParams;

pub const STATIC_RULE_ID_START: u32 = 1000;
pub const PLATFORM_QUERY_MARKER: &str = "extbuild_platform";
pub const TRACKING_HEADER: &str = "x-extbuild-track";
const USER_AGENT: &str = "user-agent";
const POLICY_HEADER: &str = "content-security-policy";
const UA_OVERRIDE_PRIORITY: u32 = 2;

/// Simulated device profiles, in emission order.
pub const DEVICE_PROFILES: [(&str, &str); 3] = [
  (
    "ios",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
  ),
  (
    "ipados",
    "Mozilla/5.0 (iPad; CPU OS 17_4 like Mac OS X) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
  ),
  (
    "android",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
  ),
];

/// `<project>/<target>-<mode>`, appended to user agents so servers can tell builds apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentity {
  pub project: String,
  pub target: Target,
  pub mode: BuildMode,
}

impl fmt::Display for BuildIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}-{}", self.project, self.target, self.mode.label())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
  pub id: u32,
  pub priority: u32,
  pub action: RuleAction,
  pub condition: RuleCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
  #[serde(rename = "type")]
  pub kind: ActionType,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub request_headers: Vec<HeaderOperation>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub response_headers: Vec<HeaderOperation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
  ModifyHeaders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderOperation {
  pub header: String,
  pub operation: Operation,
  pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
  Set,
  Append,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url_filter: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub request_domains: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub resource_types: Vec<&'static str>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub request_headers: Vec<HeaderMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderMatch {
  pub header: String,
}

fn header(name: &str, operation: Operation, value: String) -> HeaderOperation {
  HeaderOperation { header: name.to_string(), operation, value }
}

fn modify(request: Vec<HeaderOperation>, response: Vec<HeaderOperation>) -> RuleAction {
  RuleAction {
    kind: ActionType::ModifyHeaders,
    request_headers: request,
    response_headers: response,
  }
}

/// Host part of an origin such as `https://example.com:8443`.
fn origin_host(origin: &str) -> Result<String> {
  let url = reqwest::Url::parse(origin).with_context(|| format!("invalid origin \"{origin}\""))?;
  url.host_str().map(str::to_string).with_context(|| format!("origin \"{origin}\" has no host"))
}

/// Append `origins` to `img-src`. Without `img-src` one is derived from `default-src`;
/// with neither the policy is returned unchanged.
pub fn relax_image_sources(policy: &str, origins: &[String]) -> String {
  let mut directives: Vec<Vec<String>> = policy
    .split(';')
    .map(|d| d.split_whitespace().map(str::to_string).collect::<Vec<_>>())
    .filter(|d| !d.is_empty())
    .collect();
  let named = |d: &Vec<String>, name: &str| d[0].eq_ignore_ascii_case(name);

  let index = match directives.iter().position(|d| named(d, "img-src")) {
    Some(i) => i,
    None => match directives.iter().find(|d| named(d, "default-src")) {
      Some(default) => {
        let mut derived = vec!["img-src".to_string()];
        derived.extend(default[1..].iter().cloned());
        directives.push(derived);
        directives.len() - 1
      }
      None => return policy.to_string(),
    },
  };

  let img = &mut directives[index];
  for origin in origins {
    if !img[1..].contains(origin) {
      img.push(origin.clone());
    }
  }
  directives.iter().map(|d| d.join(" ")).collect::<Vec<_>>().join("; ")
}

pub fn generate(
  domains: &BTreeMap<String, DomainEntry>,
  rules: &RulesSection,
  params: &RuntimeParams,
  identity: &BuildIdentity,
) -> Result<Vec<Rule>> {
  let tag = identity.to_string();
  let mut out = Vec::new();
  let mut push = |priority: u32, action: RuleAction, condition: RuleCondition| {
    let id = STATIC_RULE_ID_START + out.len() as u32;
    out.push(Rule { id, priority, action, condition });
  };

  for (profile, agent) in DEVICE_PROFILES {
    push(
      UA_OVERRIDE_PRIORITY,
      modify(vec![header(USER_AGENT, Operation::Set, format!("{agent} {tag}"))], vec![]),
      RuleCondition {
        url_filter: Some(format!("{PLATFORM_QUERY_MARKER}={profile}")),
        resource_types: vec!["main_frame", "sub_frame", "xmlhttprequest"],
        ..RuleCondition::default()
      },
    );
  }

  let web = domains
    .get(&rules.web_domain)
    .with_context(|| format!("web domain \"{}\" is not configured", rules.web_domain))?;
  let policy = relax_image_sources(&params.reference_security_policy, &rules.image_origins);
  push(
    1,
    modify(vec![], vec![header(POLICY_HEADER, Operation::Set, policy)]),
    RuleCondition {
      request_domains: vec![origin_host(&web.production)?],
      resource_types: vec!["main_frame", "sub_frame"],
      ..RuleCondition::default()
    },
  );

  push(
    1,
    modify(vec![header(USER_AGENT, Operation::Append, tag.clone())], vec![]),
    RuleCondition {
      request_headers: vec![HeaderMatch { header: TRACKING_HEADER.to_string() }],
      ..RuleCondition::default()
    },
  );

  Ok(out)
}

#[cfg(test)]
mod tests {
  use extbuild_manifest::DevServersAvailable;
  use serde_json::json;

  use super::*;

  const ORIGINS: [&str; 2] = ["https://img.example.com", "https://cdn.example.com"];

  fn origins() -> Vec<String> {
    ORIGINS.iter().map(|o| o.to_string()).collect()
  }

  fn domains() -> BTreeMap<String, DomainEntry> {
    let mut d = BTreeMap::new();
    d.insert(
      "web".to_string(),
      DomainEntry {
        production: "https://rater.example.com".into(),
        development: Some("http://localhost:8080".into()),
        server: None,
      },
    );
    d
  }

  fn section() -> RulesSection {
    RulesSection { web_domain: "web".into(), image_origins: origins() }
  }

  fn params(policy: &str) -> RuntimeParams {
    RuntimeParams {
      reference_app_version: "5.2.0".into(),
      reference_security_policy: policy.into(),
    }
  }

  fn identity() -> BuildIdentity {
    BuildIdentity { project: "rater".into(), target: Target::Firefox, mode: BuildMode::release() }
  }

  #[test]
  fn identity_tag_format() {
    assert_eq!(identity().to_string(), "rater/firefox-release");
    let dev = BuildIdentity {
      mode: BuildMode::dev(DevServersAvailable::default()),
      target: Target::Chrome,
      ..identity()
    };
    assert_eq!(dev.to_string(), "rater/chrome-dev");
  }

  #[test]
  fn ids_are_contiguous_from_offset() {
    for policy in ["", "default-src 'self'", "img-src 'self'; script-src 'none'"] {
      let rules = generate(&domains(), &section(), &params(policy), &identity()).unwrap();
      assert_eq!(rules.len(), DEVICE_PROFILES.len() + 2);
      for (i, rule) in rules.iter().enumerate() {
        assert_eq!(rule.id, STATIC_RULE_ID_START + i as u32);
      }
    }
  }

  #[test]
  fn emission_order_and_shape() {
    let rules =
      generate(&domains(), &section(), &params("img-src 'self'"), &identity()).unwrap();
    let v = serde_json::to_value(&rules).unwrap();

    assert_eq!(v[0]["priority"], 2);
    assert_eq!(v[0]["condition"]["urlFilter"], "extbuild_platform=ios");
    assert_eq!(v[1]["condition"]["urlFilter"], "extbuild_platform=ipados");
    assert_eq!(v[2]["condition"]["urlFilter"], "extbuild_platform=android");
    let ua = v[0]["action"]["requestHeaders"][0]["value"].as_str().unwrap();
    assert!(ua.contains("iPhone"));
    assert!(ua.ends_with(" rater/firefox-release"));

    assert_eq!(v[3]["action"]["type"], "modifyHeaders");
    assert_eq!(v[3]["condition"]["requestDomains"], json!(["rater.example.com"]));
    assert_eq!(v[3]["condition"]["resourceTypes"], json!(["main_frame", "sub_frame"]));
    assert_eq!(
      v[3]["action"]["responseHeaders"][0],
      json!({
        "header": "content-security-policy",
        "operation": "set",
        "value": "img-src 'self' https://img.example.com https://cdn.example.com"
      })
    );

    assert_eq!(v[4]["condition"]["requestHeaders"], json!([{"header": TRACKING_HEADER}]));
    assert_eq!(
      v[4]["action"]["requestHeaders"][0],
      json!({"header": "user-agent", "operation": "append", "value": "rater/firefox-release"})
    );
  }

  #[test]
  fn relax_appends_to_existing_img_src_only() {
    let policy = "default-src 'self'; img-src 'self' data:; script-src 'self'";
    assert_eq!(
      relax_image_sources(policy, &origins()),
      "default-src 'self'; img-src 'self' data: https://img.example.com \
       https://cdn.example.com; script-src 'self'"
    );
  }

  #[test]
  fn relax_derives_img_src_from_default_src() {
    let policy = "default-src 'self' https:; frame-ancestors 'none'";
    assert_eq!(
      relax_image_sources(policy, &origins()),
      "default-src 'self' https:; frame-ancestors 'none'; \
       img-src 'self' https: https://img.example.com https://cdn.example.com"
    );
  }

  #[test]
  fn relax_without_img_or_default_keeps_policy() {
    let policy = "script-src 'self'; frame-ancestors 'none'";
    assert_eq!(relax_image_sources(policy, &origins()), policy);
  }

  #[test]
  fn relax_does_not_duplicate_origins() {
    let policy = "img-src https://img.example.com";
    assert_eq!(
      relax_image_sources(policy, &origins()),
      "img-src https://img.example.com https://cdn.example.com"
    );
  }

  #[test]
  fn missing_web_domain_is_an_error() {
    let rules = RulesSection { web_domain: "site".into(), image_origins: origins() };
    assert!(generate(&domains(), &rules, &params(""), &identity()).is_err());
  }
}
