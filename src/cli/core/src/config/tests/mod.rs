/* src/cli/core/src/config/tests/mod.rs */


use super::*;

const MINIMAL: &str = r#"
[project]
name = "rater"

[domains.web]
production = "https://rater.example.com"

[params]
app_version = "5.2.0"
security_policy = "default-src 'self'"

[rules]
image_origins = ["https://img.example.com", "https://cdn.example.com"]
"#;

fn parse(toml_str: &str) -> ExtbuildConfig {
  toml::from_str(toml_str).unwrap()
}
