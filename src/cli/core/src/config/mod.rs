/* src/cli/core/src/config/mod.rs */

mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use loader::{CONFIG_FILE, find_config, load_config};
pub use types::{
  BuildSection, DevSection, DomainEntry, ExtbuildConfig, LocalesSection, ParamsSection,
  RulesSection, SigningSection, SourceSection,
};
