/* src/cli/manifest/src/validate.rs */

use anyhow::{Result, bail};

use crate::source::{Background, SourceManifest};
use crate::target::TargetBase;

/// Check the fields a target family requires before anything is written.
pub fn validate(manifest: &SourceManifest, base: TargetBase) -> Result<()> {
  if manifest.name.trim().is_empty() {
    bail!("manifest.name must not be empty");
  }
  check_version("manifest.version", &manifest.version)?;
  if let Some(store_version) = &manifest.store_version {
    check_version("manifest.store_version", store_version)?;
  }

  match base {
    TargetBase::Chromium => {
      if manifest.manifest_version != 3 {
        bail!(
          "chromium targets require manifest_version 3 (found {})",
          manifest.manifest_version
        );
      }
    }
    TargetBase::Gecko => match &manifest.background {
      Some(Background::Worker { service_worker, .. }) if service_worker.is_empty() => {
        bail!("gecko targets require background.service_worker to name a script");
      }
      Some(Background::Scripts { scripts, .. }) if scripts.is_empty() => {
        bail!("gecko targets require background.scripts to list at least one script");
      }
      _ => {}
    },
    TargetBase::Apple => {}
  }
  Ok(())
}

/// Browsers accept one to four dot-separated integers, each at most 65535.
fn check_version(field: &str, version: &str) -> Result<()> {
  let parts: Vec<&str> = version.split('.').collect();
  let valid = (1..=4).contains(&parts.len())
    && parts.iter().all(|p| {
      !p.is_empty()
        && p.chars().all(|c| c.is_ascii_digit())
        && (p.len() == 1 || !p.starts_with('0'))
        && p.parse::<u32>().is_ok_and(|n| n <= 65535)
    });
  if !valid {
    bail!("{field} \"{version}\" must be 1-4 dot-separated integers (0-65535)");
  }
  Ok(())
}
