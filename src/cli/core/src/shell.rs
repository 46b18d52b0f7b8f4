/* src/cli/core/src/shell.rs */

// Shell command helper shared by the build steps.

use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result, bail};
use tokio::process::Command;

use crate::ui::{self, DIM, RESET};

/// Failure message for a finished command: status line, then stderr and stdout when present.
fn failure_message(label: &str, output: &Output) -> String {
  let streams = [&output.stderr, &output.stdout];
  let mut lines = vec![format!("{label} exited with status {}", output.status)];
  lines.extend(
    streams
      .iter()
      .map(|bytes| String::from_utf8_lossy(bytes).trim_end().to_string())
      .filter(|text| !text.is_empty()),
  );
  lines.join("\n")
}

/// Run `command` through `sh -c` from `base_dir` with extra environment variables.
pub(crate) async fn run_command(
  base_dir: &Path,
  command: &str,
  label: &str,
  env: &[(&str, &str)],
) -> Result<()> {
  ui::detail(&format!("{DIM}{command}{RESET}"));
  let output = Command::new("sh")
    .args(["-c", command])
    .current_dir(base_dir)
    .envs(env.iter().copied())
    .output()
    .await
    .with_context(|| format!("failed to run {label}"))?;
  if !output.status.success() {
    bail!("{}", failure_message(label, &output));
  }
  Ok(())
}
