/* src/cli/core/src/ui.rs */

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn ok(msg: &str) {
  println!("  {GREEN}\u{2713}{RESET} {msg}");
}

pub fn fail(msg: &str) {
  println!("  {RED}\u{2717}{RESET} {msg}");
}

pub fn warn(msg: &str) {
  println!("  {YELLOW}warning{RESET}: {msg}");
}

pub fn arrow(msg: &str) {
  println!("  {GREEN}\u{2192}{RESET} {msg}");
}

pub fn detail(msg: &str) {
  println!("        {msg}");
}

pub fn banner(cmd: &str, project: Option<&str>) {
  println!();
  let project = project.map_or(String::new(), |name| format!(" {CYAN}{name}{RESET}"));
  println!("  {BOLD}extbuild{RESET} {cmd}{project} {DIM}v{VERSION}{RESET}");
  println!();
}

pub fn blank() {
  println!();
}

pub fn format_size(bytes: u64) -> String {
  if bytes >= 1_000_000 {
    format!("{:.1} MB", bytes as f64 / 1_000_000.0)
  } else if bytes >= 1_000 {
    format!("{:.1} kB", bytes as f64 / 1_000.0)
  } else {
    format!("{bytes} B")
  }
}

pub fn format_elapsed(elapsed: Duration) -> String {
  let ms = elapsed.as_millis();
  if ms >= 1000 { format!("{:.1}s", elapsed.as_secs_f64()) } else { format!("{ms}ms") }
}

/// One status line for a finished operation: `✓ label 12ms` or `✗ label 12ms: error`.
pub fn report<T, E: Display>(label: &str, elapsed: Duration, result: &Result<T, E>) {
  let took = format!("{DIM}{}{RESET}", format_elapsed(elapsed));
  match result {
    Ok(_) => ok(&format!("{label} {took}")),
    Err(e) => fail(&format!("{label} {took}: {e:#}")),
  }
}

/// Await `fut`, then print its labeled, timed status line.
pub async fn timed<T, F>(label: &str, fut: F) -> anyhow::Result<T>
where
  F: Future<Output = anyhow::Result<T>>,
{
  let started = Instant::now();
  let result = fut.await;
  report(label, started.elapsed(), &result);
  result
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn elapsed_switches_units() {
    assert_eq!(format_elapsed(Duration::from_millis(3)), "3ms");
    assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.5s");
  }

  #[test]
  fn sizes_are_human_readable() {
    assert_eq!(format_size(512), "512 B");
    assert_eq!(format_size(2_500), "2.5 kB");
    assert_eq!(format_size(3_200_000), "3.2 MB");
  }

  #[tokio::test]
  async fn timed_passes_result_through() {
    let value = timed("probe", async { Ok::<_, anyhow::Error>(7) }).await.unwrap();
    assert_eq!(value, 7);
    let err = timed("probe", async { Err::<(), _>(anyhow::anyhow!("boom")) }).await;
    assert!(err.is_err());
  }
}
