/* src/cli/core/src/probe.rs */

use std::time::Duration;

use extbuild_manifest::{BuildMode, DevServersAvailable};
use tokio::net::TcpStream;

use crate::config::DevSection;

/// Single connect attempt against localhost; any error or timeout counts as unreachable.
/// Tries both IPv6 (::1) and IPv4 (127.0.0.1) since dev servers may bind only one.
pub async fn reachable(port: u16, timeout: Duration) -> bool {
  let attempt = async {
    TcpStream::connect(("::1", port)).await.is_ok()
      || TcpStream::connect(("127.0.0.1", port)).await.is_ok()
  };
  tokio::time::timeout(timeout, attempt).await.unwrap_or(false)
}

pub async fn probe_dev_servers(dev: &DevSection) -> DevServersAvailable {
  let timeout = Duration::from_millis(dev.probe_timeout_ms);
  let (api, website, hot_reload) = tokio::join!(
    reachable(dev.api_port, timeout),
    reachable(dev.website_port, timeout),
    reachable(dev.port, timeout),
  );
  DevServersAvailable { api, website, hot_reload }
}

/// Release builds never probe.
pub async fn resolve_mode(is_dev: bool, dev: &DevSection) -> BuildMode {
  if is_dev { BuildMode::dev(probe_dev_servers(dev).await) } else { BuildMode::release() }
}
