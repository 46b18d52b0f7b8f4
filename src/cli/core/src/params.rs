/* src/cli/core/src/params.rs */

// Session-scoped reference values fetched once and pinned in a cache file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ParamsSection;

pub const POLICY_HEADER: &str = "content-security-policy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeParams {
  pub reference_app_version: String,
  pub reference_security_policy: String,
}

pub struct ParamsCache {
  path: PathBuf,
}

impl ParamsCache {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Cached params if present, otherwise fetch and persist them.
  pub async fn fetch(&self, source: &ParamsSection) -> Result<RuntimeParams> {
    if let Some(cached) = self.read().await? {
      return Ok(cached);
    }

    let client = reqwest::Client::new();
    let reference_app_version = match (&source.app_version, &source.version_url) {
      (Some(pinned), _) => pinned.clone(),
      (None, Some(url)) => fetch_version(&client, url, &source.version_field).await?,
      (None, None) => bail!("no params.app_version or params.version_url configured"),
    };
    let reference_security_policy = match (&source.security_policy, &source.policy_url) {
      (Some(pinned), _) => pinned.clone(),
      (None, Some(url)) => fetch_policy(&client, url).await?,
      (None, None) => bail!("no params.security_policy or params.policy_url configured"),
    };

    let params = RuntimeParams { reference_app_version, reference_security_policy };
    self.write(&params).await?;
    Ok(params)
  }

  pub async fn read(&self) -> Result<Option<RuntimeParams>> {
    let content = match tokio::fs::read_to_string(&self.path).await {
      Ok(c) => c,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e).with_context(|| format!("failed to read {}", self.path.display())),
    };
    let params = serde_json::from_str(&content)
      .with_context(|| format!("failed to parse {}", self.path.display()))?;
    Ok(Some(params))
  }

  async fn write(&self, params: &RuntimeParams) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(params)?;
    tokio::fs::write(&self.path, json)
      .await
      .with_context(|| format!("failed to write {}", self.path.display()))
  }

  /// Remove the cache file; returns whether one existed.
  pub fn clear(&self) -> Result<bool> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e).with_context(|| format!("failed to remove {}", self.path.display())),
    }
  }
}

async fn fetch_version(client: &reqwest::Client, url: &str, field: &str) -> Result<String> {
  let body: Value = client
    .get(url)
    .send()
    .await
    .with_context(|| format!("failed to fetch {url}"))?
    .error_for_status()
    .with_context(|| format!("unexpected status from {url}"))?
    .json()
    .await
    .with_context(|| format!("invalid JSON from {url}"))?;

  let value = field.split('.').try_fold(&body, |node, part| node.get(part));
  match value {
    Some(Value::String(s)) => Ok(s.clone()),
    Some(Value::Number(n)) => Ok(n.to_string()),
    _ => bail!("field \"{field}\" missing from {url}"),
  }
}

async fn fetch_policy(client: &reqwest::Client, url: &str) -> Result<String> {
  let response = client
    .get(url)
    .send()
    .await
    .with_context(|| format!("failed to fetch {url}"))?
    .error_for_status()
    .with_context(|| format!("unexpected status from {url}"))?;
  let header = response
    .headers()
    .get(POLICY_HEADER)
    .with_context(|| format!("{url} sent no {POLICY_HEADER} header"))?;
  let policy = header.to_str().with_context(|| format!("non-ASCII {POLICY_HEADER} from {url}"))?;
  Ok(policy.to_string())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::sync::atomic::{AtomicUsize, Ordering};

  use axum::Json;
  use axum::Router;
  use axum::http::header::CONTENT_SECURITY_POLICY;
  use axum::routing::get;
  use serde_json::json;

  use super::*;

  const POLICY: &str = "default-src 'self'; img-src 'self' data:";

  async fn serve(hits: Arc<AtomicUsize>) -> String {
    let version_hits = hits.clone();
    let app = Router::new()
      .route(
        "/version.json",
        get(move || {
          let hits = version_hits.clone();
          async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Json(json!({"app": {"version": "5.2.0"}}))
          }
        }),
      )
      .route(
        "/",
        get(move || {
          let hits = hits.clone();
          async move {
            hits.fetch_add(1, Ordering::SeqCst);
            ([(CONTENT_SECURITY_POLICY, POLICY)], "ok")
          }
        }),
      )
      .route("/bare", get(|| async { "no header" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
  }

  fn section(base: &str) -> ParamsSection {
    ParamsSection {
      version_url: Some(format!("{base}/version.json")),
      version_field: "app.version".into(),
      policy_url: Some(format!("{base}/")),
      ..ParamsSection::default()
    }
  }

  #[tokio::test]
  async fn fetch_reads_endpoints_and_writes_cache() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(hits.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let cache = ParamsCache::new(dir.path().join("nested/runtime-params.json"));

    let params = cache.fetch(&section(&base)).await.unwrap();
    assert_eq!(params.reference_app_version, "5.2.0");
    assert_eq!(params.reference_security_policy, POLICY);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(cache.path().is_file());

    let again = cache.fetch(&section(&base)).await.unwrap();
    assert_eq!(again, params);
    assert_eq!(hits.load(Ordering::SeqCst), 2, "cache hit must not touch the network");
  }

  #[tokio::test]
  async fn existing_cache_is_used_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runtime-params.json");
    std::fs::write(
      &path,
      r#"{"reference_app_version": "1.0.0", "reference_security_policy": "img-src *"}"#,
    )
    .unwrap();
    let cache = ParamsCache::new(&path);
    let unreachable = section("http://127.0.0.1:9");
    let params = cache.fetch(&unreachable).await.unwrap();
    assert_eq!(params.reference_app_version, "1.0.0");
  }

  #[tokio::test]
  async fn pinned_values_skip_requests() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ParamsCache::new(dir.path().join("p.json"));
    let pinned = ParamsSection {
      app_version: Some("9.9.9".into()),
      security_policy: Some("default-src *".into()),
      ..ParamsSection::default()
    };
    let params = cache.fetch(&pinned).await.unwrap();
    assert_eq!(params.reference_app_version, "9.9.9");
    assert_eq!(params.reference_security_policy, "default-src *");
  }

  #[tokio::test]
  async fn missing_policy_header_is_an_error() {
    let base = serve(Arc::new(AtomicUsize::new(0))).await;
    let dir = tempfile::tempdir().unwrap();
    let cache = ParamsCache::new(dir.path().join("p.json"));
    let source = ParamsSection { policy_url: Some(format!("{base}/bare")), ..section(&base) };
    let err = cache.fetch(&source).await.unwrap_err();
    assert!(format!("{err:#}").contains(POLICY_HEADER));
    assert!(!cache.path().exists());
  }

  #[tokio::test]
  async fn network_failure_without_cache_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ParamsCache::new(dir.path().join("p.json"));
    assert!(cache.fetch(&section("http://127.0.0.1:9")).await.is_err());
  }

  #[test]
  fn clear_removes_cache_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("p.json");
    std::fs::write(&path, "{}").unwrap();
    let cache = ParamsCache::new(&path);
    assert!(cache.clear().unwrap());
    assert!(!path.exists());
    assert!(!cache.clear().unwrap());
  }
}
