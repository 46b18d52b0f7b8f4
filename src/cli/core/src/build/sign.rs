/* src/cli/core/src/build/sign.rs */

// Best-effort upload of Gecko archives to a signing endpoint.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::config::SigningSection;

/// Endpoint and credential, when both are configured and the credential is set.
pub fn credentials(signing: &SigningSection) -> Result<Option<(String, String)>> {
  let (Some(url), Some(var)) = (&signing.url, &signing.credential_env) else {
    return Ok(None);
  };
  let token = std::env::var(var).with_context(|| format!("signing credential ${var} is not set"))?;
  Ok(Some((url.clone(), token)))
}

pub async fn upload(url: &str, token: &str, archive: &Path) -> Result<()> {
  let body = tokio::fs::read(archive)
    .await
    .with_context(|| format!("failed to read {}", archive.display()))?;
  reqwest::Client::new()
    .post(url)
    .header(AUTHORIZATION, format!("Bearer {token}"))
    .header(CONTENT_TYPE, "application/zip")
    .body(body)
    .send()
    .await
    .with_context(|| format!("failed to reach {url}"))?
    .error_for_status()
    .with_context(|| format!("signing upload to {url} was rejected"))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::Router;
  use axum::body::Bytes;
  use axum::http::{HeaderMap, StatusCode};
  use axum::routing::post;

  use super::*;

  #[test]
  fn unconfigured_signing_is_skipped() {
    assert!(credentials(&SigningSection::default()).unwrap().is_none());
    let half =
      SigningSection { url: Some("https://sign.example.com".into()), credential_env: None };
    assert!(credentials(&half).unwrap().is_none());
  }

  #[test]
  fn missing_credential_variable_is_an_error() {
    let signing = SigningSection {
      url: Some("https://sign.example.com".into()),
      credential_env: Some("EXTBUILD_TEST_UNSET_SIGNING_TOKEN".into()),
    };
    assert!(credentials(&signing).is_err());
  }

  #[tokio::test]
  async fn upload_sends_bearer_and_body() {
    let seen: Arc<Mutex<Option<(String, usize)>>> = Arc::default();
    let record = seen.clone();
    let app = Router::new().route(
      "/upload",
      post(move |headers: HeaderMap, body: Bytes| {
        let record = record.clone();
        async move {
          let auth = headers[AUTHORIZATION].to_str().unwrap().to_string();
          *record.lock().unwrap() = Some((auth, body.len()));
          StatusCode::ACCEPTED
        }
      }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("rater-1.0.0-firefox.zip");
    std::fs::write(&archive, b"PK\x05\x06").unwrap();
    upload(&format!("http://{addr}/upload"), "s3cret", &archive).await.unwrap();

    let (auth, len) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(auth, "Bearer s3cret");
    assert_eq!(len, 4);
  }

  #[tokio::test]
  async fn rejected_upload_is_an_error() {
    let app = Router::new().route("/upload", post(|| async { StatusCode::UNAUTHORIZED }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("a.zip");
    std::fs::write(&archive, b"x").unwrap();
    assert!(upload(&format!("http://{addr}/upload"), "bad", &archive).await.is_err());
  }
}
