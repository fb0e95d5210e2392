//! HTTP client for the storage array's volume-management API.
//!
//! `copy_volume` posts the copy request and returns the copy-session
//! identifier the array allocates for it; `invalidate_session` releases that
//! identifier. The client carries the API token on every request and imposes
//! no request timeout of its own — a volume copy blocks for as long as the
//! array needs, and cancellation belongs to the array's client contract, not
//! to this layer.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode, Url};
use revolve_refresh::{SessionToken, VolumeStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Header carrying the array API token.
const HEADER_API_TOKEN: &str = "x-array-api-token";

/// Volume store backed by the array's REST API.
#[derive(Debug)]
pub struct HttpVolumeStore {
    client: Client,
    base_url: Url,
}

#[derive(Serialize)]
struct CopyVolumeRequest<'a> {
    source: &'a str,
    target: &'a str,
    overwrite: bool,
}

#[derive(Deserialize)]
struct CopyVolumeResponse {
    session: String,
}

impl HttpVolumeStore {
    /// Construct a client for the array at `endpoint`, authenticating with
    /// `api_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the token
    /// cannot be used as a header value.
    pub fn new(endpoint: &str, api_token: &str) -> Result<Self> {
        let base_url = Url::parse(endpoint)
            .with_context(|| format!("invalid array endpoint '{endpoint}'"))?;

        let mut token = HeaderValue::from_str(api_token)
            .map_err(|_| anyhow!("array API token contains invalid header characters"))?;
        token.set_sensitive(true);
        let mut default_headers = HeaderMap::new();
        default_headers.insert(HEADER_API_TOKEN, token);

        let client = Client::builder()
            .default_headers(default_headers)
            .build()
            .context("failed to build array HTTP client")?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl VolumeStore for HttpVolumeStore {
    async fn copy_volume(
        &self,
        source: &str,
        target: &str,
        overwrite: bool,
    ) -> Result<SessionToken> {
        let url = self
            .base_url
            .join("/v1/volumes/copy")
            .context("invalid array base URL")?;

        let response = self
            .client
            .post(url)
            .json(&CopyVolumeRequest {
                source,
                target,
                overwrite,
            })
            .send()
            .await
            .with_context(|| format!("copy request for '{source}' -> '{target}' failed"))?;

        let response = classify_status("copy_volume", response).await?;
        let body = response
            .json::<CopyVolumeResponse>()
            .await
            .context("failed to parse copy response")?;
        debug!(source, target, session = %body.session, "volume copy completed");
        Ok(SessionToken::new(body.session))
    }

    async fn invalidate_session(&self, token: &SessionToken) -> Result<()> {
        let url = self
            .base_url
            .join(&format!("/v1/sessions/{token}"))
            .context("invalid array base URL")?;

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .with_context(|| format!("release request for session '{token}' failed"))?;

        let _ = classify_status("invalidate_session", response).await?;
        debug!(session = %token, "copy session released");
        Ok(())
    }
}

/// Turn a non-success response into an error carrying status and body.
async fn classify_status(operation: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = body.trim();
    if detail.is_empty() {
        bail!("array rejected {operation} with status {status}");
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        bail!("array rejected {operation} with status {status} (check the API token): {detail}");
    }
    bail!("array rejected {operation} with status {status}: {detail}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn store_for(server: &MockServer) -> HttpVolumeStore {
        HttpVolumeStore::new(&server.base_url(), "28a21f21").expect("valid endpoint")
    }

    #[tokio::test]
    async fn copy_volume_posts_payload_and_returns_session() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/volumes/copy")
                .header(HEADER_API_TOKEN, "28a21f21")
                .json_body(json!({
                    "source": "prod-vol",
                    "target": "test-vol",
                    "overwrite": true
                }));
            then.status(200).json_body(json!({"session": "sess-17"}));
        });

        let store = store_for(&server);
        let token = store
            .copy_volume("prod-vol", "test-vol", true)
            .await
            .expect("copy should succeed");

        assert_eq!(token.as_str(), "sess-17");
        mock.assert();
    }

    #[tokio::test]
    async fn copy_volume_surfaces_status_and_body() {
        let server = MockServer::start_async().await;
        let _mock = server.mock(|when, then| {
            when.method(POST).path("/v1/volumes/copy");
            then.status(409).body("target volume has active connections");
        });

        let store = store_for(&server);
        let err = store
            .copy_volume("prod-vol", "test-vol", false)
            .await
            .expect_err("conflict should fail");
        let message = format!("{err:#}");
        assert!(message.contains("409"), "message: {message}");
        assert!(
            message.contains("active connections"),
            "body should be preserved: {message}"
        );
    }

    #[tokio::test]
    async fn unauthorized_copy_hints_at_the_token() {
        let server = MockServer::start_async().await;
        let _mock = server.mock(|when, then| {
            when.method(POST).path("/v1/volumes/copy");
            then.status(401).body("bad token");
        });

        let store = store_for(&server);
        let err = store
            .copy_volume("prod-vol", "test-vol", true)
            .await
            .expect_err("unauthorized should fail");
        assert!(format!("{err:#}").contains("API token"));
    }

    #[tokio::test]
    async fn invalidate_session_issues_delete() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/v1/sessions/sess-17")
                .header(HEADER_API_TOKEN, "28a21f21");
            then.status(204);
        });

        let store = store_for(&server);
        store
            .invalidate_session(&SessionToken::new("sess-17"))
            .await
            .expect("release should succeed");
        mock.assert();
    }

    #[test]
    fn new_rejects_invalid_endpoint() {
        let err = HttpVolumeStore::new("not a url", "token").expect_err("bad URL should fail");
        assert!(format!("{err:#}").contains("invalid array endpoint"));
    }
}
