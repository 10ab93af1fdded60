// Host admin HTTP client
//
// Wraps `reqwest::Client` with route construction and response
// classification. The individual operations live in `endpoints.rs` as
// inherent methods so this module stays focused on transport mechanics.

use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt carried in error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the host process's admin API.
///
/// Every response is classified the same way: connection failures become
/// [`Error::Unavailable`], non-2xx statuses become [`Error::Command`] with
/// the body verbatim, and undecodable bodies become
/// [`Error::Deserialization`].
#[derive(Debug, Clone)]
pub struct HostClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HostClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the host root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let body = Self::success_body(resp).await?;

        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..floor_char_boundary(&body, BODY_PREVIEW_LEN)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    /// Send a command request. Any 2xx is an acknowledgement; the body is
    /// discarded.
    pub(crate) async fn command(&self, builder: reqwest::RequestBuilder) -> Result<(), Error> {
        let resp = builder.send().await.map_err(|e| self.classify(e))?;
        let body = Self::success_body(resp).await?;
        trace!(len = body.len(), "command acknowledged");
        Ok(())
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Read the body of a successful response, or turn a failed one into
    /// [`Error::Command`].
    async fn success_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body = body.trim();
            let message = if body.is_empty() {
                status
                    .canonical_reason()
                    .map_or_else(|| format!("HTTP {status}"), String::from)
            } else {
                body.to_owned()
            };
            return Err(Error::Command {
                status: status.as_u16(),
                message,
            });
        }

        resp.text().await.map_err(Error::Transport)
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_connect() {
            Error::Unavailable {
                url: self.base_url.to_string(),
                reason: root_cause(&err),
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Innermost error message, which for connect failures names the actual
/// cause ("Connection refused") instead of reqwest's wrapper text.
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
