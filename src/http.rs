//! Provider HTTP plumbing.
//!
//! Calls carry a short connect timeout and nothing else: no read timeout, no
//! retry. A slow provider holds the caller for the full duration of the call.

use crate::error::MtResult;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::time::Duration;
use tracing::debug;

pub use reqwest::Method;

/// Default connect timeout for provider calls
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Characters left as-is in form/query encoding (RFC 3986 unreserved).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Status code and body of a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Thin wrapper over `reqwest::Client` shared by every engine.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(connect_timeout: Duration) -> MtResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Perform one request, sending `form` as a url-encoded body when given.
    ///
    /// Non-2xx statuses are returned as responses, not errors; `Err` means the
    /// provider could not be reached or the body could not be read.
    pub async fn perform(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, String)],
        form: Option<&MultiValueQuery>,
    ) -> Result<HttpResponse, reqwest::Error> {
        debug!("{} {}", method, redact_query(url));

        let mut request = self.client.request(method, url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        if let Some(form) = form {
            request = request
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(form.encode());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

/// Query/form encoder that keeps repeated keys.
///
/// Map-based encoders collapse duplicates, but providers expect one `text=`
/// (DeepL) or `q=` (Google) pair per segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiValueQuery {
    pairs: Vec<(String, String)>,
}

impl MultiValueQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair; existing pairs with the same key are kept.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Append one pair per value, in order.
    pub fn extend<I, V>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self.push(key, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `k=v&k=v2&...` with both sides percent-encoded.
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(key, QUERY_VALUE),
                    utf8_percent_encode(value, QUERY_VALUE)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Strip query parameters from a URL before logging it (Google keys travel there).
fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
