use std::time::{Duration, Instant};

use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{ProbeError, Result};

use super::request::{RequestBody, RequestInput};
use super::response::HttpResponse;

/// Thin wrapper over `reqwest::Client` that never turns a status code into
/// an error: every response, 2xx or not, comes back for the caller to judge.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_secs(config.timeout_secs));

        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let inner = builder
            .build()
            .map_err(|e| ProbeError::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { inner })
    }

    pub async fn send(&self, request: RequestInput) -> Result<HttpResponse> {
        let method: reqwest::Method = request.method.into();
        let mut url = reqwest::Url::parse(&request.url)
            .map_err(|e| ProbeError::Http(format!("Invalid URL `{}`: {e}", request.url)))?;

        if !request.query.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                query_pairs.append_pair(key, value);
            }
        }

        debug!(method = %request.method, url = %url, "sending request");

        let mut req_builder = self.inner.request(method, url);
        req_builder = apply_headers(req_builder, &request.headers)?;
        req_builder = request.auth.apply(req_builder)?;
        req_builder = match request.body {
            RequestBody::Empty => req_builder,
            RequestBody::Form(fields) => req_builder.form(&fields),
            RequestBody::Json(value) => req_builder.json(&value),
        };

        let started = Instant::now();
        let response = req_builder
            .send()
            .await
            .map_err(|e| ProbeError::Http(format!("Request failed: {e}")))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProbeError::Http(format!("Failed to read response: {e}")))?;
        let elapsed = started.elapsed().as_millis();

        debug!(status = status.as_u16(), duration_ms = elapsed as u64, "response received");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            duration_ms: elapsed,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

fn apply_headers(
    mut req_builder: reqwest::RequestBuilder,
    headers: &[(String, String)],
) -> Result<reqwest::RequestBuilder> {
    for (key, value) in headers {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let header_name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ProbeError::Http(format!("Invalid header key `{key}`: {e}")))?;
        let header_value = HeaderValue::from_str(value.trim())
            .map_err(|e| ProbeError::Http(format!("Invalid header value `{value}`: {e}")))?;
        req_builder = req_builder.header(header_name, header_value);
    }

    Ok(req_builder)
}
