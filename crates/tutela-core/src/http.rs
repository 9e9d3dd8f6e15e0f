use crate::error::{TutelaError, TutelaResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// A response from an outbound HTTP call, reduced to what the core needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP capability for government registry lookups and authority
/// notification delivery.
///
/// Every call carries an explicit timeout; implementations must return
/// [`TutelaError::ServiceUnavailable`] on timeout rather than hanging. No
/// retries happen inside the core.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform a single HTTP request.
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<serde_json::Value>,
        timeout: Duration,
    ) -> TutelaResult<HttpResponse>;
}

/// [`HttpTransport`] backed by a shared [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds the transport with a connection-level safety timeout; the
    /// per-call timeout passed to [`HttpTransport::request`] still applies.
    pub fn new() -> TutelaResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TutelaError::ServiceUnavailable(format!("HTTP client build: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<serde_json::Value>,
        timeout: Duration,
    ) -> TutelaResult<HttpResponse> {
        let mut request = match method {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            other => {
                return Err(TutelaError::Validation(format!(
                    "unsupported HTTP method '{other}'"
                )))
            }
        };

        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        info!(method = %method, url = %url, "outbound request");

        let response = request.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                TutelaError::ServiceUnavailable(format!("request to {url} timed out"))
            } else {
                TutelaError::ServiceUnavailable(format!("request to {url} failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TutelaError::ServiceUnavailable(format!("reading response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_range() {
        assert!(HttpResponse {
            status: 200,
            body: String::new()
        }
        .is_success());
        assert!(HttpResponse {
            status: 201,
            body: String::new()
        }
        .is_success());
        assert!(!HttpResponse {
            status: 404,
            body: String::new()
        }
        .is_success());
        assert!(!HttpResponse {
            status: 503,
            body: String::new()
        }
        .is_success());
    }

    #[tokio::test]
    async fn test_unsupported_method_rejected_locally() {
        #[allow(clippy::unwrap_used)]
        let transport = ReqwestTransport::new().unwrap();
        let result = transport
            .request(
                "TRACE",
                "http://example.invalid",
                &[],
                None,
                Duration::from_secs(1),
            )
            .await;
        assert!(matches!(result, Err(TutelaError::Validation(_))));
    }
}
