//! # State Kit HTTP
//!
//! [`ReqwestHttpClient`] implements the
//! [`HttpClient`](state_kit_core::environment::HttpClient) environment trait
//! on top of `reqwest`.
//!
//! Non-2xx statuses are returned as ordinary responses; deciding what a 404
//! means is up to the caller. Only transport failures become errors.
//!
//! # Example
//!
//! ```no_run
//! use state_kit_core::environment::HttpClient;
//! use state_kit_http::ReqwestHttpClient;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = ReqwestHttpClient::new(Duration::from_secs(10))?;
//! let response = http.get("https://jsonplaceholder.typicode.com/users").await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

use state_kit_core::environment::{HttpClient, HttpError, HttpResponse};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Network retrieval over HTTP(S)
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client whose requests give up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an already configured `reqwest` client
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_error(error: &reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Network(error.to_string())
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get(
        &self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + '_>> {
        let request = self.client.get(url);
        let url = url.to_string();

        Box::pin(async move {
            let response = request.send().await.map_err(|e| {
                tracing::debug!(url = %url, error = %e, "GET failed");
                map_error(&e)
            })?;

            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| map_error(&e))?;

            tracing::debug!(url = %url, status, bytes = body.len(), "GET completed");

            Ok(HttpResponse::new(status, body.to_vec()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":1}]"#))
            .mount(&server)
            .await;

        let http = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();
        let response = http.get(&format!("{}/users", server.uri())).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, br#"[{"id":1}]"#);
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let http = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();
        let response = http.get(&format!("{}/missing", server.uri())).await.unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let http = ReqwestHttpClient::new(Duration::from_millis(50)).unwrap();
        let result = http.get(&server.uri()).await;

        assert!(matches!(result, Err(HttpError::Timeout)));
    }

    #[tokio::test]
    async fn test_invalid_url_is_network_error() {
        let http = ReqwestHttpClient::new(Duration::from_secs(1)).unwrap();

        let result = http.get("not a url").await;

        assert!(matches!(result, Err(HttpError::Network(_))));
    }
}
