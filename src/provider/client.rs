//! HTTP provider client.
//!
//! This module talks to a JSON-over-HTTP provider gateway. Each capability
//! is a `POST` to `<endpoint>/<action>`; transient failures are retried
//! here so the reconciliation core never has to.

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::ProviderError;

use super::types::{CreateRequest, DescribeRequest, RemoteObject, ResourceKind, Tags};
use super::{CloudProvider, ProviderResult};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// HTTP provider client.
#[derive(Debug, Clone)]
pub struct HttpCloud {
    /// HTTP client.
    client: Client,
    /// Gateway base URL, without trailing slash.
    endpoint: String,
    /// Optional bearer token.
    api_token: Option<String>,
    /// Base delay between retries.
    retry_delay: Duration,
}

#[derive(Debug, Serialize)]
struct DescribeBody<'a> {
    kind: ResourceKind,
    #[serde(flatten)]
    request: &'a DescribeRequest,
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    #[serde(default)]
    objects: Vec<RemoteObject>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct AttachBody<'a> {
    kind: ResourceKind,
    parent_id: &'a str,
    child_id: &'a str,
}

#[derive(Debug, Serialize)]
struct TagBody<'a> {
    id: &'a str,
    tags: &'a Tags,
}

/// Acknowledgement returned by mutating calls.
#[derive(Debug, Deserialize)]
struct Ack {}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpCloud {
    /// Creates a new client for a provider gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoint: &str, api_token: Option<String>) -> ProviderResult<Self> {
        Self::with_timeout(endpoint, api_token, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(
        endpoint: &str,
        api_token: Option<String>,
        timeout_secs: u64,
    ) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_token,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        })
    }

    /// Sets the base delay between retries.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Posts a request, retrying transient failures.
    async fn execute<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        action: &str,
        body: &B,
    ) -> ProviderResult<T> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES} for {action}");
                tokio::time::sleep(self.retry_delay * attempt).await;
            }

            match self.execute_once::<B, T>(action, body).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::network("Max retries exceeded")))
    }

    /// Posts a single request.
    async fn execute_once<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        action: &str,
        body: &B,
    ) -> ProviderResult<T> {
        let url = format!("{}/{action}", self.endpoint);
        trace!("POST {url}");

        let mut request = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(token) = &self.api_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Request failed: {e}")))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();

            return Err(ProviderError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status.as_u16() == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::NotFound {
                id: Self::error_message(&body),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api_error(
                status.as_u16(),
                Self::error_message(&body),
            ));
        }

        response.json::<T>().await.map_err(|e| ProviderError::InvalidResponse {
            message: format!("Failed to parse {action} response: {e}"),
        })
    }

    /// Extracts the message from a JSON error body, falling back to the raw text.
    fn error_message(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body).map_or_else(|_| body.to_string(), |e| e.message)
    }
}

#[async_trait]
impl CloudProvider for HttpCloud {
    async fn describe(
        &self,
        kind: ResourceKind,
        request: &DescribeRequest,
    ) -> ProviderResult<Vec<RemoteObject>> {
        let response: DescribeResponse = self
            .execute("describe", &DescribeBody { kind, request })
            .await?;
        Ok(response.objects)
    }

    async fn create(&self, request: &CreateRequest) -> ProviderResult<String> {
        let response: CreateResponse = self.execute("create", request).await?;
        Ok(response.id)
    }

    async fn attach(
        &self,
        kind: ResourceKind,
        parent_id: &str,
        child_id: &str,
    ) -> ProviderResult<()> {
        let _: Ack = self
            .execute(
                "attach",
                &AttachBody {
                    kind,
                    parent_id,
                    child_id,
                },
            )
            .await?;
        Ok(())
    }

    async fn tag(&self, id: &str, tags: &Tags) -> ProviderResult<()> {
        let _: Ack = self.execute("tag", &TagBody { id, tags }).await?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Filter;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpCloud {
        HttpCloud::new(&server.uri(), Some(String::from("secret")))
            .expect("client should build")
            .with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_describe_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/describe"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "kind": "internet_gateway",
                "filters": [{"name": "tag:Name", "values": ["main"]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "objects": [{"id": "igw-1", "kind": "internet_gateway", "tags": {"Name": "main"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = DescribeRequest::with_filters(vec![Filter::tag("Name", "main")]);
        let objects = client(&server)
            .describe(ResourceKind::InternetGateway, &request)
            .await
            .expect("describe failed");

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].id, "igw-1");
    }

    #[tokio::test]
    async fn test_retries_rate_limit_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/create"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "vpc-9"})))
            .mount(&server)
            .await;

        let id = client(&server)
            .create(&CreateRequest::new(ResourceKind::Vpc))
            .await
            .expect("create should succeed after retry");
        assert_eq!(id, "vpc-9");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/attach"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "already attached"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .attach(ResourceKind::InternetGateway, "vpc-1", "igw-1")
            .await
            .expect_err("attach should fail");

        match err {
            ProviderError::ApiRequestFailed { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "already attached");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tag"))
            .respond_with(ResponseTemplate::new(503))
            .expect(u64::from(MAX_RETRIES))
            .mount(&server)
            .await;

        let err = client(&server)
            .tag("igw-1", &Tags::new())
            .await
            .expect_err("tag should fail");
        assert!(matches!(err, ProviderError::ApiRequestFailed { status: 503, .. }));
    }
}
