use async_trait::async_trait;
use http::HeaderMap;
use std::error::Error as StdError;

/// Failure reported by an [`OAuth2Client`].
///
/// Mirrors what an OAuth2 client library hands back on a failed request:
/// the status code and the response body, when a response was received.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    /// Description of the failure.
    pub message: String,
    /// HTTP status of the failed response.
    pub status: Option<u16>,
    /// Body of the failed response.
    pub data: Option<String>,
    /// Underlying transport error.
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl FetchError {
    /// Create an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            data: None,
            source: None,
        }
    }

    /// Attach the HTTP status of the failed response.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the body of the failed response.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Attach the underlying error.
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The non-empty `message` field of a JSON error body, if any.
    pub fn json_message(&self) -> Option<String> {
        let data = self.data.as_deref()?;
        let body: serde_json::Value = serde_json::from_str(data).ok()?;
        body.get("message")?
            .as_str()
            .filter(|message| !message.is_empty())
            .map(str::to_owned)
    }
}

/// The OAuth2 client collaborator providers delegate their HTTP calls to.
#[async_trait]
pub trait OAuth2Client: Send + Sync {
    /// `GET url` authorized with `access_token` as a bearer token, returning
    /// the response body of a successful response.
    async fn get(
        &self,
        url: &str,
        access_token: &str,
        headers: &HeaderMap,
    ) -> Result<String, FetchError>;
}

/// [`OAuth2Client`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Create a client with a default connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing reqwest client.
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl OAuth2Client for HttpClient {
    async fn get(
        &self,
        url: &str,
        access_token: &str,
        headers: &HeaderMap,
    ) -> Result<String, FetchError> {
        let response = self
            .inner
            .get(url)
            .headers(headers.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| FetchError::new(e.to_string()).with_source(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                FetchError::new(e.to_string())
                    .with_status(status.as_u16())
                    .with_source(e)
            })?;

        if !status.is_success() {
            return Err(FetchError::new(format!("Request failed with status {status}"))
                .with_status(status.as_u16())
                .with_data(body));
        }

        Ok(body)
    }
}
