//! # Authkestra 42 Provider
//!
//! Authenticates users against the 42 intranet (`api.intra.42.fr`) and maps
//! its user document to a normalized [`Profile`] through a declarative
//! [`FieldSpec`].
//!
//! The token exchange and transport belong to the [`OAuth2Client`] the
//! provider is built with; the provider only knows the endpoints and how to
//! turn the profile response into a profile.

#![warn(missing_docs)]

use async_trait::async_trait;
use authkestra_core::{AuthError, FetchError, HttpClient, OAuth2Client, OAuthProvider, Profile};
use http::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Provider settings loaded from serde sources or the environment.
pub mod config;
pub mod profile;

pub use config::FortyTwoConfig;
pub use profile::{FieldMapping, FieldSpec, ProfileError, ShapeError};

/// Identifier stamped on every profile.
pub const PROVIDER_ID: &str = "42";
/// Default authorization endpoint.
pub const AUTHORIZATION_URL: &str = "https://api.intra.42.fr/oauth/authorize";
/// Default token endpoint.
pub const TOKEN_URL: &str = "https://api.intra.42.fr/oauth/token";
/// Default profile endpoint.
pub const PROFILE_URL: &str = "https://api.intra.42.fr/v2/me";
/// `User-Agent` sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "authkestra-providers-fortytwo";

const FETCH_FAILED: &str = "Failed to fetch user profile";
const FETCH_TIMED_OUT: &str = "Timed out fetching user profile";
const PARSE_FAILED: &str = "Failed to parse user profile";

/// OAuth2 provider for the 42 intranet.
///
/// Holds the endpoints, the request headers and the profile field table.
/// Requests go through the configured [`OAuth2Client`]; without one, a
/// reqwest-backed [`HttpClient`] is built on the first profile request.
pub struct FortyTwoProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorization_url: String,
    token_url: String,
    profile_url: String,
    user_agent: Option<HeaderValue>,
    custom_headers: HeaderMap,
    profile_fields: Option<FieldSpec>,
    timeout: Option<Duration>,
    client: OnceLock<Arc<dyn OAuth2Client>>,
}

impl FortyTwoProvider {
    /// Create a provider for the application registered as `client_id`,
    /// using the intranet endpoints and the default profile fields.
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            authorization_url: AUTHORIZATION_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            profile_url: PROFILE_URL.to_string(),
            user_agent: None,
            custom_headers: HeaderMap::new(),
            profile_fields: None,
            timeout: None,
            client: OnceLock::new(),
        }
    }

    /// Build a provider from configuration, rejecting a missing client id,
    /// invalid headers and inconsistent profile fields.
    pub fn from_config(config: FortyTwoConfig) -> Result<Self, AuthError> {
        if config.client_id.trim().is_empty() {
            return Err(AuthError::Config(
                "FortyTwoProvider requires a client_id".to_string(),
            ));
        }

        let mut provider = Self::new(config.client_id, config.client_secret, config.callback_url);

        if let Some(url) = config.authorization_url {
            provider = provider.with_authorization_url(url);
        }
        if let Some(url) = config.token_url {
            provider = provider.with_token_url(url);
        }
        if let Some(url) = config.profile_url {
            provider = provider.with_profile_url(url);
        }
        if let Some(agent) = config.user_agent {
            let value = HeaderValue::from_str(&agent)
                .map_err(|e| AuthError::Config(format!("invalid user_agent: {e}")))?;
            provider = provider.with_user_agent(value);
        }
        for (name, value) in &config.custom_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AuthError::Config(format!("invalid header name `{name}`: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AuthError::Config(format!("invalid value for `{name}`: {e}")))?;
            provider = provider.with_header(name, value);
        }
        if let Some(paths) = config.profile_fields {
            let fields = FieldSpec::from_paths(paths);
            fields.validate()?;
            provider = provider.with_profile_fields(fields);
        }
        if let Some(secs) = config.timeout_secs {
            provider = provider.with_timeout(Duration::from_secs(secs));
        }

        Ok(provider)
    }

    /// Use another OAuth2 client for outgoing requests.
    pub fn with_client(mut self, client: Arc<dyn OAuth2Client>) -> Self {
        self.client = OnceLock::from(client);
        self
    }

    /// Override the authorization endpoint.
    pub fn with_authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = url.into();
        self
    }

    /// Override the token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Override the profile endpoint.
    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = url.into();
        self
    }

    /// Replace the default profile fields.
    pub fn with_profile_fields(mut self, fields: FieldSpec) -> Self {
        self.profile_fields = Some(fields);
        self
    }

    /// `User-Agent` for API requests. A `User-Agent` set through
    /// [`with_header`](Self::with_header) takes precedence.
    pub fn with_user_agent(mut self, user_agent: HeaderValue) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Send an extra header with every API request, replacing any earlier
    /// value for `name`.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.custom_headers.insert(name, value);
        self
    }

    /// Give up on the profile request after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The application's client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The application's client secret.
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Callback URL sent with the authorization request.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Token endpoint the code exchange should be sent to.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Endpoint the profile is fetched from.
    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    /// Headers sent with every API request.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = self.custom_headers.clone();
        if !headers.contains_key(USER_AGENT) {
            let agent = self
                .user_agent
                .clone()
                .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_USER_AGENT));
            headers.insert(USER_AGENT, agent);
        }
        headers
    }

    fn client(&self) -> &Arc<dyn OAuth2Client> {
        self.client
            .get_or_init(|| Arc::new(HttpClient::new()) as Arc<dyn OAuth2Client>)
    }
}

fn upstream_error(err: FetchError) -> AuthError {
    let message = err
        .json_message()
        .unwrap_or_else(|| FETCH_FAILED.to_string());
    AuthError::Upstream {
        message,
        source: err,
    }
}

#[async_trait]
impl OAuthProvider for FortyTwoProvider {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn get_authorization_url(&self, state: &str, scopes: &[&str]) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri);
        if !scopes.is_empty() {
            query.append_pair("scope", &scopes.join(" "));
        }
        query.append_pair("state", state);

        let separator = if self.authorization_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.authorization_url, separator, query.finish())
    }

    async fn user_profile(&self, access_token: &str) -> Result<Profile, AuthError> {
        log::debug!("fetching 42 user profile from {}", self.profile_url);

        let headers = self.headers();
        let request = self.client().get(&self.profile_url, access_token, &headers);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.map_err(|_| {
                log::warn!("42 profile request exceeded {limit:?}");
                AuthError::Upstream {
                    message: FETCH_TIMED_OUT.to_string(),
                    source: FetchError::new(format!("no response within {limit:?}")),
                }
            })?,
            None => request.await,
        };

        let body = response.map_err(|e| {
            log::warn!("42 profile request failed: {e}");
            upstream_error(e)
        })?;

        let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            log::debug!("42 profile body is not JSON: {e}");
            AuthError::Parse(PARSE_FAILED.to_string())
        })?;

        let fields = profile::parse(&json, self.profile_fields.as_ref())?;

        Ok(Profile {
            provider: PROVIDER_ID.to_string(),
            fields,
            raw: body,
            json,
        })
    }
}
