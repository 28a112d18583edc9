use serde::Deserialize;
use std::collections::BTreeMap;

/// Options for building a [`FortyTwoProvider`](crate::FortyTwoProvider).
///
/// Deserializable so it can live in the application's own configuration
/// file; [`FortyTwoConfig::from_env`] covers the common case.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FortyTwoConfig {
    /// The application's UID on the intranet.
    pub client_id: String,
    /// The application's SECRET on the intranet.
    pub client_secret: String,
    /// Where the intranet redirects after authorization.
    pub callback_url: String,
    /// Overrides the authorization endpoint.
    pub authorization_url: Option<String>,
    /// Overrides the token endpoint.
    pub token_url: Option<String>,
    /// Overrides the profile endpoint.
    pub profile_url: Option<String>,
    /// `User-Agent` sent with API requests, unless `custom_headers` sets one.
    pub user_agent: Option<String>,
    /// Extra headers sent with API requests.
    pub custom_headers: BTreeMap<String, String>,
    /// Output path to input path table replacing the default profile fields.
    pub profile_fields: Option<BTreeMap<String, String>>,
    /// Deadline for the profile request, in seconds.
    pub timeout_secs: Option<u64>,
}

/// Redirect URI used when `AUTHKESTRA_FORTYTWO_REDIRECT_URI` is unset.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/auth/42/callback";

impl FortyTwoConfig {
    /// Read the configuration from `AUTHKESTRA_FORTYTWO_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            client_id: lookup("AUTHKESTRA_FORTYTWO_CLIENT_ID").unwrap_or_default(),
            client_secret: lookup("AUTHKESTRA_FORTYTWO_CLIENT_SECRET").unwrap_or_default(),
            callback_url: lookup("AUTHKESTRA_FORTYTWO_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            profile_url: lookup("AUTHKESTRA_FORTYTWO_PROFILE_URL"),
            user_agent: lookup("AUTHKESTRA_FORTYTWO_USER_AGENT"),
            ..Self::default()
        }
    }
}
