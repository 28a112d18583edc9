use crate::path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A normalized user profile returned by a provider.
///
/// The shape of `fields` is decided by the provider's field mapping. The raw
/// response body and the document it decoded to travel along for consumers
/// that need provider-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// The provider identifier, e.g. `"42"`.
    pub provider: String,
    /// The mapped profile fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// The response body exactly as received.
    #[serde(rename = "_raw")]
    pub raw: String,
    /// The decoded response body.
    #[serde(rename = "_json")]
    pub json: Value,
}

impl Profile {
    /// Look up a mapped field by dotted path, e.g. `"emails.0.value"`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let field = self.fields.get(head)?;
        match rest {
            Some(rest) => path::resolve(field, rest),
            None => Some(field),
        }
    }

    fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// The user's identifier at the provider.
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    /// The user's login name.
    pub fn username(&self) -> Option<&str> {
        self.get_str("username")
    }

    /// The user's full name.
    pub fn display_name(&self) -> Option<&str> {
        self.get_str("displayName")
    }

    /// The user's primary email address.
    pub fn email(&self) -> Option<&str> {
        self.get_str("emails.0.value")
    }
}

/// Tokens obtained from the authorization code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    /// The bearer token used for API calls.
    pub access_token: String,
    /// Token type, usually `"bearer"`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Token used to obtain a fresh access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Space separated list of granted scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl OAuthToken {
    /// A bearer token with no refresh token or expiry.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_in: None,
            refresh_token: None,
            scope: None,
        }
    }
}

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
    /// The authorization code, present on success.
    pub code: Option<String>,
    /// The state issued with the authorization request.
    pub state: Option<String>,
    /// Error code, present when authorization failed.
    pub error: Option<String>,
    /// Human readable error description.
    pub error_description: Option<String>,
}
