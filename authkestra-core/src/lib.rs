//! # Authkestra Core
//!
//! `authkestra-core` provides the foundational traits and types for the Authkestra authentication framework.
//! It defines the normalized profile, the provider and flow abstractions, and the OAuth2 client
//! collaborator that providers delegate their HTTP calls to.

#![warn(missing_docs)]

use async_trait::async_trait;

/// Errors that can occur during the authentication process.
pub mod error;
pub use crate::error::AuthError;

/// Normalized profile, token and callback types shared by all providers.
pub mod state;
pub use crate::state::{CallbackParams, OAuthToken, Profile};

/// Dotted-path addressing into JSON documents.
pub mod path;

/// The OAuth2 client collaborator and its reqwest-backed implementation.
pub mod client;
pub use crate::client::{FetchError, HttpClient, OAuth2Client};

/// Trait for an OAuth2-compatible provider.
///
/// A provider knows its endpoints and how to turn an access token into a
/// normalized [`Profile`]. The code-for-token exchange is left to the
/// [`OAuth2Client`] the application wires in.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Get the provider identifier.
    fn provider_id(&self) -> &str;

    /// Helper to get the authorization URL.
    fn get_authorization_url(&self, state: &str, scopes: &[&str]) -> String;

    /// Fetch the user profile that belongs to `access_token`.
    async fn user_profile(&self, access_token: &str) -> Result<Profile, AuthError>;
}

/// Trait for mapping a provider profile to a local user.
#[async_trait]
pub trait UserMapper: Send + Sync {
    /// The type of the local user object.
    type LocalUser: Send + Sync;

    /// Map a profile to a local user.
    /// This could involve creating a new user or finding an existing one.
    async fn map_user(&self, profile: &Profile) -> Result<Self::LocalUser, AuthError>;
}

/// Orchestrates the Authorization Code flow.
#[async_trait]
pub trait ErasedOAuthFlow: Send + Sync {
    /// Get the provider identifier.
    fn provider_id(&self) -> String;
    /// Generates the redirect URL and CSRF state.
    fn initiate_login(&self, scopes: &[&str]) -> (String, String);
    /// Validates the callback query and returns the authorization code.
    fn authorization_code(
        &self,
        params: &CallbackParams,
        expected_state: &str,
    ) -> Result<String, AuthError>;
    /// Completes the flow with a token obtained from the code exchange.
    async fn finalize_login(&self, token: &OAuthToken) -> Result<Profile, AuthError>;
}

#[async_trait]
impl UserMapper for () {
    type LocalUser = ();
    async fn map_user(&self, _profile: &Profile) -> Result<Self::LocalUser, AuthError> {
        Ok(())
    }
}

#[async_trait]
impl<T: ErasedOAuthFlow + ?Sized> ErasedOAuthFlow for std::sync::Arc<T> {
    fn provider_id(&self) -> String {
        (**self).provider_id()
    }

    fn initiate_login(&self, scopes: &[&str]) -> (String, String) {
        (**self).initiate_login(scopes)
    }

    fn authorization_code(
        &self,
        params: &CallbackParams,
        expected_state: &str,
    ) -> Result<String, AuthError> {
        (**self).authorization_code(params, expected_state)
    }

    async fn finalize_login(&self, token: &OAuthToken) -> Result<Profile, AuthError> {
        (**self).finalize_login(token).await
    }
}

#[async_trait]
impl<T: OAuthProvider + ?Sized> OAuthProvider for std::sync::Arc<T> {
    fn provider_id(&self) -> &str {
        (**self).provider_id()
    }

    fn get_authorization_url(&self, state: &str, scopes: &[&str]) -> String {
        (**self).get_authorization_url(state, scopes)
    }

    async fn user_profile(&self, access_token: &str) -> Result<Profile, AuthError> {
        (**self).user_profile(access_token).await
    }
}
