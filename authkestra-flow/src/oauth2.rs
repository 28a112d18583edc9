use async_trait::async_trait;
use authkestra_core::{
    AuthError, CallbackParams, ErasedOAuthFlow, OAuthProvider, OAuthToken, Profile, UserMapper,
};

/// Orchestrates the standard OAuth2 Authorization Code flow.
///
/// The code-for-token exchange happens outside the flow: take the code from
/// [`authorization_code`](Self::authorization_code), exchange it with the
/// provider's token endpoint and hand the token to
/// [`finalize_login`](Self::finalize_login).
pub struct OAuth2Flow<P: OAuthProvider, M: UserMapper = ()> {
    provider: P,
    mapper: Option<M>,
}

#[async_trait]
impl<P: OAuthProvider, M: UserMapper> ErasedOAuthFlow for OAuth2Flow<P, M> {
    fn provider_id(&self) -> String {
        self.provider.provider_id().to_string()
    }

    fn initiate_login(&self, scopes: &[&str]) -> (String, String) {
        self.initiate_login(scopes)
    }

    fn authorization_code(
        &self,
        params: &CallbackParams,
        expected_state: &str,
    ) -> Result<String, AuthError> {
        self.authorization_code(params, expected_state)
    }

    async fn finalize_login(&self, token: &OAuthToken) -> Result<Profile, AuthError> {
        let (profile, _) = self.finalize_login(token).await?;
        Ok(profile)
    }
}

impl<P: OAuthProvider> OAuth2Flow<P, ()> {
    /// Create a new `OAuth2Flow` with the given provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            mapper: None,
        }
    }
}

impl<P: OAuthProvider, M: UserMapper> OAuth2Flow<P, M> {
    /// Create a new `OAuth2Flow` with the given provider and user mapper.
    pub fn with_mapper(provider: P, mapper: M) -> Self {
        Self {
            provider,
            mapper: Some(mapper),
        }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Generates the redirect URL and CSRF state.
    pub fn initiate_login(&self, scopes: &[&str]) -> (String, String) {
        let state = uuid::Uuid::new_v4().to_string();
        let url = self.provider.get_authorization_url(&state, scopes);
        (url, state)
    }

    /// Checks the query the provider redirected back with and returns the
    /// authorization code to exchange.
    pub fn authorization_code(
        &self,
        params: &CallbackParams,
        expected_state: &str,
    ) -> Result<String, AuthError> {
        if let Some(error) = &params.error {
            let description = params
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone());
            log::debug!(
                "{} authorization failed: {error}",
                self.provider.provider_id()
            );
            return Err(if error == "access_denied" {
                AuthError::AccessDenied(description)
            } else {
                AuthError::Provider(description)
            });
        }

        if params.state.as_deref() != Some(expected_state) {
            return Err(AuthError::CsrfMismatch);
        }

        params
            .code
            .clone()
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::InvalidCode)
    }

    /// Completes the flow with the exchanged token.
    /// If a mapper is provided, it will also map the profile to a local user.
    pub async fn finalize_login(
        &self,
        token: &OAuthToken,
    ) -> Result<(Profile, Option<M::LocalUser>), AuthError> {
        let profile = self.provider.user_profile(&token.access_token).await?;

        let local_user = if let Some(mapper) = &self.mapper {
            Some(mapper.map_user(&profile).await?)
        } else {
            None
        };

        Ok((profile, local_user))
    }
}
