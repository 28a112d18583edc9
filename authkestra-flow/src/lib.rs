//! # Authkestra Flow
//!
//! `authkestra-flow` orchestrates the OAuth2 Authorization Code flow around a provider.
//! It acts as the bridge between the core traits and the application's route handlers.
//!
//! ## Key Components
//!
//! - **[`OAuth2Flow`]**: Orchestrates the standard OAuth2 Authorization Code flow.
//! - **[`Authkestra`]**: The main service that holds the registered provider flows.
//! - **[`AuthkestraBuilder`]**: A builder for configuring and creating an [`Authkestra`] instance.

#![warn(missing_docs)]

pub use authkestra_core::ErasedOAuthFlow;
use authkestra_core::{OAuthProvider, UserMapper};

use std::collections::HashMap;
use std::sync::Arc;

/// OAuth2 Authorization Code flow implementation.
pub mod oauth2;

pub use oauth2::OAuth2Flow;

/// The unified Authkestra service.
#[derive(Clone, Default)]
pub struct Authkestra {
    /// Map of registered OAuth providers.
    pub providers: HashMap<String, Arc<dyn ErasedOAuthFlow>>,
}

impl Authkestra {
    /// Create a new [`AuthkestraBuilder`] to configure the service.
    pub fn builder() -> AuthkestraBuilder {
        AuthkestraBuilder::default()
    }

    /// Look up the flow registered for `provider_id`.
    pub fn provider(&self, provider_id: &str) -> Option<Arc<dyn ErasedOAuthFlow>> {
        self.providers.get(provider_id).cloned()
    }
}

/// A builder for configuring and creating an [`Authkestra`] instance.
#[derive(Default)]
pub struct AuthkestraBuilder {
    providers: HashMap<String, Arc<dyn ErasedOAuthFlow>>,
}

impl AuthkestraBuilder {
    /// Register an OAuth provider flow.
    pub fn provider<P, M>(mut self, flow: OAuth2Flow<P, M>) -> Self
    where
        P: OAuthProvider + 'static,
        M: UserMapper + 'static,
    {
        let id = flow.provider_id();
        if self.providers.contains_key(&id) {
            log::warn!("replacing already registered provider `{id}`");
        }
        self.providers.insert(id, Arc::new(flow));
        self
    }

    /// Build the [`Authkestra`] instance.
    pub fn build(self) -> Authkestra {
        Authkestra {
            providers: self.providers,
        }
    }
}
