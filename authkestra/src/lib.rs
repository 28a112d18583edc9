//! # Authkestra
//!
//! Facade over the authkestra crates. Enable the `flow` feature for flow
//! orchestration and `fortytwo` for the 42 intranet provider.
//!
//! ```no_run
//! # #[cfg(all(feature = "flow", feature = "fortytwo"))]
//! # fn build() -> Result<(), authkestra::core::AuthError> {
//! use authkestra::flow::{Authkestra, OAuth2Flow};
//! use authkestra::providers::fortytwo::{FortyTwoConfig, FortyTwoProvider};
//!
//! let provider = FortyTwoProvider::from_config(FortyTwoConfig::from_env())?;
//! let authkestra = Authkestra::builder()
//!     .provider(OAuth2Flow::new(provider))
//!     .build();
//! # let _ = authkestra;
//! # Ok(())
//! # }
//! ```

pub use authkestra_core as core;

#[cfg(feature = "flow")]
pub use authkestra_flow as flow;

/// Bundled identity providers.
pub mod providers {
    #[cfg(feature = "fortytwo")]
    pub use authkestra_providers_fortytwo as fortytwo;
}
