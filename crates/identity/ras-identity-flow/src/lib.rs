//! Client-side login flow initiation for OAuth2, OpenID Connect and SAML 2.0.
//!
//! This crate builds authorization requests for built-in OAuth2 providers,
//! custom OAuth2 endpoints, OIDC issuers (via discovery) and SAML identity
//! providers. The CSRF `state`, OIDC `nonce`, PKCE verifier and SAML relay
//! state are kept in a per-tab key/value store and consumed exactly once
//! when the provider redirects back.
//!
//! Token exchange, ID token verification and SAML response validation are
//! performed by the backend, not here.

mod catalog;
mod client;
mod config;
mod error;
mod fetch;
mod initiator;
mod logging;
mod provider;
mod random;
mod saml;
mod store;
mod token;
mod types;
mod validator;

#[cfg(target_arch = "wasm32")]
mod browser;


/// Thread-safety bound for injected host capabilities.
///
/// Native hosts share a [`FlowClient`] across tasks so ports must be
/// `Send + Sync`; browser values (`web_sys::Storage`, `Window`) are neither.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}

pub use catalog::{CatalogEntry, entries as catalog_entries, lookup as lookup_provider};
pub use client::{DEFAULT_OIDC_SCOPES, DISCOVERY_PATH, FlowClient, discovery_url};
pub use config::{
    DEFAULT_CALLBACK_PATH, DEFAULT_DISCOVERY_TIMEOUT_SECONDS, FlowConfig, SamlRedirectEncoding,
};
pub use error::{FlowError, FlowErrorKind, FlowResult, USER_FACING_FAILURE};
pub use fetch::{DiscoveryFetcher, HttpResponse, ReqwestFetcher};
pub use initiator::Navigator;
pub use logging::{FlowLogger, REDACTED, redact};
pub use provider::{
    BuiltInProvider, CustomOAuth2Config, OAuth2ProviderConfig, OidcProviderConfig,
    ProviderConfig, SamlProviderConfig,
};
pub use random::{OsRandomSource, RandomSource};
pub use saml::{POST_FORM_ID, encode_saml_request, render_authn_request};
pub use store::{ArtifactKind, FlowStorage, FlowStore, InMemoryFlowStorage};
pub use token::{PkceChallenge, TokenGenerator, generate_code_challenge};
pub use types::{AuthorizationResponse, AuthorizationTarget, DiscoveryDocument};

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserNavigator, SessionStorageBackend, current_origin};
