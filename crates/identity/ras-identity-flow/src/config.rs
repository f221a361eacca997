//! Flow client configuration.

use crate::error::{FlowError, FlowResult};
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CALLBACK_PATH: &str = "/auth/callback";
pub const DEFAULT_DISCOVERY_TIMEOUT_SECONDS: u64 = 10;

/// How the AuthnRequest is encoded for the HTTP-Redirect binding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamlRedirectEncoding {
    /// Plain base64 of the XML document
    #[default]
    Raw,
    /// Raw DEFLATE followed by base64, as the SAML bindings profile requires
    Deflate,
}

/// Settings shared by every flow a client starts
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Application origin, e.g. `https://app.example`
    #[builder(into)]
    pub origin: String,

    /// Appended to `origin` when a provider config has no redirect URI
    #[builder(into, default = DEFAULT_CALLBACK_PATH.to_string())]
    pub callback_path: String,

    #[builder(default = DEFAULT_DISCOVERY_TIMEOUT_SECONDS)]
    pub discovery_timeout_seconds: u64,

    /// Add a PKCE S256 challenge to OAuth2 and OIDC authorization requests
    #[builder(default = false)]
    pub use_pkce: bool,

    #[builder(default)]
    pub saml_redirect_encoding: SamlRedirectEncoding,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            discovery_timeout_seconds: DEFAULT_DISCOVERY_TIMEOUT_SECONDS,
            use_pkce: false,
            saml_redirect_encoding: SamlRedirectEncoding::Raw,
        }
    }
}

impl FlowConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn with_pkce(mut self, enabled: bool) -> Self {
        self.use_pkce = enabled;
        self
    }

    pub fn with_discovery_timeout(mut self, seconds: u64) -> Self {
        self.discovery_timeout_seconds = seconds;
        self
    }

    pub fn with_saml_redirect_encoding(mut self, encoding: SamlRedirectEncoding) -> Self {
        self.saml_redirect_encoding = encoding;
        self
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_seconds)
    }

    /// `{origin}{callback_path}`, the redirect URI used when none is configured.
    /// A blank origin is a configuration error, never a relative URI.
    pub fn default_redirect_uri(&self) -> FlowResult<String> {
        let origin = self.origin.trim().trim_end_matches('/');
        if origin.is_empty() {
            return Err(FlowError::MissingField("origin"));
        }
        Ok(format!("{}{}", origin, self.callback_path))
    }

    /// The configured redirect URI, or the origin-based fallback
    pub fn resolve_redirect_uri(&self, configured: Option<&str>) -> FlowResult<String> {
        match configured {
            Some(uri) if !uri.trim().is_empty() => Ok(uri.to_string()),
            _ => self.default_redirect_uri(),
        }
    }
}
