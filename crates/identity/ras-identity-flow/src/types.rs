//! Flow protocol types.

use crate::error::FlowResult;
use serde::{Deserialize, Serialize};
use url::Url;

/// Where the browser goes to start a login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AuthorizationTarget {
    /// Navigate to this URL
    Redirect(String),
    /// Inject and submit this self-posting HTML fragment
    PostForm(String),
}

/// Parameters an OAuth2/OIDC provider returns to the callback endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl AuthorizationResponse {
    /// Extract the response parameters from a callback URL's query string
    pub fn from_callback_url(callback_url: &str) -> FlowResult<Self> {
        let url = Url::parse(callback_url)?;
        let mut response = AuthorizationResponse::default();

        for (key, value) in url.query_pairs() {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => response.code = value,
                "state" => response.state = value,
                "error" => response.error = value,
                "error_description" => response.error_description = value,
                _ => {}
            }
        }

        Ok(response)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Fields of an OIDC discovery document this crate reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub issuer: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
    pub jwks_uri: Option<String>,
    pub scopes_supported: Option<Vec<String>>,
    pub response_types_supported: Option<Vec<String>>,
    pub code_challenge_methods_supported: Option<Vec<String>>,
}
