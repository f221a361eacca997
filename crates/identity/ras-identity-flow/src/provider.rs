//! Provider configuration, a tagged union discriminated by `provider`.
//!
//! Configurations arrive from the form layer as JSON such as
//! `{"provider": "google", "clientId": "abc"}`. Parsing fails closed: an
//! unrecognized tag or a missing required field is a configuration error.

use crate::error::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const CUSTOM_OAUTH2_TAG: &str = "oauth2";
pub const OIDC_TAG: &str = "oidc";
pub const SAML_TAG: &str = "saml";

/// Providers with a built-in catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInProvider {
    Google,
    Microsoft,
    Apple,
    Github,
    Gitlab,
    Facebook,
}

impl BuiltInProvider {
    pub const ALL: [BuiltInProvider; 6] = [
        BuiltInProvider::Google,
        BuiltInProvider::Microsoft,
        BuiltInProvider::Apple,
        BuiltInProvider::Github,
        BuiltInProvider::Gitlab,
        BuiltInProvider::Facebook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltInProvider::Google => "google",
            BuiltInProvider::Microsoft => "microsoft",
            BuiltInProvider::Apple => "apple",
            BuiltInProvider::Github => "github",
            BuiltInProvider::Gitlab => "gitlab",
            BuiltInProvider::Facebook => "facebook",
        }
    }
}

impl FromStr for BuiltInProvider {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuiltInProvider::ALL
            .into_iter()
            .find(|provider| provider.as_str() == s)
            .ok_or_else(|| FlowError::UnknownProvider(s.to_string()))
    }
}

impl std::fmt::Display for BuiltInProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth2 login through a catalog provider
#[derive(Debug, Clone, PartialEq)]
pub struct OAuth2ProviderConfig {
    pub provider: BuiltInProvider,
    pub client_id: String,
    pub redirect_uri: Option<String>,
    /// Replaces the catalog's default scopes when non-empty
    pub scopes: Option<Vec<String>>,
}

impl OAuth2ProviderConfig {
    pub fn new(provider: BuiltInProvider, client_id: impl Into<String>) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            redirect_uri: None,
            scopes: None,
        }
    }
}

/// OAuth2 login against a caller-supplied authorization endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CustomOAuth2Config {
    pub authorization_endpoint: String,
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub label: Option<String>,
    pub button_color: Option<String>,
    pub text_color: Option<String>,
}

impl CustomOAuth2Config {
    pub fn new(authorization_endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            authorization_endpoint: authorization_endpoint.into(),
            client_id: client_id.into(),
            redirect_uri: None,
            scopes: None,
            label: None,
            button_color: None,
            text_color: None,
        }
    }
}

/// OpenID Connect login; endpoints come from the issuer's discovery document
#[derive(Debug, Clone, PartialEq)]
pub struct OidcProviderConfig {
    pub issuer_url: String,
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub scopes: Option<Vec<String>>,
}

impl OidcProviderConfig {
    pub fn new(issuer_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            issuer_url: issuer_url.into(),
            client_id: client_id.into(),
            redirect_uri: None,
            scopes: None,
        }
    }
}

/// SP-initiated SAML 2.0 login
#[derive(Debug, Clone, PartialEq)]
pub struct SamlProviderConfig {
    pub idp_sso_url: String,
    pub entity_id: String,
    pub acs_url: String,
    /// Defaults to the email address format
    pub name_id_format: Option<String>,
    pub force_authn: bool,
}

impl SamlProviderConfig {
    pub fn new(
        idp_sso_url: impl Into<String>,
        entity_id: impl Into<String>,
        acs_url: impl Into<String>,
    ) -> Self {
        Self {
            idp_sso_url: idp_sso_url.into(),
            entity_id: entity_id.into(),
            acs_url: acs_url.into(),
            name_id_format: None,
            force_authn: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProviderConfig", into = "RawProviderConfig")]
pub enum ProviderConfig {
    OAuth2(OAuth2ProviderConfig),
    CustomOAuth2(CustomOAuth2Config),
    Oidc(OidcProviderConfig),
    Saml(SamlProviderConfig),
}

impl ProviderConfig {
    pub fn from_json(value: serde_json::Value) -> FlowResult<Self> {
        let raw: RawProviderConfig = serde_json::from_value(value)
            .map_err(|e| FlowError::ConfigError(e.to_string()))?;
        ProviderConfig::try_from(raw)
    }

    /// Value of the `provider` discriminant
    pub fn tag(&self) -> &'static str {
        match self {
            ProviderConfig::OAuth2(config) => config.provider.as_str(),
            ProviderConfig::CustomOAuth2(_) => CUSTOM_OAUTH2_TAG,
            ProviderConfig::Oidc(_) => OIDC_TAG,
            ProviderConfig::Saml(_) => SAML_TAG,
        }
    }
}

/// Flat wire shape of every variant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProviderConfig {
    provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scopes: Option<Vec<String>>,
    #[serde(alias = "authorizationUrl", skip_serializing_if = "Option::is_none")]
    authorization_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    button_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issuer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    idp_sso_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    acs_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name_id_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    force_authn: Option<bool>,
}

fn required(value: Option<String>, field: &'static str) -> FlowResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(FlowError::MissingField(field)),
    }
}

impl TryFrom<RawProviderConfig> for ProviderConfig {
    type Error = FlowError;

    fn try_from(raw: RawProviderConfig) -> Result<Self, Self::Error> {
        match raw.provider.as_str() {
            CUSTOM_OAUTH2_TAG => Ok(ProviderConfig::CustomOAuth2(CustomOAuth2Config {
                authorization_endpoint: required(
                    raw.authorization_endpoint,
                    "authorizationEndpoint",
                )?,
                client_id: required(raw.client_id, "clientId")?,
                redirect_uri: raw.redirect_uri,
                scopes: raw.scopes,
                label: raw.label,
                button_color: raw.button_color,
                text_color: raw.text_color,
            })),
            OIDC_TAG => Ok(ProviderConfig::Oidc(OidcProviderConfig {
                issuer_url: required(raw.issuer_url, "issuerUrl")?,
                client_id: required(raw.client_id, "clientId")?,
                redirect_uri: raw.redirect_uri,
                scopes: raw.scopes,
            })),
            SAML_TAG => Ok(ProviderConfig::Saml(SamlProviderConfig {
                idp_sso_url: required(raw.idp_sso_url, "idpSsoUrl")?,
                entity_id: required(raw.entity_id, "entityId")?,
                acs_url: required(raw.acs_url, "acsUrl")?,
                name_id_format: raw.name_id_format,
                force_authn: raw.force_authn.unwrap_or(false),
            })),
            other => {
                let provider = BuiltInProvider::from_str(other)?;
                Ok(ProviderConfig::OAuth2(OAuth2ProviderConfig {
                    provider,
                    client_id: required(raw.client_id, "clientId")?,
                    redirect_uri: raw.redirect_uri,
                    scopes: raw.scopes,
                }))
            }
        }
    }
}

impl From<ProviderConfig> for RawProviderConfig {
    fn from(config: ProviderConfig) -> Self {
        let provider = config.tag().to_string();
        match config {
            ProviderConfig::OAuth2(c) => RawProviderConfig {
                provider,
                client_id: Some(c.client_id),
                redirect_uri: c.redirect_uri,
                scopes: c.scopes,
                ..Default::default()
            },
            ProviderConfig::CustomOAuth2(c) => RawProviderConfig {
                provider,
                client_id: Some(c.client_id),
                redirect_uri: c.redirect_uri,
                scopes: c.scopes,
                authorization_endpoint: Some(c.authorization_endpoint),
                label: c.label,
                button_color: c.button_color,
                text_color: c.text_color,
                ..Default::default()
            },
            ProviderConfig::Oidc(c) => RawProviderConfig {
                provider,
                client_id: Some(c.client_id),
                redirect_uri: c.redirect_uri,
                scopes: c.scopes,
                issuer_url: Some(c.issuer_url),
                ..Default::default()
            },
            ProviderConfig::Saml(c) => RawProviderConfig {
                provider,
                idp_sso_url: Some(c.idp_sso_url),
                entity_id: Some(c.entity_id),
                acs_url: Some(c.acs_url),
                name_id_format: c.name_id_format,
                force_authn: c.force_authn.then_some(true),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_builtin_provider() {
        let config = ProviderConfig::from_json(json!({
            "provider": "google",
            "clientId": "abc"
        }))
        .unwrap();

        assert_eq!(
            config,
            ProviderConfig::OAuth2(OAuth2ProviderConfig::new(BuiltInProvider::Google, "abc"))
        );
        assert_eq!(config.tag(), "google");
    }

    #[test]
    fn test_parse_custom_oauth2() {
        let config = ProviderConfig::from_json(json!({
            "provider": "oauth2",
            "authorizationUrl": "https://sso.example/authorize",
            "clientId": "abc",
            "label": "Example SSO",
            "buttonColor": "#123456"
        }))
        .unwrap();

        match config {
            ProviderConfig::CustomOAuth2(c) => {
                assert_eq!(c.authorization_endpoint, "https://sso.example/authorize");
                assert_eq!(c.label.as_deref(), Some("Example SSO"));
                assert_eq!(c.button_color.as_deref(), Some("#123456"));
                assert!(c.scopes.is_none());
            }
            other => panic!("Expected custom OAuth2 config, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_saml() {
        let config = ProviderConfig::from_json(json!({
            "provider": "saml",
            "idpSsoUrl": "https://idp.example/sso",
            "entityId": "sp1",
            "acsUrl": "https://app.example/acs"
        }))
        .unwrap();

        assert_eq!(
            config,
            ProviderConfig::Saml(SamlProviderConfig::new(
                "https://idp.example/sso",
                "sp1",
                "https://app.example/acs"
            ))
        );
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let result = ProviderConfig::from_json(json!({
            "provider": "myspace",
            "clientId": "abc"
        }));
        assert!(matches!(result, Err(FlowError::UnknownProvider(name)) if name == "myspace"));
    }

    #[test]
    fn test_missing_tag_is_rejected() {
        let result = ProviderConfig::from_json(json!({ "clientId": "abc" }));
        assert!(matches!(result, Err(FlowError::ConfigError(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let result = ProviderConfig::from_json(json!({
            "provider": "oidc",
            "clientId": "abc"
        }));
        assert!(matches!(result, Err(FlowError::MissingField("issuerUrl"))));

        let result = ProviderConfig::from_json(json!({
            "provider": "github",
            "clientId": "  "
        }));
        assert!(matches!(result, Err(FlowError::MissingField("clientId"))));
    }

    #[test]
    fn test_serialize_uses_provider_tag() {
        let config = ProviderConfig::Oidc(OidcProviderConfig::new("https://auth.example", "abc"));
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["provider"], "oidc");
        assert_eq!(value["issuerUrl"], "https://auth.example");
        assert!(value.get("entityId").is_none());

        let parsed: ProviderConfig = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, config);
    }
}
