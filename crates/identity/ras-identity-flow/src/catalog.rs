//! Built-in OAuth2 provider catalog.
//!
//! Provider-specific authorization parameters live here and nowhere else.

use crate::error::FlowResult;
use crate::provider::BuiltInProvider;
use std::str::FromStr;

/// Static description of a built-in provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub provider: BuiltInProvider,
    pub label: &'static str,
    pub authorization_endpoint: &'static str,
    pub default_scopes: &'static [&'static str],
    /// Extra query parameters only this provider receives
    pub extra_params: &'static [(&'static str, &'static str)],
}

static CATALOG: [CatalogEntry; 6] = [
    CatalogEntry {
        provider: BuiltInProvider::Google,
        label: "Google",
        authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth",
        default_scopes: &["openid", "email", "profile"],
        extra_params: &[("access_type", "offline"), ("prompt", "consent")],
    },
    CatalogEntry {
        provider: BuiltInProvider::Microsoft,
        label: "Microsoft",
        authorization_endpoint: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
        default_scopes: &["openid", "email", "profile", "offline_access"],
        extra_params: &[],
    },
    CatalogEntry {
        provider: BuiltInProvider::Apple,
        label: "Apple",
        authorization_endpoint: "https://appleid.apple.com/auth/authorize",
        default_scopes: &["name", "email"],
        extra_params: &[("response_mode", "form_post")],
    },
    CatalogEntry {
        provider: BuiltInProvider::Github,
        label: "GitHub",
        authorization_endpoint: "https://github.com/login/oauth/authorize",
        default_scopes: &["read:user", "user:email"],
        extra_params: &[],
    },
    CatalogEntry {
        provider: BuiltInProvider::Gitlab,
        label: "GitLab",
        authorization_endpoint: "https://gitlab.com/oauth/authorize",
        default_scopes: &["openid", "email", "profile", "read_user"],
        extra_params: &[],
    },
    CatalogEntry {
        provider: BuiltInProvider::Facebook,
        label: "Facebook",
        authorization_endpoint: "https://www.facebook.com/v18.0/dialog/oauth",
        default_scopes: &["email", "public_profile"],
        extra_params: &[],
    },
];

pub fn entries() -> &'static [CatalogEntry] {
    &CATALOG
}

pub fn entry(provider: BuiltInProvider) -> &'static CatalogEntry {
    let index = match provider {
        BuiltInProvider::Google => 0,
        BuiltInProvider::Microsoft => 1,
        BuiltInProvider::Apple => 2,
        BuiltInProvider::Github => 3,
        BuiltInProvider::Gitlab => 4,
        BuiltInProvider::Facebook => 5,
    };
    &CATALOG[index]
}

/// Look up a provider by its tag. Unknown names are configuration errors.
pub fn lookup(name: &str) -> FlowResult<&'static CatalogEntry> {
    Ok(entry(BuiltInProvider::from_str(name)?))
}

impl CatalogEntry {
    /// Caller scopes when non-empty, otherwise the catalog defaults
    pub fn resolve_scopes(&self, requested: Option<&[String]>) -> Vec<String> {
        match requested {
            Some(scopes) if !scopes.is_empty() => scopes.to_vec(),
            _ => self.default_scopes.iter().map(|s| s.to_string()).collect(),
        }
    }
}
