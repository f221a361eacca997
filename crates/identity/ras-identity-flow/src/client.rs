//! Flow client and the OAuth2 / OIDC authorization request builders.

use crate::catalog;
use crate::config::FlowConfig;
use crate::error::{FlowError, FlowResult};
use crate::fetch::{DiscoveryFetcher, ReqwestFetcher};
use crate::logging::{FlowLogger, MAX_LOGGED_URL_CHARS, truncate};
use crate::provider::{CustomOAuth2Config, OAuth2ProviderConfig, OidcProviderConfig};
use crate::random::{OsRandomSource, RandomSource};
use crate::store::{ArtifactKind, FlowStorage, FlowStore, InMemoryFlowStorage};
use crate::token::{PkceChallenge, TokenGenerator};
use crate::types::DiscoveryDocument;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";
pub const DEFAULT_OIDC_SCOPES: &[&str] = &["openid", "email", "profile"];

/// Discovery document location for an issuer: one trailing slash trimmed,
/// then the well-known suffix appended.
pub fn discovery_url(issuer_url: &str) -> String {
    let issuer = issuer_url.strip_suffix('/').unwrap_or(issuer_url);
    format!("{}{}", issuer, DISCOVERY_PATH)
}

fn require<'a>(value: &'a str, field: &'static str) -> FlowResult<&'a str> {
    if value.trim().is_empty() {
        return Err(FlowError::MissingField(field));
    }
    Ok(value)
}

/// Resolves `None` and empty lists to `None` so no `scope` parameter is sent
fn requested_scopes(scopes: Option<&[String]>) -> Option<String> {
    scopes
        .filter(|scopes| !scopes.is_empty())
        .map(|scopes| scopes.join(" "))
}

#[cfg(not(target_arch = "wasm32"))]
async fn with_timeout<F: Future>(duration: Duration, future: F) -> Option<F::Output> {
    tokio::time::timeout(duration, future).await.ok()
}

#[cfg(target_arch = "wasm32")]
async fn with_timeout<F: Future>(duration: Duration, future: F) -> Option<F::Output> {
    use futures::future::{Either, select};

    let timer = gloo_timers::future::sleep(duration);
    futures::pin_mut!(future);
    futures::pin_mut!(timer);

    match select(future, timer).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}

/// Starts and validates login flows.
///
/// Every host capability is injected: artifact storage, the random source
/// and the discovery fetcher.
#[derive(Clone)]
pub struct FlowClient {
    config: FlowConfig,
    store: FlowStore,
    tokens: TokenGenerator,
    fetcher: Arc<dyn DiscoveryFetcher>,
}

impl FlowClient {
    pub fn new(
        config: FlowConfig,
        storage: Arc<dyn FlowStorage>,
        random: Arc<dyn RandomSource>,
        fetcher: Arc<dyn DiscoveryFetcher>,
    ) -> Self {
        Self {
            config,
            store: FlowStore::new(storage),
            tokens: TokenGenerator::new(random),
            fetcher,
        }
    }

    /// Client with process-local storage, OS randomness and a reqwest fetcher
    pub fn in_memory(config: FlowConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryFlowStorage::new()),
            Arc::new(OsRandomSource),
            Arc::new(ReqwestFetcher::new()),
        )
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn store(&self) -> &FlowStore {
        &self.store
    }

    pub fn tokens(&self) -> &TokenGenerator {
        &self.tokens
    }

    fn pkce(&self) -> FlowResult<Option<PkceChallenge>> {
        if self.config.use_pkce {
            Ok(Some(self.tokens.generate_pkce()?))
        } else {
            Ok(None)
        }
    }

    /// Persist the artifacts of a flow that is about to navigate away
    fn persist(
        &self,
        state: &str,
        nonce: Option<&str>,
        pkce: Option<&PkceChallenge>,
    ) -> FlowResult<()> {
        self.store.put(ArtifactKind::OAuthState, state)?;
        if let Some(nonce) = nonce {
            self.store.put(ArtifactKind::OidcNonce, nonce)?;
        }
        if let Some(pkce) = pkce {
            self.store.put(ArtifactKind::PkceVerifier, &pkce.code_verifier)?;
        }
        Ok(())
    }

    /// Authorization URL for a catalog provider
    pub fn build_oauth2_url(&self, config: &OAuth2ProviderConfig) -> FlowResult<String> {
        let client_id = require(&config.client_id, "clientId")?;
        let entry = catalog::entry(config.provider);
        let mut url = Url::parse(entry.authorization_endpoint)?;

        let redirect_uri = self.config.resolve_redirect_uri(config.redirect_uri.as_deref())?;
        let scopes = entry.resolve_scopes(config.scopes.as_deref());
        let state = self.tokens.generate_state()?;
        let pkce = self.pkce()?;

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("client_id", client_id);
            params.append_pair("redirect_uri", &redirect_uri);
            params.append_pair("response_type", "code");
            params.append_pair("scope", &scopes.join(" "));
            params.append_pair("state", &state);

            if let Some(pkce) = &pkce {
                params.append_pair("code_challenge", &pkce.code_challenge);
                params.append_pair("code_challenge_method", &pkce.code_challenge_method);
            }

            for (key, value) in entry.extra_params {
                params.append_pair(key, value);
            }
        }

        self.persist(&state, None, pkce.as_ref())?;

        FlowLogger::OAUTH.info(
            "Built authorization URL",
            json!({
                "provider": entry.provider.as_str(),
                "redirect_uri": truncate(&redirect_uri, MAX_LOGGED_URL_CHARS),
                "scopes": scopes,
                "pkce": pkce.is_some(),
            }),
        );

        Ok(url.to_string())
    }

    /// Authorization URL for a caller-supplied OAuth2 endpoint
    pub fn build_custom_oauth2_url(&self, config: &CustomOAuth2Config) -> FlowResult<String> {
        let endpoint = require(&config.authorization_endpoint, "authorizationEndpoint")?;
        let client_id = require(&config.client_id, "clientId")?;
        let mut url = Url::parse(endpoint)?;

        let redirect_uri = self.config.resolve_redirect_uri(config.redirect_uri.as_deref())?;
        let scope = requested_scopes(config.scopes.as_deref());
        let state = self.tokens.generate_state()?;
        let pkce = self.pkce()?;

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("client_id", client_id);
            params.append_pair("redirect_uri", &redirect_uri);
            params.append_pair("response_type", "code");
            if let Some(scope) = &scope {
                params.append_pair("scope", scope);
            }
            params.append_pair("state", &state);

            if let Some(pkce) = &pkce {
                params.append_pair("code_challenge", &pkce.code_challenge);
                params.append_pair("code_challenge_method", &pkce.code_challenge_method);
            }
        }

        self.persist(&state, None, pkce.as_ref())?;

        FlowLogger::OAUTH.info(
            "Built custom authorization URL",
            json!({
                "label": config.label.as_deref().unwrap_or("custom"),
                "redirect_uri": truncate(&redirect_uri, MAX_LOGGED_URL_CHARS),
                "scopes": scope,
                "pkce": pkce.is_some(),
            }),
        );

        Ok(url.to_string())
    }

    /// Fetch and parse an issuer's discovery document, bounded by the
    /// configured discovery timeout.
    pub async fn discover(&self, issuer_url: &str) -> FlowResult<DiscoveryDocument> {
        let issuer_url = require(issuer_url, "issuerUrl")?;
        let location = discovery_url(issuer_url);

        FlowLogger::OIDC.debug("Fetching discovery document", json!({ "url": location }));

        let response = with_timeout(self.config.discovery_timeout(), self.fetcher.get(&location))
            .await
            .ok_or(FlowError::DiscoveryTimeout {
                timeout_seconds: self.config.discovery_timeout_seconds,
            })??;

        if !response.is_success() {
            FlowLogger::OIDC.error(
                "Discovery request failed",
                json!({ "url": location, "status": response.status }),
            );
            return Err(FlowError::DiscoveryStatus {
                status: response.status,
            });
        }

        serde_json::from_str(&response.body)
            .map_err(|e| FlowError::InvalidDiscoveryDocument(e.to_string()))
    }

    /// Authorization URL for an OIDC issuer. Suspends on the discovery request.
    pub async fn build_oidc_url(&self, config: &OidcProviderConfig) -> FlowResult<String> {
        let client_id = require(&config.client_id, "clientId")?;
        let document = self.discover(&config.issuer_url).await?;

        let endpoint = document
            .authorization_endpoint
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or(FlowError::DiscoveryMissingField("authorization_endpoint"))?;
        let mut url = Url::parse(&endpoint).map_err(|e| {
            FlowError::InvalidDiscoveryDocument(format!("authorization_endpoint: {}", e))
        })?;

        let redirect_uri = self.config.resolve_redirect_uri(config.redirect_uri.as_deref())?;
        let scope = requested_scopes(config.scopes.as_deref())
            .unwrap_or_else(|| DEFAULT_OIDC_SCOPES.join(" "));
        let state = self.tokens.generate_state()?;
        let nonce = self.tokens.generate_nonce()?;
        let pkce = self.pkce()?;

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("client_id", client_id);
            params.append_pair("redirect_uri", &redirect_uri);
            params.append_pair("response_type", "code");
            params.append_pair("scope", &scope);
            params.append_pair("state", &state);
            params.append_pair("nonce", &nonce);

            if let Some(pkce) = &pkce {
                params.append_pair("code_challenge", &pkce.code_challenge);
                params.append_pair("code_challenge_method", &pkce.code_challenge_method);
            }
        }

        self.persist(&state, Some(&nonce), pkce.as_ref())?;

        FlowLogger::OIDC.info(
            "Built authorization URL",
            json!({
                "issuer": truncate(&config.issuer_url, MAX_LOGGED_URL_CHARS),
                "redirect_uri": truncate(&redirect_uri, MAX_LOGGED_URL_CHARS),
                "scope": scope,
                "pkce": pkce.is_some(),
            }),
        );

        Ok(url.to_string())
    }
}
