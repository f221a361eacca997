//! Return-leg validation of state, nonce and relay state.
//!
//! Every check consumes its slot whatever the outcome, so a stored value
//! validates at most once. Failures are returned as `false` and logged as
//! security events; callers must abort the login on `false`.

use crate::client::FlowClient;
use crate::logging::FlowLogger;
use crate::store::ArtifactKind;
use crate::types::AuthorizationResponse;
use serde_json::json;

impl FlowClient {
    fn consume_and_compare(
        &self,
        kind: ArtifactKind,
        received: &str,
        logger: FlowLogger,
    ) -> bool {
        let stored = match self.store().take(kind) {
            Ok(stored) => stored,
            Err(e) => {
                logger.security_event(
                    "Could not read pending flow artifact",
                    json!({ "artifact": kind.storage_key(), "error": e.to_string() }),
                );
                return false;
            }
        };

        match stored {
            Some(expected) if !received.is_empty() && expected == received => true,
            Some(_) => {
                logger.security_event(
                    "Mismatch on return from identity provider, possible CSRF",
                    json!({ "artifact": kind.storage_key() }),
                );
                false
            }
            None => {
                logger.security_event(
                    "No pending value on return from identity provider, possible replay",
                    json!({ "artifact": kind.storage_key() }),
                );
                false
            }
        }
    }

    fn discard_pending_state(&self) {
        if let Err(e) = self.store().clear(ArtifactKind::OAuthState) {
            FlowLogger::VALIDATOR.security_event(
                "Could not discard pending state after a failed callback",
                json!({
                    "artifact": ArtifactKind::OAuthState.storage_key(),
                    "error": e.to_string(),
                }),
            );
        }
    }

    /// Check the OAuth2/OIDC `state` parameter against the pending value
    pub fn validate_state(&self, received: &str) -> bool {
        self.consume_and_compare(ArtifactKind::OAuthState, received, FlowLogger::OAUTH)
    }

    /// Check the SAML `RelayState` against the pending value
    pub fn validate_relay_state(&self, received: &str) -> bool {
        self.consume_and_compare(ArtifactKind::SamlRelayState, received, FlowLogger::SAML)
    }

    /// Check the `nonce` claim of a returned ID token against the pending value
    pub fn validate_nonce(&self, received: &str) -> bool {
        self.consume_and_compare(ArtifactKind::OidcNonce, received, FlowLogger::OIDC)
    }

    /// Validate a parsed callback: provider errors fail, otherwise the state
    /// parameter decides. The pending state is consumed in both cases.
    pub fn validate_callback(&self, response: &AuthorizationResponse) -> bool {
        if let Some(error) = &response.error {
            self.discard_pending_state();
            FlowLogger::VALIDATOR.warn(
                "Identity provider returned an error",
                json!({ "error": error }),
            );
            return false;
        }

        if response.code.as_deref().is_none_or(str::is_empty) {
            self.discard_pending_state();
            FlowLogger::VALIDATOR.security_event(
                "Callback is missing the authorization code",
                json!({}),
            );
            return false;
        }

        self.validate_state(response.state.as_deref().unwrap_or_default())
    }

    /// Hand out the pending PKCE verifier once, for the backend code exchange
    pub fn take_code_verifier(&self) -> Option<String> {
        match self.store().take(ArtifactKind::PkceVerifier) {
            Ok(verifier) => verifier,
            Err(e) => {
                FlowLogger::VALIDATOR.error(
                    "Could not read PKCE verifier",
                    json!({ "error": e.to_string() }),
                );
                None
            }
        }
    }
}
