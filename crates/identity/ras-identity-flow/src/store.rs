//! Single-slot storage of pending flow artifacts.
//!
//! Each artifact kind owns exactly one slot. Writing a kind overwrites any
//! unconsumed value (the most recently initiated flow wins) and validation
//! consumes a slot by reading and clearing it.

use crate::MaybeSendSync;
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Artifact kinds persisted between flow start and provider return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    OAuthState,
    OidcNonce,
    PkceVerifier,
    SamlRequestId,
    SamlRelayState,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::OAuthState,
        ArtifactKind::OidcNonce,
        ArtifactKind::PkceVerifier,
        ArtifactKind::SamlRequestId,
        ArtifactKind::SamlRelayState,
    ];

    /// Key used in the host key/value store
    pub fn storage_key(&self) -> &'static str {
        match self {
            ArtifactKind::OAuthState => "oauth_state",
            ArtifactKind::OidcNonce => "oidc_nonce",
            ArtifactKind::PkceVerifier => "pkce_code_verifier",
            ArtifactKind::SamlRequestId => "saml_request_id",
            ArtifactKind::SamlRelayState => "saml_relay_state",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// Per-tab string key/value store, shaped after the browser's `sessionStorage`
pub trait FlowStorage: MaybeSendSync {
    fn get_item(&self, key: &str) -> FlowResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> FlowResult<()>;

    fn remove_item(&self, key: &str) -> FlowResult<()>;

    /// Read and remove `key`. Backends shared between threads must override
    /// this so no two callers can observe the same value.
    fn take_item(&self, key: &str) -> FlowResult<Option<String>> {
        let value = self.get_item(key)?;
        self.remove_item(key)?;
        Ok(value)
    }
}

/// In-memory implementation of FlowStorage
#[derive(Debug, Default)]
pub struct InMemoryFlowStorage {
    items: Mutex<HashMap<String, String>>,
}

impl InMemoryFlowStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> FlowResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| FlowError::StorageError("in-memory storage lock poisoned".to_string()))
    }
}

impl FlowStorage for InMemoryFlowStorage {
    fn get_item(&self, key: &str) -> FlowResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> FlowResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> FlowResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn take_item(&self, key: &str) -> FlowResult<Option<String>> {
        Ok(self.lock()?.remove(key))
    }
}

/// Typed view over a [`FlowStorage`] backend.
#[derive(Clone)]
pub struct FlowStore {
    storage: Arc<dyn FlowStorage>,
}

impl FlowStore {
    pub fn new(storage: Arc<dyn FlowStorage>) -> Self {
        Self { storage }
    }

    /// Store a pending value, replacing whatever the slot held.
    pub fn put(&self, kind: ArtifactKind, value: &str) -> FlowResult<()> {
        self.storage.set_item(kind.storage_key(), value)
    }

    /// Read without consuming.
    pub fn peek(&self, kind: ArtifactKind) -> FlowResult<Option<String>> {
        self.storage.get_item(kind.storage_key())
    }

    /// Read and clear the slot. A value can be taken at most once.
    pub fn take(&self, kind: ArtifactKind) -> FlowResult<Option<String>> {
        self.storage.take_item(kind.storage_key())
    }

    pub fn clear(&self, kind: ArtifactKind) -> FlowResult<()> {
        self.storage.remove_item(kind.storage_key())
    }

    /// Drop every pending artifact, e.g. on logout.
    pub fn clear_all(&self) -> FlowResult<()> {
        for kind in ArtifactKind::ALL {
            self.clear(kind)?;
        }
        Ok(())
    }
}
