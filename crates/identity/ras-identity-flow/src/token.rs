//! State, nonce and PKCE generation.

use crate::error::FlowResult;
use crate::random::RandomSource;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Number of random bytes behind every state, nonce and verifier.
pub const TOKEN_BYTES: usize = 32;

pub const PKCE_METHOD_S256: &str = "S256";

/// PKCE code challenge and verifier
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
}

impl PkceChallenge {
    /// Build a challenge pair from an existing verifier
    pub fn from_verifier(code_verifier: String) -> Self {
        let code_challenge = generate_code_challenge(&code_verifier);

        Self {
            code_verifier,
            code_challenge,
            code_challenge_method: PKCE_METHOD_S256.to_string(),
        }
    }
}

/// S256 code challenge: base64url (no padding) of the verifier's SHA-256 digest.
pub fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let result = hasher.finalize();
    URL_SAFE_NO_PAD.encode(result)
}

/// Generates opaque flow tokens from an injected random source.
#[derive(Clone)]
pub struct TokenGenerator {
    random: Arc<dyn RandomSource>,
}

impl TokenGenerator {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    fn random_bytes(&self) -> FlowResult<[u8; TOKEN_BYTES]> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.random.fill_bytes(&mut bytes)?;
        Ok(bytes)
    }

    /// 64 lowercase hex characters.
    pub fn generate_state(&self) -> FlowResult<String> {
        Ok(hex::encode(self.random_bytes()?))
    }

    pub fn generate_nonce(&self) -> FlowResult<String> {
        self.generate_state()
    }

    /// 43 base64url characters, inside the 43..=128 range PKCE requires.
    pub fn generate_code_verifier(&self) -> FlowResult<String> {
        Ok(URL_SAFE_NO_PAD.encode(self.random_bytes()?))
    }

    pub fn generate_pkce(&self) -> FlowResult<PkceChallenge> {
        Ok(PkceChallenge::from_verifier(self.generate_code_verifier()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use crate::random::OsRandomSource;

    struct BrokenRandom;

    impl RandomSource for BrokenRandom {
        fn fill_bytes(&self, _dest: &mut [u8]) -> FlowResult<()> {
            Err(FlowError::RandomUnavailable("no crypto".to_string()))
        }
    }

    fn generator() -> TokenGenerator {
        TokenGenerator::new(Arc::new(OsRandomSource))
    }

    #[test]
    fn test_state_is_64_lowercase_hex() {
        let tokens = generator();
        let state = tokens.generate_state().unwrap();

        assert_eq!(state.len(), 64);
        assert!(
            state
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
        assert_ne!(state, tokens.generate_state().unwrap());
    }

    #[test]
    fn test_code_verifier_length() {
        let verifier = generator().generate_code_verifier().unwrap();
        assert!((43..=128).contains(&verifier.len()));
        assert!(!verifier.contains('='));
        assert!(!verifier.contains('+'));
        assert!(!verifier.contains('/'));
    }

    #[test]
    fn test_code_challenge_is_deterministic() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            generate_code_challenge(verifier),
            generate_code_challenge(verifier)
        );
        // RFC 7636 appendix B
        assert_eq!(
            generate_code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
        assert_ne!(
            generate_code_challenge(verifier),
            generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXK")
        );
    }

    #[test]
    fn test_pkce_generation() {
        let tokens = generator();
        let pkce1 = tokens.generate_pkce().unwrap();
        let pkce2 = tokens.generate_pkce().unwrap();

        assert_ne!(pkce1.code_verifier, pkce2.code_verifier);
        assert_ne!(pkce1.code_challenge, pkce2.code_challenge);
        assert_eq!(pkce1.code_challenge_method, "S256");
        assert_eq!(
            pkce1.code_challenge,
            generate_code_challenge(&pkce1.code_verifier)
        );
    }

    #[test]
    fn test_missing_random_source_fails_loudly() {
        let tokens = TokenGenerator::new(Arc::new(BrokenRandom));
        assert!(matches!(
            tokens.generate_state(),
            Err(FlowError::RandomUnavailable(_))
        ));
        assert!(tokens.generate_pkce().is_err());
    }
}
