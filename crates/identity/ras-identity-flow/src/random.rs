//! Cryptographically secure random byte source.

use crate::MaybeSendSync;
use crate::error::{FlowError, FlowResult};
use rand::RngCore;
use rand::rngs::OsRng;

/// Source of secure random bytes.
///
/// Implementations must fail rather than fall back to a weaker generator.
pub trait RandomSource: MaybeSendSync {
    fn fill_bytes(&self, dest: &mut [u8]) -> FlowResult<()>;
}

/// Operating system (or browser `crypto.getRandomValues`) randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn fill_bytes(&self, dest: &mut [u8]) -> FlowResult<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| FlowError::RandomUnavailable(e.to_string()))
    }
}
