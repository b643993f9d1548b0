use crate::crypto::auth::{AuthTypeId, SrtpAuth};
use crate::error::SrtpError;

/// Zero-length authenticator for confidentiality-only policies.
pub struct NullAuth;

impl NullAuth {
    pub fn new() -> Self {
        NullAuth
    }
}

impl Default for NullAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl SrtpAuth for NullAuth {
    fn id(&self) -> AuthTypeId {
        AuthTypeId::Null
    }

    fn key_len(&self) -> usize {
        0
    }

    fn tag_len(&self) -> usize {
        0
    }

    fn init(&mut self, _key: &[u8]) -> Result<(), SrtpError> {
        Ok(())
    }

    fn start(&mut self) -> Result<(), SrtpError> {
        Ok(())
    }

    fn update(&mut self, _buf: &[u8]) -> Result<(), SrtpError> {
        Ok(())
    }

    fn compute(&mut self, _extra: &[u8], _tag_out: &mut [u8]) -> Result<(), SrtpError> {
        Ok(())
    }
}
