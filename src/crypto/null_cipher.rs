use crate::crypto::cipher::{CipherDirection, CipherTypeId, SrtpCipher};
use crate::error::SrtpError;

/// Identity cipher for authentication-only policies.
pub struct NullCipher;

impl NullCipher {
    pub fn new() -> Self {
        NullCipher
    }
}

impl Default for NullCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl SrtpCipher for NullCipher {
    fn id(&self) -> CipherTypeId {
        CipherTypeId::Null
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

    fn set_iv(&mut self, _iv: &[u8], _direction: CipherDirection) -> Result<(), SrtpError> {
        Ok(())
    }

    fn encrypt(&mut self, _buf: &mut [u8]) -> Result<(), SrtpError> {
        Ok(())
    }

    fn decrypt(&mut self, buf: &mut [u8]) -> Result<usize, SrtpError> {
        Ok(buf.len())
    }

    fn output(&mut self, out: &mut [u8]) -> Result<(), SrtpError> {
        out.fill(0);
        Ok(())
    }
}
