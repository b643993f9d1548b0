use crate::error::SrtpError;

/// Identifies a cipher implementation in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherTypeId {
    /// AES in integer counter mode; 128/192/256-bit keys selected by the
    /// combined key+salt length (30, 38, or 46 octets).
    AesIcm,
    /// AEAD AES-128-GCM.
    Aes128Gcm,
    /// AEAD AES-256-GCM.
    Aes256Gcm,
    /// Identity transform.
    Null,
}

impl CipherTypeId {
    /// Whether this cipher provides integrity itself (AEAD).
    pub fn is_aead(&self) -> bool {
        matches!(self, CipherTypeId::Aes128Gcm | CipherTypeId::Aes256Gcm)
    }
}

/// Direction of the pending cipher operation, set alongside the IV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherDirection {
    Encrypt,
    Decrypt,
}

/// Uniform contract over the packet ciphers.
///
/// A cipher is keyed once per stream with `init` and then driven once per
/// packet: `set_iv` (which also resets any per-packet AAD/tag state),
/// optionally `set_aad` for AEAD modes, then one of the data operations.
pub trait SrtpCipher {
    fn id(&self) -> CipherTypeId;

    /// Combined cipher-key-plus-salt length this instance was allocated with.
    fn key_len(&self) -> usize;

    /// AEAD tag length; zero for non-AEAD ciphers.
    fn tag_len(&self) -> usize;

    /// Keys the cipher. `key` holds the session key followed by the session
    /// salt, `key_len` octets in total.
    fn init(&mut self, key: &[u8]) -> Result<(), SrtpError>;

    /// Sets the per-packet IV (16 octets for counter mode, 12 for GCM) and
    /// the operation direction.
    fn set_iv(&mut self, iv: &[u8], direction: CipherDirection) -> Result<(), SrtpError>;

    /// Appends additional authenticated data. No-op for non-AEAD ciphers.
    fn set_aad(&mut self, _aad: &[u8]) -> Result<(), SrtpError> {
        Ok(())
    }

    /// Encrypts `buf` in place. For AEAD ciphers the tag is retained
    /// internally and fetched with `get_tag`.
    fn encrypt(&mut self, buf: &mut [u8]) -> Result<(), SrtpError>;

    /// Decrypts `buf` in place and returns the plaintext length. For AEAD
    /// ciphers `buf` carries ciphertext followed by the tag, and the tag is
    /// verified before any plaintext is released.
    fn decrypt(&mut self, buf: &mut [u8]) -> Result<usize, SrtpError>;

    /// Writes raw keystream into `out` (used for MAC keystream prefixes).
    fn output(&mut self, out: &mut [u8]) -> Result<(), SrtpError>;

    /// Copies the pending AEAD tag into `out` and returns its length.
    fn get_tag(&mut self, _out: &mut [u8]) -> Result<usize, SrtpError> {
        Err(SrtpError::CipherFail)
    }
}
