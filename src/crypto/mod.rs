pub mod aes_gcm;
pub mod aes_icm;
pub mod auth;
pub mod cipher;
pub mod hmac_sha1;
pub mod null_auth;
pub mod null_cipher;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SrtpError;

pub use auth::{AuthTypeId, SrtpAuth};
pub use cipher::{CipherDirection, CipherTypeId, SrtpCipher};

/// Shared handle to a cipher instance.
///
/// Streams cloned from a session template share the template's primitives
/// by reference; the handles keep them alive until the last stream drops.
pub type CipherHandle = Rc<RefCell<dyn SrtpCipher>>;
/// Shared handle to an authenticator instance.
pub type AuthHandle = Rc<RefCell<dyn SrtpAuth>>;

/// Instantiates a cipher for the given identifier.
///
/// `key_len` is the combined cipher-key-plus-salt length from the policy;
/// `tag_len` is only meaningful for AEAD ciphers.
pub fn alloc_cipher(
    id: CipherTypeId,
    key_len: usize,
    tag_len: usize,
) -> Result<CipherHandle, SrtpError> {
    match id {
        CipherTypeId::AesIcm => Ok(Rc::new(RefCell::new(aes_icm::AesIcm::new(key_len)?))),
        CipherTypeId::Aes128Gcm | CipherTypeId::Aes256Gcm => Ok(Rc::new(RefCell::new(
            aes_gcm::AesGcm::new(id, key_len, tag_len)?,
        ))),
        CipherTypeId::Null => Ok(Rc::new(RefCell::new(null_cipher::NullCipher::new()))),
    }
}

/// Instantiates an authenticator for the given identifier.
pub fn alloc_auth(id: AuthTypeId, key_len: usize, tag_len: usize) -> Result<AuthHandle, SrtpError> {
    match id {
        AuthTypeId::HmacSha1 => Ok(Rc::new(RefCell::new(hmac_sha1::HmacSha1Auth::new(
            key_len, tag_len,
        )?))),
        AuthTypeId::Null => Ok(Rc::new(RefCell::new(null_auth::NullAuth::new()))),
    }
}

/// Process-wide registry setup. The registry is statically dispatched, so
/// there is nothing to load; kept for API parity with `shutdown`.
pub fn kernel_init() -> Result<(), SrtpError> {
    Ok(())
}

/// Process-wide registry teardown.
pub fn kernel_shutdown() -> Result<(), SrtpError> {
    Ok(())
}

/// Constant-time comparison to avoid timing attacks.
///
/// Returns `true` iff the two slices are equal. Note the sense: classic C
/// implementations return non-zero on *difference*; every call site here is
/// written against the boolean-equality convention.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"0123456789", b"0123456789"));
        assert!(!constant_time_eq(b"0123456789", b"0123456788"));
        assert!(!constant_time_eq(b"012345678", b"0123456789"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn alloc_cipher_rejects_bad_key_len() {
        assert!(alloc_cipher(CipherTypeId::AesIcm, 29, 0).is_err());
        assert!(alloc_cipher(CipherTypeId::AesIcm, 30, 0).is_ok());
        assert!(alloc_cipher(CipherTypeId::AesIcm, 38, 0).is_ok());
        assert!(alloc_cipher(CipherTypeId::AesIcm, 46, 0).is_ok());
        assert!(alloc_cipher(CipherTypeId::Aes128Gcm, 28, 16).is_ok());
        assert!(alloc_cipher(CipherTypeId::Aes128Gcm, 44, 16).is_err());
        assert!(alloc_cipher(CipherTypeId::Aes256Gcm, 44, 16).is_ok());
        assert!(alloc_cipher(CipherTypeId::Aes256Gcm, 44, 8).is_err());
    }
}
