use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes256};
use ctr::Ctr128BE;

use crate::error::SrtpError;

/// KDF key length when both combined key lengths fit AES-128 (16-byte
/// master key + 14-byte master salt).
pub const KDF_KEY_LEN_128: usize = 30;
/// KDF key length when either combined key length requires AES-256.
pub const KDF_KEY_LEN_256: usize = 46;

const KDF_SALT_LEN: usize = 14;

/// Key derivation labels from RFC 3711 section 4.3.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KdfLabel {
    RtpEncryption = 0x00,
    RtpMsgAuth = 0x01,
    RtpSalt = 0x02,
    RtcpEncryption = 0x03,
    RtcpMsgAuth = 0x04,
    RtcpSalt = 0x05,
}

/// The SRTP default key derivation function: AES counter mode as a PRF
/// keyed by the master key, with the master salt folded into the counter
/// block and a one-byte label XORed into octet 7.
///
/// Key material is zeroized when the KDF is dropped.
#[derive(Debug)]
pub struct Kdf {
    key: [u8; 32],
    base_key_len: usize,
    salt: [u8; 16],
}

impl Kdf {
    /// Creates a KDF from the master key immediately followed by the master
    /// salt. `key_with_salt` must be 30 octets (AES-128 PRF) or 46 octets
    /// (AES-256 PRF).
    pub fn new(key_with_salt: &[u8]) -> Result<Self, SrtpError> {
        let base_key_len = match key_with_salt.len() {
            KDF_KEY_LEN_128 => 16,
            KDF_KEY_LEN_256 => 32,
            _ => return Err(SrtpError::BadParam),
        };
        let mut key = [0u8; 32];
        key[..base_key_len].copy_from_slice(&key_with_salt[..base_key_len]);
        let mut salt = [0u8; 16];
        salt[..KDF_SALT_LEN]
            .copy_from_slice(&key_with_salt[base_key_len..base_key_len + KDF_SALT_LEN]);
        Ok(Self {
            key,
            base_key_len,
            salt,
        })
    }

    /// Fills `out` with the keystream for `label`.
    pub fn generate(&self, label: KdfLabel, out: &mut [u8]) -> Result<(), SrtpError> {
        // Counter block: the salt shifted into the high 14 octets, the label
        // XORed into octet 7, 16-bit block counter in the low octets.
        let mut counter = self.salt;
        counter[7] ^= label as u8;

        out.fill(0);
        let nonce = GenericArray::from_slice(&counter);
        match self.base_key_len {
            16 => Ctr128BE::<Aes128>::new(GenericArray::from_slice(&self.key[..16]), nonce)
                .apply_keystream(out),
            _ => Ctr128BE::<Aes256>::new(GenericArray::from_slice(&self.key[..32]), nonce)
                .apply_keystream(out),
        }
        Ok(())
    }
}

impl Drop for Kdf {
    fn drop(&mut self) {
        self.key.fill(0);
        self.salt.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 3711 appendix B.3 key derivation test vectors.
    const MASTER: [u8; 30] = [
        0xE1, 0xF9, 0x7A, 0x0D, 0x3E, 0x01, 0x8B, 0xE0, 0xD6, 0x4F, 0xA3, 0x2C, 0x06, 0xDE, 0x41,
        0x39, //
        0x0E, 0xC6, 0x75, 0xAD, 0x49, 0x8A, 0xFE, 0xEB, 0xB6, 0x96, 0x0B, 0x3A, 0xAB, 0xE6,
    ];

    #[test]
    fn rfc3711_cipher_key() {
        let kdf = Kdf::new(&MASTER).unwrap();
        let mut out = [0u8; 16];
        kdf.generate(KdfLabel::RtpEncryption, &mut out).unwrap();
        assert_eq!(
            out,
            [
                0xC6, 0x1E, 0x7A, 0x93, 0x74, 0x4F, 0x39, 0xEE, //
                0x10, 0x73, 0x4A, 0xFE, 0x3F, 0xF7, 0xA0, 0x87
            ]
        );
    }

    #[test]
    fn rfc3711_auth_key() {
        let kdf = Kdf::new(&MASTER).unwrap();
        let mut out = [0u8; 20];
        kdf.generate(KdfLabel::RtpMsgAuth, &mut out).unwrap();
        assert_eq!(
            out,
            [
                0xCE, 0xBE, 0x32, 0x1F, 0x6F, 0xF7, 0x71, 0x6B, //
                0x6F, 0xD4, 0xAB, 0x49, 0xAF, 0x25, 0x6A, 0x15, //
                0x6D, 0x38, 0xBA, 0xA4
            ]
        );
    }

    #[test]
    fn rfc3711_salt() {
        let kdf = Kdf::new(&MASTER).unwrap();
        let mut out = [0u8; 14];
        kdf.generate(KdfLabel::RtpSalt, &mut out).unwrap();
        assert_eq!(
            out,
            [
                0x30, 0xCB, 0xBC, 0x08, 0x86, 0x3D, 0x8C, //
                0x85, 0xD4, 0x9D, 0xB3, 0x4A, 0x9A, 0xE1
            ]
        );
    }

    #[test]
    fn labels_are_independent() {
        let kdf = Kdf::new(&MASTER).unwrap();
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        kdf.generate(KdfLabel::RtpEncryption, &mut a).unwrap();
        kdf.generate(KdfLabel::RtcpEncryption, &mut b).unwrap();
        assert!(a.iter().zip(b.iter()).all(|(x, y)| x != y));
    }

    #[test]
    fn rejects_odd_lengths() {
        assert_eq!(Kdf::new(&[0u8; 29]).unwrap_err(), SrtpError::BadParam);
        assert_eq!(Kdf::new(&[0u8; 44]).unwrap_err(), SrtpError::BadParam);
        assert!(Kdf::new(&[0u8; 46]).is_ok());
    }
}
