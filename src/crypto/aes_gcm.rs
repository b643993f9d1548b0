use aes::cipher::generic_array::typenum::{U12, U16};
use aes::cipher::generic_array::GenericArray;
use aes::{Aes128, Aes256};
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::AesGcm as GcmCore;

use crate::crypto::cipher::{CipherDirection, CipherTypeId, SrtpCipher};
use crate::error::SrtpError;

/// Salt length carried in the combined key for AEAD modes (96 bits).
pub const AEAD_SALT_LEN: usize = 12;
/// GCM nonce length (96 bits).
pub const GCM_IV_LEN: usize = 12;
/// GCM authentication tag length (RFC 7714 profiles carry the full tag).
pub const GCM_TAG_LEN: usize = 16;

/// Combined key+salt length for AES-128-GCM.
pub const AES_128_GCM_KEY_LEN_WSALT: usize = 16 + AEAD_SALT_LEN;
/// Combined key+salt length for AES-256-GCM.
pub const AES_256_GCM_KEY_LEN_WSALT: usize = 32 + AEAD_SALT_LEN;

enum GcmKeyed {
    Aes128(GcmCore<Aes128, U12, U16>),
    Aes256(GcmCore<Aes256, U12, U16>),
}

/// AEAD AES-GCM as used by SRTP (RFC 7714).
///
/// The per-packet sequence is `set_iv`, then `set_aad` one or more times
/// (calls accumulate), then `encrypt`/`get_tag` or `decrypt`. `decrypt`
/// expects the tag appended to the ciphertext and verifies it before any
/// plaintext is released.
pub struct AesGcm {
    id: CipherTypeId,
    key_len: usize,
    keyed: Option<GcmKeyed>,
    iv: [u8; GCM_IV_LEN],
    have_iv: bool,
    aad: Vec<u8>,
    tag: [u8; GCM_TAG_LEN],
}

impl std::fmt::Debug for AesGcm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcm")
            .field("id", &self.id)
            .field("key_len", &self.key_len)
            .field("keyed", &self.keyed.is_some())
            .field("have_iv", &self.have_iv)
            .finish()
    }
}

impl AesGcm {
    pub fn new(id: CipherTypeId, key_len: usize, tag_len: usize) -> Result<Self, SrtpError> {
        let expected = match id {
            CipherTypeId::Aes128Gcm => AES_128_GCM_KEY_LEN_WSALT,
            CipherTypeId::Aes256Gcm => AES_256_GCM_KEY_LEN_WSALT,
            _ => return Err(SrtpError::BadParam),
        };
        if key_len != expected || tag_len != GCM_TAG_LEN {
            return Err(SrtpError::BadParam);
        }
        Ok(Self {
            id,
            key_len,
            keyed: None,
            iv: [0u8; GCM_IV_LEN],
            have_iv: false,
            aad: Vec::new(),
            tag: [0u8; GCM_TAG_LEN],
        })
    }

    fn base_key_len(&self) -> usize {
        self.key_len - AEAD_SALT_LEN
    }
}

impl SrtpCipher for AesGcm {
    fn id(&self) -> CipherTypeId {
        self.id
    }

    fn key_len(&self) -> usize {
        self.key_len
    }

    fn tag_len(&self) -> usize {
        GCM_TAG_LEN
    }

    fn init(&mut self, key: &[u8]) -> Result<(), SrtpError> {
        let base = self.base_key_len();
        if key.len() < base {
            return Err(SrtpError::BadParam);
        }
        self.keyed = Some(match self.id {
            CipherTypeId::Aes128Gcm => {
                GcmKeyed::Aes128(GcmCore::new(GenericArray::from_slice(&key[..base])))
            }
            _ => GcmKeyed::Aes256(GcmCore::new(GenericArray::from_slice(&key[..base]))),
        });
        self.have_iv = false;
        Ok(())
    }

    fn set_iv(&mut self, iv: &[u8], _direction: CipherDirection) -> Result<(), SrtpError> {
        if self.keyed.is_none() || iv.len() != GCM_IV_LEN {
            return Err(SrtpError::BadParam);
        }
        self.iv.copy_from_slice(iv);
        self.have_iv = true;
        self.aad.clear();
        Ok(())
    }

    fn set_aad(&mut self, aad: &[u8]) -> Result<(), SrtpError> {
        if !self.have_iv {
            return Err(SrtpError::CipherFail);
        }
        self.aad.extend_from_slice(aad);
        Ok(())
    }

    fn encrypt(&mut self, buf: &mut [u8]) -> Result<(), SrtpError> {
        if !self.have_iv {
            return Err(SrtpError::CipherFail);
        }
        let keyed = self.keyed.as_ref().ok_or(SrtpError::CipherFail)?;
        let nonce = GenericArray::from_slice(&self.iv);
        let tag = match keyed {
            GcmKeyed::Aes128(c) => c
                .encrypt_in_place_detached(nonce, &self.aad, buf)
                .map_err(|_| SrtpError::CipherFail)?,
            GcmKeyed::Aes256(c) => c
                .encrypt_in_place_detached(nonce, &self.aad, buf)
                .map_err(|_| SrtpError::CipherFail)?,
        };
        self.tag.copy_from_slice(&tag);
        self.have_iv = false;
        Ok(())
    }

    fn decrypt(&mut self, buf: &mut [u8]) -> Result<usize, SrtpError> {
        if !self.have_iv {
            return Err(SrtpError::CipherFail);
        }
        if buf.len() < GCM_TAG_LEN {
            return Err(SrtpError::CipherFail);
        }
        let keyed = self.keyed.as_ref().ok_or(SrtpError::CipherFail)?;
        let nonce = GenericArray::from_slice(&self.iv);
        let ct_len = buf.len() - GCM_TAG_LEN;
        let (ct, tag) = buf.split_at_mut(ct_len);
        let result = match keyed {
            GcmKeyed::Aes128(c) => {
                c.decrypt_in_place_detached(nonce, &self.aad, ct, GenericArray::from_slice(tag))
            }
            GcmKeyed::Aes256(c) => {
                c.decrypt_in_place_detached(nonce, &self.aad, ct, GenericArray::from_slice(tag))
            }
        };
        self.have_iv = false;
        result.map_err(|_| SrtpError::AuthFail)?;
        Ok(ct_len)
    }

    fn output(&mut self, out: &mut [u8]) -> Result<(), SrtpError> {
        out.fill(0);
        self.encrypt(out)
    }

    fn get_tag(&mut self, out: &mut [u8]) -> Result<usize, SrtpError> {
        if out.len() < GCM_TAG_LEN {
            return Err(SrtpError::BadParam);
        }
        out[..GCM_TAG_LEN].copy_from_slice(&self.tag);
        Ok(GCM_TAG_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7714 section 16.1.1: session key, salted IV, AAD, and the
    // protected form of a 38-octet RTP payload.
    const KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, //
        0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    ];
    const IV: [u8; 12] = [
        0x51, 0x75, 0x3c, 0x65, 0x80, 0xc2, 0x72, 0x6f, 0x20, 0x71, 0x84, 0x14,
    ];
    const AAD: [u8; 12] = [
        0x80, 0x40, 0xf1, 0x7b, 0x80, 0x41, 0xf8, 0xd3, 0x55, 0x01, 0xa0, 0xb2,
    ];
    const PLAINTEXT: &[u8] = &[
        0x47, 0x61, 0x6c, 0x6c, 0x69, 0x61, 0x20, 0x65, 0x73, 0x74, 0x20, 0x6f, 0x6d, 0x6e, 0x69,
        0x73, 0x20, 0x64, 0x69, 0x76, 0x69, 0x73, 0x61, 0x20, 0x69, 0x6e, 0x20, 0x70, 0x61, 0x72,
        0x74, 0x65, 0x73, 0x20, 0x74, 0x72, 0x65, 0x73,
    ];
    const CIPHERTEXT_AND_TAG: &[u8] = &[
        0xf2, 0x4d, 0xe3, 0xa3, 0xfb, 0x34, 0xde, 0x6c, 0xac, 0xba, 0x86, 0x1c, 0x9d, 0x7e, 0x4b,
        0xca, 0xbe, 0x63, 0x3b, 0xd5, 0x0d, 0x29, 0x4e, 0x6f, 0x42, 0xa5, 0xf4, 0x7a, 0x51, 0xc7,
        0xd1, 0x9b, 0x36, 0xde, 0x3a, 0xdf, 0x88, 0x33, 0x89, 0x9d, 0x7f, 0x27, 0xbe, 0xb1, 0x6a,
        0x91, 0x52, 0xcf, 0x76, 0x5e, 0xe4, 0x39, 0x0c, 0xce,
    ];

    fn keyed_cipher() -> AesGcm {
        let mut cipher =
            AesGcm::new(CipherTypeId::Aes128Gcm, AES_128_GCM_KEY_LEN_WSALT, 16).unwrap();
        let mut combined = [0u8; AES_128_GCM_KEY_LEN_WSALT];
        combined[..16].copy_from_slice(&KEY);
        cipher.init(&combined).unwrap();
        cipher
    }

    #[test]
    fn rfc7714_encrypt() {
        let mut cipher = keyed_cipher();
        cipher.set_iv(&IV, CipherDirection::Encrypt).unwrap();
        cipher.set_aad(&AAD).unwrap();

        let mut buf = PLAINTEXT.to_vec();
        cipher.encrypt(&mut buf).unwrap();
        let mut tag = [0u8; 16];
        assert_eq!(cipher.get_tag(&mut tag).unwrap(), 16);
        buf.extend_from_slice(&tag);
        assert_eq!(buf, CIPHERTEXT_AND_TAG);
    }

    #[test]
    fn rfc7714_decrypt() {
        let mut cipher = keyed_cipher();
        cipher.set_iv(&IV, CipherDirection::Decrypt).unwrap();
        cipher.set_aad(&AAD).unwrap();

        let mut buf = CIPHERTEXT_AND_TAG.to_vec();
        let len = cipher.decrypt(&mut buf).unwrap();
        assert_eq!(&buf[..len], PLAINTEXT);
    }

    #[test]
    fn tampered_tag_rejected() {
        let mut cipher = keyed_cipher();
        cipher.set_iv(&IV, CipherDirection::Decrypt).unwrap();
        cipher.set_aad(&AAD).unwrap();

        let mut buf = CIPHERTEXT_AND_TAG.to_vec();
        let last = buf.len() - 1;
        buf[last] ^= 0x01;
        assert_eq!(cipher.decrypt(&mut buf), Err(SrtpError::AuthFail));
    }

    #[test]
    fn tampered_aad_rejected() {
        let mut cipher = keyed_cipher();
        cipher.set_iv(&IV, CipherDirection::Decrypt).unwrap();
        let mut aad = AAD;
        aad[3] ^= 0xff;
        cipher.set_aad(&aad).unwrap();

        let mut buf = CIPHERTEXT_AND_TAG.to_vec();
        assert_eq!(cipher.decrypt(&mut buf), Err(SrtpError::AuthFail));
    }

    #[test]
    fn rejects_odd_tag_length() {
        assert_eq!(
            AesGcm::new(CipherTypeId::Aes128Gcm, AES_128_GCM_KEY_LEN_WSALT, 8).unwrap_err(),
            SrtpError::BadParam
        );
    }
}
