use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes192, Aes256};
use ctr::Ctr128BE;

use crate::crypto::cipher::{CipherDirection, CipherTypeId, SrtpCipher};
use crate::error::SrtpError;

type Aes128Ctr = Ctr128BE<Aes128>;
type Aes192Ctr = Ctr128BE<Aes192>;
type Aes256Ctr = Ctr128BE<Aes256>;

/// Salt length carried in the combined key for counter mode (112 bits).
pub const ICM_SALT_LEN: usize = 14;

enum IcmKeystream {
    Aes128(Aes128Ctr),
    Aes192(Aes192Ctr),
    Aes256(Aes256Ctr),
}

impl IcmKeystream {
    fn apply(&mut self, buf: &mut [u8]) {
        match self {
            IcmKeystream::Aes128(c) => c.apply_keystream(buf),
            IcmKeystream::Aes192(c) => c.apply_keystream(buf),
            IcmKeystream::Aes256(c) => c.apply_keystream(buf),
        }
    }
}

/// AES integer counter mode as used by SRTP (RFC 3711 section 4.1.1).
///
/// The combined key holds the AES key followed by a 112-bit salt. The
/// per-packet counter block is the salt (left-aligned in a zero block)
/// XORed with the nonce supplied via `set_iv`; the low 16 bits count
/// keystream blocks within the packet.
pub struct AesIcm {
    key_len: usize,
    key: [u8; 32],
    salt: [u8; 16],
    keyed: bool,
    keystream: Option<IcmKeystream>,
}

impl AesIcm {
    pub fn new(key_len: usize) -> Result<Self, SrtpError> {
        if !matches!(key_len, 30 | 38 | 46) {
            return Err(SrtpError::BadParam);
        }
        Ok(Self {
            key_len,
            key: [0u8; 32],
            salt: [0u8; 16],
            keyed: false,
            keystream: None,
        })
    }

    fn base_key_len(&self) -> usize {
        self.key_len - ICM_SALT_LEN
    }
}

impl SrtpCipher for AesIcm {
    fn id(&self) -> CipherTypeId {
        CipherTypeId::AesIcm
    }

    fn key_len(&self) -> usize {
        self.key_len
    }

    fn tag_len(&self) -> usize {
        0
    }

    fn init(&mut self, key: &[u8]) -> Result<(), SrtpError> {
        if key.len() < self.key_len {
            return Err(SrtpError::BadParam);
        }
        let base = self.base_key_len();
        self.key[..base].copy_from_slice(&key[..base]);
        self.salt = [0u8; 16];
        self.salt[..ICM_SALT_LEN].copy_from_slice(&key[base..base + ICM_SALT_LEN]);
        self.keyed = true;
        self.keystream = None;
        Ok(())
    }

    fn set_iv(&mut self, iv: &[u8], _direction: CipherDirection) -> Result<(), SrtpError> {
        if !self.keyed || iv.len() != 16 {
            return Err(SrtpError::BadParam);
        }
        let mut counter = [0u8; 16];
        for (c, (s, n)) in counter.iter_mut().zip(self.salt.iter().zip(iv.iter())) {
            *c = s ^ n;
        }
        let nonce = GenericArray::from_slice(&counter);
        self.keystream = Some(match self.base_key_len() {
            16 => IcmKeystream::Aes128(Aes128Ctr::new(
                GenericArray::from_slice(&self.key[..16]),
                nonce,
            )),
            24 => IcmKeystream::Aes192(Aes192Ctr::new(
                GenericArray::from_slice(&self.key[..24]),
                nonce,
            )),
            _ => IcmKeystream::Aes256(Aes256Ctr::new(
                GenericArray::from_slice(&self.key[..32]),
                nonce,
            )),
        });
        Ok(())
    }

    fn encrypt(&mut self, buf: &mut [u8]) -> Result<(), SrtpError> {
        let ks = self.keystream.as_mut().ok_or(SrtpError::CipherFail)?;
        ks.apply(buf);
        Ok(())
    }

    fn decrypt(&mut self, buf: &mut [u8]) -> Result<usize, SrtpError> {
        self.encrypt(buf)?;
        Ok(buf.len())
    }

    fn output(&mut self, out: &mut [u8]) -> Result<(), SrtpError> {
        out.fill(0);
        self.encrypt(out)
    }
}

impl Drop for AesIcm {
    fn drop(&mut self) {
        self.key.fill(0);
        self.salt.fill(0);
    }
}
