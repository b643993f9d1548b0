use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::crypto::auth::{AuthTypeId, SrtpAuth};
use crate::error::SrtpError;

type HmacSha1 = Hmac<Sha1>;

/// SHA-1 digest length; SRTP auth keys are always full-length.
pub const SHA1_OUTPUT_LEN: usize = 20;

/// HMAC-SHA1 per RFC 3711, truncated to the policy's tag length.
pub struct HmacSha1Auth {
    key: [u8; SHA1_OUTPUT_LEN],
    keyed: bool,
    tag_len: usize,
    state: Option<HmacSha1>,
}

impl HmacSha1Auth {
    pub fn new(key_len: usize, tag_len: usize) -> Result<Self, SrtpError> {
        if key_len != SHA1_OUTPUT_LEN || tag_len == 0 || tag_len > SHA1_OUTPUT_LEN {
            return Err(SrtpError::BadParam);
        }
        Ok(Self {
            key: [0u8; SHA1_OUTPUT_LEN],
            keyed: false,
            tag_len,
            state: None,
        })
    }
}

impl SrtpAuth for HmacSha1Auth {
    fn id(&self) -> AuthTypeId {
        AuthTypeId::HmacSha1
    }

    fn key_len(&self) -> usize {
        SHA1_OUTPUT_LEN
    }

    fn tag_len(&self) -> usize {
        self.tag_len
    }

    fn init(&mut self, key: &[u8]) -> Result<(), SrtpError> {
        if key.len() < SHA1_OUTPUT_LEN {
            return Err(SrtpError::BadParam);
        }
        self.key.copy_from_slice(&key[..SHA1_OUTPUT_LEN]);
        self.keyed = true;
        self.state = None;
        Ok(())
    }

    fn start(&mut self) -> Result<(), SrtpError> {
        if !self.keyed {
            return Err(SrtpError::InitFail);
        }
        self.state =
            Some(HmacSha1::new_from_slice(&self.key).map_err(|_| SrtpError::InitFail)?);
        Ok(())
    }

    fn update(&mut self, buf: &[u8]) -> Result<(), SrtpError> {
        let mac = self.state.as_mut().ok_or(SrtpError::AuthFail)?;
        mac.update(buf);
        Ok(())
    }

    fn compute(&mut self, extra: &[u8], tag_out: &mut [u8]) -> Result<(), SrtpError> {
        if tag_out.len() < self.tag_len {
            return Err(SrtpError::BadParam);
        }
        let mut mac = self.state.take().ok_or(SrtpError::AuthFail)?;
        mac.update(extra);
        let digest = mac.finalize().into_bytes();
        tag_out[..self.tag_len].copy_from_slice(&digest[..self.tag_len]);
        Ok(())
    }
}

impl Drop for HmacSha1Auth {
    fn drop(&mut self) {
        self.key.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 2202 test case 2: key "Jefe" padded is not 20 bytes, so use test
    // case 1 (20 x 0x0b, data "Hi There").
    #[test]
    fn rfc2202_case_1() {
        let mut auth = HmacSha1Auth::new(20, 20).unwrap();
        auth.init(&[0x0b; 20]).unwrap();
        auth.start().unwrap();
        auth.update(b"Hi ").unwrap();
        let mut tag = [0u8; 20];
        auth.compute(b"There", &mut tag).unwrap();
        assert_eq!(
            tag,
            [
                0xb6, 0x17, 0x31, 0x86, 0x55, 0x05, 0x72, 0x64, 0xe2, 0x8b, //
                0xc0, 0xb6, 0xfb, 0x37, 0x8c, 0x8e, 0xf1, 0x46, 0xbe, 0x00,
            ]
        );
    }

    #[test]
    fn truncated_tag() {
        let mut auth = HmacSha1Auth::new(20, 10).unwrap();
        auth.init(&[0x0b; 20]).unwrap();
        auth.start().unwrap();
        let mut tag = [0u8; 10];
        auth.compute(b"Hi There", &mut tag).unwrap();
        assert_eq!(
            tag,
            [0xb6, 0x17, 0x31, 0x86, 0x55, 0x05, 0x72, 0x64, 0xe2, 0x8b]
        );
    }

    #[test]
    fn compute_requires_start() {
        let mut auth = HmacSha1Auth::new(20, 10).unwrap();
        auth.init(&[0u8; 20]).unwrap();
        let mut tag = [0u8; 10];
        assert_eq!(auth.compute(b"", &mut tag), Err(SrtpError::AuthFail));
    }
}
