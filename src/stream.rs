use std::cell::RefCell;
use std::rc::Rc;

use crate::crypto::aes_gcm::AEAD_SALT_LEN;
use crate::crypto::aes_icm::ICM_SALT_LEN;
use crate::crypto::{self, AuthHandle, CipherHandle, CipherTypeId};
use crate::error::SrtpError;
use crate::kdf::{Kdf, KdfLabel, KDF_KEY_LEN_128, KDF_KEY_LEN_256};
use crate::key_limit::{KeyLimit, MAX_KEY_USAGE};
use crate::policy::{Policy, SecurityServices};
use crate::replay::{Rdb, Rdbx};

/// Largest combined key the schedule ever materializes.
const MAX_SRTP_KEY_LEN: usize = 64;

/// Which role a stream has been pinned to. Once set to sender or receiver
/// it never flips; a use in the opposite role raises an SSRC-collision
/// event instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Unknown,
    Sender,
    Receiver,
}

/// Scratch space for derived key material, cleared even on early returns.
struct KeyBuf([u8; MAX_SRTP_KEY_LEN]);

impl KeyBuf {
    fn new() -> Self {
        KeyBuf([0u8; MAX_SRTP_KEY_LEN])
    }
}

impl Drop for KeyBuf {
    fn drop(&mut self) {
        self.0.fill(0);
    }
}

/// Per-SSRC protection state.
///
/// Streams cloned from a session template share the cipher, authenticator,
/// and key-limit objects with it; the replay databases, SSRC, and salts are
/// per-stream.
pub(crate) struct StreamCtx {
    pub rtp_cipher: CipherHandle,
    pub rtp_auth: AuthHandle,
    pub rtcp_cipher: CipherHandle,
    pub rtcp_auth: AuthHandle,
    pub limit: Rc<RefCell<KeyLimit>>,
    pub rtp_rdbx: Rdbx,
    pub rtcp_rdb: Rdb,
    /// Session salt for the RTP AEAD IV (also holds the leading 12 octets
    /// of the counter-mode salt; the cipher keeps its own full copy).
    pub salt: [u8; AEAD_SALT_LEN],
    /// Session salt for the RTCP AEAD IV.
    pub c_salt: [u8; AEAD_SALT_LEN],
    /// SSRC in host order.
    pub ssrc: u32,
    pub direction: Direction,
    pub rtp_services: SecurityServices,
    pub rtcp_services: SecurityServices,
    pub allow_repeat_tx: bool,
}

impl std::fmt::Debug for StreamCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCtx")
            .field("ssrc", &self.ssrc)
            .field("direction", &self.direction)
            .field("rtp_services", &self.rtp_services)
            .field("rtcp_services", &self.rtcp_services)
            .field("allow_repeat_tx", &self.allow_repeat_tx)
            .finish()
    }
}

impl StreamCtx {
    /// Builds a fully keyed stream from a policy: allocates the four
    /// primitives and the key limit, validates the replay window and
    /// `allow_repeat_tx`, then runs the key schedule.
    pub fn new(policy: &Policy, ssrc: u32) -> Result<Self, SrtpError> {
        let rtp_rdbx = if policy.window_size != 0 {
            Rdbx::new(policy.window_size)?
        } else {
            Rdbx::new(crate::replay::rdbx::DEFAULT_WINDOW_SIZE)?
        };

        // Guard against uninitialized memory: allow only 0 or 1 here.
        if policy.allow_repeat_tx > 1 {
            return Err(SrtpError::BadParam);
        }

        let rtp_cipher = crypto::alloc_cipher(
            policy.rtp.cipher_type,
            policy.rtp.cipher_key_len,
            policy.rtp.auth_tag_len,
        )?;
        let rtp_auth = crypto::alloc_auth(
            policy.rtp.auth_type,
            policy.rtp.auth_key_len,
            policy.rtp.auth_tag_len,
        )?;
        let rtcp_cipher = crypto::alloc_cipher(
            policy.rtcp.cipher_type,
            policy.rtcp.cipher_key_len,
            policy.rtcp.auth_tag_len,
        )?;
        let rtcp_auth = crypto::alloc_auth(
            policy.rtcp.auth_type,
            policy.rtcp.auth_key_len,
            policy.rtcp.auth_tag_len,
        )?;

        let mut stream = Self {
            rtp_cipher,
            rtp_auth,
            rtcp_cipher,
            rtcp_auth,
            limit: Rc::new(RefCell::new(KeyLimit::new(MAX_KEY_USAGE))),
            rtp_rdbx,
            rtcp_rdb: Rdb::new(),
            salt: [0u8; AEAD_SALT_LEN],
            c_salt: [0u8; AEAD_SALT_LEN],
            ssrc,
            direction: Direction::Unknown,
            rtp_services: policy.rtp.sec_serv,
            rtcp_services: policy.rtcp.sec_serv,
            allow_repeat_tx: policy.allow_repeat_tx == 1,
        };
        stream.init_keys(&policy.key)?;
        Ok(stream)
    }

    /// Clones a template for a newly sighted SSRC. The primitives and key
    /// limit are shared by reference; replay state is fresh and the salts
    /// are copied.
    pub fn clone_from_template(template: &StreamCtx, ssrc: u32) -> Result<Self, SrtpError> {
        Ok(Self {
            rtp_cipher: Rc::clone(&template.rtp_cipher),
            rtp_auth: Rc::clone(&template.rtp_auth),
            rtcp_cipher: Rc::clone(&template.rtcp_cipher),
            rtcp_auth: Rc::clone(&template.rtcp_auth),
            limit: Rc::clone(&template.limit),
            rtp_rdbx: Rdbx::new(template.rtp_rdbx.window_size())?,
            rtcp_rdb: Rdb::new(),
            salt: template.salt,
            c_salt: template.c_salt,
            ssrc,
            direction: template.direction,
            rtp_services: template.rtp_services,
            rtcp_services: template.rtcp_services,
            allow_repeat_tx: template.allow_repeat_tx,
        })
    }

    /// Whether the RTP data path must take the AEAD pipeline.
    pub fn is_aead(&self) -> bool {
        self.rtp_cipher.borrow().id().is_aead()
    }

    /// Runs the RFC 3711 key schedule: derives session keys, salts, and
    /// authentication keys for RTP and RTCP from the master key+salt and
    /// feeds them to the primitives.
    fn init_keys(&mut self, master: &[u8]) -> Result<(), SrtpError> {
        let rtp_key_len = self.rtp_cipher.borrow().key_len();
        let rtcp_key_len = self.rtcp_cipher.borrow().key_len();
        let rtp_base_len = base_key_length(self.rtp_cipher.borrow().id(), rtp_key_len);
        let rtp_salt_len = rtp_key_len - rtp_base_len;

        if master.len() < rtp_key_len {
            return Err(SrtpError::BadParam);
        }

        // AES-CTR is always used for the KDF; promote to a 256-bit PRF when
        // either packet class carries a longer combined key.
        let mut kdf_key_len = KDF_KEY_LEN_128;
        if rtp_key_len > kdf_key_len || rtcp_key_len > kdf_key_len {
            kdf_key_len = KDF_KEY_LEN_256;
        }

        // The AEAD master salt is 96 bits but the CTR-mode KDF wants 112;
        // the master key material is zero-appended to cover the gap.
        let mut master_padded = KeyBuf::new();
        master_padded.0[..rtp_key_len].copy_from_slice(&master[..rtp_key_len]);
        let kdf = Kdf::new(&master_padded.0[..kdf_key_len])?;

        let mut buf = KeyBuf::new();

        // RTP encryption key and salt.
        kdf.generate(KdfLabel::RtpEncryption, &mut buf.0[..rtp_base_len])
            .map_err(|_| SrtpError::InitFail)?;
        if rtp_salt_len > 0 {
            kdf.generate(
                KdfLabel::RtpSalt,
                &mut buf.0[rtp_base_len..rtp_base_len + rtp_salt_len],
            )
            .map_err(|_| SrtpError::InitFail)?;
            self.salt
                .copy_from_slice(&buf.0[rtp_base_len..rtp_base_len + AEAD_SALT_LEN]);
        }
        self.rtp_cipher
            .borrow_mut()
            .init(&buf.0[..rtp_base_len + rtp_salt_len])
            .map_err(|_| SrtpError::InitFail)?;

        // RTP authentication key.
        let rtp_auth_key_len = self.rtp_auth.borrow().key_len();
        kdf.generate(KdfLabel::RtpMsgAuth, &mut buf.0[..rtp_auth_key_len])
            .map_err(|_| SrtpError::InitFail)?;
        self.rtp_auth
            .borrow_mut()
            .init(&buf.0[..rtp_auth_key_len])
            .map_err(|_| SrtpError::InitFail)?;

        // RTCP encryption key and salt.
        let rtcp_base_len = base_key_length(self.rtcp_cipher.borrow().id(), rtcp_key_len);
        let rtcp_salt_len = rtcp_key_len - rtcp_base_len;
        kdf.generate(KdfLabel::RtcpEncryption, &mut buf.0[..rtcp_base_len])
            .map_err(|_| SrtpError::InitFail)?;
        if rtcp_salt_len > 0 {
            kdf.generate(
                KdfLabel::RtcpSalt,
                &mut buf.0[rtcp_base_len..rtcp_base_len + rtcp_salt_len],
            )
            .map_err(|_| SrtpError::InitFail)?;
            self.c_salt
                .copy_from_slice(&buf.0[rtcp_base_len..rtcp_base_len + AEAD_SALT_LEN]);
        }
        self.rtcp_cipher
            .borrow_mut()
            .init(&buf.0[..rtcp_base_len + rtcp_salt_len])
            .map_err(|_| SrtpError::InitFail)?;

        // RTCP authentication key.
        let rtcp_auth_key_len = self.rtcp_auth.borrow().key_len();
        kdf.generate(KdfLabel::RtcpMsgAuth, &mut buf.0[..rtcp_auth_key_len])
            .map_err(|_| SrtpError::InitFail)?;
        self.rtcp_auth
            .borrow_mut()
            .init(&buf.0[..rtcp_auth_key_len])
            .map_err(|_| SrtpError::InitFail)?;

        Ok(())
    }
}

/// Base (salt-less) key length for a combined key+salt policy length.
fn base_key_length(id: CipherTypeId, key_len: usize) -> usize {
    match id {
        CipherTypeId::AesIcm => key_len - ICM_SALT_LEN,
        CipherTypeId::Aes128Gcm => 16,
        CipherTypeId::Aes256Gcm => 32,
        CipherTypeId::Null => key_len,
    }
}

impl Drop for StreamCtx {
    fn drop(&mut self) {
        self.salt.fill(0);
        self.c_salt.fill(0);
    }
}
