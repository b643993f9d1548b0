use crate::crypto::aes_gcm::{AES_128_GCM_KEY_LEN_WSALT, AES_256_GCM_KEY_LEN_WSALT};
use crate::crypto::{AuthTypeId, CipherTypeId};
use crate::error::SrtpError;

/// Which protections a policy applies to a packet class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityServices {
    pub confidentiality: bool,
    pub authentication: bool,
}

impl SecurityServices {
    pub const NONE: Self = Self {
        confidentiality: false,
        authentication: false,
    };
    pub const CONF: Self = Self {
        confidentiality: true,
        authentication: false,
    };
    pub const AUTH: Self = Self {
        confidentiality: false,
        authentication: true,
    };
    pub const CONF_AND_AUTH: Self = Self {
        confidentiality: true,
        authentication: true,
    };
}

/// Crypto suite for one packet class (RTP or RTCP).
///
/// `cipher_key_len` is the *combined* cipher-key-plus-salt length, as on
/// the wire protocols: 30/38/46 for AES-CM, 28/44 for AES-GCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoPolicy {
    pub cipher_type: CipherTypeId,
    pub cipher_key_len: usize,
    pub auth_type: AuthTypeId,
    pub auth_key_len: usize,
    pub auth_tag_len: usize,
    pub sec_serv: SecurityServices,
}

impl CryptoPolicy {
    /// The default RTP protection per RFC 3711: AES-128-CM with
    /// HMAC-SHA1-80.
    pub fn rtp_default() -> Self {
        Self::aes_cm_128_hmac_sha1_80()
    }

    /// The default RTCP protection per RFC 3711.
    pub fn rtcp_default() -> Self {
        Self::aes_cm_128_hmac_sha1_80()
    }

    pub fn aes_cm_128_hmac_sha1_80() -> Self {
        Self {
            cipher_type: CipherTypeId::AesIcm,
            cipher_key_len: 30,
            auth_type: AuthTypeId::HmacSha1,
            auth_key_len: 20,
            auth_tag_len: 10,
            sec_serv: SecurityServices::CONF_AND_AUTH,
        }
    }

    /// Short-tag variant from RFC 4568. Intended for RTP, not RTCP.
    pub fn aes_cm_128_hmac_sha1_32() -> Self {
        Self {
            auth_tag_len: 4,
            ..Self::aes_cm_128_hmac_sha1_80()
        }
    }

    /// Encryption-only variant from RFC 4568. Intended for RTP, not RTCP.
    pub fn aes_cm_128_null_auth() -> Self {
        Self {
            auth_type: AuthTypeId::Null,
            auth_key_len: 0,
            auth_tag_len: 0,
            sec_serv: SecurityServices::CONF,
            ..Self::aes_cm_128_hmac_sha1_80()
        }
    }

    pub fn null_cipher_hmac_sha1_80() -> Self {
        Self {
            cipher_type: CipherTypeId::Null,
            cipher_key_len: 0,
            auth_type: AuthTypeId::HmacSha1,
            auth_key_len: 20,
            auth_tag_len: 10,
            sec_serv: SecurityServices::AUTH,
        }
    }

    /// No protection at all. Should only be used for testing.
    pub fn null_cipher_hmac_null() -> Self {
        Self {
            cipher_type: CipherTypeId::Null,
            cipher_key_len: 0,
            auth_type: AuthTypeId::Null,
            auth_key_len: 0,
            auth_tag_len: 0,
            sec_serv: SecurityServices::NONE,
        }
    }

    pub fn aes_cm_256_hmac_sha1_80() -> Self {
        Self {
            cipher_key_len: 46,
            ..Self::aes_cm_128_hmac_sha1_80()
        }
    }

    /// Intended for RTP, not RTCP.
    pub fn aes_cm_256_hmac_sha1_32() -> Self {
        Self {
            auth_tag_len: 4,
            ..Self::aes_cm_256_hmac_sha1_80()
        }
    }

    pub fn aes_cm_256_null_auth() -> Self {
        Self {
            cipher_key_len: 46,
            ..Self::aes_cm_128_null_auth()
        }
    }

    /// AES-128-GCM (RFC 7714). GCM provides the authentication, so the
    /// separate authenticator is null.
    pub fn aes_gcm_128_16() -> Self {
        Self {
            cipher_type: CipherTypeId::Aes128Gcm,
            cipher_key_len: AES_128_GCM_KEY_LEN_WSALT,
            auth_type: AuthTypeId::Null,
            auth_key_len: 0,
            auth_tag_len: 16,
            sec_serv: SecurityServices::CONF_AND_AUTH,
        }
    }

    /// AES-256-GCM (RFC 7714).
    pub fn aes_gcm_256_16() -> Self {
        Self {
            cipher_type: CipherTypeId::Aes256Gcm,
            cipher_key_len: AES_256_GCM_KEY_LEN_WSALT,
            ..Self::aes_gcm_128_16()
        }
    }

    /// AES-128-GCM with authentication but no encryption. The service
    /// choice only takes effect for RTCP.
    pub fn aes_gcm_128_16_only_auth() -> Self {
        Self {
            sec_serv: SecurityServices::AUTH,
            ..Self::aes_gcm_128_16()
        }
    }

    /// AES-256-GCM with authentication but no encryption.
    pub fn aes_gcm_256_16_only_auth() -> Self {
        Self {
            sec_serv: SecurityServices::AUTH,
            ..Self::aes_gcm_256_16()
        }
    }
}

/// Named DTLS-SRTP protection profiles (RFC 5764).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtpProfile {
    Aes128CmSha1_80,
    Aes128CmSha1_32,
    NullSha1_80,
    NullSha1_32,
    Aes256CmSha1_80,
    Aes256CmSha1_32,
}

impl SrtpProfile {
    /// Maps the profile to an RTP crypto policy.
    pub fn crypto_policy_for_rtp(&self) -> Result<CryptoPolicy, SrtpError> {
        match self {
            SrtpProfile::Aes128CmSha1_80 => Ok(CryptoPolicy::aes_cm_128_hmac_sha1_80()),
            SrtpProfile::Aes128CmSha1_32 => Ok(CryptoPolicy::aes_cm_128_hmac_sha1_32()),
            SrtpProfile::NullSha1_80 => Ok(CryptoPolicy::null_cipher_hmac_sha1_80()),
            SrtpProfile::Aes256CmSha1_80 => Ok(CryptoPolicy::aes_cm_256_hmac_sha1_80()),
            SrtpProfile::Aes256CmSha1_32 => Ok(CryptoPolicy::aes_cm_256_hmac_sha1_32()),
            SrtpProfile::NullSha1_32 => Err(SrtpError::BadParam),
        }
    }

    /// Maps the profile to an RTCP crypto policy. 32-bit tag requests are
    /// upgraded to 80-bit tags, since short tags on RTCP are not compliant
    /// with RFC 3711.
    pub fn crypto_policy_for_rtcp(&self) -> Result<CryptoPolicy, SrtpError> {
        match self {
            SrtpProfile::Aes128CmSha1_80 | SrtpProfile::Aes128CmSha1_32 => {
                Ok(CryptoPolicy::aes_cm_128_hmac_sha1_80())
            }
            SrtpProfile::NullSha1_80 => Ok(CryptoPolicy::null_cipher_hmac_sha1_80()),
            SrtpProfile::Aes256CmSha1_80 | SrtpProfile::Aes256CmSha1_32 => {
                Ok(CryptoPolicy::aes_cm_256_hmac_sha1_80())
            }
            SrtpProfile::NullSha1_32 => Err(SrtpError::BadParam),
        }
    }

    /// Master key length in octets, excluding the salt.
    pub fn master_key_length(&self) -> Result<usize, SrtpError> {
        match self {
            SrtpProfile::Aes128CmSha1_80
            | SrtpProfile::Aes128CmSha1_32
            | SrtpProfile::NullSha1_80 => Ok(16),
            SrtpProfile::Aes256CmSha1_80 | SrtpProfile::Aes256CmSha1_32 => Ok(32),
            SrtpProfile::NullSha1_32 => Err(SrtpError::BadParam),
        }
    }

    /// Master salt length in octets.
    pub fn master_salt_length(&self) -> Result<usize, SrtpError> {
        match self {
            SrtpProfile::NullSha1_32 => Err(SrtpError::BadParam),
            _ => Ok(14),
        }
    }
}

/// Joins a master key and master salt into the combined layout the policy
/// `key` field expects.
pub fn append_salt_to_key(key: &[u8], salt: &[u8]) -> Vec<u8> {
    let mut combined = Vec::with_capacity(key.len() + salt.len());
    combined.extend_from_slice(key);
    combined.extend_from_slice(salt);
    combined
}

/// How a policy binds to SSRCs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ssrc {
    /// Not a valid binding; `add_stream` rejects it.
    Undefined,
    /// A concrete SSRC, in host order.
    Specific(u32),
    /// Template matching any SSRC seen on the receive path.
    AnyInbound,
    /// Template matching any SSRC used on the send path.
    AnyOutbound,
}

/// Per-stream protection policy.
#[derive(Debug, Clone)]
pub struct Policy {
    pub ssrc: Ssrc,
    pub rtp: CryptoPolicy,
    pub rtcp: CryptoPolicy,
    /// Master key immediately followed by the master salt.
    pub key: Vec<u8>,
    /// Replay window size in packets; 0 selects the default of 128.
    pub window_size: usize,
    /// Whether retransmission of an already-sent index is tolerated.
    /// Only 0 and 1 are accepted.
    pub allow_repeat_tx: u8,
}

impl Policy {
    /// A policy with default RTP/RTCP protection for the given binding.
    pub fn new(ssrc: Ssrc, key: Vec<u8>) -> Self {
        Self {
            ssrc,
            rtp: CryptoPolicy::rtp_default(),
            rtcp: CryptoPolicy::rtcp_default(),
            key,
            window_size: 0,
            allow_repeat_tx: 0,
        }
    }
}
