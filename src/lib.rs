//! rustysrtp is an SRTP/SRTCP protection engine implementing RFC 3711 and
//! the AES-GCM extensions for SRTP (RFC 7714).
//!
//! Given a per-session [`policy::Policy`] (ciphers, authenticators, master
//! key, security services) and a raw RTP or RTCP packet, a [`session::Session`]
//! transforms the packet in place into its protected form on the sending
//! side, and validates and recovers the original on the receiving side.
//!
//! The engine is not internally concurrent: a session and its streams form
//! a single-writer data structure, and callers must serialize all calls on
//! a given session. Distinct sessions are independent.

/// Cipher and message-authentication primitives and their registry.
pub mod crypto;
/// The status codes returned by every fallible engine operation.
pub mod error;
/// Out-of-band events reported from the data path (SSRC collisions, key limits).
pub mod events;
/// Key derivation from the master key and salt (RFC 3711 section 4.3).
pub mod kdf;
/// Key-usage accounting with soft and hard limits.
pub mod key_limit;
/// Logging utilities for the engine.
pub mod log;
/// RTP and RTCP packet framing: header validation and region offsets.
pub mod packet;
/// Security policies, crypto-suite presets, and DTLS-SRTP profile mapping.
pub mod policy;
/// Replay protection databases for RTP and RTCP.
pub mod replay;
/// SRTP sessions: the stream registry and the protect/unprotect pipelines.
pub mod session;
/// Per-SSRC stream state: ciphers, keys, replay databases, direction.
pub mod stream;

pub use error::SrtpError;
pub use events::{EventData, SrtpEvent};
pub use policy::{CryptoPolicy, Policy, SecurityServices, SrtpProfile, Ssrc};
pub use session::Session;

/// Initializes the process-wide cipher/authenticator registry.
///
/// The registry is statically dispatched, so this is a compatibility hook;
/// it never fails.
pub fn init() -> Result<(), SrtpError> {
    crypto::kernel_init()
}

/// Tears down the process-wide cipher/authenticator registry.
pub fn shutdown() -> Result<(), SrtpError> {
    crypto::kernel_shutdown()
}

/// Returns the library version encoded as `major << 24 | minor << 16 | micro`.
pub fn get_version() -> u32 {
    let mut parts = env!("CARGO_PKG_VERSION")
        .split('.')
        .map(|p| p.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let micro = parts.next().unwrap_or(0);
    ((major & 0xff) << 24) | ((minor & 0xff) << 16) | (micro & 0xff)
}

/// Returns the library version as a string.
pub fn get_version_string() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
