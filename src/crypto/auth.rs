use crate::error::SrtpError;

/// Identifies an authenticator implementation in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTypeId {
    HmacSha1,
    Null,
}

/// Uniform contract over the message authenticators.
///
/// An authenticator is keyed once per stream with `init` and then driven
/// once per packet: `start`, any number of `update` calls, then `compute`
/// which absorbs a final chunk and emits the (truncated) tag.
pub trait SrtpAuth {
    fn id(&self) -> AuthTypeId;

    fn key_len(&self) -> usize;

    /// Truncated tag length written by `compute`.
    fn tag_len(&self) -> usize;

    /// Keystream-prefix length a universal-hash authenticator consumes
    /// before the tag. Zero for HMAC and null.
    fn prefix_len(&self) -> usize {
        0
    }

    fn init(&mut self, key: &[u8]) -> Result<(), SrtpError>;

    /// Begins a fresh tag computation.
    fn start(&mut self) -> Result<(), SrtpError>;

    /// Absorbs `buf` into the running computation.
    fn update(&mut self, buf: &[u8]) -> Result<(), SrtpError>;

    /// Absorbs `extra`, finalizes, and writes `tag_len` octets into
    /// `tag_out`.
    fn compute(&mut self, extra: &[u8], tag_out: &mut [u8]) -> Result<(), SrtpError>;
}
