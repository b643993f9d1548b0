use std::fmt;

/// Status codes returned by the engine.
///
/// These are stable across the API: the data path returns the first error
/// eagerly, and callers can match on the variant to distinguish replay
/// conditions from authentication failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtpError {
    /// An argument or packet field was out of range or inconsistent.
    BadParam,
    /// A resource could not be allocated.
    AllocFail,
    /// Key schedule or primitive initialization failed.
    InitFail,
    /// No stream matched the packet's SSRC and no template exists.
    NoCtx,
    /// The packet index was already seen inside the replay window.
    ReplayFail,
    /// The packet index is older than the replay window.
    ReplayOld,
    /// The key-usage hard limit has been reached.
    KeyExpired,
    /// Authentication tag mismatch.
    AuthFail,
    /// A cipher primitive signaled failure.
    CipherFail,
    /// The packet header is self-inconsistent.
    ParseErr,
    /// The SRTCP E-bit does not match the configured security services.
    CantCheck,
}

impl fmt::Display for SrtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SrtpError::*;
        match self {
            BadParam => write!(f, "bad parameter"),
            AllocFail => write!(f, "allocation failed"),
            InitFail => write!(f, "initialization failed"),
            NoCtx => write!(f, "no matching stream context"),
            ReplayFail => write!(f, "replay check failed (index already seen)"),
            ReplayOld => write!(f, "replay check failed (index too old)"),
            KeyExpired => write!(f, "key usage hard limit reached"),
            AuthFail => write!(f, "authentication check failed"),
            CipherFail => write!(f, "cipher operation failed"),
            ParseErr => write!(f, "packet parse error"),
            CantCheck => write!(f, "unable to perform the required check"),
        }
    }
}

impl std::error::Error for SrtpError {}
