/// Remaining uses at which the soft-limit warning starts firing.
const SOFT_LIMIT_MARGIN: u64 = 0x10000;

/// Maximum SRTP packets under one key (2^48 - 1).
pub const MAX_KEY_USAGE: u64 = 0xffff_ffff_ffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    Normal,
    PastSoftLimit,
    Expired,
}

/// Verdict of a single key use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Normal,
    /// The soft limit has been passed; the caller should schedule rekeying.
    SoftLimit,
    /// The budget is exhausted; the packet must be refused.
    HardLimit,
}

/// A monotonically decreasing budget of key uses.
///
/// The budget is checked before it is spent, so a limit of `n` admits
/// exactly `n` packets and the `n+1`-th reports [`KeyEvent::HardLimit`].
pub struct KeyLimit {
    num_left: u64,
    state: KeyState,
}

impl KeyLimit {
    pub fn new(limit: u64) -> Self {
        Self {
            num_left: limit,
            state: KeyState::Normal,
        }
    }

    /// Resets the budget.
    pub fn set(&mut self, limit: u64) {
        self.num_left = limit;
        self.state = KeyState::Normal;
    }

    /// Accounts for one key use and reports the resulting state.
    pub fn update(&mut self) -> KeyEvent {
        if self.state == KeyState::Expired || self.num_left == 0 {
            self.state = KeyState::Expired;
            return KeyEvent::HardLimit;
        }
        self.num_left -= 1;
        if self.num_left >= SOFT_LIMIT_MARGIN {
            return KeyEvent::Normal;
        }
        if self.state == KeyState::Normal {
            self.state = KeyState::PastSoftLimit;
        }
        KeyEvent::SoftLimit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_budget_admits_exactly_n() {
        let mut limit = KeyLimit::new(3);
        assert_eq!(limit.update(), KeyEvent::SoftLimit);
        assert_eq!(limit.update(), KeyEvent::SoftLimit);
        assert_eq!(limit.update(), KeyEvent::SoftLimit);
        assert_eq!(limit.update(), KeyEvent::HardLimit);
        assert_eq!(limit.update(), KeyEvent::HardLimit);
    }

    #[test]
    fn large_budget_is_silent() {
        let mut limit = KeyLimit::new(MAX_KEY_USAGE);
        for _ in 0..1000 {
            assert_eq!(limit.update(), KeyEvent::Normal);
        }
    }

    #[test]
    fn soft_limit_crossing() {
        let mut limit = KeyLimit::new(SOFT_LIMIT_MARGIN + 2);
        assert_eq!(limit.update(), KeyEvent::Normal);
        assert_eq!(limit.update(), KeyEvent::Normal);
        assert_eq!(limit.update(), KeyEvent::SoftLimit);
    }

    #[test]
    fn set_rearms() {
        let mut limit = KeyLimit::new(1);
        assert_eq!(limit.update(), KeyEvent::SoftLimit);
        assert_eq!(limit.update(), KeyEvent::HardLimit);
        limit.set(MAX_KEY_USAGE);
        assert_eq!(limit.update(), KeyEvent::Normal);
    }
}
