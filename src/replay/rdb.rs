use crate::error::SrtpError;

/// Lookback depth of the receive-side bitmask.
const RDB_BITS: u32 = 128;

/// Largest legal SRTCP index (31 bits).
const RDB_MAX_INDEX: u32 = 0x7fff_ffff;

/// Replay database for SRTCP's 31-bit packet index.
///
/// Senders drive it with `increment`/`get_value`; receivers with
/// `check`/`add_index`. Bit `d` of the mask records whether index
/// `window_start + d` has been seen.
pub struct Rdb {
    window_start: u32,
    bitmask: u128,
}

impl Rdb {
    pub fn new() -> Self {
        Self {
            window_start: 0,
            bitmask: 0,
        }
    }

    /// Replay verdict for a received index. Does not modify the database.
    pub fn check(&self, index: u32) -> Result<(), SrtpError> {
        if index < self.window_start {
            return Err(SrtpError::ReplayOld);
        }
        let delta = index - self.window_start;
        if delta >= RDB_BITS {
            return Ok(());
        }
        if (self.bitmask >> delta) & 1 == 1 {
            return Err(SrtpError::ReplayFail);
        }
        Ok(())
    }

    /// Commits a received index previously vetted by `check`.
    pub fn add_index(&mut self, index: u32) {
        let delta = index - self.window_start;
        if delta < RDB_BITS {
            self.bitmask |= 1u128 << delta;
        } else {
            let advance = delta - RDB_BITS + 1;
            self.window_start += advance;
            self.bitmask = if advance < RDB_BITS {
                self.bitmask >> advance
            } else {
                0
            };
            self.bitmask |= 1u128 << (RDB_BITS - 1);
        }
    }

    /// Sender side: advances the index, failing once the 31-bit space is
    /// exhausted.
    pub fn increment(&mut self) -> Result<(), SrtpError> {
        if self.window_start >= RDB_MAX_INDEX {
            return Err(SrtpError::KeyExpired);
        }
        self.window_start += 1;
        Ok(())
    }

    /// Sender side: the current index value.
    pub fn get_value(&self) -> u32 {
        self.window_start
    }
}

impl Default for Rdb {
    fn default() -> Self {
        Self::new()
    }
}
