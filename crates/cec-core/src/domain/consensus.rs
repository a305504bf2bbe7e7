//! Debounce window for TV vendor readings.
//!
//! Some TVs answer vendor queries with stale or garbage values for a while
//! after power-up.  The probe therefore trusts a reading only after it has
//! come back [`WINDOW_CAPACITY`] times in a row.  A single disagreeing reading
//! empties the window; there is no partial credit.

use crate::protocol::vendor::VendorId;

/// Consecutive identical readings required before a vendor is trusted.
pub const WINDOW_CAPACITY: usize = 6;

/// What the window did with one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The reading is outside the valid range and was not recorded.
    Ignored,
    /// The reading agreed with the window and was appended; `count` readings
    /// are now held.
    Accepted { count: usize },
    /// The reading disagreed with the window, which is now empty.  The
    /// disagreeing reading itself is not kept.
    Reset,
    /// The window is full of identical readings.
    Consensus(VendorId),
}

/// Fixed-capacity run of identical vendor readings.
#[derive(Debug, Clone, Default)]
pub struct ConsensusWindow {
    readings: [Option<VendorId>; WINDOW_CAPACITY],
    len: usize,
}

impl ConsensusWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one reading into the window.
    ///
    /// Once [`Observation::Consensus`] has been returned, further agreeing
    /// readings keep returning it without growing the window.
    pub fn observe(&mut self, reading: VendorId) -> Observation {
        if !reading.is_valid_reading() {
            return Observation::Ignored;
        }

        if self.readings[..self.len].iter().any(|held| *held != Some(reading)) {
            self.clear();
            return Observation::Reset;
        }

        if self.len < WINDOW_CAPACITY {
            self.readings[self.len] = Some(reading);
            self.len += 1;
        }

        if self.len == WINDOW_CAPACITY {
            Observation::Consensus(reading)
        } else {
            Observation::Accepted { count: self.len }
        }
    }

    /// Number of readings currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.readings = [None; WINDOW_CAPACITY];
        self.len = 0;
    }
}
