//! Update rate control for diagnostic streams

use serde::{Deserialize, Serialize};

/// Update rate for observation streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every update as it is published
    #[default]
    Native,

    /// Throttled to at most this many updates per second
    /// A rate of zero is treated as Native
    Max(u32),
}

/// Fastest rate that still yields a non-zero throttle interval
const MAX_THROTTLED_HZ: u32 = 1_000_000_000;

impl UpdateRate {
    /// Normalize the rate
    ///
    /// A zero rate, or one too fast to express as a nanosecond interval, is
    /// folded into Native.
    pub fn normalize(self) -> Self {
        match self {
            UpdateRate::Max(0) => UpdateRate::Native,
            UpdateRate::Max(hz) if hz > MAX_THROTTLED_HZ => UpdateRate::Native,
            rate => rate,
        }
    }

    /// Get throttle interval if needed
    pub fn throttle_interval(self) -> Option<std::time::Duration> {
        match self.normalize() {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => {
                Some(std::time::Duration::from_nanos(1_000_000_000 / u64::from(hz)))
            }
        }
    }
}
