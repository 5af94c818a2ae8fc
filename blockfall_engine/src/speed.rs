/*!
This module handles the gravity [`SpeedMultiplier`].
*/

use std::{fmt, num::NonZeroU32, time::Duration};

/// A gravity speedup of `1 + steps / 10`, kept as an exact rational.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedMultiplier {
    steps: u32,
}

impl SpeedMultiplier {
    /// Number of line clears that never speed the game up.
    pub const GRACE_LINECLEARS: u32 = 10;

    /// Computes `1 + floor((lineclears - 10) / every_n) / 10`, clamped to `1` for
    /// `lineclears <= 10`.
    pub fn from_lineclears(lineclears: u32, every_n: NonZeroU32) -> Self {
        let excess = i64::from(lineclears) - i64::from(Self::GRACE_LINECLEARS);
        let steps = excess.div_euclid(i64::from(every_n.get())).max(0);
        Self {
            steps: u32::try_from(steps).unwrap_or(u32::MAX),
        }
    }

    /// Number of +0.1 increments above `1`.
    pub const fn steps(&self) -> u32 {
        self.steps
    }

    /// The multiplier as a float, for display.
    pub fn get(&self) -> f64 {
        1.0 + f64::from(self.steps) / 10.0
    }

    /// Divides a duration by the multiplier.
    pub fn divide(&self, duration: Duration) -> Duration {
        // d / (1 + s/10) == d * 10 / (10 + s)
        let denominator = 10u64 + u64::from(self.steps);
        let nanos = duration.as_nanos() * 10 / u128::from(denominator);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for SpeedMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}x", 1 + self.steps / 10, self.steps % 10)
    }
}
