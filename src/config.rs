//! Pool-level parameters that the swap needs alongside the curve.

use crate::error::ConfigError;
use crate::math::tick_math::{MAX_TICK, MIN_TICK};

/// Fee rates are expressed in units of one millionth (hundredths of a bip).
pub const FEE_BP_MULT: u128 = 1_000_000;

/// Static parameters of a pool.
///
/// `protocol_take` is the protocol's share of the exchange fee in units of
/// 1/256.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolSpec {
    pub fee_rate: u16,
    pub protocol_take: u8,
    pub tick_size: u16,
}

impl PoolSpec {
    /// Creates a validated pool specification.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the tick size is zero.
    pub fn new(fee_rate: u16, protocol_take: u8, tick_size: u16) -> Result<Self, ConfigError> {
        let spec = Self {
            fee_rate,
            protocol_take,
            tick_size,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Checks the invariants of a specification built by hand or loaded
    /// from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_size == 0 {
            return Err(ConfigError::ZeroTickSize);
        }
        Ok(())
    }

    /// Verifies that `[lower, upper)` is a non-empty range inside the tick
    /// domain with both ends on the tick grid.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidRange`] or [`ConfigError::MisalignedTick`].
    pub fn check_range(&self, lower: i32, upper: i32) -> Result<(), ConfigError> {
        if lower >= upper || lower < MIN_TICK || upper > MAX_TICK {
            return Err(ConfigError::InvalidRange(lower, upper));
        }
        for tick in [lower, upper] {
            if tick % i32::from(self.tick_size) != 0 {
                return Err(ConfigError::MisalignedTick(tick, self.tick_size));
            }
        }
        Ok(())
    }
}

impl Default for PoolSpec {
    fn default() -> Self {
        Self {
            fee_rate: 0,
            protocol_take: 0,
            tick_size: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_tick_size() {
        assert!(PoolSpec::new(3000, 0, 16).is_ok());
        assert!(matches!(
            PoolSpec::new(3000, 0, 0),
            Err(ConfigError::ZeroTickSize)
        ));
    }

    #[test]
    fn range_checks() {
        let spec = PoolSpec::new(500, 64, 16).unwrap();
        assert!(spec.check_range(-160, 320).is_ok());
        assert!(matches!(
            spec.check_range(320, -160),
            Err(ConfigError::InvalidRange(320, -160))
        ));
        assert!(matches!(
            spec.check_range(-150, 320),
            Err(ConfigError::MisalignedTick(-150, 16))
        ));
        assert!(matches!(
            spec.check_range(MIN_TICK - 16, 0),
            Err(ConfigError::InvalidRange(_, _))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn spec_round_trips_through_json() {
        let spec = PoolSpec::new(2500, 32, 4).unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        let back: PoolSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
