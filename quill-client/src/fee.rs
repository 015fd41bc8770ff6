//! Storage fee estimation.
//!
//! Pure arithmetic over a [`FeeScheduleConfig`]: a flat base fee, a
//! per-byte component, a flat percentage discount, and a ceiling clamp.
//! Fees are 256-bit because the raw base + per-byte sum can exceed 64
//! bits long before the ceiling applies.

use alloy_primitives::U256;
use quill_core::FeeScheduleConfig;

/// Estimate the storage fee for a payload of `byte_size` bytes.
///
/// `fee = min(max_fee, (base_fee + byte_size * per_byte_fee) * discount / 100)`
///
/// Deterministic, no side effects, no failure modes.
pub fn estimate_fee(schedule: &FeeScheduleConfig, byte_size: u64) -> U256 {
    let size_fee = U256::from(byte_size) * schedule.per_byte_fee;
    let total = schedule.base_fee + size_fee;
    let discounted = total * U256::from(schedule.discount_percent) / U256::from(100u64);
    if discounted > schedule.max_fee {
        schedule.max_fee
    } else {
        discounted
    }
}

/// Format a fee in whole-token units (18 decimals) for display.
///
/// Trailing zeros in the fractional part are trimmed; whole amounts render
/// without a decimal point.
pub fn format_fee(fee: U256) -> String {
    let unit = U256::from(10u64).pow(U256::from(18u64));
    let whole = fee / unit;
    let frac = fee % unit;

    if frac.is_zero() {
        return whole.to_string();
    }

    let frac = format!("{frac:0>18}");
    let frac = frac.trim_end_matches('0');
    format!("{whole}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_worked_scenario() {
        // base 1e18, per-byte 1e15, 10% discount, ceiling 1e19:
        // (1e18 + 1000 * 1e15) * 10 / 100 = 2e17
        let schedule = FeeScheduleConfig::default();
        let fee = estimate_fee(&schedule, 1000);
        assert_eq!(fee, U256::from(200_000_000_000_000_000u128));
    }

    #[test]
    fn test_zero_size_pays_discounted_base() {
        let schedule = FeeScheduleConfig::default();
        let fee = estimate_fee(&schedule, 0);
        // 1e18 * 10 / 100
        assert_eq!(fee, U256::from(100_000_000_000_000_000u128));
    }

    #[test]
    fn test_ceiling_clamp() {
        let schedule = FeeScheduleConfig::default();
        // 100 MB is far beyond the ceiling
        let fee = estimate_fee(&schedule, 100 * 1024 * 1024);
        assert_eq!(fee, schedule.max_fee);
    }

    #[test]
    fn test_format_fee() {
        assert_eq!(format_fee(U256::from(1_000_000_000_000_000_000u128)), "1");
        assert_eq!(
            format_fee(U256::from(100_100_000_000_000_000u128)),
            "0.1001"
        );
        assert_eq!(format_fee(U256::ZERO), "0");
        assert_eq!(
            format_fee(U256::from(2_500_000_000_000_000_000u128)),
            "2.5"
        );
    }

    proptest! {
        #[test]
        fn prop_fee_monotone_and_bounded(a in 0u64..10_000_000, b in 0u64..10_000_000) {
            let schedule = FeeScheduleConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let fee_lo = estimate_fee(&schedule, lo);
            let fee_hi = estimate_fee(&schedule, hi);
            prop_assert!(fee_lo <= fee_hi);
            prop_assert!(fee_hi <= schedule.max_fee);
        }
    }
}
