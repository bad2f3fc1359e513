//! Fixed-point arithmetic over `u64` under an implicit `1e9` scale.
//!
//! All fee, rebate, and quote-quantity computations in [`crate::pool::matching`]
//! go through these primitives. Floating-point is never used.

/// Denominator implicit in every [`mul`]/[`div`] call.
pub const FLOAT_SCALING: u64 = 1_000_000_000;

/// `floor(a * b / FLOAT_SCALING)`.
///
/// # Panics
/// Panics on overflow of the `u128` intermediate product (effectively
/// unreachable for `u64` operands).
#[inline]
pub fn mul(a: u64, b: u64) -> u64 {
    unsafe_mul(a, b)
}

/// `floor(a * FLOAT_SCALING / b)`.
///
/// # Panics
/// Panics if `b == 0`.
#[inline]
pub fn div(a: u64, b: u64) -> u64 {
    unsafe_div(a, b)
}

/// Like [`mul`], but also reports whether the floor division truncated a
/// nonzero remainder — used to decide whether a fee must round up.
#[inline]
pub fn mul_round(a: u64, b: u64) -> (u64, bool) {
    let product = (a as u128) * (b as u128);
    let floor_scaling = product / FLOAT_SCALING as u128;
    let truncated = product % FLOAT_SCALING as u128 != 0;
    (floor_scaling as u64, truncated)
}

/// `mul`, rounded up by one unit if the floor computation truncated.
#[inline]
pub fn mul_round_up(a: u64, b: u64) -> u64 {
    let (floor, truncated) = mul_round(a, b);
    if truncated { floor + 1 } else { floor }
}

/// `mul` without the overflow check a caller has already proven cannot
/// trigger. Identical to `mul` on `u64` inputs (the `u128` intermediate
/// never overflows for this type), kept as a distinct name so call sites
/// can document why the check is known to be unnecessary.
#[inline]
pub fn unsafe_mul(a: u64, b: u64) -> u64 {
    (((a as u128) * (b as u128)) / FLOAT_SCALING as u128) as u64
}

/// `div` without the zero-divisor check a caller has already proven cannot
/// trigger.
#[inline]
pub fn unsafe_div(a: u64, b: u64) -> u64 {
    (((a as u128) * FLOAT_SCALING as u128) / (b as u128)) as u64
}

/// `base_quantity * price`, truncated to `u64` via a `u128` intermediate.
///
/// Unlike [`mul`], this is plain multiplication with no implicit
/// `FLOAT_SCALING` division: a resting order's `price` is the literal
/// quote-per-base rate, not a fraction scaled by `FLOAT_SCALING` the way a
/// fee or rebate rate is. Every quote-amount computation in
/// [`crate::pool::matching`] goes through this, reserving [`mul`]/[`div`]
/// for rate arithmetic.
#[inline]
pub fn quote_amount(base_quantity: u64, price: u64) -> u64 {
    ((base_quantity as u128) * (price as u128)) as u64
}

/// The largest `base_quantity` such that `quote_amount(base_quantity, price)
/// <= quote_budget`, i.e. `floor(quote_budget / price)`.
///
/// # Panics
/// Panics if `price == 0`.
#[inline]
pub fn base_quantity_for_budget(quote_budget: u64, price: u64) -> u64 {
    quote_budget / price
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mul_is_floor() {
        assert_eq!(mul(400_000_000_000, 5_000_000), 2_000_000);
        assert_eq!(mul(3, 333_333_333), 0);
    }

    #[test]
    fn mul_round_reports_truncation() {
        let (floor, truncated) = mul_round(400, 2_500_000);
        assert_eq!(floor, 1);
        assert!(!truncated);

        let (floor, truncated) = mul_round(400, 5_000_000);
        assert_eq!(floor, 2);
        assert!(!truncated);

        // 3 * 1 / 1e9 truncates to 0 but the product is nonzero.
        let (floor, truncated) = mul_round(3, 1);
        assert_eq!(floor, 0);
        assert!(truncated);
    }

    #[test]
    fn mul_round_up_adds_one_only_on_truncation() {
        assert_eq!(mul_round_up(400, 2_500_000), 1);
        assert_eq!(mul_round_up(3, 1), 1);
        assert_eq!(mul_round_up(0, 5_000_000), 0);
    }

    #[test]
    fn div_is_floor() {
        assert_eq!(div(1, 3), 333_333_333);
        assert_eq!(div(0, 7), 0);
    }

    #[test]
    fn quote_amount_is_plain_multiplication() {
        assert_eq!(quote_amount(40, 10), 400);
        assert_eq!(quote_amount(0, 10), 0);
    }

    #[test]
    fn base_quantity_for_budget_floors_to_affordable_units() {
        assert_eq!(base_quantity_for_budget(399, 10), 39);
        assert_eq!(base_quantity_for_budget(400, 10), 40);
    }

    proptest! {
        #[test]
        fn mul_round_truncation_flag_matches_remainder(a in 0u64..1_000_000_000_000, b in 0u64..1_000_000_000_000) {
            let product = (a as u128) * (b as u128);
            let expected_truncated = product % FLOAT_SCALING as u128 != 0;
            let (_, truncated) = mul_round(a, b);
            prop_assert_eq!(truncated, expected_truncated);
        }

        #[test]
        fn mul_round_up_never_less_than_floor(a in 0u64..1_000_000_000_000, b in 0u64..1_000_000_000_000) {
            let (floor, _) = mul_round(a, b);
            prop_assert!(mul_round_up(a, b) >= floor);
        }
    }
}
