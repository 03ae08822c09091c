//! Adapter layer: converts between the f64 simulation world and the ledger's Decimal sectors.

use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Convert f64 to Decimal (lossy but sufficient for simulation).
///
/// Non-finite or out-of-range inputs map to zero.
pub fn to_decimal(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal to f64.
pub fn from_decimal(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Convert a fixed block of Decimal sectors to f64 in one pass.
pub fn sectors_to_f64<const N: usize>(sectors: &[Decimal; N]) -> [f64; N] {
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(sectors.iter()) {
        *slot = from_decimal(*value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn to_decimal_handles_non_finite() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
    }

    #[test]
    fn decimal_conversions_agree() {
        assert_eq!(to_decimal(20.0), dec!(20));
        assert!((from_decimal(dec!(10000.25)) - 10000.25).abs() < 1e-9);
    }

    #[test]
    fn sector_block_conversion() {
        let block = [dec!(1.5), dec!(-2), dec!(0)];
        let out = sectors_to_f64(&block);
        assert_eq!(out, [1.5, -2.0, 0.0]);
    }
}
