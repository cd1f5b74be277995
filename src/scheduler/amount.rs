use std::str::FromStr;

use ethers::types::U256;
use rust_decimal::Decimal;

use crate::error::PaymentError;

/// Decimals of the ledger's native token
pub const NATIVE_DECIMALS: u32 = 18;

/// Convert a decimal amount string into native smallest units, exactly.
pub fn parse_native_amount(text: &str) -> Result<U256, PaymentError> {
    let value = Decimal::from_str(text.trim())
        .map_err(|_| PaymentError::InvalidAmount(format!("not a decimal number: {}", text)))?;
    native_units(value)
}

/// Convert a decimal token amount into native smallest units, exactly.
///
/// Minimum-amount policy: the amount must be strictly positive, so zero
/// (and any all-zero fraction) is rejected. At most 18 fractional digits
/// are accepted; no floating-point arithmetic is involved anywhere.
pub fn native_units(value: Decimal) -> Result<U256, PaymentError> {
    if value <= Decimal::ZERO {
        return Err(PaymentError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if value.scale() > NATIVE_DECIMALS {
        return Err(PaymentError::InvalidAmount(format!(
            "at most {} decimal places are supported",
            NATIVE_DECIMALS
        )));
    }

    // value == mantissa * 10^-scale, so scaling the integer mantissa up by
    // the remaining decimals is exact.
    let mantissa = U256::from(value.mantissa() as u128);
    Ok(mantissa * U256::exp10((NATIVE_DECIMALS - value.scale()) as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_whole_and_fractional_amounts_exactly() {
        assert_eq!(
            native_units(dec!(1.5)).unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(native_units(dec!(2)).unwrap(), U256::exp10(18) * U256::from(2));
        assert_eq!(
            native_units(dec!(0.25)).unwrap(),
            U256::exp10(16) * U256::from(25)
        );
    }

    #[test]
    fn parsing_and_direct_conversion_agree() {
        assert_eq!(
            parse_native_amount("1.5").unwrap(),
            native_units(dec!(1.5)).unwrap()
        );
        assert_eq!(
            parse_native_amount(" 0.25 ").unwrap(),
            native_units(dec!(0.25)).unwrap()
        );
    }

    #[test]
    fn smallest_representable_unit_is_one() {
        assert_eq!(
            parse_native_amount("0.000000000000000001").unwrap(),
            U256::one()
        );
    }

    #[test]
    fn zero_is_rejected_by_minimum_amount_policy() {
        assert!(matches!(
            parse_native_amount("0"),
            Err(PaymentError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_native_amount("0.000"),
            Err(PaymentError::InvalidAmount(_))
        ));
    }

    #[test]
    fn negative_and_malformed_amounts_are_rejected() {
        assert!(parse_native_amount("-1").is_err());
        assert!(parse_native_amount("1.2.3").is_err());
        assert!(parse_native_amount("abc").is_err());
        assert!(parse_native_amount("").is_err());
    }

    #[test]
    fn excess_precision_is_rejected() {
        assert!(parse_native_amount("0.0000000000000000001").is_err());
    }
}
