//! Conversion between 18-decimal base units and the strings users read and
//! type.

use ethers::types::U256;
use ethers::utils::format_ether;

use crate::error::AmountError;

pub const DECIMALS: usize = 18;
pub const DISPLAY_DECIMALS: usize = 3;

/// `1500000000000000000` -> `"1.5"`, `2000000000000000000` -> `"2"`.
pub fn from_base_units(amount: U256) -> String {
    let formatted = format_ether(amount);
    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Truncate (never round) the fractional part of a decimal string to
/// `decimals` digits.
pub fn format_display_number(value: &str, decimals: usize) -> String {
    match value.split_once('.') {
        None => value.to_string(),
        Some((whole, fraction)) => {
            let fraction: String = fraction.chars().take(decimals).collect();
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
    }
}

/// What every amount on screen goes through.
pub fn display_amount(amount: U256) -> String {
    format_display_number(&from_base_units(amount), DISPLAY_DECIMALS)
}

/// Parse a user-typed decimal into base units. Signs, exponents and more
/// than 18 fractional digits are rejected.
pub fn to_base_units(input: &str) -> Result<U256, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }
    let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) || (whole.is_empty() && fraction.is_empty())
    {
        return Err(AmountError::NotANumber);
    }
    if fraction.len() > DECIMALS {
        return Err(AmountError::TooManyDecimals);
    }
    let whole = if whole.is_empty() { "0" } else { whole };
    let whole = U256::from_dec_str(whole).map_err(|_| AmountError::TooLarge)?;
    let fraction = format!("{fraction:0<width$}", width = DECIMALS);
    let fraction = U256::from_dec_str(&fraction).map_err(|_| AmountError::NotANumber)?;
    whole
        .checked_mul(U256::exp10(DECIMALS))
        .and_then(|whole| whole.checked_add(fraction))
        .ok_or(AmountError::TooLarge)
}

/// Lossy conversion for ratios and APY arithmetic.
pub fn to_f64(amount: U256) -> f64 {
    from_base_units(amount).parse().unwrap_or(0.0)
}

/// `part` as a percentage of `total`; zero when `total` is zero.
pub fn ratio_percent(part: U256, total: U256) -> f64 {
    let total = to_f64(total);
    if total > 0.0 {
        to_f64(part) * 100.0 / total
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::exp10(DECIMALS)
    }

    #[test]
    fn test_from_base_units() {
        assert_eq!(from_base_units(U256::zero()), "0");
        assert_eq!(from_base_units(ether(2)), "2");
        assert_eq!(from_base_units(U256::exp10(17) * 15), "1.5");
        assert_eq!(from_base_units(U256::one()), "0.000000000000000001");
    }

    #[test]
    fn test_display_truncates_instead_of_rounding() {
        assert_eq!(format_display_number("1.99999", 3), "1.999");
        assert_eq!(format_display_number("0.0005", 3), "0.000");
        assert_eq!(format_display_number("12", 3), "12");
        assert_eq!(format_display_number("12.5", 3), "12.5");
        assert_eq!(format_display_number("7.123", 0), "7");
    }

    #[test]
    fn test_display_is_idempotent() {
        for value in ["3.14159", "100", "0.1", "42.000001", "5."] {
            let once = format_display_number(value, 3);
            assert_eq!(format_display_number(&once, 3), once);
            let digits = once.split_once('.').map_or(0, |(_, f)| f.len());
            assert!(digits <= 3);
        }
    }

    #[test]
    fn test_display_amount() {
        assert_eq!(display_amount(U256::exp10(15) * 1999), "1.999");
        assert_eq!(display_amount(U256::exp10(14) * 19999), "1.999");
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units("5"), Ok(ether(5)));
        assert_eq!(to_base_units(" 1.5 "), Ok(U256::exp10(17) * 15));
        assert_eq!(to_base_units(".5"), Ok(U256::exp10(17) * 5));
        assert_eq!(to_base_units("0.000000000000000001"), Ok(U256::one()));
        assert_eq!(to_base_units("0"), Ok(U256::zero()));
    }

    #[test]
    fn test_to_base_units_rejects_garbage() {
        assert_eq!(to_base_units(""), Err(AmountError::Empty));
        assert_eq!(to_base_units("abc"), Err(AmountError::NotANumber));
        assert_eq!(to_base_units("-1"), Err(AmountError::NotANumber));
        assert_eq!(to_base_units("1e18"), Err(AmountError::NotANumber));
        assert_eq!(to_base_units("1.2.3"), Err(AmountError::NotANumber));
        assert_eq!(to_base_units("."), Err(AmountError::NotANumber));
        assert_eq!(
            to_base_units("0.0000000000000000001"),
            Err(AmountError::TooManyDecimals)
        );
    }

    #[test]
    fn test_to_base_units_rejects_overflow() {
        let huge = format!("1{}", "0".repeat(70));
        assert_eq!(to_base_units(&huge), Err(AmountError::TooLarge));
        // fits as an integer, but not once scaled by 10^18
        let max_whole = U256::MAX.to_string();
        assert_eq!(to_base_units(&max_whole), Err(AmountError::TooLarge));
        assert_eq!(to_base_units("1000000000"), Ok(ether(1_000_000_000)));
    }

    #[test]
    fn test_ratio_percent() {
        assert_eq!(ratio_percent(ether(1), ether(4)), 25.0);
        assert_eq!(ratio_percent(ether(1), U256::zero()), 0.0);
    }
}
