use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

static POSTAL_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z][0-9A-Za-z \-]{0,9}$").unwrap());

// Минимумы и верхние границы колонок NUMERIC(5,2), NUMERIC(8,2), NUMERIC(6,2)
pub const MIN_SURFACE: Decimal = Decimal::from_parts(3, 0, 0, false, 0);
pub const MAX_SURFACE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
pub const MIN_PRICE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
pub const MIN_DEPOSIT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
pub const MAX_DEPOSIT: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

pub fn validate_postal_code(postal_code: &str) -> bool {
    POSTAL_CODE_REGEX.is_match(postal_code)
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

fn check_range(field: &str, value: Decimal, min: Decimal, max: Decimal) -> AppResult<()> {
    if value < min {
        return Err(AppError::Validation(format!(
            "{}: ensure this value is greater than or equal to {}",
            field, min
        )));
    }
    if value >= max {
        return Err(AppError::Validation(format!(
            "{}: ensure this value is less than {}",
            field, max
        )));
    }
    if value.scale() > 2 && value.round_dp(2) != value {
        return Err(AppError::Validation(format!(
            "{}: ensure there are no more than 2 decimal places",
            field
        )));
    }
    Ok(())
}

pub fn validate_surface(surface: Decimal) -> AppResult<()> {
    check_range("surface", surface, MIN_SURFACE, MAX_SURFACE)
}

pub fn validate_price(price: Decimal) -> AppResult<()> {
    check_range("price", price, MIN_PRICE, MAX_PRICE)
}

pub fn validate_deposit(deposit: Decimal) -> AppResult<()> {
    check_range("deposit", deposit, MIN_DEPOSIT, MAX_DEPOSIT)
}

pub fn validate_postal_code_field(postal_code: &str) -> AppResult<()> {
    if validate_postal_code(postal_code) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "postal_code: enter a valid postal code".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_validate_postal_code() {
        assert!(validate_postal_code("00-001"));
        assert!(validate_postal_code("10115"));
        assert!(validate_postal_code("SW1A 1AA"));
        assert!(!validate_postal_code("-0001"));
        assert!(validate_postal_code("0"));
        assert!(validate_postal_code("A1"));
        assert!(!validate_postal_code(""));
        assert!(!validate_postal_code(" 0"));
        assert!(!validate_postal_code("00-001-00001"));
        assert!(!validate_postal_code("00_001"));
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(dec("1000")).is_ok());
        assert!(validate_price(dec("1500.00")).is_ok());
        assert!(validate_price(dec("999.99")).is_err());
        assert!(validate_price(dec("1000000")).is_err());
        assert!(validate_price(dec("1500.001")).is_err());
    }

    #[test]
    fn test_validate_surface_and_deposit() {
        assert!(validate_surface(dec("3")).is_ok());
        assert!(validate_surface(dec("2.99")).is_err());
        assert!(validate_surface(dec("999.99")).is_ok());
        assert!(validate_deposit(dec("50")).is_ok());
        assert!(validate_deposit(dec("49.99")).is_err());
        assert!(validate_deposit(dec("600")).is_ok());
    }

    #[test]
    fn test_error_names_field() {
        match validate_deposit(dec("10")) {
            Err(AppError::Validation(msg)) => assert!(msg.starts_with("deposit:")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
