use crate::error::FeePoolError;

/// Amounts, prices and ratios are stored as integer * 10^6 (6 decimal places)
pub const UNIT: u64 = 1_000_000;

/// Accumulators (ownership index, reward per share) use 18 decimal places
pub const PRECISE_UNIT: u128 = 1_000_000_000_000_000_000;

pub fn checked_add(a: u64, b: u64) -> Result<u64, FeePoolError> {
    a.checked_add(b).ok_or(FeePoolError::ArithmeticOverflow)
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64, FeePoolError> {
    a.checked_sub(b).ok_or(FeePoolError::ArithmeticOverflow)
}

pub fn to_u64(value: u128) -> Result<u64, FeePoolError> {
    u64::try_from(value).map_err(|_| FeePoolError::ArithmeticOverflow)
}

/// a * b / denominator, rounded down
pub fn mul_div(a: u64, b: u64, denominator: u64) -> Result<u64, FeePoolError> {
    if denominator == 0 {
        return Err(FeePoolError::DivisionByZero);
    }
    let product = (a as u128)
        .checked_mul(b as u128)
        .ok_or(FeePoolError::ArithmeticOverflow)?;
    to_u64(product / denominator as u128)
}

/// a * b / denominator, rounded up
pub fn mul_div_ceil(a: u64, b: u64, denominator: u64) -> Result<u64, FeePoolError> {
    if denominator == 0 {
        return Err(FeePoolError::DivisionByZero);
    }
    let product = (a as u128)
        .checked_mul(b as u128)
        .ok_or(FeePoolError::ArithmeticOverflow)?;
    let denominator = denominator as u128;
    to_u64((product + denominator - 1) / denominator)
}

/// Decimal multiply: a * b / UNIT
pub fn multiply_decimal(a: u64, b: u64) -> Result<u64, FeePoolError> {
    mul_div(a, b, UNIT)
}

/// Decimal divide: a * UNIT / b
pub fn divide_decimal(a: u64, b: u64) -> Result<u64, FeePoolError> {
    mul_div(a, UNIT, b)
}

/// Decimal divide rounded up
pub fn divide_decimal_ceil(a: u64, b: u64) -> Result<u64, FeePoolError> {
    mul_div_ceil(a, UNIT, b)
}

/// Scale an amount into a per-share increment at PRECISE_UNIT precision
pub fn per_share(amount: u128, shares: u64) -> Result<u128, FeePoolError> {
    if shares == 0 {
        return Err(FeePoolError::DivisionByZero);
    }
    amount
        .checked_mul(PRECISE_UNIT)
        .map(|scaled| scaled / shares as u128)
        .ok_or(FeePoolError::ArithmeticOverflow)
}

/// shares * delta / PRECISE_UNIT, rounded down
pub fn from_per_share(shares: u64, delta: u128) -> Result<u128, FeePoolError> {
    (shares as u128)
        .checked_mul(delta)
        .map(|scaled| scaled / PRECISE_UNIT)
        .ok_or(FeePoolError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_operations() {
        assert_eq!(multiply_decimal(2 * UNIT, 500_000).unwrap(), UNIT);
        assert_eq!(divide_decimal(UNIT, 4 * UNIT).unwrap(), 250_000);
        assert_eq!(divide_decimal_ceil(1, 3 * UNIT).unwrap(), 1);
        assert_eq!(mul_div_ceil(10, 1, 3).unwrap(), 4);
        assert_eq!(mul_div(10, 1, 3).unwrap(), 3);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(divide_decimal(UNIT, 0), Err(FeePoolError::DivisionByZero));
        assert_eq!(per_share(1, 0), Err(FeePoolError::DivisionByZero));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(checked_add(u64::MAX, 1), Err(FeePoolError::ArithmeticOverflow));
        assert_eq!(mul_div(u64::MAX, u64::MAX, 1), Err(FeePoolError::ArithmeticOverflow));
    }

    #[test]
    fn test_per_share_round_trip_rounds_down() {
        let delta = per_share(100, 3).unwrap();
        assert_eq!(from_per_share(3, delta).unwrap(), 99);
    }
}
