use crate::{
    error::FeePoolError,
    interfaces::RateOracle,
    math::{divide_decimal, mul_div, multiply_decimal},
    state::{StakerAccount, COLLATERAL_ASSET, TOTAL_DEBT_ASSET},
};

/// Fresh collateral price and total system debt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub collateral_price: u64,
    pub total_system_debt: u64,
}

/// Fail unless both the collateral rate and the debt snapshot are fresh
pub fn fresh_market_snapshot(oracle: &impl RateOracle) -> Result<MarketSnapshot, FeePoolError> {
    let collateral = oracle
        .rate_for(&COLLATERAL_ASSET)
        .filter(|r| !r.is_stale && r.rate > 0)
        .ok_or(FeePoolError::CollateralRateStale)?;

    let debt = oracle
        .rate_for(&TOTAL_DEBT_ASSET)
        .filter(|r| !r.is_stale)
        .ok_or(FeePoolError::DebtSnapshotStale)?;

    Ok(MarketSnapshot {
        collateral_price: collateral.rate,
        total_system_debt: debt.rate,
    })
}

/// An account's debt against its collateral at one market snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollateralPosition {
    pub debt_shares: u64,
    pub debt_balance: u64,
    pub collateral: u64,
    pub collateral_value: u64,
    /// Debt over collateral value; higher is worse
    pub ratio: u64,
}

/// USD debt backing `shares` out of `total_shares`
pub fn debt_balance(shares: u64, total_shares: u64, total_system_debt: u64) -> Result<u64, FeePoolError> {
    if shares == 0 || total_shares == 0 {
        return Ok(0);
    }
    mul_div(shares, total_system_debt, total_shares)
}

/// Debt over collateral value. Zero debt is ratio 0, debt without collateral is `u64::MAX`.
pub fn collateralisation_ratio(debt: u64, collateral_value: u64) -> Result<u64, FeePoolError> {
    if debt == 0 {
        return Ok(0);
    }
    if collateral_value == 0 {
        return Ok(u64::MAX);
    }
    match divide_decimal(debt, collateral_value) {
        Err(FeePoolError::ArithmeticOverflow) => Ok(u64::MAX),
        other => other,
    }
}

pub fn position_of(
    debt_shares: u64,
    collateral: u64,
    total_debt_shares: u64,
    market: &MarketSnapshot,
) -> Result<CollateralPosition, FeePoolError> {
    let debt = debt_balance(debt_shares, total_debt_shares, market.total_system_debt)?;
    let collateral_value = multiply_decimal(collateral, market.collateral_price)?;

    Ok(CollateralPosition {
        debt_shares,
        debt_balance: debt,
        collateral,
        collateral_value,
        ratio: collateralisation_ratio(debt, collateral_value)?,
    })
}

pub fn staker_position(
    staker: &StakerAccount,
    total_debt_shares: u64,
    market: &MarketSnapshot,
) -> Result<CollateralPosition, FeePoolError> {
    position_of(staker.debt_shares, staker.collateral, total_debt_shares, market)
}
