use solana_program::pubkey::Pubkey;

use crate::{
    engine::{apply_debt_share_change, CollateralPosition},
    error::FeePoolError,
    math::{checked_sub, divide_decimal_ceil, mul_div, mul_div_ceil, multiply_decimal, UNIT},
    state::{
        DebtShareRegistry, FeePeriodLedger, FeePoolSettings, LiquidationBook, LiquidationEntry,
        RewardPool, StakerAccount,
    },
};

/// What a liquidation removes from an account and where the collateral goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiquidationPlan {
    pub debt_removed: u64,
    pub debt_shares_burned: u64,
    pub collateral_redeemed: u64,
    pub flag_reward: u64,
    pub liquidate_reward: u64,
    /// Redeemed collateral left for the reward pool
    pub pool_deposit: u64,
    pub is_full: bool,
}

/// Flag an account whose ratio is worse than the liquidation ratio.
/// Returns the deadline after which it can be liquidated.
pub fn flag_account(
    book: &mut LiquidationBook,
    entry: &mut LiquidationEntry,
    settings: &FeePoolSettings,
    flagger: &Pubkey,
    position: &CollateralPosition,
    now: i64,
) -> Result<i64, FeePoolError> {
    let liquidation_ratio = settings.require_liquidation_ratio()?;

    if entry.is_active {
        return Err(FeePoolError::AccountAlreadyFlagged);
    }
    if position.ratio <= liquidation_ratio {
        return Err(FeePoolError::BelowLiquidationRatio);
    }

    let deadline = now
        .checked_add(settings.liquidation_delay)
        .ok_or(FeePoolError::ArithmeticOverflow)?;
    book.open_entry(entry, *flagger, deadline, now)?;
    Ok(deadline)
}

/// Close the entry of an account that is back at or under the issuance ratio.
/// Returns false when the account is still unhealthy and the entry stays.
pub fn remove_if_healthy(
    book: &mut LiquidationBook,
    entry: &mut LiquidationEntry,
    settings: &FeePoolSettings,
    position: &CollateralPosition,
) -> Result<bool, FeePoolError> {
    let issuance_ratio = settings.require_issuance_ratio()?;

    if !entry.is_active {
        return Err(FeePoolError::AccountNotFlagged);
    }
    if position.ratio > issuance_ratio {
        return Ok(false);
    }

    Ok(book.close_entry(entry, false))
}

/// Checks for a third-party liquidation. Once the deadline has passed, any
/// ratio worse than the issuance ratio can be liquidated, even if it has
/// improved past the liquidation ratio since the flag.
pub fn check_liquidatable(
    entry: &LiquidationEntry,
    settings: &FeePoolSettings,
    position: &CollateralPosition,
    now: i64,
) -> Result<(), FeePoolError> {
    let issuance_ratio = settings.require_issuance_ratio()?;

    if !entry.is_active {
        return Err(FeePoolError::AccountNotFlagged);
    }
    if !entry.deadline_passed(now) {
        return Err(FeePoolError::LiquidationDeadlineNotPassed);
    }
    if position.ratio <= issuance_ratio {
        return Err(FeePoolError::AccountHealthy);
    }
    Ok(())
}

/// Checks for self liquidation: anything worse than the issuance ratio qualifies
pub fn check_self_liquidatable(settings: &FeePoolSettings, position: &CollateralPosition) -> Result<(), FeePoolError> {
    if position.ratio <= settings.require_issuance_ratio()? {
        return Err(FeePoolError::AccountHealthy);
    }
    Ok(())
}

/// Debt to remove so that, after redeeming `amount * (1 + penalty)` of
/// collateral value, the account sits at the issuance ratio:
///
/// `(debt - collateral_value * ratio) / (1 - (1 + penalty) * ratio)`, rounded up.
pub fn amount_to_fix_collateral(
    debt: u64,
    collateral_value: u64,
    penalty: u64,
    issuance_ratio: u64,
) -> Result<u64, FeePoolError> {
    let backed_debt = multiply_decimal(collateral_value, issuance_ratio)?;
    if debt <= backed_debt {
        return Ok(0);
    }

    let scaled_ratio = multiply_decimal(UNIT + penalty, issuance_ratio)?;
    if scaled_ratio >= UNIT {
        return Err(FeePoolError::InvalidSettings);
    }

    divide_decimal_ceil(debt - backed_debt, UNIT - scaled_ratio)
}

/// Collateral units worth `usd_amount * (1 + penalty)` at `price`, rounded down
fn collateral_for(usd_amount: u64, penalty: u64, price: u64) -> Result<u64, FeePoolError> {
    let with_penalty = multiply_decimal(usd_amount, UNIT + penalty)?;
    mul_div(with_penalty, UNIT, price)
}

/// Split redeemed collateral into flag reward, liquidate reward and pool remainder.
/// Rewards shrink pro rata when the redeemed amount cannot cover both.
pub fn split_rewards(redeemed: u64, flag_reward: u64, liquidate_reward: u64) -> Result<(u64, u64, u64), FeePoolError> {
    let total_rewards = flag_reward
        .checked_add(liquidate_reward)
        .ok_or(FeePoolError::ArithmeticOverflow)?;

    if total_rewards <= redeemed {
        return Ok((flag_reward, liquidate_reward, redeemed - total_rewards));
    }

    let flag = mul_div(flag_reward, redeemed, total_rewards)?;
    let liquidate = mul_div(liquidate_reward, redeemed, total_rewards)?;
    let remainder = checked_sub(checked_sub(redeemed, flag)?, liquidate)?;
    Ok((flag, liquidate, remainder))
}

/// Work out a liquidation at `price` with the given penalty and fixed rewards
pub fn plan_liquidation(
    position: &CollateralPosition,
    price: u64,
    penalty: u64,
    issuance_ratio: u64,
    flag_reward: u64,
    liquidate_reward: u64,
) -> Result<LiquidationPlan, FeePoolError> {
    let amount = amount_to_fix_collateral(
        position.debt_balance,
        position.collateral_value,
        penalty,
        issuance_ratio,
    )?;
    if amount == 0 {
        return Err(FeePoolError::AccountHealthy);
    }

    let required = collateral_for(amount, penalty, price)?;

    let (debt_removed, debt_shares_burned, collateral_redeemed, is_full) =
        if amount >= position.debt_balance || required >= position.collateral {
            let full_required = collateral_for(position.debt_balance, penalty, price)?;
            (
                position.debt_balance,
                position.debt_shares,
                full_required.min(position.collateral),
                true,
            )
        } else {
            let shares = mul_div_ceil(position.debt_shares, amount, position.debt_balance)?;
            (amount, shares.min(position.debt_shares), required, false)
        };

    let (flag_reward, liquidate_reward, pool_deposit) =
        split_rewards(collateral_redeemed, flag_reward, liquidate_reward)?;

    Ok(LiquidationPlan {
        debt_removed,
        debt_shares_burned,
        collateral_redeemed,
        flag_reward,
        liquidate_reward,
        pool_deposit,
        is_full,
    })
}

/// Apply a plan to account state: burn shares, take collateral, fund the pool.
/// Token movements for the rewards are left to the caller.
pub fn execute_liquidation(
    ledger: &mut FeePeriodLedger,
    registry: &mut DebtShareRegistry,
    pool: &mut RewardPool,
    staker: &mut StakerAccount,
    plan: &LiquidationPlan,
    now: i64,
) -> Result<(), FeePoolError> {
    staker.collateral = checked_sub(staker.collateral, plan.collateral_redeemed)
        .map_err(|_| FeePoolError::InsufficientCollateral)?;

    let remaining_shares = checked_sub(staker.debt_shares, plan.debt_shares_burned)?;
    apply_debt_share_change(ledger, registry, pool, staker, remaining_shares, now)?;

    pool.deposit(plan.pool_deposit, registry.total_debt_shares)
}
