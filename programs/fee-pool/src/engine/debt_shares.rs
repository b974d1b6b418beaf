use crate::{
    error::FeePoolError,
    math::checked_add,
    state::{DebtShareRegistry, FeePeriodLedger, RewardPool, StakerAccount},
};

/// Apply a new debt share balance for one staker.
///
/// Order matters: the ownership accumulator and the reward checkpoint are
/// both brought up to `now` at the old balance before anything changes.
pub fn apply_debt_share_change(
    ledger: &mut FeePeriodLedger,
    registry: &mut DebtShareRegistry,
    pool: &RewardPool,
    staker: &mut StakerAccount,
    new_balance: u64,
    now: i64,
) -> Result<(), FeePoolError> {
    let old_balance = staker.debt_shares;

    ledger.accrue_ownership(now, registry.total_debt_shares)?;
    pool.checkpoint(&mut staker.rewards, old_balance)?;

    let remaining = registry
        .total_debt_shares
        .checked_sub(old_balance)
        .ok_or(FeePoolError::DebtShareTotalMismatch)?;
    let new_total = checked_add(remaining, new_balance)?;

    staker.ownership.record_change(
        now,
        ledger.current_period(),
        ledger.ownership_index,
        new_balance,
        new_total,
    )?;

    registry.total_debt_shares = new_total;
    registry.last_update = now;
    staker.debt_shares = new_balance;
    Ok(())
}
