use solana_program::pubkey::Pubkey;

use crate::{
    engine::{fees_by_period, fresh_market_snapshot, staker_position, CollateralPosition, Entitlement},
    error::FeePoolError,
    interfaces::{DelegateApprovals, RateOracle, SuspensionRegistry},
    state::{FeePeriodLedger, FeePoolSettings, StakerAccount, SystemSection, FEE_PERIOD_LENGTH},
};

/// Sections that must be active for a claim
pub const CLAIM_SECTIONS: [SystemSection; 3] = [
    SystemSection::System,
    SystemSection::Issuance,
    SystemSection::Exchange,
];

/// Fees stay claimable while the ratio is no worse than issuance ratio * (1 + threshold)
pub fn is_fees_claimable(settings: &FeePoolSettings, position: &CollateralPosition) -> Result<bool, FeePoolError> {
    Ok(position.ratio <= settings.claimable_ratio_limit()?)
}

/// Claim everything owed to `staker`, marking the periods it is paid from.
///
/// Only ledger and staker state change here; the caller pays out the
/// returned amounts after persisting that state.
pub fn claim_fees(
    status: &impl SuspensionRegistry,
    oracle: &impl RateOracle,
    settings: &FeePoolSettings,
    ledger: &mut FeePeriodLedger,
    staker: &mut StakerAccount,
    total_debt_shares: u64,
) -> Result<Entitlement, FeePoolError> {
    status.require_active(&CLAIM_SECTIONS)?;

    let market = fresh_market_snapshot(oracle)?;
    let position = staker_position(staker, total_debt_shares, &market)?;
    if !is_fees_claimable(settings, &position)? {
        return Err(FeePoolError::CRatioBelowPenaltyThreshold);
    }

    let owed = fees_by_period(ledger, &staker.ownership, staker.last_fee_withdrawal)?;
    let total = owed
        .iter()
        .try_fold(Entitlement::default(), |total, period| total.checked_add(period))?;
    if total.is_zero() {
        return Err(FeePoolError::NothingToClaim);
    }

    // Oldest to newest
    for index in (1..FEE_PERIOD_LENGTH).rev() {
        let amounts = owed[index];
        if !amounts.is_zero() {
            ledger.period_mut(index)?.record_claim(amounts.fees, amounts.rewards)?;
        }
    }

    staker.last_fee_withdrawal = ledger.period(1)?.fee_period_id;
    Ok(total)
}

/// Claim on behalf of `staker.owner`; proceeds still belong to the authoriser
#[allow(clippy::too_many_arguments)]
pub fn claim_on_behalf(
    approvals: &impl DelegateApprovals,
    delegate: &Pubkey,
    status: &impl SuspensionRegistry,
    oracle: &impl RateOracle,
    settings: &FeePoolSettings,
    ledger: &mut FeePeriodLedger,
    staker: &mut StakerAccount,
    total_debt_shares: u64,
) -> Result<Entitlement, FeePoolError> {
    if !approvals.can_claim_for(&staker.owner, delegate) {
        return Err(FeePoolError::NotApprovedToClaim);
    }
    claim_fees(status, oracle, settings, ledger, staker, total_debt_shares)
}
