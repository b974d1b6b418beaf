use crate::{
    error::FeePoolError,
    math::{checked_add, multiply_decimal, to_u64, PRECISE_UNIT, UNIT},
    state::{FeePeriodLedger, OwnershipRecord, FEE_PERIOD_LENGTH},
};

/// Fees and rewards owed or available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Entitlement {
    pub fees: u64,
    pub rewards: u64,
}

impl Entitlement {
    pub fn is_zero(&self) -> bool {
        self.fees == 0 && self.rewards == 0
    }

    pub fn checked_add(&self, other: &Entitlement) -> Result<Entitlement, FeePoolError> {
        Ok(Entitlement {
            fees: checked_add(self.fees, other.fees)?,
            rewards: checked_add(self.rewards, other.rewards)?,
        })
    }
}

/// Time-weighted share of debt the account held during a closed period (6 decimals).
///
/// Index 0 (the open period) and indices past the window are always 0.
pub fn effective_debt_ratio_for_period(
    ledger: &FeePeriodLedger,
    ownership: &OwnershipRecord,
    period_index: usize,
) -> Result<u64, FeePoolError> {
    if period_index == 0 || period_index >= FEE_PERIOD_LENGTH {
        return Ok(0);
    }

    let period = ledger.period(period_index)?;
    if period.is_empty() || period.covered_seconds == 0 {
        return Ok(0);
    }

    let share_seconds = ownership.share_seconds_in(period)?;
    let covered = (period.covered_seconds as u128)
        .checked_mul(PRECISE_UNIT)
        .ok_or(FeePoolError::ArithmeticOverflow)?;
    let ratio = share_seconds
        .checked_mul(UNIT as u128)
        .ok_or(FeePoolError::ArithmeticOverflow)?
        / covered;

    to_u64(ratio.min(UNIT as u128))
}

/// Owed amounts per retained period; entry 0 (open period) is always zero.
/// Periods with an id at or below `last_fee_withdrawal` were already claimed.
pub fn fees_by_period(
    ledger: &FeePeriodLedger,
    ownership: &OwnershipRecord,
    last_fee_withdrawal: u64,
) -> Result<[Entitlement; FEE_PERIOD_LENGTH], FeePoolError> {
    let mut owed = [Entitlement::default(); FEE_PERIOD_LENGTH];

    for (index, slot) in owed.iter_mut().enumerate().skip(1) {
        let period = ledger.period(index)?;
        if period.is_empty() || period.fee_period_id <= last_fee_withdrawal {
            continue;
        }

        let ratio = effective_debt_ratio_for_period(ledger, ownership, index)?;
        if ratio == 0 {
            continue;
        }

        *slot = Entitlement {
            fees: multiply_decimal(period.fees_to_distribute, ratio)?.min(period.unclaimed_fees()),
            rewards: multiply_decimal(period.rewards_to_distribute, ratio)?.min(period.unclaimed_rewards()),
        };
    }

    Ok(owed)
}

/// Everything the account could claim right now
pub fn fees_available(
    ledger: &FeePeriodLedger,
    ownership: &OwnershipRecord,
    last_fee_withdrawal: u64,
) -> Result<Entitlement, FeePoolError> {
    fees_by_period(ledger, ownership, last_fee_withdrawal)?
        .iter()
        .try_fold(Entitlement::default(), |total, owed| total.checked_add(owed))
}

/// Unclaimed fees and rewards across all closed periods
pub fn total_fees_available(ledger: &FeePeriodLedger) -> Result<Entitlement, FeePoolError> {
    (1..FEE_PERIOD_LENGTH).try_fold(Entitlement::default(), |total, index| {
        let period = ledger.period(index)?;
        total.checked_add(&Entitlement {
            fees: period.unclaimed_fees(),
            rewards: period.unclaimed_rewards(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: i64 = 7 * 86_400;

    /// Two holders, 1:3 split for the whole period
    fn ledger_with_two_holders() -> (FeePeriodLedger, OwnershipRecord, OwnershipRecord) {
        let mut ledger = FeePeriodLedger::new(0, 255);
        let mut alice = OwnershipRecord::default();
        let mut bob = OwnershipRecord::default();

        alice.record_change(0, ledger.current_period(), ledger.ownership_index, 100, 100).unwrap();
        ledger.accrue_ownership(0, 100).unwrap();
        bob.record_change(0, ledger.current_period(), ledger.ownership_index, 300, 400).unwrap();

        ledger.record_fee(1_000).unwrap();
        ledger.record_reward(400).unwrap();
        ledger.close_current_period(WEEK, WEEK, 400).unwrap();
        (ledger, alice, bob)
    }

    #[test]
    fn test_ratio_is_zero_for_open_and_out_of_range_periods() {
        let (ledger, alice, _) = ledger_with_two_holders();
        assert_eq!(effective_debt_ratio_for_period(&ledger, &alice, 0).unwrap(), 0);
        assert_eq!(effective_debt_ratio_for_period(&ledger, &alice, FEE_PERIOD_LENGTH).unwrap(), 0);
        assert_eq!(effective_debt_ratio_for_period(&ledger, &alice, 2).unwrap(), 0);
    }

    #[test]
    fn test_ratios_follow_share_split() {
        let (ledger, alice, bob) = ledger_with_two_holders();
        assert_eq!(effective_debt_ratio_for_period(&ledger, &alice, 1).unwrap(), 250_000);
        assert_eq!(effective_debt_ratio_for_period(&ledger, &bob, 1).unwrap(), 750_000);

        let owed = fees_available(&ledger, &alice, 0).unwrap();
        assert_eq!(owed, Entitlement { fees: 250, rewards: 100 });
        assert_eq!(total_fees_available(&ledger).unwrap(), Entitlement { fees: 1_000, rewards: 400 });
    }

    #[test]
    fn test_time_weighting_within_period() {
        let mut ledger = FeePeriodLedger::new(0, 255);
        let mut alice = OwnershipRecord::default();
        let mut bob = OwnershipRecord::default();

        alice.record_change(0, ledger.current_period(), ledger.ownership_index, 100, 100).unwrap();
        // Bob matches Alice halfway through the week
        ledger.accrue_ownership(WEEK / 2, 100).unwrap();
        bob.record_change(WEEK / 2, ledger.current_period(), ledger.ownership_index, 100, 200).unwrap();
        ledger.record_fee(4_000).unwrap();
        ledger.close_current_period(WEEK, WEEK, 200).unwrap();

        // Alice: all of the first half, half of the second
        assert_eq!(effective_debt_ratio_for_period(&ledger, &alice, 1).unwrap(), 750_000);
        assert_eq!(effective_debt_ratio_for_period(&ledger, &bob, 1).unwrap(), 250_000);
        assert_eq!(fees_available(&ledger, &bob, 0).unwrap().fees, 1_000);
    }

    #[test]
    fn test_claimed_periods_are_skipped() {
        let (ledger, alice, _) = ledger_with_two_holders();
        let closed_id = ledger.period(1).unwrap().fee_period_id;
        assert!(fees_available(&ledger, &alice, closed_id).unwrap().is_zero());
    }
}
