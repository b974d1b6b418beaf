use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    error::FeePoolError,
    math::{mul_div, UNIT},
    state::FeePeriod,
};

/// Maximum retained ownership entries per account
pub const OWNERSHIP_HISTORY_DEPTH: usize = 6;

/// Snapshot of an account's debt share position, written on every change
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnershipEntry {
    /// Time of the change
    pub timestamp: i64,

    /// Fee period that was open at the time of the change
    pub fee_period_id: u64,

    /// Balance after the change
    pub debt_shares: u64,

    /// Share of total debt after the change (6 decimals)
    pub debt_share_fraction: u64,

    /// Ledger ownership accumulator at the time of the change
    pub ownership_index: u128,

    /// Share-seconds (PRECISE_UNIT scaled) accrued inside this entry's
    /// period before `ownership_index` was taken
    pub carried_share_seconds: u128,
}

impl OwnershipEntry {
    pub const LEN: usize = 8 + 8 + 8 + 8 + 16 + 16;
}

/// Bounded append log of ownership entries, oldest first. Holds at most one
/// entry per fee period; a later change in the same period folds into it.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipRecord {
    pub entries: Vec<OwnershipEntry>,
}

impl OwnershipRecord {
    pub const LEN: usize = 4 + OWNERSHIP_HISTORY_DEPTH * OwnershipEntry::LEN;

    pub fn latest(&self) -> Option<&OwnershipEntry> {
        self.entries.last()
    }

    /// Last recorded share of total debt; retained indefinitely for inactive accounts
    pub fn last_known_fraction(&self) -> u64 {
        self.latest().map(|e| e.debt_share_fraction).unwrap_or(0)
    }

    /// Append the position that holds from `now` on.
    ///
    /// `open_period` is the period open at `now` and `ownership_index` the
    /// ledger accumulator already advanced to `now`.
    pub fn record_change(
        &mut self,
        now: i64,
        open_period: &FeePeriod,
        ownership_index: u128,
        debt_shares: u64,
        total_debt_shares: u64,
    ) -> Result<(), FeePoolError> {
        let debt_share_fraction = if total_debt_shares == 0 {
            0
        } else {
            mul_div(debt_shares, UNIT, total_debt_shares)?
        };

        if let Some(last) = self.entries.last_mut() {
            if last.fee_period_id == open_period.fee_period_id {
                let elapsed = share_seconds(last.debt_shares, last.ownership_index, ownership_index)?;
                last.carried_share_seconds = last
                    .carried_share_seconds
                    .checked_add(elapsed)
                    .ok_or(FeePoolError::ArithmeticOverflow)?;
                last.timestamp = now;
                last.debt_shares = debt_shares;
                last.debt_share_fraction = debt_share_fraction;
                last.ownership_index = ownership_index;
                return Ok(());
            }
        }

        let previous_shares = self.latest().map(|e| e.debt_shares).unwrap_or(0);
        let carried_share_seconds = share_seconds(
            previous_shares,
            open_period.starting_ownership_index,
            ownership_index,
        )?;

        self.entries.push(OwnershipEntry {
            timestamp: now,
            fee_period_id: open_period.fee_period_id,
            debt_shares,
            debt_share_fraction,
            ownership_index,
            carried_share_seconds,
        });

        if self.entries.len() > OWNERSHIP_HISTORY_DEPTH {
            self.entries.remove(0);
        }

        Ok(())
    }

    /// Share-seconds (PRECISE_UNIT scaled) the account held during a closed period
    pub fn share_seconds_in(&self, period: &FeePeriod) -> Result<u128, FeePoolError> {
        if period.is_empty() {
            return Ok(0);
        }

        if let Some(entry) = self
            .entries
            .iter()
            .rev()
            .find(|e| e.fee_period_id == period.fee_period_id)
        {
            let tail = share_seconds(
                entry.debt_shares,
                entry.ownership_index,
                period.closing_ownership_index,
            )?;
            return entry
                .carried_share_seconds
                .checked_add(tail)
                .ok_or(FeePoolError::ArithmeticOverflow);
        }

        // No change during the period: the last earlier position held throughout
        match self
            .entries
            .iter()
            .rev()
            .find(|e| e.fee_period_id < period.fee_period_id)
        {
            Some(entry) => share_seconds(
                entry.debt_shares,
                period.starting_ownership_index,
                period.closing_ownership_index,
            ),
            None => Ok(0),
        }
    }
}

fn share_seconds(shares: u64, from_index: u128, to_index: u128) -> Result<u128, FeePoolError> {
    (shares as u128)
        .checked_mul(to_index.saturating_sub(from_index))
        .ok_or(FeePoolError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::PRECISE_UNIT;

    fn period(id: u64, start: u128, close: u128) -> FeePeriod {
        FeePeriod {
            fee_period_id: id,
            starting_ownership_index: start,
            closing_ownership_index: close,
            ..FeePeriod::default()
        }
    }

    #[test]
    fn test_change_within_same_period_folds_into_one_entry() {
        let mut record = OwnershipRecord::default();
        let open = period(1, 0, 0);
        record.record_change(10, &open, 0, 100, 100).unwrap();
        record.record_change(20, &open, 10 * PRECISE_UNIT / 100, 50, 50).unwrap();

        assert_eq!(record.entries.len(), 1);
        let entry = record.latest().unwrap();
        assert_eq!(entry.debt_shares, 50);
        assert_eq!(entry.debt_share_fraction, UNIT);
        assert_eq!(entry.carried_share_seconds, 10 * PRECISE_UNIT);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut record = OwnershipRecord::default();
        for id in 1..=10u64 {
            record.record_change(id as i64, &period(id, 0, 0), 0, id, 100).unwrap();
        }
        assert_eq!(record.entries.len(), OWNERSHIP_HISTORY_DEPTH);
        assert_eq!(record.entries[0].fee_period_id, 5);
        assert_eq!(record.latest().unwrap().fee_period_id, 10);
    }

    #[test]
    fn test_inactive_account_keeps_last_position() {
        let mut record = OwnershipRecord::default();
        record.record_change(0, &period(1, 0, 0), 0, 25, 100).unwrap();
        assert_eq!(record.last_known_fraction(), 250_000);

        // Period 3 saw no change by this account
        let later = period(3, 5 * PRECISE_UNIT, 9 * PRECISE_UNIT);
        assert_eq!(record.share_seconds_in(&later).unwrap(), 25 * 4 * PRECISE_UNIT);
    }

    #[test]
    fn test_share_seconds_before_first_entry_is_zero() {
        let mut record = OwnershipRecord::default();
        record.record_change(0, &period(4, 0, 0), 0, 25, 100).unwrap();
        assert_eq!(record.share_seconds_in(&period(3, 0, PRECISE_UNIT)).unwrap(), 0);
    }
}
