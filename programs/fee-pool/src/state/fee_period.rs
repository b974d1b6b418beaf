use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    error::FeePoolError,
    math::{checked_add, PRECISE_UNIT},
    state::AccountState,
};

/// Number of retained periods, including the open one at index 0
pub const FEE_PERIOD_LENGTH: usize = 4;

pub const MIN_FEE_PERIOD_DURATION: i64 = 86_400; // 1 day
pub const MAX_FEE_PERIOD_DURATION: i64 = 60 * 86_400; // 60 days
pub const DEFAULT_FEE_PERIOD_DURATION: i64 = 7 * 86_400; // 1 week

/// Historical periods can be imported only this long after initialization
pub const SETUP_WINDOW: i64 = 4 * 7 * 86_400;

/// One fee period slot
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeePeriod {
    /// Monotonic period id, 0 marks an empty slot
    pub fee_period_id: u64,

    /// Period start (unix timestamp)
    pub start_time: i64,

    /// Length in seconds, set when the period closes
    pub duration: i64,

    /// Fees (USD, 6 decimals)
    pub fees_to_distribute: u64,
    pub fees_claimed: u64,

    /// Staking rewards (6 decimals)
    pub rewards_to_distribute: u64,
    pub rewards_claimed: u64,

    /// Ownership accumulator when the period opened
    pub starting_ownership_index: u128,

    /// Ownership accumulator when the period closed
    pub closing_ownership_index: u128,

    /// Seconds inside the period during which debt shares existed
    pub covered_seconds: u64,
}

impl FeePeriod {
    pub const LEN: usize = 8 + // fee_period_id
        8 + // start_time
        8 + // duration
        8 + // fees_to_distribute
        8 + // fees_claimed
        8 + // rewards_to_distribute
        8 + // rewards_claimed
        16 + // starting_ownership_index
        16 + // closing_ownership_index
        8; // covered_seconds

    pub fn open(fee_period_id: u64, start_time: i64, ownership_index: u128) -> Self {
        Self {
            fee_period_id,
            start_time,
            starting_ownership_index: ownership_index,
            closing_ownership_index: ownership_index,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fee_period_id == 0
    }

    pub fn unclaimed_fees(&self) -> u64 {
        self.fees_to_distribute.saturating_sub(self.fees_claimed)
    }

    pub fn unclaimed_rewards(&self) -> u64 {
        self.rewards_to_distribute.saturating_sub(self.rewards_claimed)
    }

    /// Mark fees and rewards as paid out of this period
    pub fn record_claim(&mut self, fees: u64, rewards: u64) -> Result<(), FeePoolError> {
        let fees_claimed = checked_add(self.fees_claimed, fees)?;
        let rewards_claimed = checked_add(self.rewards_claimed, rewards)?;
        if fees_claimed > self.fees_to_distribute || rewards_claimed > self.rewards_to_distribute {
            return Err(FeePoolError::ClaimExceedsDistributable);
        }
        self.fees_claimed = fees_claimed;
        self.rewards_claimed = rewards_claimed;
        Ok(())
    }
}

/// Fixed-depth rotating window of fee periods.
///
/// Logical index 0 is the open period, 1 the most recently closed and
/// `FEE_PERIOD_LENGTH - 1` the oldest retained one. Closing rotates the
/// window by moving `current_index` back one slot, so no period is copied.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct FeePeriodLedger {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Ring buffer storage
    pub periods: [FeePeriod; FEE_PERIOD_LENGTH],

    /// Storage slot of the open period
    pub current_index: u8,

    /// Cumulative seconds per debt share (PRECISE_UNIT scaled)
    pub ownership_index: u128,

    /// Scaled seconds (PRECISE_UNIT) not yet credited to the accumulator
    /// because they did not divide evenly over the share supply
    pub ownership_carry: u128,

    /// Seconds with non-zero debt shares since the open period started
    pub open_covered_seconds: u64,

    /// Last time the ownership accumulator advanced
    pub last_accrual_time: i64,

    /// Historical imports are rejected at or after this time
    pub setup_expiry_time: i64,

    /// Stats
    pub total_periods_closed: u64,
}

impl AccountState for FeePeriodLedger {
    const DISCRIMINATOR: [u8; 8] = [70, 69, 69, 95, 76, 69, 68, 71]; // "FEE_LEDG"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        FeePeriod::LEN * FEE_PERIOD_LENGTH + // periods
        1 + // current_index
        16 + // ownership_index
        16 + // ownership_carry
        8 + // open_covered_seconds
        8 + // last_accrual_time
        8 + // setup_expiry_time
        8 + // total_periods_closed
        64; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl FeePeriodLedger {
    /// Create a ledger whose first open period has id 1
    pub fn new(now: i64, bump: u8) -> Self {
        let mut periods = [FeePeriod::default(); FEE_PERIOD_LENGTH];
        periods[0] = FeePeriod::open(1, now, 0);

        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            periods,
            current_index: 0,
            ownership_index: 0,
            ownership_carry: 0,
            open_covered_seconds: 0,
            last_accrual_time: now,
            setup_expiry_time: now.saturating_add(SETUP_WINDOW),
            total_periods_closed: 0,
        }
    }

    fn slot(&self, index: usize) -> usize {
        (self.current_index as usize + index) % FEE_PERIOD_LENGTH
    }

    /// Period at logical index (0 = open)
    pub fn period(&self, index: usize) -> Result<&FeePeriod, FeePoolError> {
        if index >= FEE_PERIOD_LENGTH {
            return Err(FeePoolError::InvalidPeriodIndex);
        }
        Ok(&self.periods[self.slot(index)])
    }

    pub fn period_mut(&mut self, index: usize) -> Result<&mut FeePeriod, FeePoolError> {
        if index >= FEE_PERIOD_LENGTH {
            return Err(FeePoolError::InvalidPeriodIndex);
        }
        let slot = self.slot(index);
        Ok(&mut self.periods[slot])
    }

    pub fn current_period(&self) -> &FeePeriod {
        &self.periods[self.slot(0)]
    }

    /// Retained periods in logical order, open period first
    pub fn recent_periods(&self) -> impl Iterator<Item = &FeePeriod> + '_ {
        (0..FEE_PERIOD_LENGTH).map(move |i| &self.periods[self.slot(i)])
    }

    pub fn record_fee(&mut self, amount: u64) -> Result<(), FeePoolError> {
        let slot = self.slot(0);
        let period = &mut self.periods[slot];
        period.fees_to_distribute = checked_add(period.fees_to_distribute, amount)?;
        Ok(())
    }

    pub fn record_reward(&mut self, amount: u64) -> Result<(), FeePoolError> {
        let slot = self.slot(0);
        let period = &mut self.periods[slot];
        period.rewards_to_distribute = checked_add(period.rewards_to_distribute, amount)?;
        Ok(())
    }

    /// Advance the ownership accumulator to `now` using the share supply
    /// that has been in force since the last accrual.
    pub fn accrue_ownership(&mut self, now: i64, total_debt_shares: u64) -> Result<(), FeePoolError> {
        if now <= self.last_accrual_time {
            return Ok(());
        }
        let elapsed = (now - self.last_accrual_time) as u64;

        if total_debt_shares > 0 {
            let pending = (elapsed as u128)
                .checked_mul(PRECISE_UNIT)
                .and_then(|scaled| scaled.checked_add(self.ownership_carry))
                .ok_or(FeePoolError::ArithmeticOverflow)?;
            let shares = total_debt_shares as u128;
            let increment = pending / shares;
            self.ownership_carry = pending % shares;
            self.ownership_index = self
                .ownership_index
                .checked_add(increment)
                .ok_or(FeePoolError::ArithmeticOverflow)?;
            self.open_covered_seconds = checked_add(self.open_covered_seconds, elapsed)?;
        }

        self.last_accrual_time = now;
        Ok(())
    }

    /// Local close path: anyone may close once the configured duration has elapsed
    pub fn close_current_period(
        &mut self,
        now: i64,
        fee_period_duration: i64,
        total_debt_shares: u64,
    ) -> Result<u64, FeePoolError> {
        if fee_period_duration <= 0 {
            return Err(FeePoolError::FeePeriodDurationNotSet);
        }

        let start_time = self.current_period().start_time;
        if now < start_time.saturating_add(fee_period_duration) {
            return Err(FeePoolError::FeePeriodNotElapsed);
        }

        self.rotate(now, now - start_time, total_debt_shares)
    }

    /// Relayer close path: the companion ledger owns the timer, so no
    /// elapsed-time check. The configured duration must still be set; a zero
    /// `period_duration` defers to it.
    pub fn close_from_relayer(
        &mut self,
        now: i64,
        fee_period_id: u64,
        period_duration: i64,
        fee_period_duration: i64,
        total_debt_shares: u64,
    ) -> Result<u64, FeePoolError> {
        if fee_period_duration <= 0 {
            return Err(FeePoolError::FeePeriodDurationNotSet);
        }
        if fee_period_id != self.current_period().fee_period_id {
            return Err(FeePoolError::FeePeriodIdMismatch);
        }

        let duration = if period_duration > 0 {
            period_duration
        } else {
            fee_period_duration
        };

        self.rotate(now, duration, total_debt_shares)
    }

    fn rotate(&mut self, now: i64, duration: i64, total_debt_shares: u64) -> Result<u64, FeePoolError> {
        self.accrue_ownership(now, total_debt_shares)?;

        let open_slot = self.slot(0);
        let closed_id = {
            let open = &mut self.periods[open_slot];
            open.duration = duration;
            open.closing_ownership_index = self.ownership_index;
            open.covered_seconds = self.open_covered_seconds;
            open.fee_period_id
        };
        let next_id = closed_id.checked_add(1).ok_or(FeePoolError::ArithmeticOverflow)?;

        // The oldest slot is about to be reused; its unclaimed remainder
        // moves into the period that becomes the new oldest.
        let dropped_slot = self.slot(FEE_PERIOD_LENGTH - 1);
        let dropped = self.periods[dropped_slot];
        if !dropped.is_empty() {
            let heir_slot = self.slot(FEE_PERIOD_LENGTH - 2);
            let heir = &mut self.periods[heir_slot];
            heir.fees_to_distribute = checked_add(heir.fees_to_distribute, dropped.unclaimed_fees())?;
            heir.rewards_to_distribute =
                checked_add(heir.rewards_to_distribute, dropped.unclaimed_rewards())?;
        }

        self.current_index = dropped_slot as u8;
        self.periods[dropped_slot] = FeePeriod::open(next_id, now, self.ownership_index);
        self.open_covered_seconds = 0;
        self.total_periods_closed = self.total_periods_closed.saturating_add(1);

        Ok(closed_id)
    }

    /// Overwrite one slot with migrated history. Ownership bookkeeping of the
    /// slot is kept, so imported closed periods only pay out after rolling
    /// into a period with recorded ownership.
    #[allow(clippy::too_many_arguments)]
    pub fn import_fee_period(
        &mut self,
        now: i64,
        index: usize,
        fee_period_id: u64,
        start_time: i64,
        fees_to_distribute: u64,
        fees_claimed: u64,
        rewards_to_distribute: u64,
        rewards_claimed: u64,
    ) -> Result<(), FeePoolError> {
        if now >= self.setup_expiry_time {
            return Err(FeePoolError::SetupWindowClosed);
        }
        if fees_claimed > fees_to_distribute || rewards_claimed > rewards_to_distribute {
            return Err(FeePoolError::ClaimExceedsDistributable);
        }

        let period = self.period_mut(index)?;
        *period = FeePeriod {
            fee_period_id,
            start_time,
            fees_to_distribute,
            fees_claimed,
            rewards_to_distribute,
            rewards_claimed,
            ..*period
        };
        Ok(())
    }
}
