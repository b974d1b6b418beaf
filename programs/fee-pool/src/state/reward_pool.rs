use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    error::FeePoolError,
    math::{checked_add, checked_sub, from_per_share, per_share, to_u64},
    state::AccountState,
};

/// Per-account position in the reward accumulator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardCheckpoint {
    /// Accumulator value at the last checkpoint
    pub last_checkpoint: u128,

    /// Earned but not yet paid
    pub accrued_unclaimed: u64,
}

impl RewardCheckpoint {
    pub const LEN: usize = 16 + 8;
}

/// Liquidation proceeds vesting to debt share holders.
///
/// Proceeds stay in the collateral vault; this account only tracks how much
/// of the vault belongs to the pool and how it is split across holders.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct RewardPool {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Rewards per debt share (PRECISE_UNIT scaled), never decreases
    pub accumulated_reward_per_share: u128,

    /// Deposited while no debt shares existed; distributed with the next deposit
    pub undistributed: u64,

    /// Tokens held for holders and not yet paid out
    pub balance: u64,

    /// Stats
    pub total_deposited: u64,
    pub total_paid: u64,
}

impl AccountState for RewardPool {
    const DISCRIMINATOR: [u8; 8] = [82, 87, 68, 95, 80, 79, 79, 76]; // "RWD_POOL"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        16 + // accumulated_reward_per_share
        8 + // undistributed
        8 + // balance
        8 + // total_deposited
        8 + // total_paid
        64; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl RewardPool {
    pub fn new(bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            accumulated_reward_per_share: 0,
            undistributed: 0,
            balance: 0,
            total_deposited: 0,
            total_paid: 0,
        }
    }

    /// Spread `amount` over the current debt share supply
    pub fn deposit(&mut self, amount: u64, total_debt_shares: u64) -> Result<(), FeePoolError> {
        if amount == 0 {
            return Ok(());
        }

        self.balance = checked_add(self.balance, amount)?;
        self.total_deposited = checked_add(self.total_deposited, amount)?;

        let distributable = checked_add(self.undistributed, amount)?;
        if total_debt_shares == 0 {
            self.undistributed = distributable;
            return Ok(());
        }

        let increment = per_share(distributable as u128, total_debt_shares)?;
        self.accumulated_reward_per_share = self
            .accumulated_reward_per_share
            .checked_add(increment)
            .ok_or(FeePoolError::ArithmeticOverflow)?;
        self.undistributed = 0;
        Ok(())
    }

    /// Earned amount at the current accumulator, including what was already checkpointed
    pub fn earned(&self, checkpoint: &RewardCheckpoint, share_balance: u64) -> Result<u64, FeePoolError> {
        let delta = self
            .accumulated_reward_per_share
            .saturating_sub(checkpoint.last_checkpoint);
        let pending = to_u64(from_per_share(share_balance, delta)?)?;
        checked_add(checkpoint.accrued_unclaimed, pending)
    }

    /// Must run before `share_balance` changes
    pub fn checkpoint(&self, checkpoint: &mut RewardCheckpoint, share_balance: u64) -> Result<(), FeePoolError> {
        checkpoint.accrued_unclaimed = self.earned(checkpoint, share_balance)?;
        checkpoint.last_checkpoint = self.accumulated_reward_per_share;
        Ok(())
    }

    /// Checkpoint, then release everything accrued. Returns the amount to pay.
    pub fn take_reward(&mut self, checkpoint: &mut RewardCheckpoint, share_balance: u64) -> Result<u64, FeePoolError> {
        self.checkpoint(checkpoint, share_balance)?;
        let amount = checkpoint.accrued_unclaimed;
        if amount == 0 {
            return Ok(0);
        }

        self.balance = checked_sub(self.balance, amount).map_err(|_| FeePoolError::RewardPoolInsufficient)?;
        self.total_paid = checked_add(self.total_paid, amount)?;
        checkpoint.accrued_unclaimed = 0;
        Ok(amount)
    }
}
