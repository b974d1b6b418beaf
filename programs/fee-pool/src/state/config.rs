use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    error::FeePoolError,
    math::{mul_div, multiply_decimal, UNIT},
    state::{AccountState, DEFAULT_FEE_PERIOD_DURATION, MAX_FEE_PERIOD_DURATION, MIN_FEE_PERIOD_DURATION},
};

pub const MAX_ISSUANCE_RATIO: u64 = UNIT;
pub const MAX_TARGET_THRESHOLD: u64 = UNIT / 2;
pub const MAX_LIQUIDATION_PENALTY: u64 = UNIT;
pub const MAX_LIQUIDATION_DELAY: i64 = 30 * 86_400;

/// Program-wide configuration and roles
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct FeePoolConfig {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized flag
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Authority that can update config, suspend sections and import history
    pub authority: Pubkey,

    /// Cross-domain relayer allowed to close periods with an explicit id and duration
    pub relayer: Pubkey,

    /// Debt share issuer whose signature vouches for balance changes
    pub issuer: Pubkey,

    /// Signer that records fees and rewards into the open period
    pub fee_recorder: Pubkey,

    /// Signer that submits rates to feeds
    pub oracle_authority: Pubkey,

    /// Token vaults owned by the vault authority PDA
    pub fee_vault: Pubkey,
    pub reward_vault: Pubkey,
    pub collateral_vault: Pubkey,

    /// Vault authority PDA bump
    pub vault_authority_bump: u8,

    /// Tunable settings
    pub settings: FeePoolSettings,

    /// Last update timestamp
    pub last_update: i64,
}

/// Tunable settings. Ratios, penalties and thresholds use 6 decimals
/// (500_000 = 0.5); ratios are debt over collateral value.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePoolSettings {
    /// Seconds per fee period, 0 = unset
    pub fee_period_duration: i64,

    /// Target debt/collateral ratio (default: 0.2), 0 = unset
    pub issuance_ratio: u64,

    /// Buffer above the issuance ratio within which fees stay claimable (default: 0.01)
    pub target_threshold: u64,

    /// Ratio above which accounts can be flagged (default: 0.5), 0 = unset
    pub liquidation_ratio: u64,

    /// Seconds between flag and liquidation (default: 8 hours)
    pub liquidation_delay: i64,

    /// Collateral bonus on third-party liquidation (default: 0.3)
    pub liquidation_penalty: u64,

    /// Collateral bonus on self liquidation (default: 0.2)
    pub self_liquidation_penalty: u64,

    /// Paid to the flagger from redeemed collateral
    pub flag_reward: u64,

    /// Paid to the liquidator from redeemed collateral
    pub liquidate_reward: u64,

    /// Maximum age of the collateral rate in seconds
    pub rate_stale_period: i64,

    /// Maximum age of the total debt snapshot in seconds
    pub debt_snapshot_stale_time: i64,
}

impl Default for FeePoolSettings {
    fn default() -> Self {
        Self {
            fee_period_duration: DEFAULT_FEE_PERIOD_DURATION,
            issuance_ratio: 200_000,
            target_threshold: 10_000,
            liquidation_ratio: 500_000,
            liquidation_delay: 8 * 3_600,
            liquidation_penalty: 300_000,
            self_liquidation_penalty: 200_000,
            flag_reward: 10 * UNIT,
            liquidate_reward: 20 * UNIT,
            rate_stale_period: 25 * 3_600,
            debt_snapshot_stale_time: 25 * 3_600,
        }
    }
}

impl FeePoolSettings {
    pub const LEN: usize = 8 + // fee_period_duration
        8 + // issuance_ratio
        8 + // target_threshold
        8 + // liquidation_ratio
        8 + // liquidation_delay
        8 + // liquidation_penalty
        8 + // self_liquidation_penalty
        8 + // flag_reward
        8 + // liquidate_reward
        8 + // rate_stale_period
        8; // debt_snapshot_stale_time

    pub fn validate(&self) -> Result<(), FeePoolError> {
        if self.fee_period_duration != 0
            && !(MIN_FEE_PERIOD_DURATION..=MAX_FEE_PERIOD_DURATION).contains(&self.fee_period_duration)
        {
            return Err(FeePoolError::InvalidSettings);
        }

        if self.issuance_ratio > MAX_ISSUANCE_RATIO || self.target_threshold > MAX_TARGET_THRESHOLD {
            return Err(FeePoolError::InvalidSettings);
        }

        if self.liquidation_penalty > MAX_LIQUIDATION_PENALTY
            || self.self_liquidation_penalty > MAX_LIQUIDATION_PENALTY
        {
            return Err(FeePoolError::InvalidSettings);
        }

        if !(0..=MAX_LIQUIDATION_DELAY).contains(&self.liquidation_delay) {
            return Err(FeePoolError::InvalidSettings);
        }

        if self.rate_stale_period <= 0 || self.debt_snapshot_stale_time <= 0 {
            return Err(FeePoolError::InvalidSettings);
        }

        if self.liquidation_ratio != 0 {
            // Liquidation must leave room for the penalty: ratio * (1 + penalty) <= 1
            let with_penalty = multiply_decimal(self.liquidation_ratio, UNIT + self.liquidation_penalty)?;
            if with_penalty > UNIT || self.liquidation_ratio <= self.issuance_ratio {
                return Err(FeePoolError::InvalidSettings);
            }
        }

        if self.issuance_ratio != 0 {
            // (1 + penalty) * issuance ratio < 1 keeps the amount-to-fix divisor positive
            for penalty in [self.liquidation_penalty, self.self_liquidation_penalty] {
                if multiply_decimal(UNIT + penalty, self.issuance_ratio)? >= UNIT {
                    return Err(FeePoolError::InvalidSettings);
                }
            }
        }

        Ok(())
    }

    pub fn require_fee_period_duration(&self) -> Result<i64, FeePoolError> {
        if self.fee_period_duration == 0 {
            return Err(FeePoolError::FeePeriodDurationNotSet);
        }
        Ok(self.fee_period_duration)
    }

    pub fn require_issuance_ratio(&self) -> Result<u64, FeePoolError> {
        if self.issuance_ratio == 0 {
            return Err(FeePoolError::IssuanceRatioNotSet);
        }
        Ok(self.issuance_ratio)
    }

    pub fn require_liquidation_ratio(&self) -> Result<u64, FeePoolError> {
        if self.liquidation_ratio == 0 {
            return Err(FeePoolError::LiquidationRatioNotSet);
        }
        Ok(self.liquidation_ratio)
    }

    /// Worst ratio at which fees can still be claimed: issuance ratio * (1 + threshold)
    pub fn claimable_ratio_limit(&self) -> Result<u64, FeePoolError> {
        let issuance_ratio = self.require_issuance_ratio()?;
        mul_div(issuance_ratio, UNIT + self.target_threshold, UNIT)
    }
}

impl AccountState for FeePoolConfig {
    const DISCRIMINATOR: [u8; 8] = [70, 69, 69, 95, 67, 79, 78, 70]; // "FEE_CONF"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        32 + // authority
        32 + // relayer
        32 + // issuer
        32 + // fee_recorder
        32 + // oracle_authority
        32 * 3 + // vaults
        1 + // vault_authority_bump
        FeePoolSettings::LEN + // settings
        8 + // last_update
        128; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl FeePoolConfig {
    /// New config with every role assigned to `authority`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        authority: Pubkey,
        bump: u8,
        fee_vault: Pubkey,
        reward_vault: Pubkey,
        collateral_vault: Pubkey,
        vault_authority_bump: u8,
        settings: FeePoolSettings,
        now: i64,
    ) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            authority,
            relayer: authority,
            issuer: authority,
            fee_recorder: authority,
            oracle_authority: authority,
            fee_vault,
            reward_vault,
            collateral_vault,
            vault_authority_bump,
            settings,
            last_update: now,
        }
    }

    pub fn require_authority(&self, signer: &Pubkey) -> Result<(), FeePoolError> {
        if self.authority != *signer {
            return Err(FeePoolError::InvalidAuthority);
        }
        Ok(())
    }
}
