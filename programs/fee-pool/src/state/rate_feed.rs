use borsh::{BorshDeserialize, BorshSerialize};
use crate::{error::FeePoolError, state::AccountState};

pub type AssetKey = [u8; 8];

/// Collateral token price in USD
pub const COLLATERAL_ASSET: AssetKey = *b"COLLATRL";

/// Total system debt in USD, published by the debt aggregator
pub const TOTAL_DEBT_ASSET: AssetKey = *b"TOTLDEBT";

/// Latest value pushed by the oracle authority for one asset key
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct RateFeed {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Asset this feed prices
    pub asset_key: AssetKey,

    /// Rate (6 decimals)
    pub rate: u64,

    /// Submission time
    pub updated_at: i64,

    /// Incremented on every submission
    pub round_id: u64,
}

impl AccountState for RateFeed {
    const DISCRIMINATOR: [u8; 8] = [82, 65, 84, 69, 95, 70, 68, 68]; // "RATE_FDD"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        8 + // asset_key
        8 + // rate
        8 + // updated_at
        8 + // round_id
        32; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl RateFeed {
    pub fn new(asset_key: AssetKey, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            asset_key,
            rate: 0,
            updated_at: 0,
            round_id: 0,
        }
    }

    pub fn submit(&mut self, rate: u64, now: i64) -> Result<(), FeePoolError> {
        self.rate = rate;
        self.updated_at = now;
        self.round_id = self.round_id.checked_add(1).ok_or(FeePoolError::ArithmeticOverflow)?;
        Ok(())
    }

    /// A feed is stale once it is older than `stale_period` or was never set
    pub fn is_stale(&self, now: i64, stale_period: i64) -> bool {
        self.round_id == 0 || now.saturating_sub(self.updated_at) > stale_period
    }
}

pub fn asset_key_to_string(key: &AssetKey) -> String {
    String::from_utf8_lossy(key).trim_end_matches('\0').to_string()
}
