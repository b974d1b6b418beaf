use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::state::{AccountState, OwnershipRecord, RewardCheckpoint};

/// Per-owner debt share, collateral and entitlement bookkeeping
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct StakerAccount {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Wallet that owns this position
    pub owner: Pubkey,

    /// Debt share balance as last reported by the issuer
    pub debt_shares: u64,

    /// Collateral held in the collateral vault for this owner
    pub collateral: u64,

    /// Id of the most recently closed period at the last claim
    pub last_fee_withdrawal: u64,

    /// Position in the liquidation reward pool
    pub rewards: RewardCheckpoint,

    /// Ownership history used for fee entitlement
    pub ownership: OwnershipRecord,

    /// Creation timestamp
    pub created_at: i64,
}

impl AccountState for StakerAccount {
    const DISCRIMINATOR: [u8; 8] = [83, 84, 65, 75, 69, 82, 95, 95]; // "STAKER__"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        32 + // owner
        8 + // debt_shares
        8 + // collateral
        8 + // last_fee_withdrawal
        RewardCheckpoint::LEN + // rewards
        OwnershipRecord::LEN + // ownership
        8 + // created_at
        64; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl StakerAccount {
    pub fn new(owner: Pubkey, bump: u8, now: i64) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            owner,
            debt_shares: 0,
            collateral: 0,
            last_fee_withdrawal: 0,
            rewards: RewardCheckpoint::default(),
            ownership: OwnershipRecord::default(),
            created_at: now,
        }
    }
}
