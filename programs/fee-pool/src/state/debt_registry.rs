use borsh::{BorshDeserialize, BorshSerialize};

use crate::state::AccountState;

/// Mirror of the external debt share supply
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct DebtShareRegistry {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Sum of all staker balances
    pub total_debt_shares: u64,

    /// Number of staker accounts created
    pub staker_count: u64,

    /// Last change timestamp
    pub last_update: i64,
}

impl AccountState for DebtShareRegistry {
    const DISCRIMINATOR: [u8; 8] = [68, 69, 66, 84, 95, 82, 69, 71]; // "DEBT_REG"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        8 + // total_debt_shares
        8 + // staker_count
        8 + // last_update
        32; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl DebtShareRegistry {
    pub fn new(bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            total_debt_shares: 0,
            staker_count: 0,
            last_update: 0,
        }
    }
}
