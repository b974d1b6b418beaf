use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{interfaces::DelegateApprovals, state::AccountState};

/// Permission for `delegate` to claim fees on behalf of `authoriser`
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct DelegateApproval {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    pub authoriser: Pubkey,
    pub delegate: Pubkey,

    /// Claim permission, revocable by the authoriser
    pub can_claim: bool,
}

impl AccountState for DelegateApproval {
    const DISCRIMINATOR: [u8; 8] = [68, 69, 76, 69, 71, 65, 84, 69]; // "DELEGATE"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        32 + // authoriser
        32 + // delegate
        1 + // can_claim
        16; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl DelegateApproval {
    pub fn new(authoriser: Pubkey, delegate: Pubkey, can_claim: bool, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            authoriser,
            delegate,
            can_claim,
        }
    }
}

impl DelegateApprovals for DelegateApproval {
    fn can_claim_for(&self, authoriser: &Pubkey, delegate: &Pubkey) -> bool {
        self.can_claim && self.authoriser == *authoriser && self.delegate == *delegate
    }
}
