use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{error::FeePoolError, state::AccountState};

/// Liquidation counters. Entries themselves live in one PDA per account.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct LiquidationBook {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Entries currently open
    pub active_entries: u64,

    /// Stats
    pub total_flagged: u64,
    pub total_removed: u64,
    pub total_liquidated: u64,
}

impl AccountState for LiquidationBook {
    const DISCRIMINATOR: [u8; 8] = [76, 73, 81, 95, 66, 79, 79, 75]; // "LIQ_BOOK"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        8 + // active_entries
        8 + // total_flagged
        8 + // total_removed
        8 + // total_liquidated
        64; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl LiquidationBook {
    pub fn new(bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            active_entries: 0,
            total_flagged: 0,
            total_removed: 0,
            total_liquidated: 0,
        }
    }

    /// Open `entry` for its account. At most one open entry per account.
    pub fn open_entry(
        &mut self,
        entry: &mut LiquidationEntry,
        flagger: Pubkey,
        deadline: i64,
        now: i64,
    ) -> Result<(), FeePoolError> {
        if entry.is_active {
            return Err(FeePoolError::AccountAlreadyFlagged);
        }

        entry.is_active = true;
        entry.deadline = deadline;
        entry.flagger = flagger;
        entry.is_self = entry.account == flagger;
        entry.flagged_at = now;

        self.active_entries = self.active_entries.saturating_add(1);
        self.total_flagged = self.total_flagged.saturating_add(1);
        Ok(())
    }

    /// Resolve an open entry. Returns false when there was nothing to close.
    pub fn close_entry(&mut self, entry: &mut LiquidationEntry, was_liquidated: bool) -> bool {
        if !entry.is_active {
            return false;
        }
        entry.clear();

        self.active_entries = self.active_entries.saturating_sub(1);
        if was_liquidated {
            self.total_liquidated = self.total_liquidated.saturating_add(1);
        } else {
            self.total_removed = self.total_removed.saturating_add(1);
        }
        true
    }
}

/// Liquidation status of one account, stored at `[b"liquidation", account]`.
///
/// The account is created on the first flag and reused afterwards; `is_active`
/// tells whether an entry is currently open.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct LiquidationEntry {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Flagged staker
    pub account: Pubkey,

    /// Open entry
    pub is_active: bool,

    /// Liquidation opens at this time
    pub deadline: i64,

    /// Who flagged the account, paid the flag reward on resolution
    pub flagger: Pubkey,

    /// Flagged by the account itself
    pub is_self: bool,

    /// Flag timestamp
    pub flagged_at: i64,
}

impl AccountState for LiquidationEntry {
    const DISCRIMINATOR: [u8; 8] = [76, 73, 81, 95, 69, 78, 84, 82]; // "LIQ_ENTR"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        32 + // account
        1 + // is_active
        8 + // deadline
        32 + // flagger
        1 + // is_self
        8 + // flagged_at
        32; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl LiquidationEntry {
    /// A closed entry for `account`
    pub fn new(account: Pubkey, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            account,
            is_active: false,
            deadline: 0,
            flagger: Pubkey::default(),
            is_self: false,
            flagged_at: 0,
        }
    }

    pub fn deadline_passed(&self, now: i64) -> bool {
        now >= self.deadline
    }

    fn clear(&mut self) {
        self.is_active = false;
        self.deadline = 0;
        self.flagger = Pubkey::default();
        self.is_self = false;
        self.flagged_at = 0;
    }
}
