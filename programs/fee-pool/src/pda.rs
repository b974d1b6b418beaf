//! Program Derived Address (PDA) derivation functions

use solana_program::pubkey::Pubkey;

use crate::state::AssetKey;

/// PDA seed constants
pub mod seeds {
    pub const CONFIG: &[u8] = b"fee_pool_config";
    pub const SYSTEM_STATUS: &[u8] = b"system_status";
    pub const FEE_LEDGER: &[u8] = b"fee_ledger";
    pub const DEBT_REGISTRY: &[u8] = b"debt_registry";
    pub const REWARD_POOL: &[u8] = b"reward_pool";
    pub const LIQUIDATION_BOOK: &[u8] = b"liquidation_book";
    pub const LIQUIDATION_ENTRY: &[u8] = b"liquidation";
    pub const VAULT_AUTHORITY: &[u8] = b"vault_authority";
    pub const STAKER: &[u8] = b"staker";
    pub const RATE_FEED: &[u8] = b"rate_feed";
    pub const DELEGATE: &[u8] = b"delegate";
}

pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::CONFIG], program_id)
}

pub fn find_system_status_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::SYSTEM_STATUS], program_id)
}

pub fn find_fee_ledger_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::FEE_LEDGER], program_id)
}

pub fn find_debt_registry_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::DEBT_REGISTRY], program_id)
}

pub fn find_reward_pool_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::REWARD_POOL], program_id)
}

pub fn find_liquidation_book_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::LIQUIDATION_BOOK], program_id)
}

pub fn find_liquidation_entry_address(program_id: &Pubkey, account: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::LIQUIDATION_ENTRY, account.as_ref()], program_id)
}

/// Signs token transfers out of the vaults
pub fn find_vault_authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::VAULT_AUTHORITY], program_id)
}

pub fn find_staker_address(program_id: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::STAKER, owner.as_ref()], program_id)
}

pub fn find_rate_feed_address(program_id: &Pubkey, asset_key: &AssetKey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seeds::RATE_FEED, asset_key], program_id)
}

pub fn find_delegate_approval_address(
    program_id: &Pubkey,
    authoriser: &Pubkey,
    delegate: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[seeds::DELEGATE, authoriser.as_ref(), delegate.as_ref()],
        program_id,
    )
}

/// Addresses of every singleton account, derived once for instruction builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePoolAddresses {
    pub config: Pubkey,
    pub system_status: Pubkey,
    pub fee_ledger: Pubkey,
    pub debt_registry: Pubkey,
    pub reward_pool: Pubkey,
    pub liquidation_book: Pubkey,
    pub vault_authority: Pubkey,
    pub collateral_feed: Pubkey,
    pub debt_feed: Pubkey,
}

impl FeePoolAddresses {
    pub fn derive(program_id: &Pubkey) -> Self {
        Self {
            config: find_config_address(program_id).0,
            system_status: find_system_status_address(program_id).0,
            fee_ledger: find_fee_ledger_address(program_id).0,
            debt_registry: find_debt_registry_address(program_id).0,
            reward_pool: find_reward_pool_address(program_id).0,
            liquidation_book: find_liquidation_book_address(program_id).0,
            vault_authority: find_vault_authority_address(program_id).0,
            collateral_feed: find_rate_feed_address(program_id, &crate::state::COLLATERAL_ASSET).0,
            debt_feed: find_rate_feed_address(program_id, &crate::state::TOTAL_DEBT_ASSET).0,
        }
    }
}
