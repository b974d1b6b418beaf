//! Event logging for native Solana
//!
//! Events are written as three log lines: a marker, the event type and the
//! base58-encoded Borsh payload, so indexers can decode them from tx logs.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

/// Event type discriminator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq)]
pub enum EventType {
    // Ledger events
    FeePeriodClosed = 1,
    FeePeriodImported = 2,

    // Claim events
    FeesClaimed = 10,

    // Liquidation events
    AccountFlaggedForLiquidation = 20,
    AccountRemovedFromLiquidation = 21,
    AccountLiquidated = 22,

    // Reward pool events
    RewardsDeposited = 30,
    RewardPaid = 31,
}

pub trait Event: BorshSerialize {
    fn event_type() -> EventType;

    fn emit(&self) {
        msg!("FEE_POOL_EVENT");
        msg!("TYPE:{:?}", Self::event_type());

        if let Ok(data) = self.try_to_vec() {
            msg!("DATA:{}", bs58::encode(&data).into_string());
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct FeePeriodClosed {
    pub fee_period_id: u64,
    pub closed_at: i64,
}

impl Event for FeePeriodClosed {
    fn event_type() -> EventType {
        EventType::FeePeriodClosed
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct FeePeriodImported {
    pub index: u8,
    pub fee_period_id: u64,
}

impl Event for FeePeriodImported {
    fn event_type() -> EventType {
        EventType::FeePeriodImported
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct FeesClaimed {
    pub account: Pubkey,
    pub fees: u64,
    pub rewards: u64,
}

impl Event for FeesClaimed {
    fn event_type() -> EventType {
        EventType::FeesClaimed
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct AccountFlaggedForLiquidation {
    pub account: Pubkey,
    pub deadline: i64,
}

impl Event for AccountFlaggedForLiquidation {
    fn event_type() -> EventType {
        EventType::AccountFlaggedForLiquidation
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct AccountRemovedFromLiquidation {
    pub account: Pubkey,
    pub time: i64,
}

impl Event for AccountRemovedFromLiquidation {
    fn event_type() -> EventType {
        EventType::AccountRemovedFromLiquidation
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct AccountLiquidated {
    pub account: Pubkey,
    pub collateral_redeemed: u64,
    pub debt_removed: u64,
    pub liquidator: Pubkey,
    pub is_self: bool,
}

impl Event for AccountLiquidated {
    fn event_type() -> EventType {
        EventType::AccountLiquidated
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct RewardsDeposited {
    pub amount: u64,
}

impl Event for RewardsDeposited {
    fn event_type() -> EventType {
        EventType::RewardsDeposited
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct RewardPaid {
    pub account: Pubkey,
    pub amount: u64,
}

impl Event for RewardPaid {
    fn event_type() -> EventType {
        EventType::RewardPaid
    }
}
