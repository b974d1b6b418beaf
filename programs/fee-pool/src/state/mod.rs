pub mod config;
pub mod debt_registry;
pub mod delegate;
pub mod fee_period;
pub mod liquidation_book;
pub mod ownership;
pub mod rate_feed;
pub mod reward_pool;
pub mod staker;
pub mod system_status;

pub use config::*;
pub use debt_registry::*;
pub use delegate::*;
pub use fee_period::*;
pub use liquidation_book::*;
pub use ownership::*;
pub use rate_feed::*;
pub use reward_pool::*;
pub use staker::*;
pub use system_status::*;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::FeePoolError;

/// Common shape of every program-owned account
pub trait AccountState: BorshSerialize + BorshDeserialize {
    const DISCRIMINATOR: [u8; 8];
    const LEN: usize;

    fn discriminator(&self) -> [u8; 8];
    fn is_initialized(&self) -> bool;

    fn validate(&self) -> Result<(), FeePoolError> {
        if self.discriminator() != Self::DISCRIMINATOR {
            return Err(FeePoolError::InvalidDiscriminator);
        }
        if !self.is_initialized() {
            return Err(FeePoolError::NotInitialized);
        }
        Ok(())
    }
}
