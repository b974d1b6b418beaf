//! Seams to the collaborators the core reads from: rates, suspension
//! flags and delegate approvals. Engine functions take these as traits so
//! they can run against account state on chain and against plain values in tests.

use solana_program::pubkey::Pubkey;

use crate::{
    error::FeePoolError,
    state::{AssetKey, FeePoolSettings, RateFeed, SystemSection, SystemStatus, COLLATERAL_ASSET, TOTAL_DEBT_ASSET},
};

/// Current value and freshness of one asset key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateReading {
    pub rate: u64,
    pub is_stale: bool,
}

pub trait RateOracle {
    /// `None` when the oracle does not know the key
    fn rate_for(&self, key: &AssetKey) -> Option<RateReading>;
}

pub trait SuspensionRegistry {
    fn is_suspended(&self, section: SystemSection) -> bool;

    /// Fail with the first suspended section in `sections`
    fn require_active(&self, sections: &[SystemSection]) -> Result<(), FeePoolError> {
        match sections.iter().find(|s| self.is_suspended(**s)) {
            Some(section) => Err(section.suspended_error()),
            None => Ok(()),
        }
    }
}

pub trait DelegateApprovals {
    fn can_claim_for(&self, authoriser: &Pubkey, delegate: &Pubkey) -> bool;
}

impl SuspensionRegistry for SystemStatus {
    fn is_suspended(&self, section: SystemSection) -> bool {
        self.suspension(section).suspended
    }
}

/// The two feeds the core consumes, read at a fixed time
pub struct FeedOracle<'a> {
    pub collateral: &'a RateFeed,
    pub total_debt: &'a RateFeed,
    pub now: i64,
    pub rate_stale_period: i64,
    pub debt_snapshot_stale_time: i64,
}

impl<'a> FeedOracle<'a> {
    pub fn new(collateral: &'a RateFeed, total_debt: &'a RateFeed, settings: &FeePoolSettings, now: i64) -> Self {
        Self {
            collateral,
            total_debt,
            now,
            rate_stale_period: settings.rate_stale_period,
            debt_snapshot_stale_time: settings.debt_snapshot_stale_time,
        }
    }
}

impl RateOracle for FeedOracle<'_> {
    fn rate_for(&self, key: &AssetKey) -> Option<RateReading> {
        let (feed, stale_period) = if *key == COLLATERAL_ASSET {
            (self.collateral, self.rate_stale_period)
        } else if *key == TOTAL_DEBT_ASSET {
            (self.total_debt, self.debt_snapshot_stale_time)
        } else {
            return None;
        };

        if feed.asset_key != *key {
            return None;
        }

        Some(RateReading {
            rate: feed.rate,
            is_stale: feed.is_stale(self.now, stale_period),
        })
    }
}
