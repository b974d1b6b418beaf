pub mod claims;
pub mod collateral;
pub mod debt_shares;
pub mod entitlement;
pub mod liquidation;

pub use claims::*;
pub use collateral::*;
pub use debt_shares::*;
pub use entitlement::*;
pub use liquidation::*;
