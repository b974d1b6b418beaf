// Fee period ledger, entitlement claims, liquidations and liquidation reward pool
// Native Solana implementation - NO ANCHOR

use solana_program::entrypoint;

pub mod engine;
pub mod error;
pub mod events;
pub mod instruction;
pub mod interfaces;
pub mod math;
pub mod pda;
pub mod processor;
pub mod state;

pub use processor::process_instruction;

// Declare program ID
solana_program::declare_id!("FeePoo11111111111111111111111111111111111111");

#[cfg(not(feature = "no-entrypoint"))]
entrypoint!(process_instruction);
