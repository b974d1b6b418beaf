use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    pda::{
        find_delegate_approval_address, find_liquidation_entry_address, find_rate_feed_address, find_staker_address,
        FeePoolAddresses,
    },
    state::{AssetKey, FeePoolSettings},
};

/// Optional overrides for `FeePoolSettings`
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub fee_period_duration: Option<i64>,
    pub issuance_ratio: Option<u64>,
    pub target_threshold: Option<u64>,
    pub liquidation_ratio: Option<u64>,
    pub liquidation_delay: Option<i64>,
    pub liquidation_penalty: Option<u64>,
    pub self_liquidation_penalty: Option<u64>,
    pub flag_reward: Option<u64>,
    pub liquidate_reward: Option<u64>,
    pub rate_stale_period: Option<i64>,
    pub debt_snapshot_stale_time: Option<i64>,
}

/// Optional role reassignments
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RolesUpdate {
    pub authority: Option<Pubkey>,
    pub relayer: Option<Pubkey>,
    pub issuer: Option<Pubkey>,
    pub fee_recorder: Option<Pubkey>,
    pub oracle_authority: Option<Pubkey>,
}

/// Variant order is the wire tag.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub enum FeePoolInstruction {
    /// Create the singleton accounts; the first fee period opens with id 1
    /// Accounts:
    /// 0. `[signer, writable]` Authority (payer)
    /// 1. `[writable]` Config PDA
    /// 2. `[writable]` System status PDA
    /// 3. `[writable]` Fee ledger PDA
    /// 4. `[writable]` Debt registry PDA
    /// 5. `[writable]` Reward pool PDA
    /// 6. `[writable]` Liquidation book PDA
    /// 7. `[]` Vault authority PDA
    /// 8. `[]` Fee vault (token account owned by the vault authority)
    /// 9. `[]` Reward vault
    /// 10. `[]` Collateral vault
    /// 11. `[]` System program
    InitializeFeePool { settings: FeePoolSettings },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[writable]` Config PDA
    UpdateSettings { update: SettingsUpdate },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[writable]` Config PDA
    UpdateRoles { update: RolesUpdate },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[]` Config PDA
    /// 2. `[writable]` System status PDA
    SetSuspension { section: u8, suspended: bool, reason: u16 },

    /// Accounts:
    /// 0. `[signer, writable]` Authority (payer)
    /// 1. `[]` Config PDA
    /// 2. `[writable]` Rate feed PDA
    /// 3. `[]` System program
    InitializeRateFeed { asset_key: AssetKey },

    /// Accounts:
    /// 0. `[signer]` Oracle authority
    /// 1. `[]` Config PDA
    /// 2. `[writable]` Rate feed PDA
    SubmitRate { rate: u64 },

    /// Accounts:
    /// 0. `[signer, writable]` Payer
    /// 1. `[]` Owner
    /// 2. `[writable]` Staker PDA
    /// 3. `[writable]` Debt registry PDA
    /// 4. `[]` System program
    InitializeStaker,

    /// Issuer notification that an owner's debt share balance changed
    /// Accounts:
    /// 0. `[signer]` Issuer
    /// 1. `[]` Config PDA
    /// 2. `[writable]` Fee ledger PDA
    /// 3. `[writable]` Debt registry PDA
    /// 4. `[]` Reward pool PDA
    /// 5. `[writable]` Staker PDA
    RecordDebtShareChange { debt_shares: u64 },

    /// Accounts:
    /// 0. `[signer]` Fee recorder
    /// 1. `[]` Config PDA
    /// 2. `[writable]` Fee ledger PDA
    RecordFee { amount: u64 },

    /// Accounts: same as `RecordFee`
    RecordReward { amount: u64 },

    /// Accounts:
    /// 0. `[signer]` Any caller
    /// 1. `[]` Config PDA
    /// 2. `[]` System status PDA
    /// 3. `[writable]` Fee ledger PDA
    /// 4. `[]` Debt registry PDA
    CloseCurrentPeriod,

    /// Close driven by the companion ledger
    /// Accounts:
    /// 0. `[signer]` Relayer
    /// 1. `[]` Config PDA
    /// 2. `[]` System status PDA
    /// 3. `[writable]` Fee ledger PDA
    /// 4. `[]` Debt registry PDA
    CloseSecondary { fee_period_id: u64, period_duration: i64 },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[]` Config PDA
    /// 2. `[writable]` Fee ledger PDA
    ImportFeePeriod {
        index: u8,
        fee_period_id: u64,
        start_time: i64,
        fees_to_distribute: u64,
        fees_claimed: u64,
        rewards_to_distribute: u64,
        rewards_claimed: u64,
    },

    /// Accounts:
    /// 0. `[signer, writable]` Authoriser (payer)
    /// 1. `[writable]` Delegate approval PDA
    /// 2. `[]` System program
    SetDelegateApproval { delegate: Pubkey, can_claim: bool },

    /// Accounts:
    /// 0. `[signer]` Claimant
    /// 1. `[]` Config PDA
    /// 2. `[]` System status PDA
    /// 3. `[writable]` Fee ledger PDA
    /// 4. `[]` Debt registry PDA
    /// 5. `[writable]` Staker PDA of the claimant
    /// 6. `[]` Collateral rate feed
    /// 7. `[]` Total debt feed
    /// 8. `[writable]` Fee vault
    /// 9. `[writable]` Fee token destination (owned by the claimant)
    /// 10. `[writable]` Reward vault
    /// 11. `[writable]` Reward token destination (owned by the claimant)
    /// 12. `[]` Vault authority PDA
    /// 13. `[]` Token program
    ClaimFees,

    /// Accounts:
    /// 0. `[signer]` Delegate
    /// 1. `[]` Delegate approval PDA
    /// 2..=14. As `ClaimFees` 1..=13, with the authoriser's staker and token accounts
    ClaimOnBehalf,

    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[]` Config PDA
    /// 2. `[]` System status PDA
    /// 3. `[writable]` Staker PDA
    /// 4. `[writable]` Source token account
    /// 5. `[writable]` Collateral vault
    /// 6. `[]` Token program
    DepositCollateral { amount: u64 },

    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[]` Config PDA
    /// 2. `[]` System status PDA
    /// 3. `[]` Debt registry PDA
    /// 4. `[]` Liquidation entry PDA of the owner, may be uncreated
    /// 5. `[writable]` Staker PDA
    /// 6. `[]` Collateral rate feed
    /// 7. `[]` Total debt feed
    /// 8. `[writable]` Collateral vault
    /// 9. `[writable]` Destination token account
    /// 10. `[]` Vault authority PDA
    /// 11. `[]` Token program
    WithdrawCollateral { amount: u64 },

    /// Accounts:
    /// 0. `[writable, signer]` Flagger, pays for the entry on the first flag
    /// 1. `[]` Config PDA
    /// 2. `[]` System status PDA
    /// 3. `[]` Debt registry PDA
    /// 4. `[writable]` Liquidation book PDA
    /// 5. `[writable]` Liquidation entry PDA of the account to flag
    /// 6. `[]` Staker PDA of the account to flag
    /// 7. `[]` Collateral rate feed
    /// 8. `[]` Total debt feed
    /// 9. `[]` System program
    FlagAccountForLiquidation,

    /// Accounts:
    /// 0. `[signer]` Any caller
    /// 1. `[]` Config PDA
    /// 2. `[]` Debt registry PDA
    /// 3. `[writable]` Liquidation book PDA
    /// 4. `[writable]` Liquidation entry PDA of the flagged account
    /// 5. `[]` Staker PDA of the flagged account
    /// 6. `[]` Collateral rate feed
    /// 7. `[]` Total debt feed
    RemoveAccountInLiquidation,

    /// Accounts:
    /// 0. `[signer]` Liquidator
    /// 1. `[]` Config PDA
    /// 2. `[]` System status PDA
    /// 3. `[writable]` Fee ledger PDA
    /// 4. `[writable]` Debt registry PDA
    /// 5. `[writable]` Reward pool PDA
    /// 6. `[writable]` Liquidation book PDA
    /// 7. `[writable]` Liquidation entry PDA of the flagged account
    /// 8. `[writable]` Staker PDA of the flagged account
    /// 9. `[]` Collateral rate feed
    /// 10. `[]` Total debt feed
    /// 11. `[writable]` Collateral vault
    /// 12. `[writable]` Flagger collateral token account
    /// 13. `[writable]` Liquidator collateral token account
    /// 14. `[]` Vault authority PDA
    /// 15. `[]` Token program
    LiquidateDelinquentAccount,

    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[]` Config PDA
    /// 2. `[]` System status PDA
    /// 3. `[writable]` Fee ledger PDA
    /// 4. `[writable]` Debt registry PDA
    /// 5. `[writable]` Reward pool PDA
    /// 6. `[writable]` Liquidation book PDA
    /// 7. `[writable]` Liquidation entry PDA of the owner, may be uncreated
    /// 8. `[writable]` Staker PDA
    /// 9. `[]` Collateral rate feed
    /// 10. `[]` Total debt feed
    LiquidateSelf,

    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[]` Config PDA
    /// 2. `[]` System status PDA
    /// 3. `[writable]` Reward pool PDA
    /// 4. `[writable]` Staker PDA
    /// 5. `[writable]` Collateral vault
    /// 6. `[writable]` Destination token account
    /// 7. `[]` Vault authority PDA
    /// 8. `[]` Token program
    GetReward,
}

impl FeePoolInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (&variant, rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match variant {
            0 => Self::InitializeFeePool {
                settings: FeePoolSettings::try_from_slice(rest)?,
            },
            1 => Self::UpdateSettings {
                update: SettingsUpdate::try_from_slice(rest)?,
            },
            2 => Self::UpdateRoles {
                update: RolesUpdate::try_from_slice(rest)?,
            },
            3 => {
                let payload = SetSuspensionPayload::try_from_slice(rest)?;
                Self::SetSuspension {
                    section: payload.section,
                    suspended: payload.suspended,
                    reason: payload.reason,
                }
            }
            4 => {
                let payload = InitializeRateFeedPayload::try_from_slice(rest)?;
                Self::InitializeRateFeed { asset_key: payload.asset_key }
            }
            5 => Self::SubmitRate { rate: u64::try_from_slice(rest)? },
            6 => Self::InitializeStaker,
            7 => Self::RecordDebtShareChange { debt_shares: u64::try_from_slice(rest)? },
            8 => Self::RecordFee { amount: u64::try_from_slice(rest)? },
            9 => Self::RecordReward { amount: u64::try_from_slice(rest)? },
            10 => Self::CloseCurrentPeriod,
            11 => {
                let payload = CloseSecondaryPayload::try_from_slice(rest)?;
                Self::CloseSecondary {
                    fee_period_id: payload.fee_period_id,
                    period_duration: payload.period_duration,
                }
            }
            12 => {
                let payload = ImportFeePeriodPayload::try_from_slice(rest)?;
                Self::ImportFeePeriod {
                    index: payload.index,
                    fee_period_id: payload.fee_period_id,
                    start_time: payload.start_time,
                    fees_to_distribute: payload.fees_to_distribute,
                    fees_claimed: payload.fees_claimed,
                    rewards_to_distribute: payload.rewards_to_distribute,
                    rewards_claimed: payload.rewards_claimed,
                }
            }
            13 => {
                let payload = SetDelegateApprovalPayload::try_from_slice(rest)?;
                Self::SetDelegateApproval {
                    delegate: payload.delegate,
                    can_claim: payload.can_claim,
                }
            }
            14 => Self::ClaimFees,
            15 => Self::ClaimOnBehalf,
            16 => Self::DepositCollateral { amount: u64::try_from_slice(rest)? },
            17 => Self::WithdrawCollateral { amount: u64::try_from_slice(rest)? },
            18 => Self::FlagAccountForLiquidation,
            19 => Self::RemoveAccountInLiquidation,
            20 => Self::LiquidateDelinquentAccount,
            21 => Self::LiquidateSelf,
            22 => Self::GetReward,
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    pub fn pack(&self) -> Vec<u8> {
        // Borsh writes the variant index as the leading tag byte
        self.try_to_vec().unwrap_or_default()
    }
}

// Payload structs for multi-field instructions
#[derive(BorshSerialize, BorshDeserialize)]
struct SetSuspensionPayload {
    section: u8,
    suspended: bool,
    reason: u16,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct InitializeRateFeedPayload {
    asset_key: AssetKey,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct CloseSecondaryPayload {
    fee_period_id: u64,
    period_duration: i64,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct ImportFeePeriodPayload {
    index: u8,
    fee_period_id: u64,
    start_time: i64,
    fees_to_distribute: u64,
    fees_claimed: u64,
    rewards_to_distribute: u64,
    rewards_claimed: u64,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct SetDelegateApprovalPayload {
    delegate: Pubkey,
    can_claim: bool,
}

fn instruction(program_id: &Pubkey, accounts: Vec<AccountMeta>, data: FeePoolInstruction) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts,
        data: data.pack(),
    }
}

// Helper functions to create instructions

pub fn initialize_fee_pool(
    program_id: &Pubkey,
    authority: &Pubkey,
    fee_vault: &Pubkey,
    reward_vault: &Pubkey,
    collateral_vault: &Pubkey,
    settings: FeePoolSettings,
) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let accounts = vec![
        AccountMeta::new(*authority, true),
        AccountMeta::new(addresses.config, false),
        AccountMeta::new(addresses.system_status, false),
        AccountMeta::new(addresses.fee_ledger, false),
        AccountMeta::new(addresses.debt_registry, false),
        AccountMeta::new(addresses.reward_pool, false),
        AccountMeta::new(addresses.liquidation_book, false),
        AccountMeta::new_readonly(addresses.vault_authority, false),
        AccountMeta::new_readonly(*fee_vault, false),
        AccountMeta::new_readonly(*reward_vault, false),
        AccountMeta::new_readonly(*collateral_vault, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::InitializeFeePool { settings })
}

pub fn update_settings(program_id: &Pubkey, authority: &Pubkey, update: SettingsUpdate) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new(addresses.config, false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::UpdateSettings { update })
}

pub fn update_roles(program_id: &Pubkey, authority: &Pubkey, update: RolesUpdate) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new(addresses.config, false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::UpdateRoles { update })
}

pub fn set_suspension(
    program_id: &Pubkey,
    authority: &Pubkey,
    section: u8,
    suspended: bool,
    reason: u16,
) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new(addresses.system_status, false),
    ];
    instruction(
        program_id,
        accounts,
        FeePoolInstruction::SetSuspension { section, suspended, reason },
    )
}

pub fn initialize_rate_feed(program_id: &Pubkey, authority: &Pubkey, asset_key: AssetKey) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let (feed, _) = find_rate_feed_address(program_id, &asset_key);
    let accounts = vec![
        AccountMeta::new(*authority, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new(feed, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::InitializeRateFeed { asset_key })
}

pub fn submit_rate(program_id: &Pubkey, oracle_authority: &Pubkey, asset_key: AssetKey, rate: u64) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let (feed, _) = find_rate_feed_address(program_id, &asset_key);
    let accounts = vec![
        AccountMeta::new_readonly(*oracle_authority, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new(feed, false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::SubmitRate { rate })
}

pub fn initialize_staker(program_id: &Pubkey, payer: &Pubkey, owner: &Pubkey) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let (staker, _) = find_staker_address(program_id, owner);
    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(*owner, false),
        AccountMeta::new(staker, false),
        AccountMeta::new(addresses.debt_registry, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::InitializeStaker)
}

pub fn record_debt_share_change(
    program_id: &Pubkey,
    issuer: &Pubkey,
    owner: &Pubkey,
    debt_shares: u64,
) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let (staker, _) = find_staker_address(program_id, owner);
    let accounts = vec![
        AccountMeta::new_readonly(*issuer, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new(addresses.fee_ledger, false),
        AccountMeta::new(addresses.debt_registry, false),
        AccountMeta::new_readonly(addresses.reward_pool, false),
        AccountMeta::new(staker, false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::RecordDebtShareChange { debt_shares })
}

fn fee_recorder_accounts(program_id: &Pubkey, fee_recorder: &Pubkey) -> Vec<AccountMeta> {
    let addresses = FeePoolAddresses::derive(program_id);
    vec![
        AccountMeta::new_readonly(*fee_recorder, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new(addresses.fee_ledger, false),
    ]
}

pub fn record_fee(program_id: &Pubkey, fee_recorder: &Pubkey, amount: u64) -> Instruction {
    instruction(
        program_id,
        fee_recorder_accounts(program_id, fee_recorder),
        FeePoolInstruction::RecordFee { amount },
    )
}

pub fn record_reward(program_id: &Pubkey, fee_recorder: &Pubkey, amount: u64) -> Instruction {
    instruction(
        program_id,
        fee_recorder_accounts(program_id, fee_recorder),
        FeePoolInstruction::RecordReward { amount },
    )
}

pub fn close_current_period(program_id: &Pubkey, caller: &Pubkey) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new_readonly(addresses.system_status, false),
        AccountMeta::new(addresses.fee_ledger, false),
        AccountMeta::new_readonly(addresses.debt_registry, false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::CloseCurrentPeriod)
}

pub fn close_secondary(
    program_id: &Pubkey,
    relayer: &Pubkey,
    fee_period_id: u64,
    period_duration: i64,
) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let accounts = vec![
        AccountMeta::new_readonly(*relayer, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new_readonly(addresses.system_status, false),
        AccountMeta::new(addresses.fee_ledger, false),
        AccountMeta::new_readonly(addresses.debt_registry, false),
    ];
    instruction(
        program_id,
        accounts,
        FeePoolInstruction::CloseSecondary { fee_period_id, period_duration },
    )
}

#[allow(clippy::too_many_arguments)]
pub fn import_fee_period(
    program_id: &Pubkey,
    authority: &Pubkey,
    index: u8,
    fee_period_id: u64,
    start_time: i64,
    fees_to_distribute: u64,
    fees_claimed: u64,
    rewards_to_distribute: u64,
    rewards_claimed: u64,
) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new(addresses.fee_ledger, false),
    ];
    instruction(
        program_id,
        accounts,
        FeePoolInstruction::ImportFeePeriod {
            index,
            fee_period_id,
            start_time,
            fees_to_distribute,
            fees_claimed,
            rewards_to_distribute,
            rewards_claimed,
        },
    )
}

pub fn set_delegate_approval(
    program_id: &Pubkey,
    authoriser: &Pubkey,
    delegate: &Pubkey,
    can_claim: bool,
) -> Instruction {
    let (approval, _) = find_delegate_approval_address(program_id, authoriser, delegate);
    let accounts = vec![
        AccountMeta::new(*authoriser, true),
        AccountMeta::new(approval, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    instruction(
        program_id,
        accounts,
        FeePoolInstruction::SetDelegateApproval { delegate: *delegate, can_claim },
    )
}

/// Token accounts involved in a fee claim
#[derive(Debug, Clone, Copy)]
pub struct ClaimTokenAccounts {
    pub fee_vault: Pubkey,
    pub fee_destination: Pubkey,
    pub reward_vault: Pubkey,
    pub reward_destination: Pubkey,
}

fn claim_accounts(program_id: &Pubkey, owner: &Pubkey, tokens: &ClaimTokenAccounts) -> Vec<AccountMeta> {
    let addresses = FeePoolAddresses::derive(program_id);
    let (staker, _) = find_staker_address(program_id, owner);
    vec![
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new_readonly(addresses.system_status, false),
        AccountMeta::new(addresses.fee_ledger, false),
        AccountMeta::new_readonly(addresses.debt_registry, false),
        AccountMeta::new(staker, false),
        AccountMeta::new_readonly(addresses.collateral_feed, false),
        AccountMeta::new_readonly(addresses.debt_feed, false),
        AccountMeta::new(tokens.fee_vault, false),
        AccountMeta::new(tokens.fee_destination, false),
        AccountMeta::new(tokens.reward_vault, false),
        AccountMeta::new(tokens.reward_destination, false),
        AccountMeta::new_readonly(addresses.vault_authority, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ]
}

pub fn claim_fees(program_id: &Pubkey, claimant: &Pubkey, tokens: &ClaimTokenAccounts) -> Instruction {
    let mut accounts = vec![AccountMeta::new_readonly(*claimant, true)];
    accounts.extend(claim_accounts(program_id, claimant, tokens));
    instruction(program_id, accounts, FeePoolInstruction::ClaimFees)
}

pub fn claim_on_behalf(
    program_id: &Pubkey,
    delegate: &Pubkey,
    authoriser: &Pubkey,
    tokens: &ClaimTokenAccounts,
) -> Instruction {
    let (approval, _) = find_delegate_approval_address(program_id, authoriser, delegate);
    let mut accounts = vec![
        AccountMeta::new_readonly(*delegate, true),
        AccountMeta::new_readonly(approval, false),
    ];
    accounts.extend(claim_accounts(program_id, authoriser, tokens));
    instruction(program_id, accounts, FeePoolInstruction::ClaimOnBehalf)
}

pub fn deposit_collateral(
    program_id: &Pubkey,
    owner: &Pubkey,
    source: &Pubkey,
    collateral_vault: &Pubkey,
    amount: u64,
) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let (staker, _) = find_staker_address(program_id, owner);
    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new_readonly(addresses.system_status, false),
        AccountMeta::new(staker, false),
        AccountMeta::new(*source, false),
        AccountMeta::new(*collateral_vault, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::DepositCollateral { amount })
}

pub fn withdraw_collateral(
    program_id: &Pubkey,
    owner: &Pubkey,
    collateral_vault: &Pubkey,
    destination: &Pubkey,
    amount: u64,
) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let (staker, _) = find_staker_address(program_id, owner);
    let (entry, _) = find_liquidation_entry_address(program_id, owner);
    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new_readonly(addresses.system_status, false),
        AccountMeta::new_readonly(addresses.debt_registry, false),
        AccountMeta::new_readonly(entry, false),
        AccountMeta::new(staker, false),
        AccountMeta::new_readonly(addresses.collateral_feed, false),
        AccountMeta::new_readonly(addresses.debt_feed, false),
        AccountMeta::new(*collateral_vault, false),
        AccountMeta::new(*destination, false),
        AccountMeta::new_readonly(addresses.vault_authority, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::WithdrawCollateral { amount })
}

pub fn flag_account_for_liquidation(program_id: &Pubkey, flagger: &Pubkey, account: &Pubkey) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let (staker, _) = find_staker_address(program_id, account);
    let (entry, _) = find_liquidation_entry_address(program_id, account);
    let accounts = vec![
        AccountMeta::new(*flagger, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new_readonly(addresses.system_status, false),
        AccountMeta::new_readonly(addresses.debt_registry, false),
        AccountMeta::new(addresses.liquidation_book, false),
        AccountMeta::new(entry, false),
        AccountMeta::new_readonly(staker, false),
        AccountMeta::new_readonly(addresses.collateral_feed, false),
        AccountMeta::new_readonly(addresses.debt_feed, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::FlagAccountForLiquidation)
}

pub fn remove_account_in_liquidation(program_id: &Pubkey, caller: &Pubkey, account: &Pubkey) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let (staker, _) = find_staker_address(program_id, account);
    let (entry, _) = find_liquidation_entry_address(program_id, account);
    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new_readonly(addresses.debt_registry, false),
        AccountMeta::new(addresses.liquidation_book, false),
        AccountMeta::new(entry, false),
        AccountMeta::new_readonly(staker, false),
        AccountMeta::new_readonly(addresses.collateral_feed, false),
        AccountMeta::new_readonly(addresses.debt_feed, false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::RemoveAccountInLiquidation)
}

fn liquidation_accounts(program_id: &Pubkey, signer: &Pubkey, account: &Pubkey) -> Vec<AccountMeta> {
    let addresses = FeePoolAddresses::derive(program_id);
    let (staker, _) = find_staker_address(program_id, account);
    let (entry, _) = find_liquidation_entry_address(program_id, account);
    vec![
        AccountMeta::new_readonly(*signer, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new_readonly(addresses.system_status, false),
        AccountMeta::new(addresses.fee_ledger, false),
        AccountMeta::new(addresses.debt_registry, false),
        AccountMeta::new(addresses.reward_pool, false),
        AccountMeta::new(addresses.liquidation_book, false),
        AccountMeta::new(entry, false),
        AccountMeta::new(staker, false),
        AccountMeta::new_readonly(addresses.collateral_feed, false),
        AccountMeta::new_readonly(addresses.debt_feed, false),
    ]
}

pub fn liquidate_delinquent_account(
    program_id: &Pubkey,
    liquidator: &Pubkey,
    account: &Pubkey,
    collateral_vault: &Pubkey,
    flagger_destination: &Pubkey,
    liquidator_destination: &Pubkey,
) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let mut accounts = liquidation_accounts(program_id, liquidator, account);
    accounts.extend([
        AccountMeta::new(*collateral_vault, false),
        AccountMeta::new(*flagger_destination, false),
        AccountMeta::new(*liquidator_destination, false),
        AccountMeta::new_readonly(addresses.vault_authority, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ]);
    instruction(program_id, accounts, FeePoolInstruction::LiquidateDelinquentAccount)
}

pub fn liquidate_self(program_id: &Pubkey, owner: &Pubkey) -> Instruction {
    instruction(
        program_id,
        liquidation_accounts(program_id, owner, owner),
        FeePoolInstruction::LiquidateSelf,
    )
}

pub fn get_reward(
    program_id: &Pubkey,
    owner: &Pubkey,
    collateral_vault: &Pubkey,
    destination: &Pubkey,
) -> Instruction {
    let addresses = FeePoolAddresses::derive(program_id);
    let (staker, _) = find_staker_address(program_id, owner);
    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new_readonly(addresses.config, false),
        AccountMeta::new_readonly(addresses.system_status, false),
        AccountMeta::new(addresses.reward_pool, false),
        AccountMeta::new(staker, false),
        AccountMeta::new(*collateral_vault, false),
        AccountMeta::new(*destination, false),
        AccountMeta::new_readonly(addresses.vault_authority, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];
    instruction(program_id, accounts, FeePoolInstruction::GetReward)
}
