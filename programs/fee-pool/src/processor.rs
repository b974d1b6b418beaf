use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    engine::{
        apply_debt_share_change, check_liquidatable, check_self_liquidatable, claim_fees, claim_on_behalf,
        execute_liquidation, flag_account, fresh_market_snapshot, plan_liquidation, position_of,
        remove_if_healthy, staker_position, Entitlement,
    },
    error::FeePoolError,
    events::{
        AccountFlaggedForLiquidation, AccountLiquidated, AccountRemovedFromLiquidation, Event, FeePeriodClosed,
        FeePeriodImported, FeesClaimed, RewardPaid, RewardsDeposited,
    },
    instruction::{FeePoolInstruction, RolesUpdate, SettingsUpdate},
    interfaces::{FeedOracle, SuspensionRegistry},
    pda::seeds,
    state::{
        AccountState, AssetKey, DebtShareRegistry, DelegateApproval, FeePeriodLedger, FeePoolConfig,
        FeePoolSettings, LiquidationBook, LiquidationEntry, RateFeed, RewardPool, StakerAccount, SystemSection, SystemStatus,
    },
};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = FeePoolInstruction::unpack(instruction_data)?;

    match instruction {
        FeePoolInstruction::InitializeFeePool { settings } => {
            msg!("Instruction: InitializeFeePool");
            process_initialize_fee_pool(program_id, accounts, settings)
        }
        FeePoolInstruction::UpdateSettings { update } => {
            msg!("Instruction: UpdateSettings");
            process_update_settings(program_id, accounts, update)
        }
        FeePoolInstruction::UpdateRoles { update } => {
            msg!("Instruction: UpdateRoles");
            process_update_roles(program_id, accounts, update)
        }
        FeePoolInstruction::SetSuspension { section, suspended, reason } => {
            msg!("Instruction: SetSuspension");
            process_set_suspension(program_id, accounts, section, suspended, reason)
        }
        FeePoolInstruction::InitializeRateFeed { asset_key } => {
            msg!("Instruction: InitializeRateFeed");
            process_initialize_rate_feed(program_id, accounts, asset_key)
        }
        FeePoolInstruction::SubmitRate { rate } => {
            msg!("Instruction: SubmitRate");
            process_submit_rate(program_id, accounts, rate)
        }
        FeePoolInstruction::InitializeStaker => {
            msg!("Instruction: InitializeStaker");
            process_initialize_staker(program_id, accounts)
        }
        FeePoolInstruction::RecordDebtShareChange { debt_shares } => {
            msg!("Instruction: RecordDebtShareChange");
            process_record_debt_share_change(program_id, accounts, debt_shares)
        }
        FeePoolInstruction::RecordFee { amount } => {
            msg!("Instruction: RecordFee");
            process_record_fee(program_id, accounts, amount, false)
        }
        FeePoolInstruction::RecordReward { amount } => {
            msg!("Instruction: RecordReward");
            process_record_fee(program_id, accounts, amount, true)
        }
        FeePoolInstruction::CloseCurrentPeriod => {
            msg!("Instruction: CloseCurrentPeriod");
            process_close_current_period(program_id, accounts)
        }
        FeePoolInstruction::CloseSecondary { fee_period_id, period_duration } => {
            msg!("Instruction: CloseSecondary");
            process_close_secondary(program_id, accounts, fee_period_id, period_duration)
        }
        FeePoolInstruction::ImportFeePeriod {
            index,
            fee_period_id,
            start_time,
            fees_to_distribute,
            fees_claimed,
            rewards_to_distribute,
            rewards_claimed,
        } => {
            msg!("Instruction: ImportFeePeriod");
            process_import_fee_period(
                program_id,
                accounts,
                index,
                fee_period_id,
                start_time,
                fees_to_distribute,
                fees_claimed,
                rewards_to_distribute,
                rewards_claimed,
            )
        }
        FeePoolInstruction::SetDelegateApproval { delegate, can_claim } => {
            msg!("Instruction: SetDelegateApproval");
            process_set_delegate_approval(program_id, accounts, delegate, can_claim)
        }
        FeePoolInstruction::ClaimFees => {
            msg!("Instruction: ClaimFees");
            process_claim_fees(program_id, accounts)
        }
        FeePoolInstruction::ClaimOnBehalf => {
            msg!("Instruction: ClaimOnBehalf");
            process_claim_on_behalf(program_id, accounts)
        }
        FeePoolInstruction::DepositCollateral { amount } => {
            msg!("Instruction: DepositCollateral");
            process_deposit_collateral(program_id, accounts, amount)
        }
        FeePoolInstruction::WithdrawCollateral { amount } => {
            msg!("Instruction: WithdrawCollateral");
            process_withdraw_collateral(program_id, accounts, amount)
        }
        FeePoolInstruction::FlagAccountForLiquidation => {
            msg!("Instruction: FlagAccountForLiquidation");
            process_flag_account(program_id, accounts)
        }
        FeePoolInstruction::RemoveAccountInLiquidation => {
            msg!("Instruction: RemoveAccountInLiquidation");
            process_remove_account_in_liquidation(program_id, accounts)
        }
        FeePoolInstruction::LiquidateDelinquentAccount => {
            msg!("Instruction: LiquidateDelinquentAccount");
            process_liquidate_delinquent_account(program_id, accounts)
        }
        FeePoolInstruction::LiquidateSelf => {
            msg!("Instruction: LiquidateSelf");
            process_liquidate_self(program_id, accounts)
        }
        FeePoolInstruction::GetReward => {
            msg!("Instruction: GetReward");
            process_get_reward(program_id, accounts)
        }
    }
}

// Account helpers

/// Accounts carry trailing padding, so read with a cursor instead of `try_from_slice`
fn borsh_deserialize_unchecked<T: BorshDeserialize>(data: &[u8]) -> Result<T, ProgramError> {
    let mut cursor: &[u8] = data;
    T::deserialize(&mut cursor).map_err(|_| ProgramError::InvalidAccountData)
}

fn load<T: AccountState>(program_id: &Pubkey, info: &AccountInfo) -> Result<T, ProgramError> {
    if info.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    let state: T = borsh_deserialize_unchecked(&info.try_borrow_data()?)?;
    state.validate()?;
    Ok(state)
}

fn store<T: BorshSerialize>(info: &AccountInfo, state: &T) -> ProgramResult {
    let mut data = info.try_borrow_mut_data()?;
    let mut slice: &mut [u8] = &mut data[..];
    borsh::to_writer(&mut slice, state).map_err(|_| ProgramError::AccountDataTooSmall)
}

fn require_signer(info: &AccountInfo) -> ProgramResult {
    if !info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    Ok(())
}

fn now() -> Result<i64, ProgramError> {
    Ok(Clock::get()?.unix_timestamp)
}

/// Check `info` is the PDA for `seeds` and return its bump
fn check_pda(program_id: &Pubkey, info: &AccountInfo, seeds: &[&[u8]]) -> Result<u8, ProgramError> {
    let (expected, bump) = Pubkey::find_program_address(seeds, program_id);
    if expected != *info.key {
        return Err(FeePoolError::InvalidPDA.into());
    }
    Ok(bump)
}

fn create_pda_account<'a>(
    program_id: &Pubkey,
    payer: &AccountInfo<'a>,
    target: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    space: usize,
    signer_seeds: &[&[u8]],
) -> ProgramResult {
    if !target.data_is_empty() {
        return Err(FeePoolError::AlreadyInitialized.into());
    }

    let lamports = Rent::get()?.minimum_balance(space);
    invoke_signed(
        &system_instruction::create_account(payer.key, target.key, lamports, space as u64, program_id),
        &[payer.clone(), target.clone(), system_program.clone()],
        &[signer_seeds],
    )
}

/// Create a single-seed singleton account and write its initial state
fn init_singleton<'a, T: AccountState>(
    program_id: &Pubkey,
    payer: &AccountInfo<'a>,
    target: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    seed: &[u8],
    build: impl FnOnce(u8) -> T,
) -> ProgramResult {
    let bump = check_pda(program_id, target, &[seed])?;
    create_pda_account(program_id, payer, target, system_program, T::LEN, &[seed, &[bump]])?;
    store(target, &build(bump))
}

fn load_staker_of(program_id: &Pubkey, info: &AccountInfo, owner: &Pubkey) -> Result<StakerAccount, ProgramError> {
    let staker: StakerAccount = load(program_id, info)?;
    if staker.owner != *owner {
        return Err(FeePoolError::StakerOwnerMismatch.into());
    }
    Ok(staker)
}

/// Liquidation entry of `account`. A PDA that was never created reads as a closed entry.
fn load_liquidation_entry(
    program_id: &Pubkey,
    info: &AccountInfo,
    account: &Pubkey,
) -> Result<LiquidationEntry, ProgramError> {
    let bump = check_pda(program_id, info, &[seeds::LIQUIDATION_ENTRY, account.as_ref()])?;
    if info.data_is_empty() {
        return Ok(LiquidationEntry::new(*account, bump));
    }
    load(program_id, info)
}

fn load_feeds(
    program_id: &Pubkey,
    collateral_feed_info: &AccountInfo,
    debt_feed_info: &AccountInfo,
) -> Result<(RateFeed, RateFeed), ProgramError> {
    Ok((load(program_id, collateral_feed_info)?, load(program_id, debt_feed_info)?))
}

// Token helpers

fn require_token_owner(info: &AccountInfo, owner: &Pubkey) -> ProgramResult {
    if info.owner != &spl_token::id() {
        return Err(FeePoolError::TokenAccountMismatch.into());
    }
    let account = spl_token::state::Account::unpack(&info.try_borrow_data()?)?;
    if account.owner != *owner {
        return Err(FeePoolError::TokenAccountMismatch.into());
    }
    Ok(())
}

fn require_vault(info: &AccountInfo, expected: &Pubkey) -> ProgramResult {
    if info.key != expected {
        return Err(FeePoolError::TokenAccountMismatch.into());
    }
    Ok(())
}

fn require_token_program(info: &AccountInfo) -> ProgramResult {
    if info.key != &spl_token::id() {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

fn check_vault_authority(program_id: &Pubkey, config: &FeePoolConfig, info: &AccountInfo) -> ProgramResult {
    let expected = Pubkey::create_program_address(&[seeds::VAULT_AUTHORITY, &[config.vault_authority_bump]], program_id)
        .map_err(|_| FeePoolError::InvalidPDA)?;
    if expected != *info.key {
        return Err(FeePoolError::InvalidPDA.into());
    }
    Ok(())
}

/// Move `amount` out of a program vault, signed by the vault authority PDA
fn transfer_from_vault<'a>(
    config: &FeePoolConfig,
    vault: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    vault_authority: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    if amount == 0 {
        return Ok(());
    }

    invoke_signed(
        &spl_token::instruction::transfer(
            token_program.key,
            vault.key,
            destination.key,
            vault_authority.key,
            &[],
            amount,
        )?,
        &[
            vault.clone(),
            destination.clone(),
            vault_authority.clone(),
            token_program.clone(),
        ],
        &[&[seeds::VAULT_AUTHORITY, &[config.vault_authority_bump]]],
    )
}

// Administration

fn process_initialize_fee_pool(program_id: &Pubkey, accounts: &[AccountInfo], settings: FeePoolSettings) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let authority_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let book_info = next_account_info(account_info_iter)?;
    let vault_authority_info = next_account_info(account_info_iter)?;
    let fee_vault_info = next_account_info(account_info_iter)?;
    let reward_vault_info = next_account_info(account_info_iter)?;
    let collateral_vault_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    require_signer(authority_info)?;
    settings.validate()?;

    let vault_authority_bump = check_pda(program_id, vault_authority_info, &[seeds::VAULT_AUTHORITY])?;
    for vault in [fee_vault_info, reward_vault_info, collateral_vault_info] {
        require_token_owner(vault, vault_authority_info.key)?;
    }

    let now = now()?;
    let authority = *authority_info.key;

    init_singleton(program_id, authority_info, config_info, system_program, seeds::CONFIG, |bump| {
        FeePoolConfig::new(
            authority,
            bump,
            *fee_vault_info.key,
            *reward_vault_info.key,
            *collateral_vault_info.key,
            vault_authority_bump,
            settings,
            now,
        )
    })?;
    init_singleton(program_id, authority_info, status_info, system_program, seeds::SYSTEM_STATUS, SystemStatus::new)?;
    init_singleton(program_id, authority_info, ledger_info, system_program, seeds::FEE_LEDGER, |bump| {
        FeePeriodLedger::new(now, bump)
    })?;
    init_singleton(program_id, authority_info, registry_info, system_program, seeds::DEBT_REGISTRY, DebtShareRegistry::new)?;
    init_singleton(program_id, authority_info, pool_info, system_program, seeds::REWARD_POOL, RewardPool::new)?;
    init_singleton(program_id, authority_info, book_info, system_program, seeds::LIQUIDATION_BOOK, LiquidationBook::new)?;

    msg!("Fee pool initialized, fee period 1 open at {}", now);
    Ok(())
}

fn process_update_settings(program_id: &Pubkey, accounts: &[AccountInfo], update: SettingsUpdate) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let authority_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;

    require_signer(authority_info)?;
    let mut config: FeePoolConfig = load(program_id, config_info)?;
    config.require_authority(authority_info.key)?;

    let settings = &mut config.settings;
    if let Some(value) = update.fee_period_duration {
        settings.fee_period_duration = value;
    }
    if let Some(value) = update.issuance_ratio {
        settings.issuance_ratio = value;
    }
    if let Some(value) = update.target_threshold {
        settings.target_threshold = value;
    }
    if let Some(value) = update.liquidation_ratio {
        settings.liquidation_ratio = value;
    }
    if let Some(value) = update.liquidation_delay {
        settings.liquidation_delay = value;
    }
    if let Some(value) = update.liquidation_penalty {
        settings.liquidation_penalty = value;
    }
    if let Some(value) = update.self_liquidation_penalty {
        settings.self_liquidation_penalty = value;
    }
    if let Some(value) = update.flag_reward {
        settings.flag_reward = value;
    }
    if let Some(value) = update.liquidate_reward {
        settings.liquidate_reward = value;
    }
    if let Some(value) = update.rate_stale_period {
        settings.rate_stale_period = value;
    }
    if let Some(value) = update.debt_snapshot_stale_time {
        settings.debt_snapshot_stale_time = value;
    }
    settings.validate()?;

    config.last_update = now()?;
    store(config_info, &config)?;

    msg!("Settings updated");
    Ok(())
}

fn process_update_roles(program_id: &Pubkey, accounts: &[AccountInfo], update: RolesUpdate) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let authority_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;

    require_signer(authority_info)?;
    let mut config: FeePoolConfig = load(program_id, config_info)?;
    config.require_authority(authority_info.key)?;

    if let Some(key) = update.relayer {
        config.relayer = key;
    }
    if let Some(key) = update.issuer {
        config.issuer = key;
    }
    if let Some(key) = update.fee_recorder {
        config.fee_recorder = key;
    }
    if let Some(key) = update.oracle_authority {
        config.oracle_authority = key;
    }
    if let Some(key) = update.authority {
        msg!("Authority transferred to {}", key);
        config.authority = key;
    }

    config.last_update = now()?;
    store(config_info, &config)
}

fn process_set_suspension(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    section: u8,
    suspended: bool,
    reason: u16,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let authority_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;

    require_signer(authority_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    config.require_authority(authority_info.key)?;

    let section = SystemSection::from_u8(section)?;
    let mut status: SystemStatus = load(program_id, status_info)?;
    status.set_suspension(section, suspended, reason, now()?);
    store(status_info, &status)?;

    msg!("Section {:?} suspended={} reason={}", section, suspended, reason);
    Ok(())
}

// Collaborator adapters

fn process_initialize_rate_feed(program_id: &Pubkey, accounts: &[AccountInfo], asset_key: AssetKey) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let authority_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let feed_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    require_signer(authority_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    config.require_authority(authority_info.key)?;

    let bump = check_pda(program_id, feed_info, &[seeds::RATE_FEED, &asset_key])?;
    create_pda_account(
        program_id,
        authority_info,
        feed_info,
        system_program,
        RateFeed::LEN,
        &[seeds::RATE_FEED, &asset_key, &[bump]],
    )?;
    store(feed_info, &RateFeed::new(asset_key, bump))?;

    msg!("Rate feed {} created", crate::state::asset_key_to_string(&asset_key));
    Ok(())
}

fn process_submit_rate(program_id: &Pubkey, accounts: &[AccountInfo], rate: u64) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let oracle_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let feed_info = next_account_info(account_info_iter)?;

    require_signer(oracle_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    if config.oracle_authority != *oracle_info.key {
        return Err(FeePoolError::NotOracleAuthority.into());
    }

    let mut feed: RateFeed = load(program_id, feed_info)?;
    feed.submit(rate, now()?)?;
    store(feed_info, &feed)?;

    msg!("Rate round {}: {}", feed.round_id, rate);
    Ok(())
}

fn process_initialize_staker(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let payer_info = next_account_info(account_info_iter)?;
    let owner_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    require_signer(payer_info)?;
    let owner = *owner_info.key;

    let bump = check_pda(program_id, staker_info, &[seeds::STAKER, owner.as_ref()])?;
    create_pda_account(
        program_id,
        payer_info,
        staker_info,
        system_program,
        StakerAccount::LEN,
        &[seeds::STAKER, owner.as_ref(), &[bump]],
    )?;

    let now = now()?;
    store(staker_info, &StakerAccount::new(owner, bump, now))?;

    let mut registry: DebtShareRegistry = load(program_id, registry_info)?;
    registry.staker_count = registry.staker_count.saturating_add(1);
    store(registry_info, &registry)?;

    msg!("Staker account created for {}", owner);
    Ok(())
}

fn process_record_debt_share_change(program_id: &Pubkey, accounts: &[AccountInfo], debt_shares: u64) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let issuer_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;

    require_signer(issuer_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    if config.issuer != *issuer_info.key {
        return Err(FeePoolError::NotIssuer.into());
    }

    let mut ledger: FeePeriodLedger = load(program_id, ledger_info)?;
    let mut registry: DebtShareRegistry = load(program_id, registry_info)?;
    let pool: RewardPool = load(program_id, pool_info)?;
    let mut staker: StakerAccount = load(program_id, staker_info)?;

    let previous = staker.debt_shares;
    apply_debt_share_change(&mut ledger, &mut registry, &pool, &mut staker, debt_shares, now()?)?;

    store(ledger_info, &ledger)?;
    store(registry_info, &registry)?;
    store(staker_info, &staker)?;

    msg!(
        "Debt shares of {}: {} -> {} (total {})",
        staker.owner,
        previous,
        debt_shares,
        registry.total_debt_shares
    );
    Ok(())
}

// Fee period ledger

fn process_record_fee(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64, is_reward: bool) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let recorder_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;

    require_signer(recorder_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    if config.fee_recorder != *recorder_info.key {
        return Err(FeePoolError::NotFeeRecorder.into());
    }

    let mut ledger: FeePeriodLedger = load(program_id, ledger_info)?;
    if is_reward {
        ledger.record_reward(amount)?;
    } else {
        ledger.record_fee(amount)?;
    }
    store(ledger_info, &ledger)?;

    let open = ledger.current_period();
    msg!(
        "Period {}: fees {} rewards {}",
        open.fee_period_id,
        open.fees_to_distribute,
        open.rewards_to_distribute
    );
    Ok(())
}

fn process_close_current_period(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let caller_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;

    require_signer(caller_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    let status: SystemStatus = load(program_id, status_info)?;
    status.require_active(&[SystemSection::System, SystemSection::Issuance])?;

    let mut ledger: FeePeriodLedger = load(program_id, ledger_info)?;
    let registry: DebtShareRegistry = load(program_id, registry_info)?;

    let now = now()?;
    let closed_id =
        ledger.close_current_period(now, config.settings.fee_period_duration, registry.total_debt_shares)?;
    store(ledger_info, &ledger)?;

    FeePeriodClosed { fee_period_id: closed_id, closed_at: now }.emit();
    Ok(())
}

fn process_close_secondary(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    fee_period_id: u64,
    period_duration: i64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let relayer_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;

    require_signer(relayer_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    if config.relayer != *relayer_info.key {
        return Err(FeePoolError::NotRelayer.into());
    }
    let status: SystemStatus = load(program_id, status_info)?;
    status.require_active(&[SystemSection::System, SystemSection::Issuance])?;

    let mut ledger: FeePeriodLedger = load(program_id, ledger_info)?;
    let registry: DebtShareRegistry = load(program_id, registry_info)?;

    let now = now()?;
    let closed_id = ledger.close_from_relayer(
        now,
        fee_period_id,
        period_duration,
        config.settings.fee_period_duration,
        registry.total_debt_shares,
    )?;
    store(ledger_info, &ledger)?;

    FeePeriodClosed { fee_period_id: closed_id, closed_at: now }.emit();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn process_import_fee_period(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    index: u8,
    fee_period_id: u64,
    start_time: i64,
    fees_to_distribute: u64,
    fees_claimed: u64,
    rewards_to_distribute: u64,
    rewards_claimed: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let authority_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;

    require_signer(authority_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    config.require_authority(authority_info.key)?;

    let mut ledger: FeePeriodLedger = load(program_id, ledger_info)?;
    ledger.import_fee_period(
        now()?,
        index as usize,
        fee_period_id,
        start_time,
        fees_to_distribute,
        fees_claimed,
        rewards_to_distribute,
        rewards_claimed,
    )?;
    store(ledger_info, &ledger)?;

    FeePeriodImported { index, fee_period_id }.emit();
    Ok(())
}

// Claims

fn process_set_delegate_approval(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    delegate: Pubkey,
    can_claim: bool,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let authoriser_info = next_account_info(account_info_iter)?;
    let approval_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    require_signer(authoriser_info)?;
    let authoriser = *authoriser_info.key;
    let bump = check_pda(
        program_id,
        approval_info,
        &[seeds::DELEGATE, authoriser.as_ref(), delegate.as_ref()],
    )?;

    let approval = if approval_info.data_is_empty() {
        create_pda_account(
            program_id,
            authoriser_info,
            approval_info,
            system_program,
            DelegateApproval::LEN,
            &[seeds::DELEGATE, authoriser.as_ref(), delegate.as_ref(), &[bump]],
        )?;
        DelegateApproval::new(authoriser, delegate, can_claim, bump)
    } else {
        let mut approval: DelegateApproval = load(program_id, approval_info)?;
        approval.can_claim = can_claim;
        approval
    };
    store(approval_info, &approval)?;

    msg!("Delegate {} can_claim={} for {}", delegate, can_claim, authoriser);
    Ok(())
}

fn process_claim_fees(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let claimant_info = next_account_info(account_info_iter)?;
    require_signer(claimant_info)?;

    process_claim(program_id, account_info_iter.as_slice(), claimant_info.key, None)
}

fn process_claim_on_behalf(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let delegate_info = next_account_info(account_info_iter)?;
    let approval_info = next_account_info(account_info_iter)?;
    require_signer(delegate_info)?;

    let approval: DelegateApproval = load(program_id, approval_info)?;
    process_claim(
        program_id,
        account_info_iter.as_slice(),
        &approval.authoriser,
        Some((&approval, delegate_info.key)),
    )
}

/// Shared claim path. Proceeds always go to token accounts of `owner`.
fn process_claim(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    owner: &Pubkey,
    delegation: Option<(&DelegateApproval, &Pubkey)>,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;
    let collateral_feed_info = next_account_info(account_info_iter)?;
    let debt_feed_info = next_account_info(account_info_iter)?;
    let fee_vault_info = next_account_info(account_info_iter)?;
    let fee_destination_info = next_account_info(account_info_iter)?;
    let reward_vault_info = next_account_info(account_info_iter)?;
    let reward_destination_info = next_account_info(account_info_iter)?;
    let vault_authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    let config: FeePoolConfig = load(program_id, config_info)?;
    let status: SystemStatus = load(program_id, status_info)?;
    let mut ledger: FeePeriodLedger = load(program_id, ledger_info)?;
    let registry: DebtShareRegistry = load(program_id, registry_info)?;
    let mut staker = load_staker_of(program_id, staker_info, owner)?;
    let (collateral_feed, debt_feed) = load_feeds(program_id, collateral_feed_info, debt_feed_info)?;

    require_vault(fee_vault_info, &config.fee_vault)?;
    require_vault(reward_vault_info, &config.reward_vault)?;
    require_token_owner(fee_destination_info, owner)?;
    require_token_owner(reward_destination_info, owner)?;
    check_vault_authority(program_id, &config, vault_authority_info)?;
    require_token_program(token_program)?;

    let oracle = FeedOracle::new(&collateral_feed, &debt_feed, &config.settings, now()?);
    let claimed: Entitlement = match delegation {
        Some((approval, delegate)) => claim_on_behalf(
            approval,
            delegate,
            &status,
            &oracle,
            &config.settings,
            &mut ledger,
            &mut staker,
            registry.total_debt_shares,
        )?,
        None => claim_fees(
            &status,
            &oracle,
            &config.settings,
            &mut ledger,
            &mut staker,
            registry.total_debt_shares,
        )?,
    };

    store(ledger_info, &ledger)?;
    store(staker_info, &staker)?;

    transfer_from_vault(
        &config,
        fee_vault_info,
        fee_destination_info,
        vault_authority_info,
        token_program,
        claimed.fees,
    )?;
    transfer_from_vault(
        &config,
        reward_vault_info,
        reward_destination_info,
        vault_authority_info,
        token_program,
        claimed.rewards,
    )?;

    FeesClaimed {
        account: *owner,
        fees: claimed.fees,
        rewards: claimed.rewards,
    }
    .emit();
    Ok(())
}

// Collateral custody

fn process_deposit_collateral(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let owner_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;
    let source_info = next_account_info(account_info_iter)?;
    let collateral_vault_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    require_signer(owner_info)?;
    if amount == 0 {
        return Err(FeePoolError::ZeroAmount.into());
    }

    let config: FeePoolConfig = load(program_id, config_info)?;
    let status: SystemStatus = load(program_id, status_info)?;
    status.require_active(&[SystemSection::System])?;

    let mut staker = load_staker_of(program_id, staker_info, owner_info.key)?;
    require_vault(collateral_vault_info, &config.collateral_vault)?;
    require_token_program(token_program)?;

    staker.collateral = staker
        .collateral
        .checked_add(amount)
        .ok_or(FeePoolError::ArithmeticOverflow)?;
    store(staker_info, &staker)?;

    invoke(
        &spl_token::instruction::transfer(
            token_program.key,
            source_info.key,
            collateral_vault_info.key,
            owner_info.key,
            &[],
            amount,
        )?,
        &[
            source_info.clone(),
            collateral_vault_info.clone(),
            owner_info.clone(),
            token_program.clone(),
        ],
    )?;

    msg!("Deposited {} collateral, balance {}", amount, staker.collateral);
    Ok(())
}

fn process_withdraw_collateral(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let owner_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;
    let entry_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;
    let collateral_feed_info = next_account_info(account_info_iter)?;
    let debt_feed_info = next_account_info(account_info_iter)?;
    let collateral_vault_info = next_account_info(account_info_iter)?;
    let destination_info = next_account_info(account_info_iter)?;
    let vault_authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    require_signer(owner_info)?;
    if amount == 0 {
        return Err(FeePoolError::ZeroAmount.into());
    }

    let config: FeePoolConfig = load(program_id, config_info)?;
    let status: SystemStatus = load(program_id, status_info)?;
    status.require_active(&[SystemSection::System])?;

    let registry: DebtShareRegistry = load(program_id, registry_info)?;
    let entry = load_liquidation_entry(program_id, entry_info, owner_info.key)?;
    let mut staker = load_staker_of(program_id, staker_info, owner_info.key)?;
    let (collateral_feed, debt_feed) = load_feeds(program_id, collateral_feed_info, debt_feed_info)?;

    require_vault(collateral_vault_info, &config.collateral_vault)?;
    require_token_owner(destination_info, owner_info.key)?;
    check_vault_authority(program_id, &config, vault_authority_info)?;
    require_token_program(token_program)?;

    if entry.is_active {
        return Err(FeePoolError::AccountFlagged.into());
    }

    let remaining = staker
        .collateral
        .checked_sub(amount)
        .ok_or(FeePoolError::InsufficientCollateral)?;

    let oracle = FeedOracle::new(&collateral_feed, &debt_feed, &config.settings, now()?);
    let market = fresh_market_snapshot(&oracle)?;
    let after = position_of(staker.debt_shares, remaining, registry.total_debt_shares, &market)?;
    if after.ratio > config.settings.require_issuance_ratio()? {
        return Err(FeePoolError::WithdrawalBreachesIssuanceRatio.into());
    }

    staker.collateral = remaining;
    store(staker_info, &staker)?;

    transfer_from_vault(
        &config,
        collateral_vault_info,
        destination_info,
        vault_authority_info,
        token_program,
        amount,
    )?;

    msg!("Withdrew {} collateral, balance {}", amount, remaining);
    Ok(())
}

// Liquidations

fn process_flag_account(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let flagger_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;
    let book_info = next_account_info(account_info_iter)?;
    let entry_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;
    let collateral_feed_info = next_account_info(account_info_iter)?;
    let debt_feed_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    require_signer(flagger_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    let status: SystemStatus = load(program_id, status_info)?;
    status.require_active(&[SystemSection::System])?;

    let registry: DebtShareRegistry = load(program_id, registry_info)?;
    let mut book: LiquidationBook = load(program_id, book_info)?;
    let staker: StakerAccount = load(program_id, staker_info)?;
    let (collateral_feed, debt_feed) = load_feeds(program_id, collateral_feed_info, debt_feed_info)?;

    let now = now()?;
    let oracle = FeedOracle::new(&collateral_feed, &debt_feed, &config.settings, now);
    let market = fresh_market_snapshot(&oracle)?;
    let position = staker_position(&staker, registry.total_debt_shares, &market)?;

    let mut entry = load_liquidation_entry(program_id, entry_info, &staker.owner)?;
    let deadline = flag_account(&mut book, &mut entry, &config.settings, flagger_info.key, &position, now)?;

    if entry_info.data_is_empty() {
        create_pda_account(
            program_id,
            flagger_info,
            entry_info,
            system_program,
            LiquidationEntry::LEN,
            &[seeds::LIQUIDATION_ENTRY, staker.owner.as_ref(), &[entry.bump]],
        )?;
    }
    store(entry_info, &entry)?;
    store(book_info, &book)?;

    AccountFlaggedForLiquidation { account: staker.owner, deadline }.emit();
    Ok(())
}

fn process_remove_account_in_liquidation(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let caller_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;
    let book_info = next_account_info(account_info_iter)?;
    let entry_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;
    let collateral_feed_info = next_account_info(account_info_iter)?;
    let debt_feed_info = next_account_info(account_info_iter)?;

    require_signer(caller_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    let registry: DebtShareRegistry = load(program_id, registry_info)?;
    let mut book: LiquidationBook = load(program_id, book_info)?;
    let staker: StakerAccount = load(program_id, staker_info)?;
    let (collateral_feed, debt_feed) = load_feeds(program_id, collateral_feed_info, debt_feed_info)?;

    let now = now()?;
    let oracle = FeedOracle::new(&collateral_feed, &debt_feed, &config.settings, now);
    let market = fresh_market_snapshot(&oracle)?;
    let position = staker_position(&staker, registry.total_debt_shares, &market)?;

    let mut entry = load_liquidation_entry(program_id, entry_info, &staker.owner)?;
    if !remove_if_healthy(&mut book, &mut entry, &config.settings, &position)? {
        msg!("Account {} still above issuance ratio, entry kept", staker.owner);
        return Ok(());
    }
    store(entry_info, &entry)?;
    store(book_info, &book)?;

    AccountRemovedFromLiquidation { account: staker.owner, time: now }.emit();
    Ok(())
}

fn process_liquidate_delinquent_account(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let liquidator_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let book_info = next_account_info(account_info_iter)?;
    let entry_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;
    let collateral_feed_info = next_account_info(account_info_iter)?;
    let debt_feed_info = next_account_info(account_info_iter)?;
    let collateral_vault_info = next_account_info(account_info_iter)?;
    let flagger_destination_info = next_account_info(account_info_iter)?;
    let liquidator_destination_info = next_account_info(account_info_iter)?;
    let vault_authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    require_signer(liquidator_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    let status: SystemStatus = load(program_id, status_info)?;
    status.require_active(&[SystemSection::System])?;

    let mut ledger: FeePeriodLedger = load(program_id, ledger_info)?;
    let mut registry: DebtShareRegistry = load(program_id, registry_info)?;
    let mut pool: RewardPool = load(program_id, pool_info)?;
    let mut book: LiquidationBook = load(program_id, book_info)?;
    let mut staker: StakerAccount = load(program_id, staker_info)?;
    let (collateral_feed, debt_feed) = load_feeds(program_id, collateral_feed_info, debt_feed_info)?;

    require_vault(collateral_vault_info, &config.collateral_vault)?;
    check_vault_authority(program_id, &config, vault_authority_info)?;
    require_token_program(token_program)?;

    let now = now()?;
    let settings = &config.settings;
    let oracle = FeedOracle::new(&collateral_feed, &debt_feed, settings, now);
    let market = fresh_market_snapshot(&oracle)?;
    let position = staker_position(&staker, registry.total_debt_shares, &market)?;

    let account = staker.owner;
    let mut entry = load_liquidation_entry(program_id, entry_info, &account)?;
    check_liquidatable(&entry, settings, &position, now)?;
    require_token_owner(flagger_destination_info, &entry.flagger)?;
    require_token_owner(liquidator_destination_info, liquidator_info.key)?;

    let plan = plan_liquidation(
        &position,
        market.collateral_price,
        settings.liquidation_penalty,
        settings.require_issuance_ratio()?,
        settings.flag_reward,
        settings.liquidate_reward,
    )?;
    execute_liquidation(&mut ledger, &mut registry, &mut pool, &mut staker, &plan, now)?;
    book.close_entry(&mut entry, true);

    store(ledger_info, &ledger)?;
    store(registry_info, &registry)?;
    store(pool_info, &pool)?;
    store(book_info, &book)?;
    store(entry_info, &entry)?;
    store(staker_info, &staker)?;

    transfer_from_vault(
        &config,
        collateral_vault_info,
        flagger_destination_info,
        vault_authority_info,
        token_program,
        plan.flag_reward,
    )?;
    transfer_from_vault(
        &config,
        collateral_vault_info,
        liquidator_destination_info,
        vault_authority_info,
        token_program,
        plan.liquidate_reward,
    )?;

    msg!(
        "Liquidated {}: full={} shares burned {}",
        account,
        plan.is_full,
        plan.debt_shares_burned
    );
    AccountLiquidated {
        account,
        collateral_redeemed: plan.collateral_redeemed,
        debt_removed: plan.debt_removed,
        liquidator: *liquidator_info.key,
        is_self: false,
    }
    .emit();
    if plan.pool_deposit > 0 {
        RewardsDeposited { amount: plan.pool_deposit }.emit();
    }
    Ok(())
}

fn process_liquidate_self(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let owner_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let registry_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let book_info = next_account_info(account_info_iter)?;
    let entry_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;
    let collateral_feed_info = next_account_info(account_info_iter)?;
    let debt_feed_info = next_account_info(account_info_iter)?;

    require_signer(owner_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    let status: SystemStatus = load(program_id, status_info)?;
    status.require_active(&[SystemSection::System])?;

    let mut ledger: FeePeriodLedger = load(program_id, ledger_info)?;
    let mut registry: DebtShareRegistry = load(program_id, registry_info)?;
    let mut pool: RewardPool = load(program_id, pool_info)?;
    let mut book: LiquidationBook = load(program_id, book_info)?;
    let mut entry = load_liquidation_entry(program_id, entry_info, owner_info.key)?;
    let mut staker = load_staker_of(program_id, staker_info, owner_info.key)?;
    let (collateral_feed, debt_feed) = load_feeds(program_id, collateral_feed_info, debt_feed_info)?;

    let now = now()?;
    let settings = &config.settings;
    let oracle = FeedOracle::new(&collateral_feed, &debt_feed, settings, now);
    let market = fresh_market_snapshot(&oracle)?;
    let position = staker_position(&staker, registry.total_debt_shares, &market)?;
    check_self_liquidatable(settings, &position)?;

    // No flagger or liquidator to pay; everything redeemed goes to the pool
    let plan = plan_liquidation(
        &position,
        market.collateral_price,
        settings.self_liquidation_penalty,
        settings.require_issuance_ratio()?,
        0,
        0,
    )?;
    execute_liquidation(&mut ledger, &mut registry, &mut pool, &mut staker, &plan, now)?;
    let was_flagged = book.close_entry(&mut entry, true);

    store(ledger_info, &ledger)?;
    store(registry_info, &registry)?;
    store(pool_info, &pool)?;
    if was_flagged {
        store(book_info, &book)?;
        store(entry_info, &entry)?;
    }
    store(staker_info, &staker)?;

    AccountLiquidated {
        account: *owner_info.key,
        collateral_redeemed: plan.collateral_redeemed,
        debt_removed: plan.debt_removed,
        liquidator: *owner_info.key,
        is_self: true,
    }
    .emit();
    if plan.pool_deposit > 0 {
        RewardsDeposited { amount: plan.pool_deposit }.emit();
    }
    Ok(())
}

// Reward pool

fn process_get_reward(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let owner_info = next_account_info(account_info_iter)?;
    let config_info = next_account_info(account_info_iter)?;
    let status_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let staker_info = next_account_info(account_info_iter)?;
    let collateral_vault_info = next_account_info(account_info_iter)?;
    let destination_info = next_account_info(account_info_iter)?;
    let vault_authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    require_signer(owner_info)?;
    let config: FeePoolConfig = load(program_id, config_info)?;
    let status: SystemStatus = load(program_id, status_info)?;
    status.require_active(&[SystemSection::System])?;

    let mut pool: RewardPool = load(program_id, pool_info)?;
    let mut staker = load_staker_of(program_id, staker_info, owner_info.key)?;

    require_vault(collateral_vault_info, &config.collateral_vault)?;
    require_token_owner(destination_info, owner_info.key)?;
    check_vault_authority(program_id, &config, vault_authority_info)?;
    require_token_program(token_program)?;

    let amount = pool.take_reward(&mut staker.rewards, staker.debt_shares)?;
    if amount == 0 {
        msg!("No liquidation rewards accrued for {}", owner_info.key);
        return Ok(());
    }

    store(pool_info, &pool)?;
    store(staker_info, &staker)?;

    transfer_from_vault(
        &config,
        collateral_vault_info,
        destination_info,
        vault_authority_info,
        token_program,
        amount,
    )?;

    RewardPaid { account: *owner_info.key, amount }.emit();
    Ok(())
}
