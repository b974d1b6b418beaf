use fee_pool::{
    error::FeePoolError,
    instruction::{
        claim_fees, claim_on_behalf, close_current_period, close_secondary, deposit_collateral,
        flag_account_for_liquidation, get_reward, initialize_fee_pool, initialize_rate_feed, initialize_staker,
        liquidate_delinquent_account, liquidate_self, record_debt_share_change, record_fee,
        remove_account_in_liquidation, set_delegate_approval, set_suspension, submit_rate, withdraw_collateral,
        ClaimTokenAccounts,
    },
    math::UNIT,
    pda::{find_liquidation_entry_address, find_staker_address, FeePoolAddresses},
    state::{
        FeePeriodLedger, FeePoolSettings, LiquidationBook, LiquidationEntry, RewardPool, StakerAccount,
        SystemSection, COLLATERAL_ASSET, TOTAL_DEBT_ASSET,
    },
};
use borsh::BorshDeserialize;
use solana_program::{
    clock::Clock, instruction::Instruction, program_pack::Pack, pubkey::Pubkey, system_instruction,
};
use solana_program_test::*;
use solana_sdk::{
    instruction::InstructionError,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};

const WEEK: i64 = 7 * 86_400;
const LIQUIDATION_DELAY: i64 = 8 * 3_600;

struct Pool {
    context: ProgramTestContext,
    addresses: FeePoolAddresses,
    fee_mint: Keypair,
    reward_mint: Keypair,
    collateral_mint: Keypair,
    fee_vault: Keypair,
    reward_vault: Keypair,
    collateral_vault: Keypair,
}

async fn process(context: &mut ProgramTestContext, instructions: &[Instruction], signers: &[&Keypair]) -> Result<(), BanksClientError> {
    let blockhash = context.get_new_latest_blockhash().await.unwrap();
    let mut all_signers = vec![&context.payer];
    all_signers.extend_from_slice(signers);
    let transaction =
        Transaction::new_signed_with_payer(instructions, Some(&context.payer.pubkey()), &all_signers, blockhash);
    context.banks_client.process_transaction(transaction).await
}

async fn create_mint(context: &mut ProgramTestContext, mint: &Keypair) {
    let rent = context.banks_client.get_rent().await.unwrap();
    let payer = context.payer.pubkey();
    let instructions = [
        system_instruction::create_account(
            &payer,
            &mint.pubkey(),
            rent.minimum_balance(spl_token::state::Mint::LEN),
            spl_token::state::Mint::LEN as u64,
            &spl_token::id(),
        ),
        spl_token::instruction::initialize_mint(&spl_token::id(), &mint.pubkey(), &payer, None, 6).unwrap(),
    ];
    process(context, &instructions, &[mint]).await.unwrap();
}

async fn create_token_account(context: &mut ProgramTestContext, account: &Keypair, mint: &Pubkey, owner: &Pubkey) {
    let rent = context.banks_client.get_rent().await.unwrap();
    let payer = context.payer.pubkey();
    let instructions = [
        system_instruction::create_account(
            &payer,
            &account.pubkey(),
            rent.minimum_balance(spl_token::state::Account::LEN),
            spl_token::state::Account::LEN as u64,
            &spl_token::id(),
        ),
        spl_token::instruction::initialize_account(&spl_token::id(), &account.pubkey(), mint, owner).unwrap(),
    ];
    process(context, &instructions, &[account]).await.unwrap();
}

async fn mint_to(context: &mut ProgramTestContext, mint: &Pubkey, destination: &Pubkey, amount: u64) {
    let payer = context.payer.pubkey();
    let instruction =
        spl_token::instruction::mint_to(&spl_token::id(), mint, destination, &payer, &[], amount).unwrap();
    process(context, &[instruction], &[]).await.unwrap();
}

async fn token_balance(context: &mut ProgramTestContext, account: &Pubkey) -> u64 {
    let account = context.banks_client.get_account(*account).await.unwrap().unwrap();
    spl_token::state::Account::unpack(&account.data).unwrap().amount
}

async fn read_state<T: BorshDeserialize>(context: &mut ProgramTestContext, address: &Pubkey) -> T {
    let account = context.banks_client.get_account(*address).await.unwrap().unwrap();
    let mut data: &[u8] = &account.data;
    T::deserialize(&mut data).unwrap()
}

async fn advance_clock(context: &mut ProgramTestContext, seconds: i64) {
    let mut clock: Clock = context.banks_client.get_sysvar().await.unwrap();
    clock.unix_timestamp += seconds;
    context.set_sysvar(&clock);
}

fn custom_error(error: BanksClientError) -> u32 {
    match error.unwrap() {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => code,
        other => panic!("unexpected error {:?}", other),
    }
}

async fn fund(context: &mut ProgramTestContext, to: &Pubkey) {
    let payer = context.payer.pubkey();
    process(context, &[system_instruction::transfer(&payer, to, 1_000_000_000)], &[])
        .await
        .unwrap();
}

async fn init_rates(pool: &mut Pool, price: u64, total_debt: u64) {
    let program_id = fee_pool::id();
    let oracle = pool.context.payer.pubkey();
    process(
        &mut pool.context,
        &[
            initialize_rate_feed(&program_id, &oracle, COLLATERAL_ASSET),
            initialize_rate_feed(&program_id, &oracle, TOTAL_DEBT_ASSET),
        ],
        &[],
    )
    .await
    .unwrap();
    set_rates(pool, price, total_debt).await;
}

async fn set_rates(pool: &mut Pool, price: u64, total_debt: u64) {
    let program_id = fee_pool::id();
    let oracle = pool.context.payer.pubkey();
    process(
        &mut pool.context,
        &[
            submit_rate(&program_id, &oracle, COLLATERAL_ASSET, price),
            submit_rate(&program_id, &oracle, TOTAL_DEBT_ASSET, total_debt),
        ],
        &[],
    )
    .await
    .unwrap();
}

/// Open a staker for `owner`, deposit `collateral` and report `debt_shares`
async fn stake(pool: &mut Pool, owner: &Keypair, collateral: u64, debt_shares: u64) {
    let program_id = fee_pool::id();
    let issuer = pool.context.payer.pubkey();
    let source = Keypair::new();
    let collateral_mint = pool.collateral_mint.pubkey();
    create_token_account(&mut pool.context, &source, &collateral_mint, &owner.pubkey()).await;
    mint_to(&mut pool.context, &collateral_mint, &source.pubkey(), collateral).await;

    process(
        &mut pool.context,
        &[
            initialize_staker(&program_id, &issuer, &owner.pubkey()),
            deposit_collateral(
                &program_id,
                &owner.pubkey(),
                &source.pubkey(),
                &pool.collateral_vault.pubkey(),
                collateral,
            ),
            record_debt_share_change(&program_id, &issuer, &owner.pubkey(), debt_shares),
        ],
        &[owner],
    )
    .await
    .unwrap();
}

async fn collateral_account(pool: &mut Pool, owner: &Pubkey) -> Pubkey {
    let account = Keypair::new();
    let collateral_mint = pool.collateral_mint.pubkey();
    create_token_account(&mut pool.context, &account, &collateral_mint, owner).await;
    account.pubkey()
}

async fn staker_state(pool: &mut Pool, owner: &Pubkey) -> StakerAccount {
    let (address, _) = find_staker_address(&fee_pool::id(), owner);
    read_state(&mut pool.context, &address).await
}

/// The collateral vault holds every staker's collateral plus the reward pool balance
async fn assert_vault_backs_collateral(pool: &mut Pool, owners: &[Pubkey]) -> u64 {
    let mut held = 0;
    for owner in owners {
        held += staker_state(pool, owner).await.collateral;
    }
    let reward_pool: RewardPool = read_state(&mut pool.context, &pool.addresses.reward_pool).await;
    let vault = pool.collateral_vault.pubkey();
    let balance = token_balance(&mut pool.context, &vault).await;
    assert_eq!(balance, held + reward_pool.balance);
    balance
}

async fn setup() -> Pool {
    let program_test = ProgramTest::new("fee_pool", fee_pool::id(), processor!(fee_pool::process_instruction));
    let mut pool = Pool {
        context: program_test.start_with_context().await,
        addresses: FeePoolAddresses::derive(&fee_pool::id()),
        fee_mint: Keypair::new(),
        reward_mint: Keypair::new(),
        collateral_mint: Keypair::new(),
        fee_vault: Keypair::new(),
        reward_vault: Keypair::new(),
        collateral_vault: Keypair::new(),
    };

    let vault_authority = pool.addresses.vault_authority;
    for (mint, vault) in [
        (&pool.fee_mint, &pool.fee_vault),
        (&pool.reward_mint, &pool.reward_vault),
        (&pool.collateral_mint, &pool.collateral_vault),
    ] {
        create_mint(&mut pool.context, mint).await;
        create_token_account(&mut pool.context, vault, &mint.pubkey(), &vault_authority).await;
    }

    let authority = pool.context.payer.pubkey();
    let instruction = initialize_fee_pool(
        &fee_pool::id(),
        &authority,
        &pool.fee_vault.pubkey(),
        &pool.reward_vault.pubkey(),
        &pool.collateral_vault.pubkey(),
        FeePoolSettings::default(),
    );
    process(&mut pool.context, &[instruction], &[]).await.unwrap();
    pool
}

#[tokio::test]
async fn test_initialize_opens_first_period() {
    let mut pool = setup().await;
    let clock: Clock = pool.context.banks_client.get_sysvar().await.unwrap();

    let ledger: FeePeriodLedger = read_state(&mut pool.context, &pool.addresses.fee_ledger).await;
    assert_eq!(ledger.current_period().fee_period_id, 1);
    assert_eq!(ledger.current_period().start_time, clock.unix_timestamp);

    // Singletons cannot be created twice
    let authority = pool.context.payer.pubkey();
    let again = initialize_fee_pool(
        &fee_pool::id(),
        &authority,
        &pool.fee_vault.pubkey(),
        &pool.reward_vault.pubkey(),
        &pool.collateral_vault.pubkey(),
        FeePoolSettings::default(),
    );
    let error = process(&mut pool.context, &[again], &[]).await.unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::AlreadyInitialized as u32);
}

#[tokio::test]
async fn test_close_waits_for_period_and_respects_suspension() {
    let mut pool = setup().await;
    let caller = pool.context.payer.pubkey();

    let error = process(&mut pool.context, &[close_current_period(&fee_pool::id(), &caller)], &[])
        .await
        .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::FeePeriodNotElapsed as u32);

    advance_clock(&mut pool.context, WEEK).await;

    let suspend = set_suspension(&fee_pool::id(), &caller, SystemSection::Issuance as u8, true, 1);
    process(&mut pool.context, &[suspend], &[]).await.unwrap();
    let error = process(&mut pool.context, &[close_current_period(&fee_pool::id(), &caller)], &[])
        .await
        .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::IssuanceSuspended as u32);

    let resume = set_suspension(&fee_pool::id(), &caller, SystemSection::Issuance as u8, false, 0);
    process(&mut pool.context, &[resume], &[]).await.unwrap();
    process(&mut pool.context, &[close_current_period(&fee_pool::id(), &caller)], &[])
        .await
        .unwrap();

    let ledger: FeePeriodLedger = read_state(&mut pool.context, &pool.addresses.fee_ledger).await;
    assert_eq!(ledger.current_period().fee_period_id, 2);
    assert_eq!(ledger.period(1).unwrap().fee_period_id, 1);
}

#[tokio::test]
async fn test_relayer_close_is_not_replayable() {
    let mut pool = setup().await;
    let relayer = pool.context.payer.pubkey();

    process(&mut pool.context, &[close_secondary(&fee_pool::id(), &relayer, 1, WEEK)], &[])
        .await
        .unwrap();

    let error = process(&mut pool.context, &[close_secondary(&fee_pool::id(), &relayer, 1, WEEK)], &[])
        .await
        .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::FeePeriodIdMismatch as u32);

    // Only the registered relayer may use this path
    let stranger = Keypair::new();
    let error = process(
        &mut pool.context,
        &[close_secondary(&fee_pool::id(), &stranger.pubkey(), 2, WEEK)],
        &[&stranger],
    )
    .await
    .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::NotRelayer as u32);
}

#[tokio::test]
async fn test_sole_staker_claims_recorded_fees_once() {
    let mut pool = setup().await;
    let program_id = fee_pool::id();
    let owner = pool.context.payer.pubkey();

    let refresh_rates = [
        submit_rate(&program_id, &owner, COLLATERAL_ASSET, UNIT),
        submit_rate(&program_id, &owner, TOTAL_DEBT_ASSET, 100 * UNIT),
    ];
    process(
        &mut pool.context,
        &[
            initialize_rate_feed(&program_id, &owner, COLLATERAL_ASSET),
            initialize_rate_feed(&program_id, &owner, TOTAL_DEBT_ASSET),
        ],
        &[],
    )
    .await
    .unwrap();
    process(&mut pool.context, &refresh_rates, &[]).await.unwrap();

    // Collateral in, then debt shares reported by the issuer
    let collateral_account = Keypair::new();
    let collateral_mint = pool.collateral_mint.pubkey();
    create_token_account(&mut pool.context, &collateral_account, &collateral_mint, &owner).await;
    mint_to(&mut pool.context, &collateral_mint, &collateral_account.pubkey(), 1_000 * UNIT).await;

    process(
        &mut pool.context,
        &[
            initialize_staker(&program_id, &owner, &owner),
            deposit_collateral(
                &program_id,
                &owner,
                &collateral_account.pubkey(),
                &pool.collateral_vault.pubkey(),
                1_000 * UNIT,
            ),
            record_debt_share_change(&program_id, &owner, &owner, 100 * UNIT),
            record_fee(&program_id, &owner, 50 * UNIT),
        ],
        &[],
    )
    .await
    .unwrap();
    let fee_mint = pool.fee_mint.pubkey();
    let fee_vault = pool.fee_vault.pubkey();
    mint_to(&mut pool.context, &fee_mint, &fee_vault, 50 * UNIT).await;

    advance_clock(&mut pool.context, WEEK).await;
    process(&mut pool.context, &refresh_rates, &[]).await.unwrap();
    process(&mut pool.context, &[close_current_period(&program_id, &owner)], &[])
        .await
        .unwrap();

    let fee_destination = Keypair::new();
    let reward_destination = Keypair::new();
    let reward_mint = pool.reward_mint.pubkey();
    create_token_account(&mut pool.context, &fee_destination, &fee_mint, &owner).await;
    create_token_account(&mut pool.context, &reward_destination, &reward_mint, &owner).await;

    let tokens = ClaimTokenAccounts {
        fee_vault,
        fee_destination: fee_destination.pubkey(),
        reward_vault: pool.reward_vault.pubkey(),
        reward_destination: reward_destination.pubkey(),
    };
    process(&mut pool.context, &[claim_fees(&program_id, &owner, &tokens)], &[])
        .await
        .unwrap();

    assert_eq!(token_balance(&mut pool.context, &fee_destination.pubkey()).await, 50 * UNIT);
    assert_eq!(token_balance(&mut pool.context, &fee_vault).await, 0);

    let (staker_address, _) = fee_pool::pda::find_staker_address(&program_id, &owner);
    let staker: StakerAccount = read_state(&mut pool.context, &staker_address).await;
    assert_eq!(staker.last_fee_withdrawal, 1);
    assert_eq!(staker.collateral, 1_000 * UNIT);

    let error = process(&mut pool.context, &[claim_fees(&program_id, &owner, &tokens)], &[])
        .await
        .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::NothingToClaim as u32);
}

#[tokio::test]
async fn test_suspended_issuance_blocks_relayer_close() {
    let mut pool = setup().await;
    let relayer = pool.context.payer.pubkey();

    let suspend = set_suspension(&fee_pool::id(), &relayer, SystemSection::Issuance as u8, true, 1);
    process(&mut pool.context, &[suspend], &[]).await.unwrap();
    let error = process(&mut pool.context, &[close_secondary(&fee_pool::id(), &relayer, 1, WEEK)], &[])
        .await
        .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::IssuanceSuspended as u32);

    let ledger: FeePeriodLedger = read_state(&mut pool.context, &pool.addresses.fee_ledger).await;
    assert_eq!(ledger.current_period().fee_period_id, 1);

    let resume = set_suspension(&fee_pool::id(), &relayer, SystemSection::Issuance as u8, false, 0);
    process(&mut pool.context, &[resume], &[]).await.unwrap();
    process(&mut pool.context, &[close_secondary(&fee_pool::id(), &relayer, 1, WEEK)], &[])
        .await
        .unwrap();

    let ledger: FeePeriodLedger = read_state(&mut pool.context, &pool.addresses.fee_ledger).await;
    assert_eq!(ledger.current_period().fee_period_id, 2);
}

#[tokio::test]
async fn test_flagged_account_is_liquidated_and_pool_pays_stakers() {
    let mut pool = setup().await;
    let program_id = fee_pool::id();
    let liquidator = pool.context.payer.pubkey();
    let alice = Keypair::new();
    let bob = Keypair::new();
    let flagger = Keypair::new();
    let owners = [alice.pubkey(), bob.pubkey()];

    init_rates(&mut pool, UNIT, 20_000 * UNIT).await;
    stake(&mut pool, &alice, 30_000 * UNIT, 1_000 * UNIT).await;
    stake(&mut pool, &bob, 1_000_000 * UNIT, 1_000 * UNIT).await;
    assert_eq!(assert_vault_backs_collateral(&mut pool, &owners).await, 1_030_000 * UNIT);

    // 10,000 of debt against 30,000 of collateral value is not flaggable
    fund(&mut pool.context, &flagger.pubkey()).await;
    let flag = flag_account_for_liquidation(&program_id, &flagger.pubkey(), &alice.pubkey());
    let error = process(&mut pool.context, &[flag.clone()], &[&flagger]).await.unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::BelowLiquidationRatio as u32);

    // Price halves: ratio 0.666
    set_rates(&mut pool, UNIT / 2, 20_000 * UNIT).await;
    process(&mut pool.context, &[flag], &[&flagger]).await.unwrap();

    let (entry_address, _) = find_liquidation_entry_address(&program_id, &alice.pubkey());
    let entry: LiquidationEntry = read_state(&mut pool.context, &entry_address).await;
    assert!(entry.is_active);
    assert_eq!(entry.flagger, flagger.pubkey());

    let flagger_destination = collateral_account(&mut pool, &flagger.pubkey()).await;
    let liquidator_destination = collateral_account(&mut pool, &liquidator).await;
    let vault = pool.collateral_vault.pubkey();

    let error = process(
        &mut pool.context,
        &[liquidate_delinquent_account(
            &program_id,
            &liquidator,
            &alice.pubkey(),
            &vault,
            &flagger_destination,
            &liquidator_destination,
        )],
        &[],
    )
    .await
    .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::LiquidationDeadlineNotPassed as u32);

    advance_clock(&mut pool.context, LIQUIDATION_DELAY).await;
    set_rates(&mut pool, UNIT / 2, 20_000 * UNIT).await;

    // The flag reward may only go to a token account of the flagger
    let error = process(
        &mut pool.context,
        &[liquidate_delinquent_account(
            &program_id,
            &liquidator,
            &alice.pubkey(),
            &vault,
            &liquidator_destination,
            &liquidator_destination,
        )],
        &[],
    )
    .await
    .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::TokenAccountMismatch as u32);

    process(
        &mut pool.context,
        &[liquidate_delinquent_account(
            &program_id,
            &liquidator,
            &alice.pubkey(),
            &vault,
            &flagger_destination,
            &liquidator_destination,
        )],
        &[],
    )
    .await
    .unwrap();

    assert_eq!(token_balance(&mut pool.context, &flagger_destination).await, 10 * UNIT);
    assert_eq!(token_balance(&mut pool.context, &liquidator_destination).await, 20 * UNIT);

    let alice_state = staker_state(&mut pool, &alice.pubkey()).await;
    assert_eq!(alice_state.collateral, 5_405_405_404);
    assert_eq!(alice_state.debt_shares, 1_000 * UNIT - 945_945_946);

    let reward_pool: RewardPool = read_state(&mut pool.context, &pool.addresses.reward_pool).await;
    assert_eq!(reward_pool.balance, 24_564_594_596);
    assert_eq!(assert_vault_backs_collateral(&mut pool, &owners).await, 1_029_970 * UNIT);

    let entry: LiquidationEntry = read_state(&mut pool.context, &entry_address).await;
    assert!(!entry.is_active);
    let book: LiquidationBook = read_state(&mut pool.context, &pool.addresses.liquidation_book).await;
    assert_eq!(book.total_flagged, 1);
    assert_eq!(book.total_liquidated, 1);
    assert_eq!(book.active_entries, 0);

    // Bob holds 1,000 of the 1,054.054054 remaining shares
    let bob_destination = collateral_account(&mut pool, &bob.pubkey()).await;
    process(
        &mut pool.context,
        &[get_reward(&program_id, &bob.pubkey(), &vault, &bob_destination)],
        &[&bob],
    )
    .await
    .unwrap();
    assert_eq!(token_balance(&mut pool.context, &bob_destination).await, 23_304_871_797);

    let reward_pool: RewardPool = read_state(&mut pool.context, &pool.addresses.reward_pool).await;
    assert_eq!(reward_pool.balance, 24_564_594_596 - 23_304_871_797);
    assert_eq!(staker_state(&mut pool, &bob.pubkey()).await.rewards.accrued_unclaimed, 0);
    assert_vault_backs_collateral(&mut pool, &owners).await;
}

#[tokio::test]
async fn test_self_liquidation_moves_collateral_into_pool() {
    let mut pool = setup().await;
    let program_id = fee_pool::id();
    let alice = Keypair::new();
    let bob = Keypair::new();
    let owners = [alice.pubkey(), bob.pubkey()];

    init_rates(&mut pool, UNIT, 20_000 * UNIT).await;
    stake(&mut pool, &alice, 30_000 * UNIT, 1_000 * UNIT).await;
    stake(&mut pool, &bob, 1_000_000 * UNIT, 1_000 * UNIT).await;

    // Bob sits well under the issuance ratio
    let error = process(&mut pool.context, &[liquidate_self(&program_id, &bob.pubkey())], &[&bob])
        .await
        .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::AccountHealthy as u32);

    process(&mut pool.context, &[liquidate_self(&program_id, &alice.pubkey())], &[&alice])
        .await
        .unwrap();

    let alice_state = staker_state(&mut pool, &alice.pubkey()).await;
    assert_eq!(alice_state.collateral, 30_000 * UNIT - 6_315_789_474);

    let reward_pool: RewardPool = read_state(&mut pool.context, &pool.addresses.reward_pool).await;
    assert_eq!(reward_pool.balance, 6_315_789_474);
    assert_eq!(assert_vault_backs_collateral(&mut pool, &owners).await, 1_030_000 * UNIT);

    // Never flagged, so no entry account was created
    let (entry_address, _) = find_liquidation_entry_address(&program_id, &alice.pubkey());
    assert!(pool.context.banks_client.get_account(entry_address).await.unwrap().is_none());
}

#[tokio::test]
async fn test_flag_blocks_withdrawal_until_removed() {
    let mut pool = setup().await;
    let program_id = fee_pool::id();
    let caller = pool.context.payer.pubkey();
    let alice = Keypair::new();
    let bob = Keypair::new();
    let owners = [alice.pubkey(), bob.pubkey()];

    init_rates(&mut pool, UNIT / 2, 20_000 * UNIT).await;
    stake(&mut pool, &alice, 30_000 * UNIT, 1_000 * UNIT).await;
    stake(&mut pool, &bob, 1_000_000 * UNIT, 1_000 * UNIT).await;

    process(
        &mut pool.context,
        &[flag_account_for_liquidation(&program_id, &caller, &alice.pubkey())],
        &[],
    )
    .await
    .unwrap();

    let vault = pool.collateral_vault.pubkey();
    let destination = collateral_account(&mut pool, &alice.pubkey()).await;
    let withdraw = withdraw_collateral(&program_id, &alice.pubkey(), &vault, &destination, 5_000 * UNIT);
    let error = process(&mut pool.context, &[withdraw.clone()], &[&alice]).await.unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::AccountFlagged as u32);

    // Still unhealthy: the entry stays
    let remove = remove_account_in_liquidation(&program_id, &caller, &alice.pubkey());
    process(&mut pool.context, &[remove.clone()], &[]).await.unwrap();
    let (entry_address, _) = find_liquidation_entry_address(&program_id, &alice.pubkey());
    let entry: LiquidationEntry = read_state(&mut pool.context, &entry_address).await;
    assert!(entry.is_active);

    // Price quadruples: 10,000 of debt against 60,000 of collateral value
    set_rates(&mut pool, 2 * UNIT, 20_000 * UNIT).await;
    process(&mut pool.context, &[remove], &[]).await.unwrap();

    let entry: LiquidationEntry = read_state(&mut pool.context, &entry_address).await;
    assert!(!entry.is_active);
    let book: LiquidationBook = read_state(&mut pool.context, &pool.addresses.liquidation_book).await;
    assert_eq!(book.total_removed, 1);
    assert_eq!(book.active_entries, 0);

    // Leaves 25,000 of collateral, exactly at the issuance ratio
    process(&mut pool.context, &[withdraw], &[&alice]).await.unwrap();
    assert_eq!(token_balance(&mut pool.context, &destination).await, 5_000 * UNIT);
    assert_eq!(staker_state(&mut pool, &alice.pubkey()).await.collateral, 25_000 * UNIT);
    assert_eq!(assert_vault_backs_collateral(&mut pool, &owners).await, 1_025_000 * UNIT);

    let error = process(
        &mut pool.context,
        &[withdraw_collateral(&program_id, &alice.pubkey(), &vault, &destination, UNIT)],
        &[&alice],
    )
    .await
    .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::WithdrawalBreachesIssuanceRatio as u32);
}

#[tokio::test]
async fn test_delegate_claims_into_authoriser_accounts() {
    let mut pool = setup().await;
    let program_id = fee_pool::id();
    let delegate = pool.context.payer.pubkey();
    let alice = Keypair::new();

    init_rates(&mut pool, UNIT, 100 * UNIT).await;
    stake(&mut pool, &alice, 1_000 * UNIT, 100 * UNIT).await;
    process(&mut pool.context, &[record_fee(&program_id, &delegate, 50 * UNIT)], &[])
        .await
        .unwrap();
    let fee_mint = pool.fee_mint.pubkey();
    let fee_vault = pool.fee_vault.pubkey();
    mint_to(&mut pool.context, &fee_mint, &fee_vault, 50 * UNIT).await;

    advance_clock(&mut pool.context, WEEK).await;
    set_rates(&mut pool, UNIT, 100 * UNIT).await;
    process(&mut pool.context, &[close_current_period(&program_id, &delegate)], &[])
        .await
        .unwrap();

    let fee_destination = Keypair::new();
    let reward_destination = Keypair::new();
    let reward_mint = pool.reward_mint.pubkey();
    create_token_account(&mut pool.context, &fee_destination, &fee_mint, &alice.pubkey()).await;
    create_token_account(&mut pool.context, &reward_destination, &reward_mint, &alice.pubkey()).await;
    let tokens = ClaimTokenAccounts {
        fee_vault,
        fee_destination: fee_destination.pubkey(),
        reward_vault: pool.reward_vault.pubkey(),
        reward_destination: reward_destination.pubkey(),
    };

    // The authoriser pays for the approval account
    fund(&mut pool.context, &alice.pubkey()).await;
    process(
        &mut pool.context,
        &[set_delegate_approval(&program_id, &alice.pubkey(), &delegate, false)],
        &[&alice],
    )
    .await
    .unwrap();
    let error = process(
        &mut pool.context,
        &[claim_on_behalf(&program_id, &delegate, &alice.pubkey(), &tokens)],
        &[],
    )
    .await
    .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::NotApprovedToClaim as u32);

    process(
        &mut pool.context,
        &[set_delegate_approval(&program_id, &alice.pubkey(), &delegate, true)],
        &[&alice],
    )
    .await
    .unwrap();
    process(
        &mut pool.context,
        &[claim_on_behalf(&program_id, &delegate, &alice.pubkey(), &tokens)],
        &[],
    )
    .await
    .unwrap();

    assert_eq!(token_balance(&mut pool.context, &fee_destination.pubkey()).await, 50 * UNIT);
    assert_eq!(token_balance(&mut pool.context, &fee_vault).await, 0);
    assert_eq!(staker_state(&mut pool, &alice.pubkey()).await.last_fee_withdrawal, 1);

    // Proceeds may not be routed to the delegate
    let delegate_destination = Keypair::new();
    create_token_account(&mut pool.context, &delegate_destination, &fee_mint, &delegate).await;
    let redirected = ClaimTokenAccounts { fee_destination: delegate_destination.pubkey(), ..tokens };
    let error = process(
        &mut pool.context,
        &[claim_on_behalf(&program_id, &delegate, &alice.pubkey(), &redirected)],
        &[],
    )
    .await
    .unwrap_err();
    assert_eq!(custom_error(error), FeePoolError::TokenAccountMismatch as u32);
}
