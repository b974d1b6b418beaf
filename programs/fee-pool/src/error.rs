use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Broad failure classes surfaced to clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required setting is unset or out of range
    Configuration,
    /// The relevant system section is suspended
    Suspension,
    /// Oracle or debt snapshot data is too old, or a period id is out of date
    Staleness,
    /// Caller lacks the role or approval for the operation
    Authorization,
    /// The operation is valid but its state precondition does not hold
    Precondition,
    /// Arithmetic or bookkeeping invariant would break
    InvariantViolation,
}

#[derive(Error, Debug, Copy, Clone, FromPrimitive, PartialEq, Eq)]
pub enum FeePoolError {
    #[error("Invalid instruction")]
    InvalidInstruction = 0,

    #[error("Account not initialized")]
    NotInitialized = 1,

    #[error("Account already initialized")]
    AlreadyInitialized = 2,

    #[error("Invalid account discriminator")]
    InvalidDiscriminator = 3,

    #[error("Invalid PDA")]
    InvalidPDA = 4,

    #[error("Invalid authority")]
    InvalidAuthority = 5,

    // Configuration
    #[error("Fee period duration not set")]
    FeePeriodDurationNotSet = 10,

    #[error("Issuance ratio not set")]
    IssuanceRatioNotSet = 11,

    #[error("Liquidation ratio not set")]
    LiquidationRatioNotSet = 12,

    #[error("Invalid settings")]
    InvalidSettings = 13,

    #[error("Unknown system section")]
    UnknownSection = 14,

    // Suspension
    #[error("Operation prohibited: system suspended")]
    SystemSuspended = 20,

    #[error("Operation prohibited: issuance suspended")]
    IssuanceSuspended = 21,

    #[error("Operation prohibited: exchange suspended")]
    ExchangeSuspended = 22,

    #[error("Operation prohibited: synth suspended")]
    SynthSuspended = 23,

    // Staleness
    #[error("Collateral rate is stale or invalid")]
    CollateralRateStale = 30,

    #[error("Debt snapshot is stale or invalid")]
    DebtSnapshotStale = 31,

    #[error("Fee period id does not match the open period")]
    FeePeriodIdMismatch = 32,

    // Authorization
    #[error("Caller is not the relayer")]
    NotRelayer = 40,

    #[error("Caller is not the debt share issuer")]
    NotIssuer = 41,

    #[error("Caller is not the fee recorder")]
    NotFeeRecorder = 42,

    #[error("Caller is not the oracle authority")]
    NotOracleAuthority = 43,

    #[error("Not approved to claim on behalf")]
    NotApprovedToClaim = 44,

    #[error("Can only perform this action during setup")]
    SetupWindowClosed = 45,

    #[error("Token account does not match")]
    TokenAccountMismatch = 46,

    #[error("Staker account does not belong to signer")]
    StakerOwnerMismatch = 47,

    // Preconditions
    #[error("Too early to close fee period")]
    FeePeriodNotElapsed = 50,

    #[error("No fees or rewards available for period, or fees already claimed")]
    NothingToClaim = 51,

    #[error("C-Ratio below penalty threshold")]
    CRatioBelowPenaltyThreshold = 52,

    #[error("Account already flagged for liquidation")]
    AccountAlreadyFlagged = 53,

    #[error("Account issuance ratio is less than liquidation ratio")]
    BelowLiquidationRatio = 54,

    #[error("Account has no liquidation set")]
    AccountNotFlagged = 55,

    #[error("Liquidation deadline has not passed")]
    LiquidationDeadlineNotPassed = 56,

    #[error("Account is healthy, nothing to liquidate")]
    AccountHealthy = 58,

    #[error("Fee period index out of range")]
    InvalidPeriodIndex = 60,

    #[error("Insufficient collateral")]
    InsufficientCollateral = 61,

    #[error("Withdrawal would breach issuance ratio")]
    WithdrawalBreachesIssuanceRatio = 62,

    #[error("Account is flagged for liquidation")]
    AccountFlagged = 63,

    #[error("Amount must be greater than zero")]
    ZeroAmount = 64,

    // Invariants
    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 70,

    #[error("Division by zero")]
    DivisionByZero = 71,

    #[error("Claim exceeds distributable amount")]
    ClaimExceedsDistributable = 72,

    #[error("Debt share total out of sync")]
    DebtShareTotalMismatch = 73,

    #[error("Reward pool balance insufficient")]
    RewardPoolInsufficient = 74,
}

impl FeePoolError {
    pub fn kind(&self) -> ErrorKind {
        use FeePoolError::*;
        match self {
            FeePeriodDurationNotSet | IssuanceRatioNotSet | LiquidationRatioNotSet
            | InvalidSettings | UnknownSection => ErrorKind::Configuration,

            SystemSuspended | IssuanceSuspended | ExchangeSuspended | SynthSuspended => {
                ErrorKind::Suspension
            }

            CollateralRateStale | DebtSnapshotStale | FeePeriodIdMismatch => ErrorKind::Staleness,

            InvalidAuthority | NotRelayer | NotIssuer | NotFeeRecorder | NotOracleAuthority
            | NotApprovedToClaim | SetupWindowClosed | TokenAccountMismatch
            | StakerOwnerMismatch => ErrorKind::Authorization,

            ArithmeticOverflow | DivisionByZero | ClaimExceedsDistributable
            | DebtShareTotalMismatch | RewardPoolInsufficient => ErrorKind::InvariantViolation,

            _ => ErrorKind::Precondition,
        }
    }
}

impl PrintProgramError for FeePoolError {
    fn print<E>(&self) {
        msg!("FeePoolError: {}", self);
    }
}

impl From<FeePoolError> for ProgramError {
    fn from(e: FeePoolError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for FeePoolError {
    fn type_of() -> &'static str {
        "FeePoolError"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn test_custom_code_round_trips_through_program_error() {
        let err: ProgramError = FeePoolError::NothingToClaim.into();
        let code = match err {
            ProgramError::Custom(code) => code,
            _ => panic!("expected custom error"),
        };
        assert_eq!(FeePoolError::from_u32(code), Some(FeePoolError::NothingToClaim));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(FeePoolError::FeePeriodDurationNotSet.kind(), ErrorKind::Configuration);
        assert_eq!(FeePoolError::IssuanceSuspended.kind(), ErrorKind::Suspension);
        assert_eq!(FeePoolError::DebtSnapshotStale.kind(), ErrorKind::Staleness);
        assert_eq!(FeePoolError::NotApprovedToClaim.kind(), ErrorKind::Authorization);
        assert_eq!(FeePoolError::FeePeriodNotElapsed.kind(), ErrorKind::Precondition);
        assert_eq!(FeePoolError::ArithmeticOverflow.kind(), ErrorKind::InvariantViolation);
    }
}
