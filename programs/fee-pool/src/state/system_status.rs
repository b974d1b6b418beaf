use borsh::{BorshDeserialize, BorshSerialize};

use crate::{error::FeePoolError, state::AccountState};

/// Independently suspendable parts of the system
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSection {
    System,
    Issuance,
    Exchange,
    Synth,
}

impl SystemSection {
    pub const COUNT: usize = 4;

    pub fn from_u8(value: u8) -> Result<Self, FeePoolError> {
        match value {
            0 => Ok(Self::System),
            1 => Ok(Self::Issuance),
            2 => Ok(Self::Exchange),
            3 => Ok(Self::Synth),
            _ => Err(FeePoolError::UnknownSection),
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn suspended_error(&self) -> FeePoolError {
        match self {
            Self::System => FeePoolError::SystemSuspended,
            Self::Issuance => FeePoolError::IssuanceSuspended,
            Self::Exchange => FeePoolError::ExchangeSuspended,
            Self::Synth => FeePoolError::SynthSuspended,
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Suspension {
    pub suspended: bool,
    pub reason: u16,
}

/// Manual circuit breaker per section
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct SystemStatus {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Indexed by `SystemSection`
    pub sections: [Suspension; SystemSection::COUNT],

    /// Last change timestamp
    pub last_update: i64,
}

impl AccountState for SystemStatus {
    const DISCRIMINATOR: [u8; 8] = [83, 89, 83, 95, 83, 84, 65, 84]; // "SYS_STAT"

    const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        3 * SystemSection::COUNT + // sections
        8 + // last_update
        32; // padding

    fn discriminator(&self) -> [u8; 8] {
        self.discriminator
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl SystemStatus {
    pub fn new(bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            sections: [Suspension::default(); SystemSection::COUNT],
            last_update: 0,
        }
    }

    pub fn set_suspension(&mut self, section: SystemSection, suspended: bool, reason: u16, now: i64) {
        self.sections[section.index()] = Suspension {
            suspended,
            reason: if suspended { reason } else { 0 },
        };
        self.last_update = now;
    }

    pub fn suspension(&self, section: SystemSection) -> Suspension {
        self.sections[section.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::SuspensionRegistry;

    #[test]
    fn test_require_active_reports_first_suspended_section() {
        let mut status = SystemStatus::new(255);
        assert!(status
            .require_active(&[SystemSection::System, SystemSection::Issuance])
            .is_ok());

        status.set_suspension(SystemSection::Issuance, true, 42, 10);
        assert_eq!(status.suspension(SystemSection::Issuance).reason, 42);
        assert_eq!(
            status.require_active(&[SystemSection::System, SystemSection::Issuance]),
            Err(FeePoolError::IssuanceSuspended)
        );
        assert!(status.require_active(&[SystemSection::Exchange]).is_ok());

        status.set_suspension(SystemSection::Issuance, false, 42, 20);
        assert_eq!(status.suspension(SystemSection::Issuance), Suspension::default());
    }

    #[test]
    fn test_section_from_u8() {
        assert_eq!(SystemSection::from_u8(2), Ok(SystemSection::Exchange));
        assert_eq!(SystemSection::from_u8(4), Err(FeePoolError::UnknownSection));
    }
}
