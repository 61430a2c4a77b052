//! Error types.
//!
//! `Error` covers what can go wrong outside the control loop: building a
//! rig from config and driving hardware lines.  Everything is `Copy` and
//! allocation-free.
//!
//! Nothing on the control path is fatal.  Interlocks trip as
//! [`SafetyFault`] bits and the rig waits with its outputs off.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be applied.
    Config(ConfigError),
    /// A hardware line could not be driven or read.
    Hardware(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Hardware(msg) => write!(f, "hardware: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// More tanks than the arena can hold.
    TooManyTanks,
    /// More devices than the arena can hold.
    TooManyDevices,
    /// Stored bytes did not decode into a config.
    Corrupted,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::TooManyTanks => write!(f, "too many tanks"),
            Self::TooManyDevices => write!(f, "too many devices"),
            Self::Corrupted => write!(f, "stored config is corrupted"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Interlock conditions.  These are never returned as errors: the
/// supervisor keeps them as bits of a fault word, one bit per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SafetyFault {
    /// A float-switch pair reads full without empty (miswired or stuck).
    TankLevelUndefined = 0b0000_0001,
    /// Product water conductivity above limit.
    ConductivityHigh = 0b0000_0010,
    /// Dissolved oxygen above limit.
    DissolvedOxygenHigh = 0b0000_0100,
    /// Pressure ahead of the microfilter above limit.
    MicrofilterPressureHigh = 0b0000_1000,
    /// Pressure ahead of the RO membrane above limit.
    RoPressureHigh = 0b0001_0000,
}

impl SafetyFault {
    pub const ALL: [Self; 5] = [
        Self::TankLevelUndefined,
        Self::ConductivityHigh,
        Self::DissolvedOxygenHigh,
        Self::MicrofilterPressureHigh,
        Self::RoPressureHigh,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TankLevelUndefined => write!(f, "tank level undefined"),
            Self::ConductivityHigh => write!(f, "conductivity high"),
            Self::DissolvedOxygenHigh => write!(f, "dissolved oxygen high"),
            Self::MicrofilterPressureHigh => write!(f, "microfilter pressure high"),
            Self::RoPressureHigh => write!(f, "RO pressure high"),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;
