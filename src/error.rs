//! Control-plane errors
//!
//! The real-time paths never fail; these are returned by the lower
//! priority operations that the USB stack and settings layer call.

use core::fmt;

/// Audio core result
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported to the USB stack or settings collaborator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Requested sample rate is not in the supported set
    InvalidRate(u32),
    /// The output converter is owned by the other consumer
    OutputBusy,
    /// Register id is not part of the map
    InvalidRegister(u8),
    /// Register is diagnostic and cannot be written
    ReadOnlyRegister(u8),
    /// Register value outside its encoding
    InvalidValue {
        /// Register id
        register: u8,
        /// Rejected value
        value: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRate(hz) => write!(f, "unsupported sample rate {hz} Hz"),
            Self::OutputBusy => f.write_str("output converter owned by another consumer"),
            Self::InvalidRegister(id) => write!(f, "unknown register 0x{id:02X}"),
            Self::ReadOnlyRegister(id) => write!(f, "register 0x{id:02X} is read-only"),
            Self::InvalidValue { register, value } => {
                write!(f, "value {value} invalid for register 0x{register:02X}")
            }
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::InvalidRate(hz) => defmt::write!(f, "InvalidRate({} Hz)", hz),
            Self::OutputBusy => defmt::write!(f, "OutputBusy"),
            Self::InvalidRegister(id) => defmt::write!(f, "InvalidRegister(0x{:02X})", id),
            Self::ReadOnlyRegister(id) => defmt::write!(f, "ReadOnlyRegister(0x{:02X})", id),
            Self::InvalidValue { register, value } => {
                defmt::write!(f, "InvalidValue(0x{:02X} = {})", register, value);
            }
        }
    }
}

#[cfg(not(feature = "embedded"))]
impl std::error::Error for Error {}
