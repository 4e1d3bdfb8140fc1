//! Driver error type
//!
//! Every fallible operation returns [`Error<E>`], where `E` is the error
//! type of the injected [`Transport`](crate::Transport). Transport failures
//! are wrapped verbatim in [`Error::Transport`]; every other variant is
//! raised by the driver itself.
//!
//! None of the driver errors are retried internally. The only looping
//! constructs are the deadline-bounded state and flag waits, which re-issue
//! commands but never re-issue a failed bus transaction.

use core::fmt;

use crate::registers::FskConfigError;

/// Driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The transport reported a failure
    Transport(E),
    /// An argument is out of range for the requested operation
    InvalidParameter,
    /// The device (or the frontend) has not been initialized yet
    NotInitialized,
    /// The requested PHY is not implemented by this driver
    NotImplemented,
    /// The device returned a value that cannot be decoded
    InvalidValue,
    /// The part number register holds an unknown value
    UnknownDevice(u8),
    /// The detected family does not support the frontend or chip mode
    NotSupported,
    /// The request conflicts with the current configuration
    InvalidConfiguration,
    /// The chip mode does not route the frontend through its baseband core
    InvalidChipMode,
    /// A deadline elapsed before the device reached the requested condition
    Timeout,
    /// The frequency synthesizer is not locked
    PllUnlock,
    /// The user interrupt handler reported a failure
    Handler,
}

impl<E> Error<E> {
    /// Whether the error came from the transport
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl<E> From<FskConfigError> for Error<E> {
    fn from(err: FskConfigError) -> Self {
        match err {
            FskConfigError::FourFskRestriction => Error::InvalidConfiguration,
            FskConfigError::OutOfRange => Error::InvalidParameter,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "transport error: {e:?}"),
            Error::InvalidParameter => f.write_str("invalid parameter"),
            Error::NotInitialized => f.write_str("not initialized"),
            Error::NotImplemented => f.write_str("not implemented"),
            Error::InvalidValue => f.write_str("invalid value read from device"),
            Error::UnknownDevice(pn) => write!(f, "unknown part number 0x{pn:02X}"),
            Error::NotSupported => f.write_str("not supported by this device family"),
            Error::InvalidConfiguration => f.write_str("invalid configuration"),
            Error::InvalidChipMode => f.write_str("baseband core disabled by chip mode"),
            Error::Timeout => f.write_str("timeout"),
            Error::PllUnlock => f.write_str("PLL not locked"),
            Error::Handler => f.write_str("interrupt handler failed"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}
