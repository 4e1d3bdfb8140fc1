#![no_std]
//! AT86RF215 Radio Driver
//!
//! This crate provides a type-safe interface for the Microchip AT86RF215 family of dual band
//! transceivers. The AT86RF215 combines a sub-1GHz and a 2.4GHz radio frontend, each paired with
//! its own baseband core, behind a single SPI register interface.
//!
//! # Features
//! - Frequency range:
//!   - RF09: 389.5-510 MHz, 779-1020 MHz
//!   - RF24: 2400-2483.5 MHz
//! - Baseband PHYs: MR-FSK (implemented), MR-OFDM, MR-O-QPSK
//! - 2047 octet frame buffers per baseband core
//! - I/Q radio mode with LVDS interface
//! - Family detection: AT86RF215, AT86RF215IQ (no baseband), AT86RF215M (no RF24)
//!
//! # Architecture
//! The driver is organized into several modules, all of them adding methods to one
//! [`Device`] handle:
//!
//! - [`device`]: Register access, reset, identification and chip mode
//! - [`radio`]: Channel, PLL, PA, filters, AGC, RSSI and I/Q configuration
//! - [`baseband`]: Baseband PHY configuration (MR-FSK)
//! - [`state`]: RF state machine, frame transmission and reception
//! - [`irq`]: Interrupt dispatch and user handlers
//! - [`transport`]: Bus and pin abstraction, with an embedded-hal implementation
//! - [`registers`]: Register addresses and layouts
//!
//! # Usage
//! The driver uses the `regiface` crate to provide a type-safe interface for the fixed-address
//! registers. Per-frontend registers are addressed through a [`Frontend`].
//!
//! Configuration follows a specific sequence:
//!
//! 1. Create a [`Device`] around a [`Transport`] (usually a [`HalTransport`])
//! 2. Reset and identify the IC with [`Device::init`]
//! 3. Configure the channel setup of a frontend
//! 4. Configure and enable the paired baseband core
//! 5. Transmit frames or enter RX
//!
//! # Important Notes
//! - Every operation except [`Device::check_connection`] requires [`Device::init`]
//! - Channel dependent operations require [`Device::configure_frontend`]
//! - Frame operations require a chip mode that keeps the baseband core in use
//! - Wait loops learn of interrupts from an [`IrqSignal`] set by the platform
//!   interrupt handler or from [`Transport::irq_asserted`]; without either,
//!   [`Device::transmit`] cannot observe the end of a frame
//!
//! # Example
//! ```no_run
//! use at86rf215::{
//!     BasebandConfig, Device, DeviceConfig, Error, Frontend, FrontendConfig, Transport,
//! };
//!
//! fn send<T: Transport>(transport: T) -> Result<(), Error<T::Error>> {
//!     let mut device = Device::new(transport);
//!     device.init(&DeviceConfig::default())?;
//!
//!     device.configure_frontend(Frontend::Rf09, &FrontendConfig::default())?;
//!     device.set_channel(Frontend::Rf09, 0)?;
//!     device.configure_baseband(Frontend::Rf09, &BasebandConfig::default())?;
//!     device.enable_baseband(Frontend::Rf09, true)?;
//!
//!     device.transmit(Frontend::Rf09, b"hello", 100)
//! }
//! ```

pub mod baseband;
pub mod device;
pub mod error;
pub mod irq;
pub mod radio;
pub mod registers;
pub mod state;
pub mod transport;

#[cfg(test)]
mod mock;

pub use baseband::FskFilterSettings;
pub use device::{Device, DeviceConfig, FrontendState, Identity};
pub use error::Error;
pub use irq::{CallbackError, FrontendFlags, IrqHandler, IrqSignal, IrqStatus, NoopHandler};
pub use radio::{FrontendConfig, IqConfig};
pub use registers::*;
pub use state::{InvalidState, RfCommand, RfState};
pub use transport::{Clock, HalError, HalTransport, IrqLine, NoIrqLine, PolledIrq, Transport};
