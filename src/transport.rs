//! Transport hooks
//!
//! The driver never touches a bus or a pin directly. Everything it needs from
//! the platform goes through the [`Transport`] trait:
//! - Reset and chip-select pin control
//! - Masking the device IRQ line around bus transactions
//! - Microsecond delays and a monotonic millisecond clock
//! - Raw SPI byte exchange
//!
//! [`HalTransport`] implements the trait on top of the `embedded-hal` 1.0
//! traits, so any HAL providing an [`SpiBus`], two [`OutputPin`]s and a
//! [`DelayNs`] can drive the radio. The millisecond clock is supplied as a
//! [`Clock`] (any `FnMut() -> u64` works), and the IRQ line either as a
//! [`PolledIrq`] input pin or not at all ([`NoIrqLine`]).
//!
//! A transport without an IRQ line relies on the platform interrupt handler
//! setting an [`IrqSignal`](crate::IrqSignal) the device was given.
//!
//! # Important Notes
//! - Chip select is handled by the driver, not by the bus: several register
//!   accesses (frame buffer bursts) span one select window
//! - `set_irq_enabled` only gates the driver's own view of the IRQ line; it
//!   must not clear pending interrupt state on the device

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

/// Platform capabilities required by the driver
pub trait Transport {
    /// Error reported by the platform
    type Error: core::fmt::Debug;

    /// Drive the active-low reset line
    fn set_reset(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Drive the active-low chip-select line
    fn set_select(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Enable or disable delivery of the device IRQ line
    fn set_irq_enabled(&mut self, enabled: bool);

    /// Whether the IRQ line is currently asserted
    ///
    /// Wait loops call this on every iteration and run the interrupt
    /// dispatcher inline when it returns `true`. Platforms that deliver the
    /// line through an interrupt handler keep the default and hand the
    /// device an [`IrqSignal`](crate::IrqSignal) instead.
    fn irq_asserted(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    /// Busy-wait for `us` microseconds
    fn delay_us(&mut self, us: u32);

    /// Monotonic time in milliseconds
    fn now_ms(&mut self) -> u64;

    /// Shift out `bytes`, discarding whatever is received
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Full duplex exchange of `rx.len()` bytes
    ///
    /// `tx` is sent first and padded with zeros up to `rx.len()`.
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error>;
}

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&mut self) -> u64;
}

impl<F> Clock for F
where
    F: FnMut() -> u64,
{
    fn now_ms(&mut self) -> u64 {
        self()
    }
}

/// Device IRQ line as seen by [`HalTransport`]
pub trait IrqLine {
    type Error: core::fmt::Debug;

    fn set_enabled(&mut self, enabled: bool);

    fn is_asserted(&mut self) -> Result<bool, Self::Error>;
}

/// No IRQ line wired; interrupts reach the driver through an
/// [`IrqSignal`](crate::IrqSignal)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIrqLine;

impl IrqLine for NoIrqLine {
    type Error = Infallible;

    fn set_enabled(&mut self, _enabled: bool) {}

    fn is_asserted(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

/// IRQ line read from an input pin
///
/// The line is reported as asserted only while enabled, matching the
/// polarity programmed in [`PadConfig`](crate::registers::PadConfig).
pub struct PolledIrq<P> {
    pin: P,
    active_high: bool,
    enabled: bool,
}

impl<P: InputPin> PolledIrq<P> {
    pub fn new(pin: P, active_high: bool) -> Self {
        Self {
            pin,
            active_high,
            enabled: false,
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> IrqLine for PolledIrq<P> {
    type Error = P::Error;

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_asserted(&mut self) -> Result<bool, Self::Error> {
        if !self.enabled {
            return Ok(false);
        }
        if self.active_high {
            self.pin.is_high()
        } else {
            self.pin.is_low()
        }
    }
}

/// Error type of [`HalTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError<S, P, I> {
    /// SPI bus failure
    Spi(S),
    /// Select or reset pin failure
    Pin(P),
    /// IRQ line failure
    Irq(I),
}

/// [`Transport`] built from `embedded-hal` 1.0 peripherals
pub struct HalTransport<SPI, CS, RST, D, C, IRQ = NoIrqLine> {
    spi: SPI,
    select: CS,
    reset: RST,
    delay: D,
    clock: C,
    irq: IRQ,
}

impl<SPI, CS, RST, D, C> HalTransport<SPI, CS, RST, D, C, NoIrqLine> {
    /// Creates a transport without an IRQ line
    ///
    /// The wait loops then only see interrupts through an
    /// [`IrqSignal`](crate::IrqSignal) given to
    /// [`Device::with_irq_signal`](crate::Device::with_irq_signal). Use
    /// [`HalTransport::with_irq`] to poll the pin instead.
    pub fn new(spi: SPI, select: CS, reset: RST, delay: D, clock: C) -> Self {
        Self::with_irq(spi, select, reset, delay, clock, NoIrqLine)
    }
}

impl<SPI, CS, RST, D, C, IRQ> HalTransport<SPI, CS, RST, D, C, IRQ> {
    /// Creates a transport whose wait loops poll `irq`
    pub fn with_irq(spi: SPI, select: CS, reset: RST, delay: D, clock: C, irq: IRQ) -> Self {
        Self {
            spi,
            select,
            reset,
            delay,
            clock,
            irq,
        }
    }

    /// Releases the wrapped peripherals
    pub fn release(self) -> (SPI, CS, RST, D, C, IRQ) {
        (
            self.spi,
            self.select,
            self.reset,
            self.delay,
            self.clock,
            self.irq,
        )
    }
}

impl<SPI, CS, RST, D, C, IRQ> Transport for HalTransport<SPI, CS, RST, D, C, IRQ>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    RST: OutputPin<Error = CS::Error>,
    D: DelayNs,
    C: Clock,
    IRQ: IrqLine,
{
    type Error = HalError<SPI::Error, CS::Error, IRQ::Error>;

    fn set_reset(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.reset.set_high()
        } else {
            self.reset.set_low()
        }
        .map_err(HalError::Pin)
    }

    fn set_select(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.select.set_high()
        } else {
            self.select.set_low()
        }
        .map_err(HalError::Pin)
    }

    fn set_irq_enabled(&mut self, enabled: bool) {
        self.irq.set_enabled(enabled);
    }

    fn irq_asserted(&mut self) -> Result<bool, Self::Error> {
        self.irq.is_asserted().map_err(HalError::Irq)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn now_ms(&mut self) -> u64 {
        self.clock.now_ms()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(bytes).map_err(HalError::Spi)?;
        self.spi.flush().map_err(HalError::Spi)
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        let n = tx.len().min(rx.len());
        rx[..n].copy_from_slice(&tx[..n]);
        rx[n..].fill(0);
        self.spi.transfer_in_place(rx).map_err(HalError::Spi)?;
        self.spi.flush().map_err(HalError::Spi)
    }
}
