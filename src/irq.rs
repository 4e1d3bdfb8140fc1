//! Interrupt dispatch
//!
//! The AT86RF215 raises a single IRQ line for four status registers: one per
//! radio frontend and one per baseband core. All of them are cleared on
//! read, so [`Device::dispatch_irq`] reads all four in one pass, latches the
//! events the driver itself waits on into [`FrontendFlags`], and forwards
//! the raw status to the user [`IrqHandler`].
//!
//! The driver only unmasks TRXRDY (radio) and TXFE (baseband) during
//! [`Device::init`]. Applications that need more sources widen the masks
//! with [`Device::set_radio_irq_mask`] and [`Device::set_baseband_irq_mask`]
//! and react to them in their handler.
//!
//! Dispatch needs the bus, so it always runs in the context that owns the
//! [`Device`]. The wait loops of [`Device::transmit`] and
//! [`Device::enter_rx`] dispatch inline whenever an interrupt is pending,
//! which they learn from either source:
//! - an [`IrqSignal`] the platform interrupt handler sets with
//!   [`IrqSignal::notify`] (see [`Device::with_irq_signal`])
//! - [`Transport::irq_asserted`], e.g. a [`PolledIrq`](crate::PolledIrq) pin
//!
//! # Important Notes
//! - Without either source the wait loops never see TXFE; outside of them,
//!   call [`Device::dispatch_irq`] when the signal is pending
//! - [`IrqSignal::notify`] never touches the bus and is safe to call from
//!   an interrupt handler

use core::sync::atomic::{AtomicBool, Ordering};

use crate::registers::{BasebandIrq, Frontend, RadioIrq};
use crate::{Device, Error, Transport};

/// Events latched by the dispatcher for one frontend
#[derive(Debug, Default)]
pub struct FrontendFlags {
    rf_ready: AtomicBool,
    tx_complete: AtomicBool,
}

impl FrontendFlags {
    pub const fn new() -> Self {
        Self {
            rf_ready: AtomicBool::new(false),
            tx_complete: AtomicBool::new(false),
        }
    }

    /// TRXRDY seen since the frontend was last reset
    pub fn rf_ready(&self) -> bool {
        self.rf_ready.load(Ordering::Acquire)
    }

    /// TXFE seen since the last transmission started
    pub fn tx_complete(&self) -> bool {
        self.tx_complete.load(Ordering::Acquire)
    }

    pub(crate) fn latch(&self, radio: RadioIrq, baseband: BasebandIrq) {
        if radio.contains(RadioIrq::TRXRDY) {
            self.rf_ready.store(true, Ordering::Release);
        }
        if baseband.contains(BasebandIrq::TXFE) {
            self.tx_complete.store(true, Ordering::Release);
        }
    }

    pub(crate) fn clear_tx_complete(&self) {
        self.tx_complete.store(false, Ordering::Release);
    }

    pub(crate) fn reset(&self) {
        self.rf_ready.store(false, Ordering::Release);
        self.tx_complete.store(false, Ordering::Release);
    }
}

/// Pending interrupt notification, shared with the platform interrupt
/// handler
///
/// ```no_run
/// use at86rf215::IrqSignal;
///
/// static RADIO_IRQ: IrqSignal = IrqSignal::new();
///
/// // In the IRQ pin interrupt handler
/// fn on_radio_irq() {
///     RADIO_IRQ.notify();
/// }
/// ```
#[derive(Debug, Default)]
pub struct IrqSignal {
    pending: AtomicBool,
}

impl IrqSignal {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Marks an interrupt as pending
    pub fn notify(&self) {
        self.pending.store(true, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Clears the pending mark, reporting whether it was set
    ///
    /// Cleared before the status registers are read, so an interrupt raised
    /// meanwhile is either part of that read or notified again.
    pub(crate) fn take(&self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.pending.store(false, Ordering::Release);
        true
    }
}

/// Snapshot of the four IRQ status registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IrqStatus {
    pub rf09: RadioIrq,
    pub rf24: RadioIrq,
    pub bbc0: BasebandIrq,
    pub bbc1: BasebandIrq,
}

impl IrqStatus {
    /// Decodes RF09_IRQS, RF24_IRQS, BBC0_IRQS and BBC1_IRQS, in that order
    pub fn from_raw(raw: [u8; 4]) -> Self {
        Self {
            rf09: RadioIrq::from_bits_retain(raw[0]),
            rf24: RadioIrq::from_bits_retain(raw[1]),
            bbc0: BasebandIrq::from_bits_retain(raw[2]),
            bbc1: BasebandIrq::from_bits_retain(raw[3]),
        }
    }

    pub fn raw(&self) -> [u8; 4] {
        [
            self.rf09.bits(),
            self.rf24.bits(),
            self.bbc0.bits(),
            self.bbc1.bits(),
        ]
    }

    pub fn radio(&self, frontend: Frontend) -> RadioIrq {
        match frontend {
            Frontend::Rf09 => self.rf09,
            Frontend::Rf24 => self.rf24,
        }
    }

    pub fn baseband(&self, frontend: Frontend) -> BasebandIrq {
        match frontend {
            Frontend::Rf09 => self.bbc0,
            Frontend::Rf24 => self.bbc1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw() == [0; 4]
    }
}

/// Failure reported by an [`IrqHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CallbackError;

/// Application hook invoked once per dispatch
pub trait IrqHandler {
    fn on_interrupt(&mut self, status: IrqStatus) -> Result<(), CallbackError> {
        let _ = status;
        Ok(())
    }
}

/// Handler that ignores every interrupt
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl IrqHandler for NoopHandler {}

impl<F> IrqHandler for F
where
    F: FnMut(IrqStatus) -> Result<(), CallbackError>,
{
    fn on_interrupt(&mut self, status: IrqStatus) -> Result<(), CallbackError> {
        self(status)
    }
}

impl<T, H> Device<T, H>
where
    T: Transport,
    H: IrqHandler,
{
    /// Reads and acknowledges all interrupt sources
    ///
    /// Latches TRXRDY and TXFE into the frontend flags, then hands the
    /// status to the user handler. A handler failure is reported as
    /// [`Error::Handler`] after the flags have been updated.
    pub fn dispatch_irq(&mut self) -> Result<IrqStatus, Error<T::Error>> {
        self.ready()?;
        let status = self.read_irq_status()?;

        for frontend in Frontend::ALL {
            self.flags[frontend.index()]
                .latch(status.radio(frontend), status.baseband(frontend));
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("irq status {:x}", status.raw());

        self.handler
            .on_interrupt(status)
            .map_err(|_| Error::Handler)?;
        Ok(status)
    }

    /// Acknowledges every pending interrupt without dispatching it
    pub fn clear_irqs(&mut self) -> Result<(), Error<T::Error>> {
        self.ready()?;
        self.read_irq_status().map(|_| ())
    }

    /// Acknowledges the pending interrupts of one frontend and its
    /// baseband core
    pub fn clear_frontend_irqs(&mut self, frontend: Frontend) -> Result<(), Error<T::Error>> {
        self.ready()?;
        self.read_u8(frontend.rf_irqs())?;
        self.read_u8(frontend.bbc_irqs())?;
        Ok(())
    }

    /// Selects which radio events raise the IRQ line
    pub fn set_radio_irq_mask(
        &mut self,
        frontend: Frontend,
        mask: RadioIrq,
    ) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        self.write_u8(frontend.rf(crate::registers::rf::IRQM), mask.bits())
    }

    /// Selects which baseband events raise the IRQ line
    pub fn set_baseband_irq_mask(
        &mut self,
        frontend: Frontend,
        mask: BasebandIrq,
    ) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        self.write_u8(frontend.bbc(crate::registers::bbc::IRQM), mask.bits())
    }

    /// Flags latched for `frontend`
    pub fn flags(&self, frontend: Frontend) -> &FrontendFlags {
        &self.flags[frontend.index()]
    }

    /// Attaches the signal set by the platform interrupt handler
    pub fn with_irq_signal(mut self, signal: &'static IrqSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Dispatches inline if the signal or the transport reports a pending
    /// interrupt
    pub(crate) fn poll_irq(&mut self) -> Result<(), Error<T::Error>> {
        let signalled = self.signal.is_some_and(IrqSignal::take);
        if signalled || self.transport.irq_asserted().map_err(Error::Transport)? {
            self.dispatch_irq()?;
        }
        Ok(())
    }

    pub(crate) fn read_irq_status(&mut self) -> Result<IrqStatus, Error<T::Error>> {
        let mut raw = [0u8; 4];
        for (slot, addr) in raw.iter_mut().zip([
            crate::registers::RF09_IRQS,
            crate::registers::RF24_IRQS,
            crate::registers::BBC0_IRQS,
            crate::registers::BBC1_IRQS,
        ]) {
            *slot = self.read_u8(addr)?;
        }
        Ok(IrqStatus::from_raw(raw))
    }
}
