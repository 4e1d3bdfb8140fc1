//! RF state machine and frame I/O
//!
//! Each frontend runs its own state machine, driven through RFn_CMD and
//! observed through RFn_STATE:
//!
//! ```text
//!   TRXOFF --TXPREP--> TXPREP --TX--> TX --(frame sent)--> TXPREP
//!      ^                 |
//!      +----TRXOFF-------+--RX--> RX
//! ```
//!
//! Every wait in this module is bounded by a single deadline taken from
//! [`Transport::now_ms`] when the operation starts. Commands are re-issued
//! on every iteration since the transceiver may drop a command received
//! while it is still settling. Each iteration also dispatches pending
//! interrupts inline, as reported by the device's
//! [`IrqSignal`](crate::IrqSignal) or by [`Transport::irq_asserted`].
//!
//! # Important Notes
//! - A zero timeout fails with [`Error::Timeout`] before anything is sent
//! - [`Device::transmit`] and [`Device::enter_rx`] require the chip mode to
//!   route the frontend through its baseband core
//! - [`Device::transmit`] only completes when one of the two interrupt
//!   sources is available

use crate::irq::IrqHandler;
use crate::registers::{bbc, rf, Frontend, MAX_PSDU_LEN};
use crate::{Device, Error, Transport};

/// Settling time between a command and the next state read
const STATE_POLL_US: u32 = 100;

/// Settled or transient state reported by RFn_STATE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RfState {
    TrxOff = 0x2,
    TxPrep = 0x3,
    Tx = 0x4,
    Rx = 0x5,
    /// Between two settled states
    Transition = 0x6,
    Reset = 0x7,
}

/// Error type for state decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidState(pub u8);

impl TryFrom<u8> for RfState {
    type Error = InvalidState;

    /// Decodes the low three bits of RFn_STATE
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value & 0x07 {
            0x2 => Ok(Self::TrxOff),
            0x3 => Ok(Self::TxPrep),
            0x4 => Ok(Self::Tx),
            0x5 => Ok(Self::Rx),
            0x6 => Ok(Self::Transition),
            0x7 => Ok(Self::Reset),
            invalid => Err(InvalidState(invalid)),
        }
    }
}

/// Command written to RFn_CMD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RfCommand {
    Nop = 0x0,
    Sleep = 0x1,
    TrxOff = 0x2,
    TxPrep = 0x3,
    Tx = 0x4,
    Rx = 0x5,
    /// Resets the frontend; the radio registers keep their values
    Reset = 0x7,
}

impl RfState {
    /// Command that settles the frontend in this state
    fn command(self) -> Option<RfCommand> {
        match self {
            RfState::TrxOff => Some(RfCommand::TrxOff),
            RfState::TxPrep => Some(RfCommand::TxPrep),
            RfState::Tx => Some(RfCommand::Tx),
            RfState::Rx => Some(RfCommand::Rx),
            RfState::Reset => Some(RfCommand::Reset),
            RfState::Transition => None,
        }
    }
}

impl<T, H> Device<T, H>
where
    T: Transport,
    H: IrqHandler,
{
    /// Current state of `frontend`
    ///
    /// # Errors
    /// * [`Error::InvalidValue`] - RFn_STATE holds a reserved value
    pub fn state(&mut self, frontend: Frontend) -> Result<RfState, Error<T::Error>> {
        self.supports_frontend(frontend)?;
        let raw = self.read_u8(frontend.rf(rf::STATE))?;
        RfState::try_from(raw).map_err(|_| Error::InvalidValue)
    }

    /// Writes `cmd` to RFn_CMD without waiting for the outcome
    pub fn command(&mut self, frontend: Frontend, cmd: RfCommand) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        self.write_u8(frontend.rf(rf::CMD), cmd as u8)
    }

    /// Resets the state machine of `frontend`
    ///
    /// The frontend settles in TRXOFF. Latched interrupt flags of the
    /// frontend are cleared as well.
    pub fn reset_frontend(&mut self, frontend: Frontend) -> Result<(), Error<T::Error>> {
        self.command(frontend, RfCommand::Reset)?;
        self.flags[frontend.index()].reset();
        Ok(())
    }

    /// Drives `frontend` to `target`, re-issuing the matching command until
    /// the state is reached or `timeout_ms` elapses
    ///
    /// # Errors
    /// * [`Error::InvalidParameter`] - `target` is [`RfState::Transition`]
    /// * [`Error::Timeout`] - The state was not reached in time
    pub fn transition(
        &mut self,
        frontend: Frontend,
        target: RfState,
        timeout_ms: u64,
    ) -> Result<(), Error<T::Error>> {
        let deadline = self.transport.now_ms().saturating_add(timeout_ms);
        self.transition_until(frontend, target, deadline)
    }

    /// Switches `frontend` off
    ///
    /// A TRXOFF command can be lost while the frontend is busy, so it is
    /// repeated until TRXOFF is observed.
    pub fn set_trxoff(
        &mut self,
        frontend: Frontend,
        timeout_ms: u64,
    ) -> Result<(), Error<T::Error>> {
        self.transition(frontend, RfState::TrxOff, timeout_ms)
    }

    /// Sends one frame and waits for the end of transmission
    ///
    /// The frontend is prepared (TXPREP), the PSDU length and payload are
    /// written to the TX frame buffer of the paired baseband core, then TX
    /// is issued. Completion is signalled by TXFE through the interrupt
    /// dispatcher. The whole sequence shares a single deadline.
    ///
    /// # Arguments
    /// * `psdu` - Frame payload, 1 to 2047 octets, FCS included when the
    ///   core does not append it
    ///
    /// # Errors
    /// * [`Error::InvalidChipMode`] - The baseband core is not in use
    /// * [`Error::InvalidParameter`] - Empty or oversized frame
    /// * [`Error::Timeout`] - TXPREP or TXFE was not reached in time
    pub fn transmit(
        &mut self,
        frontend: Frontend,
        psdu: &[u8],
        timeout_ms: u64,
    ) -> Result<(), Error<T::Error>> {
        self.frontend_ready(frontend)?;
        self.check_baseband_routed(frontend)?;
        if psdu.is_empty() || psdu.len() > MAX_PSDU_LEN {
            return Err(Error::InvalidParameter);
        }
        let deadline = self.transport.now_ms().saturating_add(timeout_ms);

        self.transition_until(frontend, RfState::TxPrep, deadline)?;

        let [len_high, len_low] = (psdu.len() as u16).to_be_bytes();
        self.write_u8(frontend.bbc(bbc::TXFLL), len_low)?;
        self.write_u8(frontend.bbc(bbc::TXFLH), len_high)?;
        self.write_frame_buffer(frontend, psdu)?;

        self.flags[frontend.index()].clear_tx_complete();
        self.command(frontend, RfCommand::Tx)?;

        loop {
            if self.flags[frontend.index()].tx_complete() {
                return Ok(());
            }
            if self.transport.now_ms() >= deadline {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: no TXFE before deadline", frontend);
                return Err(Error::Timeout);
            }
            self.poll_irq()?;
            self.transport.delay_us(STATE_POLL_US);
        }
    }

    /// Puts `frontend` in RX
    ///
    /// The frontend is walked through TXPREP first. TXPREP is requested
    /// whenever TRXOFF is observed and TRXOFF from TX or RESET. Nothing is
    /// sent while a transition is in progress.
    ///
    /// A frontend already in RX returns immediately without a single
    /// command, so calling this while listening never drops a frame being
    /// received. A frontend in TX is switched off before TXPREP, which
    /// aborts the frame in flight.
    ///
    /// # Errors
    /// * [`Error::InvalidChipMode`] - The baseband core is not in use
    /// * [`Error::Timeout`] - RX was not reached in time
    pub fn enter_rx(
        &mut self,
        frontend: Frontend,
        timeout_ms: u64,
    ) -> Result<(), Error<T::Error>> {
        self.frontend_ready(frontend)?;
        self.check_baseband_routed(frontend)?;
        let deadline = self.transport.now_ms().saturating_add(timeout_ms);

        let mut state = self.state(frontend)?;
        if state == RfState::Rx {
            return Ok(());
        }

        while state != RfState::TxPrep {
            if self.transport.now_ms() >= deadline {
                return Err(Error::Timeout);
            }
            match state {
                RfState::TrxOff => self.command(frontend, RfCommand::TxPrep)?,
                RfState::Transition => {}
                _ => self.command(frontend, RfCommand::TrxOff)?,
            }
            self.poll_irq()?;
            self.transport.delay_us(STATE_POLL_US);
            state = self.state(frontend)?;
        }

        self.transport.delay_us(STATE_POLL_US);
        self.transition_until(frontend, RfState::Rx, deadline)
    }

    /// Copies the received frame from the RX frame buffer into `buf`
    ///
    /// No length or FCS check is made; size `buf` from BBCn_RXFLL/RXFLH.
    pub fn read_frame(
        &mut self,
        frontend: Frontend,
        buf: &mut [u8],
    ) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        self.read_frame_buffer(frontend, buf)
    }

    fn transition_until(
        &mut self,
        frontend: Frontend,
        target: RfState,
        deadline: u64,
    ) -> Result<(), Error<T::Error>> {
        let cmd = target.command().ok_or(Error::InvalidParameter)?;
        loop {
            if self.transport.now_ms() >= deadline {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: timeout waiting for {}", frontend, target);
                return Err(Error::Timeout);
            }
            self.command(frontend, cmd)?;
            self.poll_irq()?;
            self.transport.delay_us(STATE_POLL_US);
            if self.state(frontend)? == target {
                #[cfg(feature = "defmt")]
                defmt::trace!("{}: {}", frontend, target);
                return Ok(());
            }
        }
    }
}
