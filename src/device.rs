//! AT86RF215 Device Interface
//!
//! This module provides the device handle and the register access layer.
//!
//! The interface is built around the `Device<T, H>` struct which wraps a
//! [`Transport`] and an [`IrqHandler`] and provides methods for:
//! - Reading and writing registers (8, 16 and 32 bit, raw or typed)
//! - Burst transfers to and from the baseband frame buffers
//! - Resetting and identifying the IC
//! - Selecting the chip mode
//!
//! Radio, baseband and state machine operations are implemented on the same
//! handle in their own modules.
//!
//! # Register access protocol
//! Every access is one select window: the 14-bit address is sent MSB first
//! with bit 15 set for writes, followed by the data. Reads are full duplex;
//! the two bytes clocked in during the header are discarded. The IRQ line is
//! masked for the duration of the window and restored afterwards, even when
//! the transfer fails.
//!
//! # Example
//! ```no_run
//! use at86rf215::{Device, DeviceConfig, Transport};
//!
//! fn bring_up<T: Transport>(transport: T) -> Result<Device<T>, at86rf215::Error<T::Error>> {
//!     let mut device = Device::new(transport);
//!     let identity = device.init(&DeviceConfig::default())?;
//!     assert!(identity.version > 0);
//!     Ok(device)
//! }
//! ```

use core::convert::Infallible;

use regiface::{ByteArray, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use crate::irq::{FrontendFlags, IrqHandler, IrqSignal, NoopHandler};
use crate::registers::{
    bbc, rf, BasebandConfig, BasebandIrq, ChannelMode, ChipMode, ClockOutput, CrystalOscillator,
    Family, Frontend, FrontendControl, IqChipMode, PadConfig, PartNumber, RadioIrq,
    VersionNumber, MAX_PSDU_LEN,
};
use crate::{Error, Transport};

/// Identity read from the IC during [`Device::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Identity {
    pub family: Family,
    /// Content of the version number register
    pub version: u8,
}

/// Settings applied to the common block by [`Device::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceConfig {
    pub clock_output: ClockOutput,
    pub crystal: CrystalOscillator,
    pub pads: PadConfig,
    /// External frontend control on the RF09 pads
    pub rf09_frontend_control: FrontendControl,
    /// External frontend control on the RF24 pads; ignored on AT86RF215M
    pub rf24_frontend_control: FrontendControl,
}

/// Channel setup of one frontend, recorded by
/// [`Device::configure_frontend`](crate::Device::configure_frontend)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontendState {
    pub channel_mode: ChannelMode,
    /// Channel spacing register value (25kHz steps)
    pub channel_spacing: u8,
    pub spacing_hz: u32,
    pub base_frequency_hz: u32,
}

/// Main device interface for the AT86RF215.
///
/// Owns the transport for its whole lifetime; `&mut self` on every operation
/// keeps bus transactions from interleaving.
pub struct Device<T, H = NoopHandler> {
    pub(crate) transport: T,
    pub(crate) handler: H,
    pub(crate) identity: Option<Identity>,
    pub(crate) chip_mode: ChipMode,
    pub(crate) irq_enabled: bool,
    pub(crate) frontends: [Option<FrontendState>; 2],
    pub(crate) baseband: [Option<BasebandConfig>; 2],
    pub(crate) flags: [FrontendFlags; 2],
    pub(crate) signal: Option<&'static IrqSignal>,
    buffer: [u8; MAX_PSDU_LEN + 2],
}

impl<T> Device<T, NoopHandler> {
    /// Creates a new Device instance wrapping the provided transport.
    ///
    /// Nothing is sent on the bus until [`Device::init`] is called.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            handler: NoopHandler,
            identity: None,
            chip_mode: ChipMode::BbRf,
            irq_enabled: false,
            frontends: [None; 2],
            baseband: [None; 2],
            flags: [FrontendFlags::new(), FrontendFlags::new()],
            signal: None,
            buffer: [0; MAX_PSDU_LEN + 2],
        }
    }
}

impl<T, H> Device<T, H> {
    /// Replaces the interrupt handler, keeping all device state
    pub fn with_handler<H2: IrqHandler>(self, handler: H2) -> Device<T, H2> {
        Device {
            transport: self.transport,
            handler,
            identity: self.identity,
            chip_mode: self.chip_mode,
            irq_enabled: self.irq_enabled,
            frontends: self.frontends,
            baseband: self.baseband,
            flags: self.flags,
            signal: self.signal,
            buffer: self.buffer,
        }
    }

    /// Releases the underlying transport.
    pub fn release(self) -> T {
        self.transport
    }

    /// Identity of the IC, once initialized
    pub fn identity(&self) -> Option<Identity> {
        self.identity
    }

    /// Chip mode last applied through [`Device::set_chip_mode`]
    pub fn chip_mode(&self) -> ChipMode {
        self.chip_mode
    }

    /// Channel setup of `frontend`, once configured
    pub fn frontend_state(&self, frontend: Frontend) -> Option<FrontendState> {
        self.frontends[frontend.index()]
    }

    /// Baseband configuration last applied to the core paired with `frontend`
    pub fn baseband_config(&self, frontend: Frontend) -> Option<&BasebandConfig> {
        self.baseband[frontend.index()].as_ref()
    }
}

/// Runs `f` inside one select window with the IRQ line masked.
///
/// Select and the IRQ line are restored whatever `f` returns.
fn bracket<T, R>(
    transport: &mut T,
    irq_enabled: bool,
    f: impl FnOnce(&mut T) -> Result<R, T::Error>,
) -> Result<R, Error<T::Error>>
where
    T: Transport,
{
    transport.set_select(false).map_err(Error::Transport)?;
    transport.set_irq_enabled(false);
    let result = f(transport);
    transport.set_irq_enabled(irq_enabled);
    let released = transport.set_select(true);
    let value = result.map_err(Error::Transport)?;
    released.map_err(Error::Transport)?;
    Ok(value)
}

const fn read_header(addr: u16) -> [u8; 2] {
    [((addr >> 8) & 0x3F) as u8, (addr & 0xFF) as u8]
}

const fn write_header(addr: u16) -> [u8; 2] {
    [((addr >> 8) & 0x3F) as u8 | 0x80, (addr & 0xFF) as u8]
}

impl<T, H> Device<T, H>
where
    T: Transport,
    H: IrqHandler,
{
    /// Reads an 8-bit register
    pub fn read_u8(&mut self, addr: u16) -> Result<u8, Error<T::Error>> {
        let header = read_header(addr);
        let mut rx = [0u8; 3];
        bracket(&mut self.transport, self.irq_enabled, |t| {
            t.transfer(&header, &mut rx)
        })?;
        Ok(rx[2])
    }

    /// Reads four consecutive registers as a big-endian word
    pub fn read_u32(&mut self, addr: u16) -> Result<u32, Error<T::Error>> {
        let header = read_header(addr);
        let mut rx = [0u8; 6];
        bracket(&mut self.transport, self.irq_enabled, |t| {
            t.transfer(&header, &mut rx)
        })?;
        Ok(u32::from_be_bytes([rx[2], rx[3], rx[4], rx[5]]))
    }

    /// Writes an 8-bit register
    pub fn write_u8(&mut self, addr: u16, value: u8) -> Result<(), Error<T::Error>> {
        let header = write_header(addr);
        bracket(&mut self.transport, self.irq_enabled, |t| {
            t.write(&[header[0], header[1], value])
        })
    }

    /// Writes two consecutive registers, MSB first
    pub fn write_u16(&mut self, addr: u16, value: u16) -> Result<(), Error<T::Error>> {
        let header = write_header(addr);
        let [msb, lsb] = value.to_be_bytes();
        bracket(&mut self.transport, self.irq_enabled, |t| {
            t.write(&[header[0], header[1], msb, lsb])
        })
    }

    /// Reads a fixed-address register.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing ReadableRegister with u16 ID
    ///
    /// # Errors
    /// * [`Error::Transport`] - The transfer failed
    /// * [`Error::InvalidValue`] - The register content could not be decoded
    pub fn read_register<R>(&mut self) -> Result<R, Error<T::Error>>
    where
        R: ReadableRegister<IdType = u16>,
    {
        let mut raw_value = R::Array::new();
        self.read_burst(R::id(), raw_value.as_mut())?;
        R::from_bytes(raw_value).map_err(|_| Error::InvalidValue)
    }

    /// Writes a fixed-address register.
    pub fn write_register<R>(&mut self, register: R) -> Result<(), Error<T::Error>>
    where
        R: WritableRegister<IdType = u16, Error = Infallible>,
    {
        let raw_value = match register.to_bytes() {
            Ok(raw) => raw,
            Err(never) => match never {},
        };
        self.write_burst(R::id(), raw_value.as_ref())
    }

    /// Writes a single-byte packing type to a per-frontend register
    pub(crate) fn write_packed<V>(&mut self, addr: u16, value: V) -> Result<(), Error<T::Error>>
    where
        V: ToByteArray<Error = Infallible, Array = [u8; 1]>,
    {
        let [byte] = match value.to_bytes() {
            Ok(raw) => raw,
            Err(never) => match never {},
        };
        self.write_u8(addr, byte)
    }

    /// Reads a single-byte packing type from a per-frontend register
    pub(crate) fn read_packed<V>(&mut self, addr: u16) -> Result<V, Error<T::Error>>
    where
        V: FromByteArray<Array = [u8; 1]>,
    {
        let byte = self.read_u8(addr)?;
        V::from_bytes([byte]).map_err(|_| Error::InvalidValue)
    }

    /// Writes `data` to consecutive addresses starting at `addr`, in one
    /// select window
    pub fn write_burst(&mut self, addr: u16, data: &[u8]) -> Result<(), Error<T::Error>> {
        let header = write_header(addr);
        bracket(&mut self.transport, self.irq_enabled, |t| {
            t.write(&header)?;
            t.write(data)
        })
    }

    /// Reads consecutive addresses starting at `addr` into `data`, in one
    /// select window
    pub fn read_burst(&mut self, addr: u16, data: &mut [u8]) -> Result<(), Error<T::Error>> {
        let len = data.len();
        if len > MAX_PSDU_LEN {
            return Err(Error::InvalidParameter);
        }
        let header = read_header(addr);
        let buffer = &mut self.buffer[..len + 2];
        bracket(&mut self.transport, self.irq_enabled, |t| {
            t.transfer(&header, buffer)
        })?;
        data.copy_from_slice(&self.buffer[2..len + 2]);
        Ok(())
    }

    /// Fills the TX frame buffer of the core paired with `frontend`
    pub fn write_frame_buffer(
        &mut self,
        frontend: Frontend,
        data: &[u8],
    ) -> Result<(), Error<T::Error>> {
        self.write_burst(frontend.tx_frame_buffer(), data)
    }

    /// Reads the start of the RX frame buffer of the core paired with
    /// `frontend`
    pub fn read_frame_buffer(
        &mut self,
        frontend: Frontend,
        data: &mut [u8],
    ) -> Result<(), Error<T::Error>> {
        self.read_burst(frontend.rx_frame_buffer(), data)
    }

    /// Enables or disables the IRQ line between transactions
    pub fn set_irq_enabled(&mut self, enabled: bool) {
        self.irq_enabled = enabled;
        self.transport.set_irq_enabled(enabled);
    }

    pub(crate) fn ready(&self) -> Result<Identity, Error<T::Error>> {
        self.identity.ok_or(Error::NotInitialized)
    }

    pub(crate) fn supports_frontend(&self, frontend: Frontend) -> Result<(), Error<T::Error>> {
        let identity = self.ready()?;
        match (identity.family, frontend) {
            (Family::At86rf215m, Frontend::Rf24) => Err(Error::NotSupported),
            _ => Ok(()),
        }
    }

    pub(crate) fn supports_mode(&self, mode: ChipMode) -> Result<(), Error<T::Error>> {
        let identity = self.ready()?;
        match (identity.family, mode) {
            (Family::At86rf215iq, mode) if mode != ChipMode::Rf => Err(Error::NotSupported),
            (Family::At86rf215m, ChipMode::BbRf24) => Err(Error::NotSupported),
            _ => Ok(()),
        }
    }

    pub(crate) fn frontend_ready(
        &self,
        frontend: Frontend,
    ) -> Result<FrontendState, Error<T::Error>> {
        self.supports_frontend(frontend)?;
        self.frontends[frontend.index()].ok_or(Error::NotInitialized)
    }

    /// Resets and identifies the IC, then applies `config` to the common
    /// block.
    ///
    /// # Important Notes
    /// - All frontend and baseband state held by the handle is discarded
    /// - Only TRXRDY and TXFE are unmasked; pending interrupts are cleared
    ///   before the IRQ line is enabled
    /// - The chip mode is assumed to be the reset value, [`ChipMode::BbRf`]
    pub fn init(&mut self, config: &DeviceConfig) -> Result<Identity, Error<T::Error>> {
        self.identity = None;
        self.frontends = [None; 2];
        self.baseband = [None; 2];
        for flags in &self.flags {
            flags.reset();
        }

        self.set_irq_enabled(false);
        self.transport.set_reset(false).map_err(Error::Transport)?;
        self.transport.delay_us(1000);
        self.transport.set_reset(true).map_err(Error::Transport)?;
        self.transport.delay_us(1000);

        let pn: PartNumber = self.read_register()?;
        let family = pn.family().ok_or(Error::UnknownDevice(pn.value))?;

        self.write_register(config.clock_output)?;
        self.write_register(config.crystal)?;
        self.write_register(config.pads)?;
        self.write_packed(Frontend::Rf09.rf(rf::PADFE), config.rf09_frontend_control)?;
        if family != Family::At86rf215m {
            self.write_packed(Frontend::Rf24.rf(rf::PADFE), config.rf24_frontend_control)?;
        }

        let vn: VersionNumber = self.read_register()?;
        let identity = Identity {
            family,
            version: vn.version,
        };
        self.chip_mode = ChipMode::BbRf;
        self.identity = Some(identity);

        #[cfg(feature = "defmt")]
        defmt::debug!("found {} rev {}", identity.family, identity.version);

        for frontend in Frontend::ALL {
            if self.supports_frontend(frontend).is_err() {
                continue;
            }
            self.write_u8(frontend.bbc(bbc::IRQM), BasebandIrq::TXFE.bits())?;
            self.write_u8(frontend.rf(rf::IRQM), RadioIrq::TRXRDY.bits())?;
        }

        self.read_irq_status()?;
        self.set_irq_enabled(true);
        Ok(identity)
    }

    /// Connectivity check: reads the part number and decodes the family
    ///
    /// Does not require [`Device::init`].
    pub fn check_connection(&mut self) -> Result<Family, Error<T::Error>> {
        let pn: PartNumber = self.read_register()?;
        pn.family().ok_or(Error::UnknownDevice(pn.value))
    }

    /// Selects which frontends are served by the baseband cores
    ///
    /// Updates the chip mode field of RF_IQIFC1 and keeps the I/Q skew
    /// alignment bits as they are.
    pub fn set_chip_mode(&mut self, mode: ChipMode) -> Result<(), Error<T::Error>> {
        self.supports_mode(mode)?;
        let mut iqifc1: IqChipMode = self.read_register()?;
        iqifc1.chip_mode = mode;
        self.write_register(iqifc1)?;
        self.chip_mode = mode;
        Ok(())
    }

    /// Fails with [`Error::InvalidChipMode`] when the chip mode does not run
    /// the baseband core paired with `frontend`
    pub(crate) fn check_baseband_routed(&self, frontend: Frontend) -> Result<(), Error<T::Error>> {
        if self.chip_mode.baseband_enabled(frontend) {
            Ok(())
        } else {
            Err(Error::InvalidChipMode)
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec;

    use super::*;
    use crate::mock::{ready_device, Event, MockError, MockTransport};
    use crate::registers::{RF_CFG, RF_CLKO, RF_IQIFC1, RF_PN, RF_VN, RF_XOC};

    #[test]
    fn read_u8_frames_the_address() {
        let mut transport = MockTransport::new();
        transport.set(0x0203, 0x5A);
        let mut device = Device::new(transport);

        assert_eq!(device.read_u8(0x0203).unwrap(), 0x5A);
        assert_eq!(
            device.transport.events(),
            vec![
                Event::Select(false),
                Event::Irq(false),
                Event::Transfer(vec![0x02, 0x03], 3),
                Event::Irq(false),
                Event::Select(true),
            ]
        );
    }

    #[test]
    fn write_u16_sends_msb_first() {
        let mut device = Device::new(MockTransport::new());
        device.write_u16(0x0305, 0x07FF).unwrap();
        assert!(device
            .transport
            .events()
            .contains(&Event::Write(vec![0x83, 0x05, 0x07, 0xFF])));
        assert_eq!(device.transport.get(0x0305), 0x07);
        assert_eq!(device.transport.get(0x0306), 0xFF);
    }

    #[test]
    fn read_u32_is_big_endian() {
        let mut transport = MockTransport::new();
        for (i, b) in [0x12, 0x34, 0x56, 0x78].into_iter().enumerate() {
            transport.set(0x0110 + i as u16, b);
        }
        let mut device = Device::new(transport);
        assert_eq!(device.read_u32(0x0110).unwrap(), 0x1234_5678);
    }

    #[test]
    fn frame_buffer_burst_is_one_select_window() {
        let mut device = Device::new(MockTransport::new());
        device
            .write_frame_buffer(Frontend::Rf24, &[0xA1, 0xA2, 0xA3])
            .unwrap();
        assert_eq!(
            device.transport.events(),
            vec![
                Event::Select(false),
                Event::Irq(false),
                Event::Write(vec![0xB8, 0x00]),
                Event::Write(vec![0xA1, 0xA2, 0xA3]),
                Event::Irq(false),
                Event::Select(true),
            ]
        );

        let mut frame = [0u8; 3];
        device.transport.set(0x3001, 0x42);
        device.read_frame_buffer(Frontend::Rf24, &mut frame).unwrap();
        assert_eq!(frame, [0x00, 0x42, 0x00]);
        let mut oversized = [0u8; MAX_PSDU_LEN + 1];
        assert_eq!(
            device.read_frame_buffer(Frontend::Rf24, &mut oversized),
            Err(Error::InvalidParameter)
        );
    }

    #[test]
    fn failed_write_restores_select_and_irq() {
        let mut device = ready_device(MockTransport::new());
        device.transport.clear_log();
        device.transport.fail_next_write();

        assert_eq!(
            device.write_u8(0x0103, 0x02),
            Err(Error::Transport(MockError::Bus))
        );
        assert_eq!(
            device.transport.events(),
            vec![
                Event::Select(false),
                Event::Irq(false),
                Event::Irq(true),
                Event::Select(true),
            ]
        );
    }

    #[test]
    fn failed_select_aborts_before_the_bus() {
        let mut device = Device::new(MockTransport::new());
        device.transport.fail_next_select();
        assert_eq!(device.read_u8(RF_PN), Err(Error::Transport(MockError::Pin)));
        assert!(device.transport.events().is_empty());
    }

    #[test]
    fn device_config_compares_by_value() {
        let config = DeviceConfig::default();
        assert_eq!(config, DeviceConfig::default());

        let mut trimmed = config;
        trimmed.crystal.trim = 4;
        assert_ne!(trimmed, config);
        assert_eq!(trimmed.clock_output, config.clock_output);
        assert_eq!(trimmed.pads, config.pads);
    }

    #[test]
    fn init_identifies_and_configures() {
        let mut transport = MockTransport::new();
        transport.set(RF_VN, 0x03);
        let mut device = Device::new(transport);

        let identity = device.init(&DeviceConfig::default()).unwrap();
        assert_eq!(
            identity,
            Identity {
                family: Family::At86rf215,
                version: 3
            }
        );
        assert_eq!(device.chip_mode(), ChipMode::BbRf);

        let t = &device.transport;
        assert_eq!(
            &t.events()[..5],
            &[
                Event::Irq(false),
                Event::Reset(false),
                Event::Delay(1000),
                Event::Reset(true),
                Event::Delay(1000),
            ]
        );
        assert_eq!(t.get(RF_CLKO), 0x09);
        assert_eq!(t.get(RF_XOC), 0x10);
        assert_eq!(t.get(RF_CFG), 0x08);
        assert_eq!(t.get(Frontend::Rf09.bbc(bbc::IRQM)), 0x10);
        assert_eq!(t.get(Frontend::Rf24.rf(rf::IRQM)), 0x02);
        assert!(t.irq_enabled());
    }

    #[test]
    fn init_rejects_unknown_part() {
        let mut transport = MockTransport::new();
        transport.set(RF_PN, 0x42);
        let mut device = Device::new(transport);
        assert_eq!(
            device.init(&DeviceConfig::default()),
            Err(Error::UnknownDevice(0x42))
        );
        assert_eq!(device.identity(), None);
    }

    #[test]
    fn sub_ghz_only_part_skips_rf24() {
        let mut transport = MockTransport::new();
        transport.set(RF_PN, 0x36);
        let device = ready_device(transport);

        assert!(!device
            .transport
            .writes()
            .iter()
            .any(|(addr, _)| *addr == Frontend::Rf24.rf(rf::PADFE)));
        assert_eq!(
            device.supports_frontend(Frontend::Rf24),
            Err(Error::NotSupported)
        );
        assert_eq!(device.supports_mode(ChipMode::BbRf24), Err(Error::NotSupported));
        assert_eq!(device.supports_mode(ChipMode::BbRf09), Ok(()));
    }

    #[test]
    fn iq_part_only_accepts_rf_mode() {
        let mut transport = MockTransport::new();
        transport.set(RF_PN, 0x35);
        let mut device = ready_device(transport);

        assert_eq!(device.set_chip_mode(ChipMode::BbRf), Err(Error::NotSupported));
        device.set_chip_mode(ChipMode::Rf).unwrap();
        assert_eq!(device.chip_mode(), ChipMode::Rf);
    }

    #[test]
    fn chip_mode_keeps_skew_bits() {
        let mut transport = MockTransport::new();
        transport.set(RF_IQIFC1, 0x02);
        let mut device = ready_device(transport);

        device.set_chip_mode(ChipMode::BbRf24).unwrap();
        assert_eq!(device.transport.get(RF_IQIFC1), 0x52);
    }

    #[test]
    fn guards_before_init() {
        let device = Device::new(MockTransport::new());
        assert_eq!(
            device.supports_frontend(Frontend::Rf09),
            Err(Error::NotInitialized)
        );
        assert_eq!(
            device.frontend_ready(Frontend::Rf09),
            Err(Error::NotInitialized)
        );
        let device = ready_device(MockTransport::new());
        assert_eq!(
            device.frontend_ready(Frontend::Rf09),
            Err(Error::NotInitialized)
        );
    }

    #[test]
    fn connection_check_needs_no_init() {
        let mut device = Device::new(MockTransport::new());
        assert_eq!(device.check_connection(), Ok(Family::At86rf215));
        device.transport.set(RF_PN, 0x00);
        assert_eq!(device.check_connection(), Err(Error::UnknownDevice(0)));
    }
}
