//! Radio frontend configuration
//!
//! This module contains the per-frontend operations:
//! - Channel setup (IEEE channel grid or fine resolution frequency)
//! - PLL loop bandwidth and lock status
//! - Power amplifier, TX cut-off and PA ramp
//! - RX bandwidth and digital frontends
//! - AGC configuration and gain readout
//! - RSSI and energy detection readout
//! - I/Q interface setup
//!
//! A frontend must be configured with [`Device::configure_frontend`] before
//! any operation that depends on its channel setup.
//!
//! # Channel modes
//! In IEEE mode the carrier is `base + spacing * channel`, with the base
//! and spacing in 25kHz steps. In the fine resolution modes the carrier is
//! written directly as a 24-bit fraction of a sub-band:
//!
//! | Mode       | Offset   | Span    | Range              |
//! |------------|----------|---------|--------------------|
//! | `FineLow`  | 377MHz   | 6.5MHz  | 389.5 - 510MHz     |
//! | `FineHigh` | 754MHz   | 13MHz   | 779 - 1020MHz      |
//! | `Fine24`   | 2366MHz  | 26MHz   | 2400 - 2486MHz     |

use crate::irq::IrqHandler;
use crate::registers::{
    rf, AgcConfig, AgcStatus, AgcTarget, AuxConfig, ChannelMode, ChannelModeSelect, Frontend,
    IqChipMode, IqInterface, LowPassCutoff, PaControl, PaCurrent, PaRamp, Pll, PllBandwidth,
    PllLock, RelativeCutoff, RxBandwidth, RxBandwidthControl, RxFrontend, SampleRate, TxCutoff,
    TxFrontend, AGC_MAX_GAIN,
};
use crate::{Device, Error, FrontendState, Transport};

/// Step of the IEEE channel grid registers
const CHANNEL_STEP_HZ: u32 = 25_000;
/// CCF0 of the 2.4GHz frontend counts from 1.5GHz
const RF24_CCF0_OFFSET_HZ: u32 = 1_500_000_000;
/// Highest IEEE channel index accepted by [`Device::set_channel`]
pub const MAX_CHANNEL: u16 = 31;
/// Value of the RSSI and EDV registers when no valid measurement exists
const INVALID_LEVEL: i8 = 127;

/// Channel setup of one frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontendConfig {
    pub channel_mode: ChannelMode,
    /// Channel spacing, used in IEEE mode
    pub spacing_hz: u32,
    /// Frequency of channel 0, used in IEEE mode
    pub base_frequency_hz: u32,
    /// Applied to the sub-1GHz frontend only
    pub pll_bandwidth: PllBandwidth,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            channel_mode: ChannelMode::Ieee,
            spacing_hz: 200_000,
            base_frequency_hz: 863_125_000,
            pll_bandwidth: PllBandwidth::Default,
        }
    }
}

/// I/Q interface setup, see [`Device::configure_iq`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IqConfig {
    pub interface: IqInterface,
    /// Skew alignment of the I/Q driver (0..=3)
    pub skew_drive: u8,
    pub tx_cutoff: RelativeCutoff,
    pub tx_sample_rate: SampleRate,
    pub rx_cutoff: RelativeCutoff,
    pub rx_sample_rate: SampleRate,
}

impl Default for IqConfig {
    fn default() -> Self {
        Self {
            interface: IqInterface::default(),
            skew_drive: 2,
            tx_cutoff: RelativeCutoff::Fs100,
            tx_sample_rate: SampleRate::Khz4000,
            rx_cutoff: RelativeCutoff::Fs100,
            rx_sample_rate: SampleRate::Khz4000,
        }
    }
}

/// Fine resolution sub-band: offset, span and accepted range, in Hz
struct FineBand {
    offset: u64,
    span: u64,
    min: u32,
    max: u32,
}

impl FineBand {
    const fn of(mode: ChannelMode) -> Option<FineBand> {
        match mode {
            ChannelMode::Ieee => None,
            ChannelMode::FineLow => Some(FineBand {
                offset: 377_000_000,
                span: 6_500_000,
                min: 389_500_000,
                max: 510_000_000,
            }),
            ChannelMode::FineHigh => Some(FineBand {
                offset: 754_000_000,
                span: 13_000_000,
                min: 779_000_000,
                max: 1_020_000_000,
            }),
            ChannelMode::Fine24 => Some(FineBand {
                offset: 2_366_000_000,
                span: 26_000_000,
                min: 2_400_000_000,
                max: 2_486_000_000,
            }),
        }
    }

    /// Rounded 24-bit synthesizer word for `hz`
    fn word(&self, hz: u32) -> u32 {
        let delta = hz as u64 - self.offset;
        ((delta * 65_536 + self.span / 2) / self.span) as u32
    }
}

/// IEEE base frequency range of a frontend
const fn ieee_range(frontend: Frontend) -> (u32, u32) {
    match frontend {
        Frontend::Rf09 => (389_500_000, 1_020_000_000),
        Frontend::Rf24 => (2_400_000_000, 2_483_500_000),
    }
}

const fn mode_allowed(frontend: Frontend, mode: ChannelMode) -> bool {
    matches!(
        (frontend, mode),
        (_, ChannelMode::Ieee)
            | (Frontend::Rf09, ChannelMode::FineLow | ChannelMode::FineHigh)
            | (Frontend::Rf24, ChannelMode::Fine24)
    )
}

fn level_dbm<E>(raw: u8) -> Result<i8, Error<E>> {
    match raw as i8 {
        INVALID_LEVEL => Err(Error::InvalidValue),
        dbm => Ok(dbm),
    }
}

impl<T, H> Device<T, H>
where
    T: Transport,
    H: IrqHandler,
{
    /// (Re-)initializes the channel setup of a frontend
    ///
    /// In IEEE mode the base frequency is range checked before anything is
    /// written, then the channel spacing and base frequency registers are
    /// programmed. The fine resolution modes only record the mode; the
    /// carrier is set later with [`Device::set_frequency`].
    ///
    /// # Errors
    /// * [`Error::InvalidParameter`] - Mode not available on this frontend,
    ///   or base frequency out of range
    pub fn configure_frontend(
        &mut self,
        frontend: Frontend,
        config: &FrontendConfig,
    ) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        if !mode_allowed(frontend, config.channel_mode) {
            return Err(Error::InvalidParameter);
        }

        let channel_spacing = (config.spacing_hz / CHANNEL_STEP_HZ).min(0xFF) as u8;
        if config.channel_mode == ChannelMode::Ieee {
            let (min, max) = ieee_range(frontend);
            if !(min..=max).contains(&config.base_frequency_hz) {
                return Err(Error::InvalidParameter);
            }
            let base = match frontend {
                Frontend::Rf09 => config.base_frequency_hz,
                Frontend::Rf24 => config.base_frequency_hz - RF24_CCF0_OFFSET_HZ,
            } / CHANNEL_STEP_HZ;
            let [ccf0h, ccf0l] = (base as u16).to_be_bytes();

            self.write_u8(frontend.rf(rf::CS), channel_spacing)?;
            self.write_u8(frontend.rf(rf::CCF0L), ccf0l)?;
            self.write_u8(frontend.rf(rf::CCF0H), ccf0h)?;
        }

        if frontend == Frontend::Rf09 {
            self.write_packed(
                frontend.rf(rf::PLL),
                Pll {
                    bandwidth: config.pll_bandwidth,
                    lock: PllLock::Unlocked,
                },
            )?;
        }

        self.frontends[frontend.index()] = Some(FrontendState {
            channel_mode: config.channel_mode,
            channel_spacing,
            spacing_hz: config.spacing_hz,
            base_frequency_hz: config.base_frequency_hz,
        });
        Ok(())
    }

    /// Selects an IEEE channel
    ///
    /// # Errors
    /// * [`Error::InvalidParameter`] - `channel` above [`MAX_CHANNEL`]
    /// * [`Error::InvalidConfiguration`] - The frontend is in a fine
    ///   resolution mode
    pub fn set_channel(&mut self, frontend: Frontend, channel: u16) -> Result<(), Error<T::Error>> {
        let state = self.frontend_ready(frontend)?;
        if channel > MAX_CHANNEL {
            return Err(Error::InvalidParameter);
        }
        if state.channel_mode != ChannelMode::Ieee {
            return Err(Error::InvalidConfiguration);
        }

        self.write_u8(frontend.rf(rf::CNL), (channel & 0xFF) as u8)?;
        self.write_packed(
            frontend.rf(rf::CNM),
            ChannelModeSelect {
                mode: ChannelMode::Ieee,
                channel_msb: channel & 0x100 != 0,
            },
        )
    }

    /// Tunes a fine resolution frontend to `hz`
    ///
    /// # Errors
    /// * [`Error::InvalidConfiguration`] - The frontend is in IEEE mode
    /// * [`Error::InvalidParameter`] - `hz` outside the sub-band of the
    ///   configured mode
    pub fn set_frequency(&mut self, frontend: Frontend, hz: u32) -> Result<(), Error<T::Error>> {
        let state = self.frontend_ready(frontend)?;
        let band = FineBand::of(state.channel_mode).ok_or(Error::InvalidConfiguration)?;
        if !(band.min..=band.max).contains(&hz) {
            return Err(Error::InvalidParameter);
        }
        let [_, high, mid, low] = band.word(hz).to_be_bytes();

        self.write_u8(frontend.rf(rf::CCF0H), high)?;
        self.write_u8(frontend.rf(rf::CCF0L), mid)?;
        self.write_u8(frontend.rf(rf::CNL), low)?;
        self.write_packed(
            frontend.rf(rf::CNM),
            ChannelModeSelect {
                mode: state.channel_mode,
                channel_msb: false,
            },
        )
    }

    /// Frequency synthesizer lock status
    pub fn pll_lock(&mut self, frontend: Frontend) -> Result<PllLock, Error<T::Error>> {
        self.frontend_ready(frontend)?;
        let pll: Pll = self.read_packed(frontend.rf(rf::PLL))?;
        Ok(pll.lock)
    }

    /// Fails with [`Error::PllUnlock`] unless the synthesizer is locked
    pub fn ensure_pll_locked(&mut self, frontend: Frontend) -> Result<(), Error<T::Error>> {
        match self.pll_lock(frontend)? {
            PllLock::Locked => Ok(()),
            PllLock::Unlocked => Err(Error::PllUnlock),
        }
    }

    /// Sets the PA current reduction and output power (clamped to 31)
    pub fn set_pa(
        &mut self,
        frontend: Frontend,
        current: PaCurrent,
        power: u8,
    ) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        self.write_packed(frontend.rf(rf::PAC), PaControl { current, power })
    }

    /// Sets the TX analog low pass cut-off and the PA ramp time
    pub fn set_tx_cutoff(
        &mut self,
        frontend: Frontend,
        ramp: PaRamp,
        low_pass: LowPassCutoff,
    ) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        self.write_packed(frontend.rf(rf::TXCUTC), TxCutoff { ramp, low_pass })
    }

    /// Sets the RX analog bandwidth and IF
    pub fn set_rx_bandwidth(
        &mut self,
        frontend: Frontend,
        if_invert: bool,
        if_shift: bool,
        bandwidth: RxBandwidth,
    ) -> Result<(), Error<T::Error>> {
        self.frontend_ready(frontend)?;
        self.write_packed(
            frontend.rf(rf::RXBWC),
            RxBandwidthControl {
                if_invert,
                if_shift,
                bandwidth,
            },
        )
    }

    /// Changes the RX digital frontend cut-off, keeping its sample rate
    pub fn set_rx_cutoff(
        &mut self,
        frontend: Frontend,
        cutoff: RelativeCutoff,
    ) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        let addr = frontend.rf(rf::RXDFE);
        let value = self.read_u8(addr)?;
        self.write_u8(addr, ((cutoff as u8) << 5) | (value & 0x1F))
    }

    pub(crate) fn set_tx_frontend(
        &mut self,
        frontend: Frontend,
        txdfe: TxFrontend,
    ) -> Result<(), Error<T::Error>> {
        self.write_packed(frontend.rf(rf::TXDFE), txdfe)
    }

    pub(crate) fn set_rx_frontend(
        &mut self,
        frontend: Frontend,
        rxdfe: RxFrontend,
    ) -> Result<(), Error<T::Error>> {
        self.write_packed(frontend.rf(rf::RXDFE), rxdfe)
    }

    /// Applies a complete AGC configuration
    pub fn set_agc(
        &mut self,
        frontend: Frontend,
        config: &AgcConfig,
    ) -> Result<(), Error<T::Error>> {
        self.frontend_ready(frontend)?;
        self.write_u8(frontend.rf(rf::AGCC), config.control())?;
        self.write_u8(frontend.rf(rf::AGCS), config.status())
    }

    /// Changes the AGC target, keeping the gain word
    pub fn set_agc_target(
        &mut self,
        frontend: Frontend,
        target: AgcTarget,
    ) -> Result<(), Error<T::Error>> {
        self.frontend_ready(frontend)?;
        let addr = frontend.rf(rf::AGCS);
        let mut agcs = AgcStatus::from_byte(self.read_u8(addr)?);
        agcs.target = target;
        self.write_u8(addr, agcs.to_byte())
    }

    /// Changes the AGC freeze and enable bits, keeping the rest of AGCC
    pub fn set_agc_control(
        &mut self,
        frontend: Frontend,
        freeze: bool,
        enable: bool,
    ) -> Result<(), Error<T::Error>> {
        self.frontend_ready(frontend)?;
        let addr = frontend.rf(rf::AGCC);
        let value = self.read_u8(addr)? & 0xFC;
        self.write_u8(addr, value | ((freeze as u8) << 1) | enable as u8)
    }

    /// Sets the RX gain word used while the AGC is disabled
    ///
    /// # Errors
    /// * [`Error::InvalidParameter`] - `gain` above [`AGC_MAX_GAIN`]
    pub fn set_agc_gain(&mut self, frontend: Frontend, gain: u8) -> Result<(), Error<T::Error>> {
        self.frontend_ready(frontend)?;
        if gain > AGC_MAX_GAIN {
            return Err(Error::InvalidParameter);
        }
        let addr = frontend.rf(rf::AGCS);
        let mut agcs = AgcStatus::from_byte(self.read_u8(addr)?);
        agcs.gain = gain;
        self.write_u8(addr, agcs.to_byte())
    }

    /// Current RX gain word
    pub fn agc_gain(&mut self, frontend: Frontend) -> Result<u8, Error<T::Error>> {
        self.frontend_ready(frontend)?;
        let agcs = AgcStatus::from_byte(self.read_u8(frontend.rf(rf::AGCS))?);
        Ok(agcs.gain)
    }

    pub fn set_aux_settings(
        &mut self,
        frontend: Frontend,
        config: &AuxConfig,
    ) -> Result<(), Error<T::Error>> {
        self.frontend_ready(frontend)?;
        self.write_packed(frontend.rf(rf::AUXS), *config)
    }

    /// Received signal strength in dBm
    ///
    /// # Errors
    /// * [`Error::InvalidValue`] - No valid measurement (receiver off)
    pub fn rssi(&mut self, frontend: Frontend) -> Result<i8, Error<T::Error>> {
        self.frontend_ready(frontend)?;
        level_dbm(self.read_u8(frontend.rf(rf::RSSI))?)
    }

    /// Result of the last energy detection, in dBm
    pub fn energy_detect_value(&mut self, frontend: Frontend) -> Result<i8, Error<T::Error>> {
        self.frontend_ready(frontend)?;
        level_dbm(self.read_u8(frontend.rf(rf::EDV))?)
    }

    /// Configures the I/Q interface and the digital frontends of `frontend`
    /// for I/Q operation
    ///
    /// The I/Q interface settings are shared by both frontends. The chip
    /// mode is left untouched; switch it with
    /// [`Device::set_chip_mode`](crate::Device::set_chip_mode).
    pub fn configure_iq(
        &mut self,
        frontend: Frontend,
        config: &IqConfig,
    ) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        if config.skew_drive > 3 {
            return Err(Error::InvalidParameter);
        }
        self.write_register(config.interface)?;

        let mut iqifc1: IqChipMode = self.read_register()?;
        iqifc1.skew_drive = config.skew_drive;
        self.write_register(iqifc1)?;

        self.set_tx_frontend(
            frontend,
            TxFrontend {
                cutoff: config.tx_cutoff,
                direct_modulation: false,
                sample_rate: config.tx_sample_rate,
            },
        )?;
        self.set_rx_frontend(
            frontend,
            RxFrontend {
                cutoff: config.rx_cutoff,
                sample_rate: config.rx_sample_rate,
            },
        )
    }
}
