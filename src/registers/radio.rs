//! Radio (frontend) registers
//!
//! This module contains the per-frontend register layouts:
//! - Channel mode and channel number
//! - PLL loop bandwidth and lock status
//! - Power amplifier current, power and ramping
//! - TX/RX digital frontends (cutoff and sample rate)
//! - RX bandwidth, AGC and auxiliary analog settings
//! - Radio IRQ sources
//!
//! The layouts are identical for RF09 and RF24, only the block address
//! differs, so these types only carry the packing and are written through
//! [`Frontend::rf`](crate::Frontend::rf) addresses.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{FromByteArray, ToByteArray};

/// Channel addressing scheme of a frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMode {
    /// IEEE compliant: base frequency + channel spacing * channel index
    #[default]
    Ieee = 0,
    /// Fine resolution 389.5-510MHz, 99.182Hz steps (RF09 only)
    FineLow = 1,
    /// Fine resolution 779-1020MHz, 198.364Hz steps (RF09 only)
    FineHigh = 2,
    /// Fine resolution 2400-2483.5MHz, 396.728Hz steps (RF24 only)
    Fine24 = 3,
}

/// Channel number high byte RFn_CNM
///
/// Writing this register applies the whole channel setting (CCF0, CNL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelModeSelect {
    pub mode: ChannelMode,
    /// Bit 8 of the IEEE channel index
    pub channel_msb: bool,
}

impl ToByteArray for ChannelModeSelect {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.mode as u8) << 6) | self.channel_msb as u8])
    }
}

/// PLL loop bandwidth (sub-1GHz frontend only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllBandwidth {
    #[default]
    Default = 0,
    /// 15% smaller loop bandwidth
    Smaller = 1,
    /// 15% larger loop bandwidth
    Larger = 2,
}

/// PLL lock status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllLock {
    Unlocked,
    Locked,
}

/// PLL register RFn_PLL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pll {
    pub bandwidth: PllBandwidth,
    /// Read-only lock status, ignored on write
    pub lock: PllLock,
}

impl FromByteArray for Pll {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            bandwidth: match (bytes[0] >> 4) & 0x3 {
                1 => PllBandwidth::Smaller,
                2 => PllBandwidth::Larger,
                _ => PllBandwidth::Default,
            },
            lock: if bytes[0] & 0x02 != 0 {
                PllLock::Locked
            } else {
                PllLock::Unlocked
            },
        })
    }
}

impl ToByteArray for Pll {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.bandwidth as u8) << 4])
    }
}

/// Power amplifier current reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaCurrent {
    /// ~22mA reduction, 3dB less small signal gain
    Reduce22mA = 0,
    /// ~18mA reduction, 2dB less small signal gain
    Reduce18mA = 1,
    /// ~11mA reduction, 1dB less small signal gain
    Reduce11mA = 2,
    /// Maximum small signal gain
    #[default]
    NoReduction = 3,
}

/// Power amplifier control RFn_PAC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaControl {
    pub current: PaCurrent,
    /// Output power in 1dB steps, clamped to 0..=31
    pub power: u8,
}

impl ToByteArray for PaControl {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.current as u8) << 5) | self.power.min(31)])
    }
}

/// Power amplifier ramp up/down time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaRamp {
    Us4 = 0,
    Us8 = 1,
    #[default]
    Us16 = 2,
    Us32 = 3,
}

/// TX analog low pass filter cut-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LowPassCutoff {
    Khz80 = 0x0,
    Khz100 = 0x1,
    Khz125 = 0x2,
    Khz160 = 0x3,
    Khz200 = 0x4,
    Khz250 = 0x5,
    Khz315 = 0x6,
    Khz400 = 0x7,
    Khz500 = 0x8,
    Khz624 = 0x9,
    Khz800 = 0xA,
    #[default]
    Khz1000 = 0xB,
}

/// TX cut-off and PA ramp RFn_TXCUTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxCutoff {
    pub ramp: PaRamp,
    pub low_pass: LowPassCutoff,
}

impl ToByteArray for TxCutoff {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.ramp as u8) << 6) | self.low_pass as u8])
    }
}

/// Sample rate of the TX/RX digital frontends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleRate {
    #[default]
    Khz4000 = 0x1,
    Khz2000 = 0x2,
    Khz1333 = 0x3,
    Khz1000 = 0x4,
    Khz800 = 0x5,
    Khz666 = 0x6,
    Khz500 = 0x8,
    Khz400 = 0xA,
}

/// Digital filter cut-off relative to half the sample rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelativeCutoff {
    /// 0.25 * fs/2
    Fs025 = 0x0,
    /// 0.375 * fs/2
    Fs037 = 0x1,
    /// 0.5 * fs/2
    Fs050 = 0x2,
    /// 0.75 * fs/2
    Fs075 = 0x3,
    /// 1.0 * fs/2
    #[default]
    Fs100 = 0x4,
}

/// TX digital frontend RFn_TXDFE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxFrontend {
    pub cutoff: RelativeCutoff,
    /// Direct modulation through the frequency synthesizer (FSK only)
    pub direct_modulation: bool,
    pub sample_rate: SampleRate,
}

impl ToByteArray for TxFrontend {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.cutoff as u8) << 5)
            | ((self.direct_modulation as u8) << 4)
            | self.sample_rate as u8])
    }
}

/// RX digital frontend RFn_RXDFE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxFrontend {
    pub cutoff: RelativeCutoff,
    pub sample_rate: SampleRate,
}

impl ToByteArray for RxFrontend {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.cutoff as u8) << 5) | self.sample_rate as u8])
    }
}

/// RX analog bandwidth and IF frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxBandwidth {
    Bw160IfKhz250 = 0x0,
    Bw200IfKhz250 = 0x1,
    Bw250IfKhz250 = 0x2,
    Bw320IfKhz500 = 0x3,
    Bw400IfKhz500 = 0x4,
    Bw500IfKhz500 = 0x5,
    Bw630IfKhz1000 = 0x6,
    Bw800IfKhz1000 = 0x7,
    Bw1000IfKhz1000 = 0x8,
    Bw1250IfKhz2000 = 0x9,
    Bw1600IfKhz2000 = 0xA,
    #[default]
    Bw2000IfKhz2000 = 0xB,
}

/// RX bandwidth control RFn_RXBWC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxBandwidthControl {
    /// Invert the IF (image rejection on the other side)
    pub if_invert: bool,
    /// Shift the IF by a factor of 1.25
    pub if_shift: bool,
    pub bandwidth: RxBandwidth,
}

impl ToByteArray for RxBandwidthControl {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.if_invert as u8) << 5)
            | ((self.if_shift as u8) << 4)
            | self.bandwidth as u8])
    }
}

/// AGC target level relative to ADC full scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AgcTarget {
    Minus21dB = 0,
    Minus24dB = 1,
    Minus27dB = 2,
    #[default]
    Minus30dB = 3,
    Minus33dB = 4,
    Minus36dB = 5,
    Minus39dB = 6,
    Minus42dB = 7,
}

/// AGC averaging window, in samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AgcAveraging {
    #[default]
    Samples8 = 0,
    Samples16 = 1,
    Samples32 = 2,
    Samples64 = 3,
}

/// Highest valid RX gain control word
pub const AGC_MAX_GAIN: u8 = 23;

/// AGC configuration, spread over RFn_AGCC and RFn_AGCS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgcConfig {
    pub enable: bool,
    /// Hold the gain at its current value
    pub freeze: bool,
    /// Restart the AGC; self clearing
    pub reset: bool,
    pub averaging: AgcAveraging,
    /// Use the unfiltered frontend signal, settling faster
    pub unfiltered_input: bool,
    /// RX gain control word used when the AGC is disabled, clamped to 23
    pub gain: u8,
    pub target: AgcTarget,
}

impl Default for AgcConfig {
    fn default() -> Self {
        Self {
            enable: true,
            freeze: false,
            reset: false,
            averaging: AgcAveraging::Samples8,
            unfiltered_input: false,
            gain: AGC_MAX_GAIN,
            target: AgcTarget::Minus30dB,
        }
    }
}

impl AgcConfig {
    /// Value of RFn_AGCC
    pub fn control(&self) -> u8 {
        ((self.unfiltered_input as u8) << 6)
            | ((self.averaging as u8) << 4)
            | ((self.reset as u8) << 3)
            | ((self.freeze as u8) << 1)
            | self.enable as u8
    }

    /// Value of RFn_AGCS
    pub fn status(&self) -> u8 {
        AgcStatus {
            target: self.target,
            gain: self.gain.min(AGC_MAX_GAIN),
        }
        .to_byte()
    }
}

/// AGC target and gain RFn_AGCS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgcStatus {
    pub target: AgcTarget,
    pub gain: u8,
}

impl AgcStatus {
    /// Decode the register value
    pub fn from_byte(value: u8) -> Self {
        let target = match value >> 5 {
            0 => AgcTarget::Minus21dB,
            1 => AgcTarget::Minus24dB,
            2 => AgcTarget::Minus27dB,
            3 => AgcTarget::Minus30dB,
            4 => AgcTarget::Minus33dB,
            5 => AgcTarget::Minus36dB,
            6 => AgcTarget::Minus39dB,
            _ => AgcTarget::Minus42dB,
        };
        Self {
            target,
            gain: value & 0x1F,
        }
    }

    /// Encode the register value
    pub fn to_byte(self) -> u8 {
        ((self.target as u8) << 5) | (self.gain & 0x1F)
    }
}

/// AGC gain mapping for an external LNA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AgcMap {
    /// No external LNA
    #[default]
    Internal = 0,
    /// Back-off for an external LNA of about 9dB
    External9dB = 1,
    /// Back-off for an external LNA of about 12dB
    External12dB = 2,
}

/// Internal power amplifier supply voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaVoltage {
    V2_0 = 0,
    V2_2 = 1,
    #[default]
    V2_4 = 2,
}

/// Auxiliary analog settings RFn_AUXS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuxConfig {
    /// Allow the AGC to bypass the external LNA over FEAnn/FEBnn
    pub external_lna_bypass: bool,
    pub agc_map: AgcMap,
    /// Analog supply driven externally
    pub analog_voltage_external: bool,
    /// Keep the analog supply enabled in TRXOFF
    pub analog_voltage_enable: bool,
    pub pa_voltage: PaVoltage,
}

impl ToByteArray for AuxConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.external_lna_bypass as u8) << 7)
            | ((self.agc_map as u8) << 5)
            | ((self.analog_voltage_external as u8) << 4)
            | ((self.analog_voltage_enable as u8) << 3)
            | self.pa_voltage as u8])
    }
}

/// External frontend control mode on the FEAnn/FEBnn pins (RFn_PADFE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrontendControl {
    /// Pins unused
    #[default]
    Mode0 = 0,
    Mode1 = 1,
    Mode2 = 2,
    Mode3 = 3,
}

impl ToByteArray for FrontendControl {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self as u8) << 6])
    }
}

bitflags! {
    /// Radio IRQ sources (RFn_IRQS / RFn_IRQM)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RadioIrq: u8 {
        /// Wake-up or reset completed
        const WAKEUP = 1 << 0;
        /// Transceiver ready: TXPREP reached or frequency settled
        const TRXRDY = 1 << 1;
        /// Energy detection completed
        const EDC = 1 << 2;
        const BATLOW = 1 << 3;
        /// PLL unlock or other transceiver error
        const TRXERR = 1 << 4;
        /// I/Q interface synchronization failure
        const IQIFSF = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pa_power_is_clamped() {
        let pac = PaControl {
            current: PaCurrent::NoReduction,
            power: 40,
        };
        assert_eq!(pac.to_bytes().unwrap(), [0x7F]);
        let pac = PaControl {
            current: PaCurrent::Reduce18mA,
            power: 3,
        };
        assert_eq!(pac.to_bytes().unwrap(), [0x23]);
    }

    #[test]
    fn pll_bandwidth_and_lock_bits() {
        let pll = Pll {
            bandwidth: PllBandwidth::Larger,
            lock: PllLock::Unlocked,
        };
        assert_eq!(pll.to_bytes().unwrap(), [0x20]);
        let read = Pll::from_bytes([0x12]).unwrap();
        assert_eq!(read.bandwidth, PllBandwidth::Smaller);
        assert_eq!(read.lock, PllLock::Locked);
    }

    #[test]
    fn agc_registers() {
        let agc = AgcConfig {
            enable: true,
            freeze: true,
            reset: true,
            averaging: AgcAveraging::Samples32,
            unfiltered_input: true,
            gain: 30,
            target: AgcTarget::Minus42dB,
        };
        assert_eq!(agc.control(), 0x6B);
        assert_eq!(agc.status(), 0xF7);
        let status = AgcStatus::from_byte(0x65);
        assert_eq!(status.target, AgcTarget::Minus30dB);
        assert_eq!(status.gain, 5);
    }

    #[test]
    fn rx_bandwidth_and_frontends() {
        let bw = RxBandwidthControl {
            if_invert: true,
            if_shift: true,
            bandwidth: RxBandwidth::Bw630IfKhz1000,
        };
        assert_eq!(bw.to_bytes().unwrap(), [0x36]);
        let tx = TxFrontend {
            cutoff: RelativeCutoff::Fs100,
            direct_modulation: true,
            sample_rate: SampleRate::Khz500,
        };
        assert_eq!(tx.to_bytes().unwrap(), [0x98]);
        let aux = AuxConfig {
            external_lna_bypass: true,
            agc_map: AgcMap::External12dB,
            analog_voltage_external: false,
            analog_voltage_enable: true,
            pa_voltage: PaVoltage::V2_2,
        };
        assert_eq!(aux.to_bytes().unwrap(), [0xC9]);
    }
}
