//! Common registers
//!
//! This module contains the registers shared by both frontends:
//! - Part and version identification
//! - Pad and IRQ pin configuration
//! - Clock output and crystal oscillator trimming
//! - I/Q interface and chip mode selection
//!
//! These registers live at fixed addresses and are accessed through the
//! typed [`Device::read_register`](crate::Device::read_register) and
//! [`Device::write_register`](crate::Device::write_register) calls.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Device family, as reported by the part number register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Family {
    /// AT86RF215: dual band transceiver and I/Q radio
    At86rf215 = 0x34,
    /// AT86RF215IQ: I/Q radio only, no baseband cores
    At86rf215iq = 0x35,
    /// AT86RF215M: sub-1GHz transceiver and I/Q radio
    At86rf215m = 0x36,
}

impl TryFrom<u8> for Family {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x34 => Ok(Self::At86rf215),
            0x35 => Ok(Self::At86rf215iq),
            0x36 => Ok(Self::At86rf215m),
            unknown => Err(unknown),
        }
    }
}

/// Part number register (address: 0x000D)
///
/// Identifies the device family. Any value other than 0x34, 0x35 or 0x36
/// means the part on the bus is not an AT86RF215 (or the bus is not working).
#[register(0x000Du16)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct PartNumber {
    /// Raw part number
    pub value: u8,
}

impl PartNumber {
    /// Decoded family, if the part number is a known one
    pub fn family(&self) -> Option<Family> {
        Family::try_from(self.value).ok()
    }
}

/// Version number register (address: 0x000E)
///
/// Hardware revision of the IC. Revision 1 parts use lower TX sample rates
/// for the two slowest FSK symbol rates.
#[register(0x000Eu16)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct VersionNumber {
    pub version: u8,
}

/// Output driver strength of the IRQ, MISO and frontend control pads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PadDrive {
    #[default]
    Ma2 = 0,
    Ma4 = 1,
    Ma6 = 2,
    Ma8 = 3,
}

/// IRQ pin polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqPolarity {
    /// IRQ pin is high when an interrupt is pending
    #[default]
    ActiveHigh = 0,
    /// IRQ pin is low when an interrupt is pending
    ActiveLow = 1,
}

/// Pad configuration register RF_CFG (address: 0x0006)
#[register(0x0006u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct PadConfig {
    /// When set, masked IRQ sources are still reported in the IRQS registers
    pub irq_mask_mode: bool,
    pub irq_polarity: IrqPolarity,
    pub drive: PadDrive,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            irq_mask_mode: true,
            irq_polarity: IrqPolarity::ActiveHigh,
            drive: PadDrive::Ma2,
        }
    }
}

impl ToByteArray for PadConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.irq_mask_mode as u8) << 3)
            | ((self.irq_polarity as u8) << 2)
            | self.drive as u8])
    }
}

/// Frequency on the CLKO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockOutputFrequency {
    Off = 0,
    #[default]
    Mhz26 = 1,
    Mhz32 = 2,
    Mhz16 = 3,
    Mhz8 = 4,
    Mhz4 = 5,
    Mhz2 = 6,
    Mhz1 = 7,
}

/// Clock output register RF_CLKO (address: 0x0007)
#[register(0x0007u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct ClockOutput {
    pub frequency: ClockOutputFrequency,
    pub drive: PadDrive,
}

impl Default for ClockOutput {
    fn default() -> Self {
        Self {
            frequency: ClockOutputFrequency::Mhz26,
            drive: PadDrive::Ma4,
        }
    }
}

impl ToByteArray for ClockOutput {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.drive as u8) << 3) | self.frequency as u8])
    }
}

/// Crystal oscillator control register RF_XOC (address: 0x0009)
#[register(0x0009u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct CrystalOscillator {
    /// Fast start-up, trading current for a shorter settling time
    pub fast_start: bool,
    /// Load capacitance trim, steps of 0.3pF (0..=15)
    pub trim: u8,
}

impl Default for CrystalOscillator {
    fn default() -> Self {
        Self {
            fast_start: true,
            trim: 0,
        }
    }
}

impl ToByteArray for CrystalOscillator {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.fast_start as u8) << 4) | (self.trim & 0x0F)])
    }
}

/// LVDS driver current of the I/Q interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LvdsDrive {
    Ma1 = 0,
    Ma2 = 1,
    #[default]
    Ma3 = 2,
    Ma4 = 3,
}

/// LVDS common mode voltage of the I/Q interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LvdsCommonMode {
    Mv150 = 0,
    Mv200 = 1,
    #[default]
    Mv250 = 2,
    Mv300 = 3,
}

/// I/Q interface configuration register RF_IQIFC0 (address: 0x000A)
#[register(0x000Au16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, WritableRegister)]
pub struct IqInterface {
    /// Route the TX I/Q data back to the RX path
    pub external_loopback: bool,
    pub drive: LvdsDrive,
    pub common_mode: LvdsCommonMode,
    /// 1.2V common mode (IEEE 1596); overrides `common_mode`
    pub common_mode_1v2: bool,
    /// Embedded control of the frontend over the I/Q stream
    pub embedded_control: bool,
}

impl ToByteArray for IqInterface {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.external_loopback as u8) << 7)
            | ((self.drive as u8) << 4)
            | ((self.common_mode as u8) << 2)
            | ((self.common_mode_1v2 as u8) << 1)
            | self.embedded_control as u8])
    }
}

/// Chip mode: which frontends are served by the baseband cores and which are
/// routed to the I/Q interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipMode {
    /// Both baseband cores enabled, I/Q interface disabled
    #[default]
    BbRf = 0x0,
    /// Both baseband cores disabled, I/Q interface enabled
    Rf = 0x1,
    /// BBC0 disabled, BBC1 enabled; RF09 on the I/Q interface
    BbRf09 = 0x4,
    /// BBC1 disabled, BBC0 enabled; RF24 on the I/Q interface
    BbRf24 = 0x5,
}

impl ChipMode {
    /// Whether the baseband core paired with `frontend` runs in this mode
    pub fn baseband_enabled(self, frontend: crate::Frontend) -> bool {
        match (self, frontend) {
            (ChipMode::BbRf, _) => true,
            (ChipMode::Rf, _) => false,
            (ChipMode::BbRf09, crate::Frontend::Rf09) => false,
            (ChipMode::BbRf24, crate::Frontend::Rf24) => false,
            _ => true,
        }
    }
}

/// Error type for chip mode decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidChipMode(pub u8);

impl TryFrom<u8> for ChipMode {
    type Error = InvalidChipMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Self::BbRf),
            0x1 => Ok(Self::Rf),
            0x4 => Ok(Self::BbRf09),
            0x5 => Ok(Self::BbRf24),
            invalid => Err(InvalidChipMode(invalid)),
        }
    }
}

/// I/Q interface and chip mode register RF_IQIFC1 (address: 0x000B)
///
/// Holds both the I/Q clock skew alignment and the chip mode, so each of
/// them is updated with a read-modify-write that leaves the other intact.
#[register(0x000Bu16)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct IqChipMode {
    /// Skew alignment of the I/Q interface driver (0..=3, reset value 2)
    pub skew_drive: u8,
    pub chip_mode: ChipMode,
}

impl FromByteArray for IqChipMode {
    type Error = InvalidChipMode;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            skew_drive: bytes[0] & 0x03,
            chip_mode: ChipMode::try_from((bytes[0] >> 4) & 0x07)?,
        })
    }
}

impl ToByteArray for IqChipMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.chip_mode as u8) << 4) | (self.skew_drive & 0x03)])
    }
}

impl FromByteArray for PartNumber {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl FromByteArray for VersionNumber {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { version: bytes[0] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frontend;

    #[test]
    fn chip_mode_update_keeps_skew() {
        assert_eq!(
            IqChipMode::from_bytes([0x72]).unwrap_err(),
            InvalidChipMode(0x7)
        );

        let mut current = IqChipMode::from_bytes([0x02]).unwrap();
        current.chip_mode = ChipMode::BbRf24;
        assert_eq!(current.to_bytes().unwrap(), [0x52]);
    }

    #[test]
    fn baseband_enabled_per_mode() {
        assert!(ChipMode::BbRf.baseband_enabled(Frontend::Rf24));
        assert!(!ChipMode::Rf.baseband_enabled(Frontend::Rf09));
        assert!(!ChipMode::BbRf09.baseband_enabled(Frontend::Rf09));
        assert!(ChipMode::BbRf09.baseband_enabled(Frontend::Rf24));
        assert!(ChipMode::BbRf24.baseband_enabled(Frontend::Rf09));
        assert!(!ChipMode::BbRf24.baseband_enabled(Frontend::Rf24));
    }

    #[test]
    fn pad_and_clock_defaults_match_reset_values() {
        assert_eq!(PadConfig::default().to_bytes().unwrap(), [0x08]);
        assert_eq!(ClockOutput::default().to_bytes().unwrap(), [0x09]);
        assert_eq!(CrystalOscillator::default().to_bytes().unwrap(), [0x10]);
        assert_eq!(PartNumber::from_bytes([0x36]).unwrap().family(), Some(Family::At86rf215m));
        assert_eq!(PartNumber::from_bytes([0x00]).unwrap().family(), None);
    }
}
