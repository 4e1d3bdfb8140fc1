//! Baseband core registers
//!
//! This module contains the register layouts of the baseband cores:
//! - PHY control (PHY type, FCS handling, core enable)
//! - The MR-FSK parameter set (FSKC0..FSKC4, preamble, SFDs, PHR,
//!   direct modulation, pre-emphasis and RAW frame length)
//! - Baseband IRQ sources
//!
//! [`FskConfig::registers`] turns a symbolic FSK configuration into the
//! packed register image. It validates everything up front, so a rejected
//! configuration never reaches the bus.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::ToByteArray;

/// Physical layer of a baseband core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyType {
    /// Baseband core off
    Off = 0,
    /// MR-FSK
    #[default]
    Fsk = 1,
    /// MR-OFDM
    Ofdm = 2,
    /// MR-O-QPSK
    Oqpsk = 3,
}

/// Frame check sequence length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FcsType {
    #[default]
    Fcs32 = 1,
    Fcs16 = 0,
}

/// PHY control register BBCn_PC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhyControl {
    pub phy: PhyType,
    pub baseband_enable: bool,
    pub fcs_type: FcsType,
    /// Append the FCS automatically on transmit
    pub tx_auto_fcs: bool,
    /// Drop received frames with a bad FCS
    pub fcs_filter: bool,
    /// Continuous transmit
    pub continuous_tx: bool,
}

impl ToByteArray for PhyControl {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.continuous_tx as u8) << 7)
            | ((self.fcs_filter as u8) << 6)
            | ((self.tx_auto_fcs as u8) << 4)
            | ((self.fcs_type as u8) << 3)
            | ((self.baseband_enable as u8) << 2)
            | self.phy as u8])
    }
}

/// FSK modulation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FskOrder {
    #[default]
    Fsk2 = 0,
    Fsk4 = 1,
}

/// FSK modulation index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModulationIndex {
    Midx0_375 = 0,
    Midx0_5 = 1,
    Midx0_75 = 2,
    #[default]
    Midx1_0 = 3,
    Midx1_25 = 4,
    Midx1_5 = 5,
    Midx1_75 = 6,
    Midx2_0 = 7,
}

impl ModulationIndex {
    /// Whether the index falls in the "h >= 1" class of the datasheet
    /// filter tables
    pub fn is_wide(self) -> bool {
        self >= ModulationIndex::Midx1_0
    }
}

/// Scaling applied to the modulation index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndexScaling {
    /// 7/8
    S7_8 = 0,
    /// 8/8
    #[default]
    S8_8 = 1,
    /// 9/8
    S9_8 = 2,
    /// 10/8
    S10_8 = 3,
}

/// Bandwidth-time product of the shaping filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BtProduct {
    Bt0_5 = 0,
    #[default]
    Bt1_0 = 1,
    Bt1_5 = 2,
    Bt2_0 = 3,
}

/// FSK symbol rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SymbolRate {
    #[default]
    Khz50 = 0,
    Khz100 = 1,
    Khz150 = 2,
    Khz200 = 3,
    Khz300 = 4,
    Khz400 = 5,
}

/// Receiver override: restart synchronization on a much stronger frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiverOverride {
    Db6 = 0,
    Db12 = 1,
    Db18 = 2,
    #[default]
    Disabled = 3,
}

/// FEC scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FecScheme {
    /// Non-recursive non-systematic convolutional code
    #[default]
    Nrnsc = 0,
    /// Recursive systematic convolutional code
    Rsc = 1,
}

/// SFD coding and frame mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SfdMode {
    UncodedIeee = 0,
    UncodedRaw = 1,
    #[default]
    CodedIeee = 2,
    CodedRaw = 3,
}

/// SFD used for transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SfdSelect {
    #[default]
    Sfd0 = 0,
    Sfd1 = 1,
}

/// Error type for FSK parameter validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FskConfigError {
    /// 4-FSK needs BT = 2.0 and a modulation index of at least 1.0
    FourFskRestriction,
    /// A numeric field exceeds its register width
    OutOfRange,
}

/// Largest preamble length, in octets
pub const MAX_PREAMBLE_LEN: u16 = 0x3FF;
/// Largest RAW mode RX frame length
pub const MAX_RAW_FRAME_LEN: u16 = 0x7FF;
/// Largest pre-emphasis tap word
pub const MAX_PREEMPHASIS_TAPS: u32 = 0xFF_FFFF;

/// MR-FSK parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FskConfig {
    pub order: FskOrder,
    pub index: ModulationIndex,
    pub index_scaling: IndexScaling,
    pub bt: BtProduct,
    pub symbol_rate: SymbolRate,
    /// Invert the frequency deviation
    pub frequency_inversion: bool,
    /// Preamble length in octets (0..=1023)
    pub preamble_length: u16,
    pub receiver_override: ReceiverOverride,
    /// Preamble detection timing mode
    pub preamble_detect_timing: bool,
    /// RX preamble time-out
    pub rx_preamble_timeout: bool,
    /// Report the mean square error instead of the frequency offset
    pub mse: bool,
    /// Invert the preamble detection polarity
    pub preamble_inversion: bool,
    pub fec_enable: bool,
    pub fec_scheme: FecScheme,
    /// SFD detector threshold (0..=15); lower is more sensitive
    pub sfd_threshold: u8,
    /// Preamble detector threshold (0..=15); lower is more sensitive
    pub preamble_threshold: u8,
    /// Hard SFD decision instead of soft
    pub hard_sfd_decision: bool,
    /// Search for a single 32-bit SFD {SFD1, SFD0} instead of two 16-bit ones
    pub sfd32: bool,
    /// Transmit RAW mode payload bytes MSB first
    pub raw_msb_first: bool,
    pub sfd1_mode: SfdMode,
    pub sfd0_mode: SfdMode,
    /// First 16-bit SFD, LSB transmitted first
    pub sfd0: u16,
    /// Second 16-bit SFD
    pub sfd1: u16,
    pub sfd_select: SfdSelect,
    /// Data whitening of the PSDU
    pub whitening: bool,
    /// Reserved PHR bit 2 on transmit
    pub phr_reserved2: bool,
    /// Reserved PHR bit 1 on transmit
    pub phr_reserved1: bool,
    /// Direct modulation; TXDFE gets the same setting
    pub direct_modulation: bool,
    pub preemphasis: bool,
    /// Pre-emphasis filter taps (24 bits)
    pub preemphasis_taps: u32,
    /// Frame length used by the receiver in RAW mode (0..=2047)
    pub raw_rx_frame_length: u16,
}

impl Default for FskConfig {
    fn default() -> Self {
        Self {
            order: FskOrder::Fsk2,
            index: ModulationIndex::Midx1_0,
            index_scaling: IndexScaling::S8_8,
            bt: BtProduct::Bt1_0,
            symbol_rate: SymbolRate::Khz50,
            frequency_inversion: false,
            preamble_length: 8,
            receiver_override: ReceiverOverride::Disabled,
            preamble_detect_timing: false,
            rx_preamble_timeout: false,
            mse: false,
            preamble_inversion: false,
            fec_enable: false,
            fec_scheme: FecScheme::Nrnsc,
            sfd_threshold: 8,
            preamble_threshold: 5,
            hard_sfd_decision: false,
            sfd32: false,
            raw_msb_first: false,
            sfd1_mode: SfdMode::CodedIeee,
            sfd0_mode: SfdMode::CodedIeee,
            sfd0: 0x7209,
            sfd1: 0x72F6,
            sfd_select: SfdSelect::Sfd0,
            whitening: true,
            phr_reserved2: false,
            phr_reserved1: false,
            direct_modulation: false,
            preemphasis: false,
            preemphasis_taps: 0,
            raw_rx_frame_length: MAX_RAW_FRAME_LEN,
        }
    }
}

/// Packed FSK register image, in write order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FskRegisters {
    pub c0: u8,
    pub c1: u8,
    pub c2: u8,
    pub c3: u8,
    pub c4: u8,
    pub preamble: u8,
    /// FSKSFD0L, FSKSFD0H, FSKSFD1L, FSKSFD1H
    pub sfd: [u8; 4],
    pub phr_tx: u8,
    pub direct_modulation: u8,
    /// FSKPE0, FSKPE1, FSKPE2
    pub preemphasis: [u8; 3],
    /// FSKRRXFLH, FSKRRXFLL
    pub raw_rx_frame_length: [u8; 2],
}

impl FskConfig {
    /// Cross-field and range checks
    ///
    /// 2-FSK is always legal. 4-FSK requires BT = 2.0 and an index of at
    /// least 1.0, whatever the index scaling.
    pub fn validate(&self) -> Result<(), FskConfigError> {
        if self.order == FskOrder::Fsk4 && (self.bt != BtProduct::Bt2_0 || !self.index.is_wide()) {
            return Err(FskConfigError::FourFskRestriction);
        }
        if self.preamble_length > MAX_PREAMBLE_LEN
            || self.raw_rx_frame_length > MAX_RAW_FRAME_LEN
            || self.preemphasis_taps > MAX_PREEMPHASIS_TAPS
            || self.sfd_threshold > 0x0F
            || self.preamble_threshold > 0x0F
        {
            return Err(FskConfigError::OutOfRange);
        }
        Ok(())
    }

    /// FSKC0: order, index, scaling, BT
    pub fn fskc0(&self) -> u8 {
        ((self.bt as u8) << 6)
            | ((self.index_scaling as u8) << 4)
            | ((self.index as u8) << 1)
            | self.order as u8
    }

    /// FSKC1: symbol rate, frequency inversion, preamble length bits 9:8
    pub fn fskc1(&self) -> u8 {
        (((self.preamble_length >> 2) & 0xC0) as u8)
            | ((self.frequency_inversion as u8) << 5)
            | self.symbol_rate as u8
    }

    /// FSKC2: FEC, preamble polarity, MSE, preamble time-out, receiver
    /// override, preamble detection timing
    pub fn fskc2(&self) -> u8 {
        ((self.preamble_detect_timing as u8) << 7)
            | ((self.receiver_override as u8) << 5)
            | ((self.rx_preamble_timeout as u8) << 4)
            | ((self.mse as u8) << 3)
            | ((self.preamble_inversion as u8) << 2)
            | ((self.fec_scheme as u8) << 1)
            | self.fec_enable as u8
    }

    /// FSKC3: SFD and preamble detector thresholds
    pub fn fskc3(&self) -> u8 {
        ((self.sfd_threshold & 0x0F) << 4) | (self.preamble_threshold & 0x0F)
    }

    /// FSKC4: SFD coding, RAW bit order, SFD32, SFD decision
    pub fn fskc4(&self) -> u8 {
        ((self.hard_sfd_decision as u8) << 6)
            | ((self.sfd32 as u8) << 5)
            | ((self.raw_msb_first as u8) << 4)
            | ((self.sfd1_mode as u8) << 2)
            | self.sfd0_mode as u8
    }

    /// FSKPHRTX: reserved PHR bits, whitening, SFD selection
    pub fn phr_tx(&self) -> u8 {
        ((self.sfd_select as u8) << 3)
            | ((self.whitening as u8) << 2)
            | ((self.phr_reserved2 as u8) << 1)
            | self.phr_reserved1 as u8
    }

    /// FSKDM: direct modulation and pre-emphasis enables
    pub fn fskdm(&self) -> u8 {
        ((self.preemphasis as u8) << 1) | self.direct_modulation as u8
    }

    /// Validate and pack the whole register image
    pub fn registers(&self) -> Result<FskRegisters, FskConfigError> {
        self.validate()?;
        let sfd0 = self.sfd0.to_le_bytes();
        let sfd1 = self.sfd1.to_le_bytes();
        let taps = self.preemphasis_taps.to_le_bytes();
        Ok(FskRegisters {
            c0: self.fskc0(),
            c1: self.fskc1(),
            c2: self.fskc2(),
            c3: self.fskc3(),
            c4: self.fskc4(),
            preamble: (self.preamble_length & 0xFF) as u8,
            sfd: [sfd0[0], sfd0[1], sfd1[0], sfd1[1]],
            phr_tx: self.phr_tx(),
            direct_modulation: self.fskdm(),
            preemphasis: [taps[0], taps[1], taps[2]],
            raw_rx_frame_length: self.raw_rx_frame_length.to_be_bytes(),
        })
    }
}

/// Baseband core configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasebandConfig {
    pub phy: PhyType,
    pub continuous_tx: bool,
    pub fcs_type: FcsType,
    pub tx_auto_fcs: bool,
    pub fcs_filter: bool,
    /// Used when `phy` is [`PhyType::Fsk`]
    pub fsk: FskConfig,
}

impl BasebandConfig {
    /// PHY control register for this configuration
    pub fn phy_control(&self, enable: bool) -> PhyControl {
        PhyControl {
            phy: self.phy,
            baseband_enable: enable,
            fcs_type: self.fcs_type,
            tx_auto_fcs: self.tx_auto_fcs,
            fcs_filter: self.fcs_filter,
            continuous_tx: self.continuous_tx,
        }
    }
}

bitflags! {
    /// Baseband IRQ sources (BBCn_IRQS / BBCn_IRQM)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BasebandIrq: u8 {
        /// Frame reception started
        const RXFS = 1 << 0;
        /// Frame reception complete
        const RXFE = 1 << 1;
        /// Address match
        const RXAM = 1 << 2;
        /// Extended address match
        const RXEM = 1 << 3;
        /// Frame transmission complete
        const TXFE = 1 << 4;
        /// AGC hold
        const AGCH = 1 << 5;
        /// AGC release
        const AGCR = 1 << 6;
        /// Frame buffer level indication
        const FBLI = 1 << 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_fsk() -> FskConfig {
        FskConfig {
            order: FskOrder::Fsk4,
            bt: BtProduct::Bt2_0,
            index: ModulationIndex::Midx1_0,
            ..FskConfig::default()
        }
    }

    #[test]
    fn two_fsk_is_always_legal() {
        for bt in [
            BtProduct::Bt0_5,
            BtProduct::Bt1_0,
            BtProduct::Bt1_5,
            BtProduct::Bt2_0,
        ] {
            let cfg = FskConfig {
                bt,
                index: ModulationIndex::Midx0_375,
                index_scaling: IndexScaling::S7_8,
                ..FskConfig::default()
            };
            assert_eq!(cfg.validate(), Ok(()));
        }
    }

    #[test]
    fn four_fsk_restrictions() {
        assert_eq!(four_fsk().validate(), Ok(()));

        let wrong_bt = FskConfig {
            bt: BtProduct::Bt1_5,
            ..four_fsk()
        };
        assert_eq!(wrong_bt.validate(), Err(FskConfigError::FourFskRestriction));

        let narrow = FskConfig {
            index: ModulationIndex::Midx0_75,
            index_scaling: IndexScaling::S7_8,
            ..four_fsk()
        };
        assert_eq!(narrow.validate(), Err(FskConfigError::FourFskRestriction));
        assert!(narrow.registers().is_err());
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let cfg = FskConfig {
            preamble_length: 1024,
            ..FskConfig::default()
        };
        assert_eq!(cfg.validate(), Err(FskConfigError::OutOfRange));
        let cfg = FskConfig {
            preemphasis_taps: 0x100_0000,
            ..FskConfig::default()
        };
        assert_eq!(cfg.validate(), Err(FskConfigError::OutOfRange));
    }

    #[test]
    fn register_image_layout() {
        let cfg = FskConfig {
            order: FskOrder::Fsk4,
            index: ModulationIndex::Midx2_0,
            index_scaling: IndexScaling::S10_8,
            bt: BtProduct::Bt2_0,
            symbol_rate: SymbolRate::Khz300,
            frequency_inversion: true,
            preamble_length: 0x2A5,
            receiver_override: ReceiverOverride::Db12,
            preamble_detect_timing: true,
            rx_preamble_timeout: false,
            mse: true,
            preamble_inversion: false,
            fec_enable: true,
            fec_scheme: FecScheme::Rsc,
            sfd_threshold: 0xA,
            preamble_threshold: 0x3,
            hard_sfd_decision: true,
            sfd32: false,
            raw_msb_first: true,
            sfd1_mode: SfdMode::UncodedRaw,
            sfd0_mode: SfdMode::CodedRaw,
            sfd0: 0x1234,
            sfd1: 0xABCD,
            sfd_select: SfdSelect::Sfd1,
            whitening: true,
            phr_reserved2: true,
            phr_reserved1: false,
            direct_modulation: true,
            preemphasis: true,
            preemphasis_taps: 0x0A0B0C,
            raw_rx_frame_length: 0x456,
        };
        let regs = cfg.registers().unwrap();
        assert_eq!(regs.c0, 0xFF);
        assert_eq!(regs.c1, 0xA4);
        assert_eq!(regs.c2, 0xAB);
        assert_eq!(regs.c3, 0xA3);
        assert_eq!(regs.c4, 0x57);
        assert_eq!(regs.preamble, 0xA5);
        assert_eq!(regs.sfd, [0x34, 0x12, 0xCD, 0xAB]);
        assert_eq!(regs.phr_tx, 0x0E);
        assert_eq!(regs.direct_modulation, 0x03);
        assert_eq!(regs.preemphasis, [0x0C, 0x0B, 0x0A]);
        assert_eq!(regs.raw_rx_frame_length, [0x04, 0x56]);
    }

    #[test]
    fn phy_control_keeps_fcs_and_ctx_apart() {
        let bb = BasebandConfig {
            phy: PhyType::Fsk,
            continuous_tx: true,
            fcs_type: FcsType::Fcs16,
            tx_auto_fcs: true,
            fcs_filter: false,
            fsk: FskConfig::default(),
        };
        assert_eq!(bb.phy_control(false).to_bytes().unwrap(), [0x91]);
        assert_eq!(bb.phy_control(true).to_bytes().unwrap(), [0x95]);
    }
}
