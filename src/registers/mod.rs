//! Register definitions for the AT86RF215
//! Generated from the AT86RF215 datasheet register summary (chapter 11)
//!
//! The register space is split into a common block at `0x0000`, one radio
//! block per frontend (`0x0100` for RF09, `0x0200` for RF24) and one baseband
//! block per core (`0x0300` for BBC0, `0x0400` for BBC1). The per-frontend
//! blocks share their layout, so the offsets in [`rf`] and [`bbc`] are
//! resolved against a [`Frontend`] with [`Frontend::rf`] and
//! [`Frontend::bbc`].

mod baseband;
mod common;
mod radio;

pub use baseband::*;
pub use common::*;
pub use radio::*;

/// Largest PSDU the frame buffer can hold, in octets
pub const MAX_PSDU_LEN: usize = 2047;

/// Radio frontend of the transceiver
///
/// Each frontend is paired one-to-one with a baseband core: RF09 with BBC0,
/// RF24 with BBC1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Frontend {
    /// Sub-1GHz frontend
    Rf09 = 0,
    /// 2.4GHz frontend
    Rf24 = 1,
}

impl Frontend {
    /// Both frontends, in register order
    pub const ALL: [Frontend; 2] = [Frontend::Rf09, Frontend::Rf24];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Absolute address of a radio register given its offset in [`rf`]
    pub const fn rf(self, offset: u16) -> u16 {
        match self {
            Frontend::Rf09 => RF09_BASE + offset,
            Frontend::Rf24 => RF24_BASE + offset,
        }
    }

    /// Absolute address of a baseband register given its offset in [`bbc`]
    pub const fn bbc(self, offset: u16) -> u16 {
        match self {
            Frontend::Rf09 => BBC0_BASE + offset,
            Frontend::Rf24 => BBC1_BASE + offset,
        }
    }

    /// Radio IRQ status register of this frontend
    pub const fn rf_irqs(self) -> u16 {
        match self {
            Frontend::Rf09 => RF09_IRQS,
            Frontend::Rf24 => RF24_IRQS,
        }
    }

    /// Baseband IRQ status register of the core paired with this frontend
    pub const fn bbc_irqs(self) -> u16 {
        match self {
            Frontend::Rf09 => BBC0_IRQS,
            Frontend::Rf24 => BBC1_IRQS,
        }
    }

    /// Start of the RX frame buffer of the paired baseband core
    pub const fn rx_frame_buffer(self) -> u16 {
        match self {
            Frontend::Rf09 => BBC0_FBRXS,
            Frontend::Rf24 => BBC1_FBRXS,
        }
    }

    /// Start of the TX frame buffer of the paired baseband core
    pub const fn tx_frame_buffer(self) -> u16 {
        match self {
            Frontend::Rf09 => BBC0_FBTXS,
            Frontend::Rf24 => BBC1_FBTXS,
        }
    }
}

/// Interrupt status registers (read to clear)
pub const RF09_IRQS: u16 = 0x0000;
pub const RF24_IRQS: u16 = 0x0001;
pub const BBC0_IRQS: u16 = 0x0002;
pub const BBC1_IRQS: u16 = 0x0003;

/// Common block
pub const RF_RST: u16 = 0x0005;
pub const RF_CFG: u16 = 0x0006;
pub const RF_CLKO: u16 = 0x0007;
pub const RF_BMDVC: u16 = 0x0008;
pub const RF_XOC: u16 = 0x0009;
pub const RF_IQIFC0: u16 = 0x000A;
pub const RF_IQIFC1: u16 = 0x000B;
pub const RF_IQIFC2: u16 = 0x000C;
pub const RF_PN: u16 = 0x000D;
pub const RF_VN: u16 = 0x000E;

pub const RF09_BASE: u16 = 0x0100;
pub const RF24_BASE: u16 = 0x0200;
pub const BBC0_BASE: u16 = 0x0300;
pub const BBC1_BASE: u16 = 0x0400;

pub const BBC0_FBRXS: u16 = 0x2000;
pub const BBC0_FBTXS: u16 = 0x2800;
pub const BBC1_FBRXS: u16 = 0x3000;
pub const BBC1_FBTXS: u16 = 0x3800;

/// Radio register offsets, relative to [`RF09_BASE`] / [`RF24_BASE`]
pub mod rf {
    pub const IRQM: u16 = 0x00;
    pub const AUXS: u16 = 0x01;
    pub const STATE: u16 = 0x02;
    pub const CMD: u16 = 0x03;
    pub const CS: u16 = 0x04;
    pub const CCF0L: u16 = 0x05;
    pub const CCF0H: u16 = 0x06;
    pub const CNL: u16 = 0x07;
    pub const CNM: u16 = 0x08;
    pub const RXBWC: u16 = 0x09;
    pub const RXDFE: u16 = 0x0A;
    pub const AGCC: u16 = 0x0B;
    pub const AGCS: u16 = 0x0C;
    pub const RSSI: u16 = 0x0D;
    pub const EDC: u16 = 0x0E;
    pub const EDD: u16 = 0x0F;
    pub const EDV: u16 = 0x10;
    pub const RNDV: u16 = 0x11;
    pub const TXCUTC: u16 = 0x12;
    pub const TXDFE: u16 = 0x13;
    pub const PAC: u16 = 0x14;
    pub const PADFE: u16 = 0x16;
    pub const PLL: u16 = 0x21;
    pub const PLLCF: u16 = 0x22;
}

/// Baseband register offsets, relative to [`BBC0_BASE`] / [`BBC1_BASE`]
pub mod bbc {
    pub const IRQM: u16 = 0x00;
    pub const PC: u16 = 0x01;
    pub const PS: u16 = 0x02;
    pub const RXFLL: u16 = 0x04;
    pub const RXFLH: u16 = 0x05;
    pub const TXFLL: u16 = 0x06;
    pub const TXFLH: u16 = 0x07;
    pub const FSKC0: u16 = 0x60;
    pub const FSKC1: u16 = 0x61;
    pub const FSKC2: u16 = 0x62;
    pub const FSKC3: u16 = 0x63;
    pub const FSKC4: u16 = 0x64;
    pub const FSKPLL: u16 = 0x65;
    pub const FSKSFD0L: u16 = 0x66;
    pub const FSKSFD0H: u16 = 0x67;
    pub const FSKSFD1L: u16 = 0x68;
    pub const FSKSFD1H: u16 = 0x69;
    pub const FSKPHRTX: u16 = 0x6A;
    pub const FSKPHRRX: u16 = 0x6B;
    pub const FSKRPC: u16 = 0x6C;
    pub const FSKRPCONT: u16 = 0x6D;
    pub const FSKRPCOFFT: u16 = 0x6E;
    pub const FSKRRXFLL: u16 = 0x70;
    pub const FSKRRXFLH: u16 = 0x71;
    pub const FSKDM: u16 = 0x72;
    pub const FSKPE0: u16 = 0x73;
    pub const FSKPE1: u16 = 0x74;
    pub const FSKPE2: u16 = 0x75;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_blocks_are_one_page_apart() {
        assert_eq!(Frontend::Rf09.rf(rf::STATE), 0x0102);
        assert_eq!(Frontend::Rf24.rf(rf::STATE), 0x0202);
        assert_eq!(Frontend::Rf09.bbc(bbc::FSKC0), 0x0360);
        assert_eq!(
            Frontend::Rf24.bbc(bbc::FSKC0) - Frontend::Rf09.bbc(bbc::FSKC0),
            0x100
        );
    }
}
