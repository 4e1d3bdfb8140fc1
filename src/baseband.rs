//! Baseband PHY configuration
//!
//! Programs a baseband core from a [`BasebandConfig`]. Only MR-FSK is
//! implemented; the other PHYs are rejected with [`Error::NotImplemented`].
//!
//! Besides the FSK registers themselves, the frontend paired with the core
//! gets its TX/RX digital frontends and its RX bandwidth from the
//! recommended settings of the datasheet (tables 6-60 to 6-63), selected by
//! symbol rate, modulation index class and frontend. See
//! [`FskFilterSettings::recommended`].
//!
//! # Important Notes
//! - The core is left disabled; enable it with [`Device::enable_baseband`]
//! - The RX bandwidth step requires the frontend to be configured
//! - Configuration is not atomic: a failure part way leaves the registers
//!   written so far in place

use crate::irq::IrqHandler;
use crate::registers::{
    bbc, BasebandConfig, Frontend, FskConfig, PhyType, RelativeCutoff, RxBandwidth, RxFrontend,
    SampleRate, SymbolRate, TxFrontend,
};
use crate::{Device, Error, Transport};

use RelativeCutoff::{Fs025, Fs037, Fs050, Fs075, Fs100};
use RxBandwidth::{
    Bw1000IfKhz1000 as B1000, Bw160IfKhz250 as B160, Bw200IfKhz250 as B200,
    Bw320IfKhz500 as B320, Bw400IfKhz500 as B400, Bw500IfKhz500 as B500,
    Bw630IfKhz1000 as B630, Bw800IfKhz1000 as B800,
};

// Indexed by symbol rate: 50, 100, 150, 200, 300, 400 kHz.
const TX_RCUT_NARROW: [RelativeCutoff; 6] = [Fs025; 6];
const TX_RCUT_WIDE: [RelativeCutoff; 6] = [Fs100; 6];

const RX_RCUT_NARROW_09: [RelativeCutoff; 6] = [Fs025, Fs025, Fs025, Fs037, Fs025, Fs025];
const RX_RCUT_NARROW_24: [RelativeCutoff; 6] = [Fs025, Fs025, Fs025, Fs037, Fs025, Fs037];
const RX_RCUT_WIDE_09: [RelativeCutoff; 6] = [Fs037, Fs037, Fs037, Fs050, Fs037, Fs037];
const RX_RCUT_WIDE_24: [RelativeCutoff; 6] = [Fs037, Fs037, Fs050, Fs075, Fs037, Fs050];

const RX_BW_NARROW_09: [RxBandwidth; 6] = [B160, B200, B320, B320, B500, B630];
const RX_BW_NARROW_24: [RxBandwidth; 6] = [B160, B200, B320, B400, B630, B800];
const RX_BW_WIDE_09: [RxBandwidth; 6] = [B160, B320, B400, B500, B630, B1000];
const RX_BW_WIDE_24: [RxBandwidth; 6] = [B200, B400, B630, B630, B800, B1000];

const IF_SHIFT_NARROW_09: [bool; 6] = [false, false, false, false, true, false];
const IF_SHIFT_NARROW_24: [bool; 6] = [false; 6];
const IF_SHIFT_WIDE_09: [bool; 6] = [false, false, false, true, false, true];
const IF_SHIFT_WIDE_24: [bool; 6] = [false, false, false, false, false, true];

/// Frontend filter settings recommended for an FSK configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FskFilterSettings {
    pub tx_cutoff: RelativeCutoff,
    pub tx_sample_rate: SampleRate,
    pub rx_cutoff: RelativeCutoff,
    pub rx_sample_rate: SampleRate,
    pub rx_bandwidth: RxBandwidth,
    pub if_shift: bool,
}

impl FskFilterSettings {
    /// Looks up the datasheet recommendation for `fsk` on `frontend`
    ///
    /// `version` is the IC revision; revision 1 parts need lower TX sample
    /// rates at 50 and 100 kHz.
    pub fn recommended(frontend: Frontend, fsk: &FskConfig, version: u8) -> Self {
        let i = fsk.symbol_rate as usize;
        let wide = fsk.index.is_wide();

        let (tx_sample_rate, rx_sample_rate) = match fsk.symbol_rate {
            SymbolRate::Khz50 if version == 1 => (SampleRate::Khz400, SampleRate::Khz400),
            SymbolRate::Khz50 => (SampleRate::Khz500, SampleRate::Khz400),
            SymbolRate::Khz100 if version == 1 => (SampleRate::Khz800, SampleRate::Khz800),
            SymbolRate::Khz100 => (SampleRate::Khz1000, SampleRate::Khz800),
            SymbolRate::Khz150 | SymbolRate::Khz200 => (SampleRate::Khz2000, SampleRate::Khz1000),
            SymbolRate::Khz300 | SymbolRate::Khz400 => (SampleRate::Khz4000, SampleRate::Khz2000),
        };

        let tx_cutoff = if wide { TX_RCUT_WIDE[i] } else { TX_RCUT_NARROW[i] };
        let (rx_cutoff, rx_bandwidth, if_shift) = match (frontend, wide) {
            (Frontend::Rf09, false) => (RX_RCUT_NARROW_09, RX_BW_NARROW_09, IF_SHIFT_NARROW_09),
            (Frontend::Rf24, false) => (RX_RCUT_NARROW_24, RX_BW_NARROW_24, IF_SHIFT_NARROW_24),
            (Frontend::Rf09, true) => (RX_RCUT_WIDE_09, RX_BW_WIDE_09, IF_SHIFT_WIDE_09),
            (Frontend::Rf24, true) => (RX_RCUT_WIDE_24, RX_BW_WIDE_24, IF_SHIFT_WIDE_24),
        };

        Self {
            tx_cutoff,
            tx_sample_rate,
            rx_cutoff: rx_cutoff[i],
            rx_sample_rate,
            rx_bandwidth: rx_bandwidth[i],
            if_shift: if_shift[i],
        }
    }
}

impl<T, H> Device<T, H>
where
    T: Transport,
    H: IrqHandler,
{
    /// Configures the baseband core paired with `frontend`
    ///
    /// The FSK parameters are validated before anything is written. The
    /// core is disabled (PC.BBEN = 0) as part of the configuration.
    ///
    /// # Errors
    /// * [`Error::NotImplemented`] - PHY other than MR-FSK
    /// * [`Error::InvalidConfiguration`] - Illegal 4-FSK combination
    /// * [`Error::InvalidParameter`] - Numeric FSK field out of range
    /// * [`Error::NotInitialized`] - The frontend has not been configured
    pub fn configure_baseband(
        &mut self,
        frontend: Frontend,
        config: &BasebandConfig,
    ) -> Result<(), Error<T::Error>> {
        let identity = self.supports_frontend(frontend).and_then(|_| self.ready())?;
        if config.phy != PhyType::Fsk {
            return Err(Error::NotImplemented);
        }
        let fsk = &config.fsk;
        let regs = fsk.registers()?;
        let filters = FskFilterSettings::recommended(frontend, fsk, identity.version);

        self.write_packed(frontend.bbc(bbc::PC), config.phy_control(false))?;

        self.write_u8(frontend.bbc(bbc::FSKC0), regs.c0)?;
        self.write_u8(frontend.bbc(bbc::FSKC1), regs.c1)?;
        self.write_u8(frontend.bbc(bbc::FSKC2), regs.c2)?;
        self.write_u8(frontend.bbc(bbc::FSKC3), regs.c3)?;
        self.write_u8(frontend.bbc(bbc::FSKC4), regs.c4)?;
        self.write_u8(frontend.bbc(bbc::FSKPLL), regs.preamble)?;
        for (offset, value) in [bbc::FSKSFD0L, bbc::FSKSFD0H, bbc::FSKSFD1L, bbc::FSKSFD1H]
            .into_iter()
            .zip(regs.sfd)
        {
            self.write_u8(frontend.bbc(offset), value)?;
        }
        self.write_u8(frontend.bbc(bbc::FSKPHRTX), regs.phr_tx)?;
        self.write_u8(frontend.bbc(bbc::FSKDM), regs.direct_modulation)?;
        for (offset, value) in [bbc::FSKPE0, bbc::FSKPE1, bbc::FSKPE2]
            .into_iter()
            .zip(regs.preemphasis)
        {
            self.write_u8(frontend.bbc(offset), value)?;
        }

        self.set_tx_frontend(
            frontend,
            TxFrontend {
                cutoff: filters.tx_cutoff,
                direct_modulation: fsk.direct_modulation,
                sample_rate: filters.tx_sample_rate,
            },
        )?;
        self.set_rx_frontend(
            frontend,
            RxFrontend {
                cutoff: filters.rx_cutoff,
                sample_rate: filters.rx_sample_rate,
            },
        )?;
        self.set_rx_bandwidth(frontend, false, filters.if_shift, filters.rx_bandwidth)?;

        let [high, low] = regs.raw_rx_frame_length;
        self.write_u8(frontend.bbc(bbc::FSKRRXFLH), high)?;
        self.write_u8(frontend.bbc(bbc::FSKRRXFLL), low)?;

        self.baseband[frontend.index()] = Some(*config);
        Ok(())
    }

    /// Enables or disables the baseband core paired with `frontend`
    ///
    /// Rewrites the PHY control register from the last applied
    /// configuration, changing only the enable bit.
    ///
    /// # Errors
    /// * [`Error::NotInitialized`] - The core has never been configured
    pub fn enable_baseband(
        &mut self,
        frontend: Frontend,
        enable: bool,
    ) -> Result<(), Error<T::Error>> {
        self.supports_frontend(frontend)?;
        let config = self.baseband[frontend.index()].ok_or(Error::NotInitialized)?;
        self.write_packed(frontend.bbc(bbc::PC), config.phy_control(enable))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec;

    use super::*;
    use crate::mock::{ready_device, MockTransport};
    use crate::radio::FrontendConfig;
    use crate::registers::{
        rf, BtProduct, FcsType, FskOrder, IndexScaling, ModulationIndex, RF_VN,
    };

    fn fsk(symbol_rate: SymbolRate, index: ModulationIndex) -> FskConfig {
        FskConfig {
            symbol_rate,
            index,
            ..FskConfig::default()
        }
    }

    fn fsk_baseband(fsk: FskConfig) -> BasebandConfig {
        BasebandConfig {
            phy: PhyType::Fsk,
            continuous_tx: false,
            fcs_type: FcsType::Fcs16,
            tx_auto_fcs: true,
            fcs_filter: true,
            fsk,
        }
    }

    fn configured(transport: MockTransport, frontend: Frontend) -> Device<MockTransport> {
        let mut device = ready_device(transport);
        let config = match frontend {
            Frontend::Rf09 => FrontendConfig::default(),
            Frontend::Rf24 => FrontendConfig {
                base_frequency_hz: 2_405_000_000,
                ..FrontendConfig::default()
            },
        };
        device.configure_frontend(frontend, &config).unwrap();
        device.transport.clear_log();
        device
    }

    #[test]
    fn sample_rates_follow_symbol_rate_and_revision() {
        let narrow = ModulationIndex::Midx0_5;
        let at = |rate, version| {
            let s = FskFilterSettings::recommended(Frontend::Rf09, &fsk(rate, narrow), version);
            (s.tx_sample_rate, s.rx_sample_rate)
        };
        assert_eq!(at(SymbolRate::Khz50, 3), (SampleRate::Khz500, SampleRate::Khz400));
        assert_eq!(at(SymbolRate::Khz50, 1), (SampleRate::Khz400, SampleRate::Khz400));
        assert_eq!(at(SymbolRate::Khz100, 3), (SampleRate::Khz1000, SampleRate::Khz800));
        assert_eq!(at(SymbolRate::Khz100, 1), (SampleRate::Khz800, SampleRate::Khz800));
        assert_eq!(at(SymbolRate::Khz150, 1), (SampleRate::Khz2000, SampleRate::Khz1000));
        assert_eq!(at(SymbolRate::Khz400, 3), (SampleRate::Khz4000, SampleRate::Khz2000));
    }

    #[test]
    fn filter_tables_select_by_index_class_and_frontend() {
        let s = FskFilterSettings::recommended(
            Frontend::Rf24,
            &fsk(SymbolRate::Khz200, ModulationIndex::Midx1_0),
            3,
        );
        assert_eq!(s.tx_cutoff, Fs100);
        assert_eq!(s.rx_cutoff, Fs075);
        assert_eq!(s.rx_bandwidth, B630);
        assert!(!s.if_shift);

        let s = FskFilterSettings::recommended(
            Frontend::Rf09,
            &fsk(SymbolRate::Khz200, ModulationIndex::Midx1_0),
            3,
        );
        assert_eq!(s.rx_cutoff, Fs050);
        assert_eq!(s.rx_bandwidth, B500);
        assert!(s.if_shift);

        let s = FskFilterSettings::recommended(
            Frontend::Rf09,
            &fsk(SymbolRate::Khz300, ModulationIndex::Midx0_75),
            3,
        );
        assert_eq!(s.tx_cutoff, Fs025);
        assert_eq!(s.rx_cutoff, Fs025);
        assert_eq!(s.rx_bandwidth, B500);
        assert!(s.if_shift);
    }

    #[test]
    fn configure_writes_in_register_order() {
        let mut device = configured(MockTransport::new(), Frontend::Rf09);
        let config = fsk_baseband(fsk(SymbolRate::Khz50, ModulationIndex::Midx1_0));
        device.configure_baseband(Frontend::Rf09, &config).unwrap();

        let addrs: std::vec::Vec<u16> = device.transport.writes().iter().map(|(a, _)| *a).collect();
        let bb = |offset| Frontend::Rf09.bbc(offset);
        let radio = |offset| Frontend::Rf09.rf(offset);
        assert_eq!(
            addrs,
            vec![
                bb(bbc::PC),
                bb(bbc::FSKC0),
                bb(bbc::FSKC1),
                bb(bbc::FSKC2),
                bb(bbc::FSKC3),
                bb(bbc::FSKC4),
                bb(bbc::FSKPLL),
                bb(bbc::FSKSFD0L),
                bb(bbc::FSKSFD0H),
                bb(bbc::FSKSFD1L),
                bb(bbc::FSKSFD1H),
                bb(bbc::FSKPHRTX),
                bb(bbc::FSKDM),
                bb(bbc::FSKPE0),
                bb(bbc::FSKPE1),
                bb(bbc::FSKPE2),
                radio(rf::TXDFE),
                radio(rf::RXDFE),
                radio(rf::RXBWC),
                bb(bbc::FSKRRXFLH),
                bb(bbc::FSKRRXFLL),
            ]
        );

        let t = &device.transport;
        // FCS filter, auto FCS, 16-bit FCS, core disabled, FSK
        assert_eq!(t.get(bb(bbc::PC)), 0x51);
        assert_eq!(t.get(radio(rf::TXDFE)), 0x88);
        assert_eq!(t.get(radio(rf::RXDFE)), 0x2A);
        assert_eq!(t.get(radio(rf::RXBWC)), 0x00);
        assert_eq!(t.get(bb(bbc::FSKRRXFLH)), 0x07);
        assert_eq!(t.get(bb(bbc::FSKRRXFLL)), 0xFF);
        assert_eq!(device.baseband_config(Frontend::Rf09), Some(&config));
    }

    #[test]
    fn revision_one_lowers_tx_sample_rate() {
        let mut transport = MockTransport::new();
        transport.set(RF_VN, 0x01);
        let mut device = configured(transport, Frontend::Rf24);
        let config = fsk_baseband(fsk(SymbolRate::Khz100, ModulationIndex::Midx0_5));
        device.configure_baseband(Frontend::Rf24, &config).unwrap();
        assert_eq!(device.transport.get(Frontend::Rf24.rf(rf::TXDFE)) & 0x0F, 0x05);
    }

    #[test]
    fn illegal_four_fsk_writes_nothing() {
        let mut device = configured(MockTransport::new(), Frontend::Rf09);
        let config = fsk_baseband(FskConfig {
            order: FskOrder::Fsk4,
            bt: BtProduct::Bt1_0,
            ..FskConfig::default()
        });
        assert_eq!(
            device.configure_baseband(Frontend::Rf09, &config),
            Err(Error::InvalidConfiguration)
        );
        let config = fsk_baseband(FskConfig {
            order: FskOrder::Fsk4,
            bt: BtProduct::Bt2_0,
            index: ModulationIndex::Midx0_5,
            index_scaling: IndexScaling::S7_8,
            ..FskConfig::default()
        });
        assert_eq!(
            device.configure_baseband(Frontend::Rf09, &config),
            Err(Error::InvalidConfiguration)
        );
        assert!(device.transport.writes().is_empty());
        assert_eq!(device.baseband_config(Frontend::Rf09), None);
    }

    #[test]
    fn legal_four_fsk_is_applied() {
        let mut device = configured(MockTransport::new(), Frontend::Rf09);
        let config = fsk_baseband(FskConfig {
            order: FskOrder::Fsk4,
            bt: BtProduct::Bt2_0,
            index: ModulationIndex::Midx1_0,
            ..FskConfig::default()
        });
        device.configure_baseband(Frontend::Rf09, &config).unwrap();
        assert_eq!(device.transport.get(Frontend::Rf09.bbc(bbc::FSKC0)), 0xD7);
    }

    #[test]
    fn other_phys_are_not_implemented() {
        let mut device = configured(MockTransport::new(), Frontend::Rf09);
        for phy in [PhyType::Off, PhyType::Ofdm, PhyType::Oqpsk] {
            let config = BasebandConfig {
                phy,
                ..BasebandConfig::default()
            };
            assert_eq!(
                device.configure_baseband(Frontend::Rf09, &config),
                Err(Error::NotImplemented)
            );
        }
        assert!(device.transport.writes().is_empty());
    }

    #[test]
    fn unconfigured_frontend_fails_at_rx_bandwidth() {
        let mut device = ready_device(MockTransport::new());
        let config = fsk_baseband(FskConfig::default());
        assert_eq!(
            device.configure_baseband(Frontend::Rf09, &config),
            Err(Error::NotInitialized)
        );
        // Everything up to the RX digital frontend was written
        assert_eq!(
            device.transport.writes().last().map(|(a, _)| *a),
            Some(Frontend::Rf09.rf(rf::RXDFE))
        );
    }

    #[test]
    fn enable_only_toggles_bben() {
        let mut device = configured(MockTransport::new(), Frontend::Rf09);
        assert_eq!(
            device.enable_baseband(Frontend::Rf09, true),
            Err(Error::NotInitialized)
        );
        let config = BasebandConfig {
            continuous_tx: true,
            ..fsk_baseband(FskConfig::default())
        };
        device.configure_baseband(Frontend::Rf09, &config).unwrap();

        let pc = Frontend::Rf09.bbc(bbc::PC);
        assert_eq!(device.transport.get(pc), 0xD1);
        device.enable_baseband(Frontend::Rf09, true).unwrap();
        assert_eq!(device.transport.get(pc), 0xD5);
        device.enable_baseband(Frontend::Rf09, false).unwrap();
        assert_eq!(device.transport.get(pc), 0xD1);
    }
}
