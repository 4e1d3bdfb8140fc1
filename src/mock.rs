//! Recording transport for unit tests
//!
//! Decodes the register protocol into a flat 16 KiB register image, so tests
//! can both preset register values and inspect what the driver wrote. A tiny
//! device model answers state commands: TRXOFF, TXPREP, TX and RX settle
//! immediately, and TX raises TXFE on the paired baseband core.

extern crate std;

use std::collections::{HashMap, VecDeque};
use std::vec;
use std::vec::Vec;

use crate::registers::{rf, Frontend, RF_PN, RF_VN};
use crate::{Device, DeviceConfig, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Reset(bool),
    Select(bool),
    Irq(bool),
    Delay(u32),
    Write(Vec<u8>),
    /// Transmitted bytes and total transfer length
    Transfer(Vec<u8>, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    Bus,
    Pin,
}

pub struct MockTransport {
    mem: Vec<u8>,
    scripted: HashMap<u16, VecDeque<u8>>,
    events: Vec<Event>,
    reads: Vec<u16>,
    writes: Vec<(u16, u8)>,
    header: Vec<u8>,
    cursor: Option<(u16, bool)>,
    now_us: u64,
    irq_enabled: bool,
    fail_write: bool,
    fail_select: bool,
    /// Whether state commands are answered by the device model
    pub auto_state: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        let mut mem = vec![0u8; 0x4000];
        mem[RF_PN as usize] = 0x34;
        mem[RF_VN as usize] = 0x03;
        for frontend in Frontend::ALL {
            mem[frontend.rf(rf::STATE) as usize] = 0x02;
        }
        Self {
            mem,
            scripted: HashMap::new(),
            events: Vec::new(),
            reads: Vec::new(),
            writes: Vec::new(),
            header: Vec::new(),
            cursor: None,
            now_us: 0,
            irq_enabled: false,
            fail_write: false,
            fail_select: false,
            auto_state: true,
        }
    }

    pub fn set(&mut self, addr: u16, value: u8) {
        self.mem[(addr & 0x3FFF) as usize] = value;
    }

    pub fn get(&self, addr: u16) -> u8 {
        self.mem[(addr & 0x3FFF) as usize]
    }

    /// Queues values returned by the next reads of `addr`, ahead of the
    /// register image
    pub fn script(&mut self, addr: u16, values: &[u8]) {
        self.scripted
            .entry(addr)
            .or_default()
            .extend(values.iter().copied());
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.clone()
    }

    /// Register addresses read, one per select window
    pub fn reads(&self) -> Vec<u16> {
        self.reads.clone()
    }

    /// Every byte written, with its register address
    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.writes.clone()
    }

    /// Values written to `addr`, in order
    pub fn writes_to(&self, addr: u16) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.events.clear();
        self.reads.clear();
        self.writes.clear();
    }

    pub fn fail_next_write(&mut self) {
        self.fail_write = true;
    }

    pub fn fail_next_select(&mut self) {
        self.fail_select = true;
    }

    pub fn irq_enabled(&self) -> bool {
        self.irq_enabled
    }

    pub fn now_us(&self) -> u64 {
        self.now_us
    }

    fn load(&mut self, addr: u16) -> u8 {
        if let Some(value) = self.scripted.get_mut(&addr).and_then(|q| q.pop_front()) {
            return value;
        }
        let value = self.get(addr);
        if addr <= 0x0003 {
            self.set(addr, 0);
        }
        value
    }

    fn store(&mut self, addr: u16, value: u8) {
        self.writes.push((addr, value));
        self.set(addr, value);
        if !self.auto_state {
            return;
        }
        for frontend in Frontend::ALL {
            if addr != frontend.rf(rf::CMD) {
                continue;
            }
            let state = frontend.rf(rf::STATE);
            match value {
                0x02 | 0x03 | 0x05 => self.set(state, value),
                0x04 => {
                    self.set(state, 0x03);
                    let irqs = frontend.bbc_irqs();
                    let pending = self.get(irqs) | 0x10;
                    self.set(irqs, pending);
                }
                0x07 => self.set(state, 0x02),
                _ => {}
            }
        }
    }

    /// Feeds one byte through the protocol decoder, returning the byte
    /// clocked back
    fn clock_byte(&mut self, out: u8) -> u8 {
        match self.cursor {
            None => {
                self.header.push(out);
                if self.header.len() == 2 {
                    let addr = (((self.header[0] & 0x3F) as u16) << 8) | self.header[1] as u16;
                    let write = self.header[0] & 0x80 != 0;
                    if !write {
                        self.reads.push(addr);
                    }
                    self.cursor = Some((addr, write));
                }
                0
            }
            Some((addr, true)) => {
                self.store(addr, out);
                self.cursor = Some((addr + 1, true));
                0
            }
            Some((addr, false)) => {
                let value = self.load(addr);
                self.cursor = Some((addr + 1, false));
                value
            }
        }
    }
}

impl Transport for MockTransport {
    type Error = MockError;

    fn set_reset(&mut self, high: bool) -> Result<(), Self::Error> {
        self.events.push(Event::Reset(high));
        Ok(())
    }

    fn set_select(&mut self, high: bool) -> Result<(), Self::Error> {
        if !high && self.fail_select {
            self.fail_select = false;
            return Err(MockError::Pin);
        }
        self.events.push(Event::Select(high));
        self.header.clear();
        self.cursor = None;
        Ok(())
    }

    fn set_irq_enabled(&mut self, enabled: bool) {
        self.events.push(Event::Irq(enabled));
        self.irq_enabled = enabled;
    }

    fn irq_asserted(&mut self) -> Result<bool, Self::Error> {
        Ok(self.irq_enabled && self.mem[..4].iter().any(|b| *b != 0))
    }

    fn delay_us(&mut self, us: u32) {
        self.events.push(Event::Delay(us));
        self.now_us += us as u64;
    }

    fn now_ms(&mut self) -> u64 {
        self.now_us / 1000
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_write {
            self.fail_write = false;
            return Err(MockError::Bus);
        }
        self.events.push(Event::Write(bytes.to_vec()));
        for byte in bytes {
            self.clock_byte(*byte);
        }
        Ok(())
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        self.events.push(Event::Transfer(tx.to_vec(), rx.len()));
        for (i, slot) in rx.iter_mut().enumerate() {
            *slot = self.clock_byte(tx.get(i).copied().unwrap_or(0));
        }
        Ok(())
    }
}

/// Initialized device with an empty log
pub fn ready_device(transport: MockTransport) -> Device<MockTransport> {
    let mut device = Device::new(transport);
    device.init(&DeviceConfig::default()).unwrap();
    device.transport.clear_log();
    device
}

