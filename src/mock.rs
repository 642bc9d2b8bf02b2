//! Recording fakes for the caller-supplied radio and timer, for unit tests.

use crate::device::radio::types::TxFrame;
use crate::device::radio::Radio;
use crate::device::timer::Timer;
use crate::device::Device;

/// Error returned when a mock is told to reject the next request.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rejected;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    Enable,
    Disable,
    Sleep,
    Receive(u8),
    ReceiveAt { channel: u8, start: u32, duration: u32 },
    Transmit { channel: u8 },
    EnergyScan { channel: u8, duration: u16 },
}

#[derive(Debug)]
pub struct MockRadio {
    pub calls: Vec<RadioCall>,
    pub now: u64,
    pub receive_timing: bool,
    pub scan_capable: bool,
    pub reject_next: bool,
}

impl MockRadio {
    fn accept(&mut self, call: RadioCall) -> Result<(), Rejected> {
        if core::mem::take(&mut self.reject_next) {
            return Err(Rejected);
        }
        self.calls.push(call);
        Ok(())
    }
}

impl Radio for MockRadio {
    type Error = Rejected;

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.accept(RadioCall::Enable)
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.accept(RadioCall::Disable)
    }

    fn sleep(&mut self) -> Result<(), Self::Error> {
        self.accept(RadioCall::Sleep)
    }

    fn receive(&mut self, channel: u8) -> Result<(), Self::Error> {
        self.accept(RadioCall::Receive(channel))
    }

    fn receive_at(&mut self, channel: u8, start: u32, duration: u32) -> Result<(), Self::Error> {
        self.accept(RadioCall::ReceiveAt { channel, start, duration })
    }

    fn transmit(&mut self, frame: &TxFrame) -> Result<(), Self::Error> {
        self.accept(RadioCall::Transmit { channel: frame.channel })
    }

    fn energy_scan(&mut self, channel: u8, duration: u16) -> Result<(), Self::Error> {
        self.accept(RadioCall::EnergyScan { channel, duration })
    }

    fn supports_receive_timing(&self) -> bool {
        self.receive_timing
    }

    fn supports_energy_scan(&self) -> bool {
        self.scan_capable
    }

    fn now(&mut self) -> u64 {
        self.now
    }
}

#[derive(Debug)]
pub struct MockTimer {
    pub now: u64,
    pub armed: Option<u64>,
}

impl Timer for MockTimer {
    type Error = Rejected;

    fn now(&mut self) -> u64 {
        self.now
    }

    fn fire_at(&mut self, micros: u64) -> Result<(), Self::Error> {
        self.armed = Some(micros);
        Ok(())
    }

    fn stop(&mut self) {
        self.armed = None;
    }
}

#[derive(Debug)]
pub struct MockDevice {
    pub radio: MockRadio,
    pub timer: MockTimer,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            radio: MockRadio {
                calls: Vec::new(),
                now: 0,
                receive_timing: false,
                scan_capable: true,
                reject_next: false,
            },
            timer: MockTimer { now: 0, armed: None },
        }
    }
}

impl Device for MockDevice {
    type Timer = MockTimer;
    type Radio = MockRadio;

    fn timer(&mut self) -> &mut Self::Timer {
        &mut self.timer
    }

    fn radio(&mut self) -> &mut Self::Radio {
        &mut self.radio
    }
}
