//! Duty-cycled listening for the wake-up end device role.
//!
//! The listener drives the [`RadioId::Wed`] interface through a periodic
//! listen/sleep cycle. When the transceiver supports hardware-timed receive
//! windows the local timer's only job on each fire is to schedule the *next*
//! window one cycle ahead; the actual radio switching is delegated to the
//! hardware. Otherwise the listener alternates plain receive and sleep
//! requests itself, compensating for turnaround latency with the fixed
//! [`guard`](crate::mac::guard) offsets.
//!
//! Two clock domains are tracked: the local timer's and the radio hardware's
//! own, which may drift against each other. Both sample times advance by the
//! same fixed-point increment independently in their own domain, so no drift
//! accumulates in either.

use crate::device::radio::Radio;
use crate::device::timer::Timer;
use crate::device::Device;
use crate::mac::guard;
use crate::radio::{RadioId, RadioScheduler, State};

/// Wake-up listening parameters, negotiated by the layers above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WakeupListenConfig {
    /// Interval between consecutive listen windows, in microseconds.
    pub interval: u32,
    /// Duration of each listen window, in microseconds.
    pub duration: u32,
    /// Channel to listen on.
    pub channel: u8,
}

impl Default for WakeupListenConfig {
    fn default() -> Self {
        Self { interval: 1_000_000, duration: 8_000, channel: 11 }
    }
}

/// Schedules the wake-up end device's periodic receive windows.
pub struct WedListener {
    running: bool,
    // `true` when the next manual-mode fire enters the listen phase.
    is_rx: bool,
    interval: u32,
    duration: u32,
    channel: u8,
    // Next phase-boundary instant in the local timer domain.
    sample_time: u64,
    // The same instant in the radio's clock domain; used only with
    // hardware-timed receive.
    sample_time_radio: u64,
}

impl Default for WedListener {
    fn default() -> Self {
        Self::new()
    }
}

impl WedListener {
    /// Create a stopped listener.
    pub fn new() -> Self {
        Self {
            running: false,
            is_rx: false,
            interval: 0,
            duration: 0,
            channel: 0,
            sample_time: 0,
            sample_time_radio: 0,
        }
    }

    /// Whether the listener is currently duty-cycling.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start or stop wake-up listening.
    ///
    /// When enabling, both clock-domain sample times are seeded one interval
    /// in the past plus a small lead, so the first window fires promptly
    /// rather than a full interval later, and the first cycle runs
    /// synchronously instead of waiting for the timer. When disabling, the
    /// timer is stopped (idempotently) and the interface is parked with one
    /// sleep request.
    pub fn update_wakeup_listening<D: Device>(
        &mut self,
        device: &mut D,
        scheduler: &mut RadioScheduler,
        enable: bool,
        config: WakeupListenConfig,
    ) {
        info!("wed: update listening, enable={}", enable);

        self.interval = config.interval;
        // A window longer than the interval collapses to continuous listening.
        self.duration = config.duration.min(config.interval);
        self.channel = config.channel;
        self.running = enable;
        device.timer().stop();

        if enable {
            // One interval in the past plus the lead; wraps with the clocks.
            let offset = (guard::RECEIVE_TIME_AHEAD as i64 - self.interval as i64) as u64;
            self.is_rx = true;
            self.sample_time = device.timer().now().wrapping_add(offset);
            self.sample_time_radio = device.radio().now().wrapping_add(offset);

            self.handle_timer(device, scheduler);
        } else if scheduler.sleep(device, RadioId::Wed).is_err() {
            warn!("wed: parking the interface failed");
        }
    }

    /// Handle the listener's timer fire. The caller routes the fire of the
    /// timer armed by the previous cycle (or by
    /// [`Self::update_wakeup_listening`]) back here.
    pub fn handle_timer<D: Device>(&mut self, device: &mut D, scheduler: &mut RadioScheduler) {
        if !self.running {
            return;
        }

        if device.radio().supports_receive_timing() {
            self.handle_receive_at(device, scheduler);
        } else {
            self.handle_receive_and_sleep(device, scheduler);
        }
    }

    // Hardware-timed mode. Each fire advances both sample times by exactly
    // one interval, arms the next fire past the end of the window it is
    // about to schedule, and hands the window itself to the hardware:
    //
    //   ----+--------+---------------+--------+---------------+----
    //      now    sample[n]                sample[n+1]
    //             fire_at(sample[n] + duration + after)
    //             receive_at(radio_sample[n], duration)
    fn handle_receive_at<D: Device>(&mut self, device: &mut D, scheduler: &mut RadioScheduler) {
        self.sample_time = self.sample_time.wrapping_add(self.interval as u64);
        self.sample_time_radio = self.sample_time_radio.wrapping_add(self.interval as u64);

        let fire = self
            .sample_time
            .wrapping_add(self.duration as u64)
            .wrapping_add(guard::WED_RECEIVE_TIME_AFTER as u64);
        if let Err(error) = device.timer().fire_at(fire) {
            warn!("wed: timer rearm failed: {:?}", error);
        }

        if scheduler.radio(RadioId::Wed).state() != State::Disabled {
            trace!("wed: window ch={} start={} dur={}", self.channel, self.sample_time_radio, self.duration);
            if scheduler
                .receive_at(device, self.channel, self.sample_time_radio as u32, self.duration)
                .is_err()
            {
                // A higher-priority owner holds the radio; the next cycle
                // retries with a fresh window.
                warn!("wed: receive-at rejected");
            }
        }
    }

    // Manual alternation. Each fire toggles the phase: entering the listen
    // phase advances the boundary by the listen duration and turns the
    // receiver on; entering the sleep phase advances it by the remainder of
    // the interval and turns the receiver off, leading the boundary slightly
    // to absorb the sleep request's latency.
    fn handle_receive_and_sleep<D: Device>(
        &mut self,
        device: &mut D,
        scheduler: &mut RadioScheduler,
    ) {
        let step = if self.is_rx { self.duration } else { self.interval - self.duration };
        let lead: i64 =
            if self.is_rx { guard::RECEIVE_ON_AFTER as i64 } else { -(guard::RECEIVE_ON_AHEAD as i64) };

        self.sample_time = self.sample_time.wrapping_add(step as u64);
        if let Err(error) = device.timer().fire_at(self.sample_time.wrapping_add(lead as u64)) {
            warn!("wed: timer rearm failed: {:?}", error);
        }

        if self.is_rx {
            trace!("wed: rx ch={}", self.channel);
            if scheduler.receive(device, RadioId::Wed, self.channel).is_err() {
                warn!("wed: receive rejected");
            }
        } else {
            trace!("wed: sleep");
            if scheduler.sleep(device, RadioId::Wed).is_err() {
                warn!("wed: sleep rejected");
            }
        }

        self.is_rx = !self.is_rx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::radio::types::{RadioEvent, TxFrame, TxResult};
    use crate::mac::guard;
    use crate::mock::{MockDevice, RadioCall};

    const LOCAL_NOW: u64 = 1_000_000;
    const RADIO_NOW: u64 = 5_000_000;

    fn setup(timed: bool) -> (WedListener, RadioScheduler, MockDevice) {
        let mut scheduler = RadioScheduler::new();
        let mut device = MockDevice::new();
        device.timer.now = LOCAL_NOW;
        device.radio.now = RADIO_NOW;
        device.radio.receive_timing = timed;
        scheduler.enable(&mut device).unwrap();
        device.radio.calls.clear();
        (WedListener::new(), scheduler, device)
    }

    fn config(interval: u32, duration: u32, channel: u8) -> WakeupListenConfig {
        WakeupListenConfig { interval, duration, channel }
    }

    #[test]
    fn enabling_schedules_first_window_synchronously() {
        let (mut wed, mut scheduler, mut device) = setup(true);
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(40_000, 10_000, 20));

        // The seed is one interval in the past plus the lead, so the first
        // window starts a lead ahead of "now" in each clock domain.
        let start = RADIO_NOW + guard::RECEIVE_TIME_AHEAD as u64;
        assert_eq!(
            device.radio.calls,
            vec![RadioCall::ReceiveAt { channel: 20, start: start as u32, duration: 10_000 }]
        );
        let sample = LOCAL_NOW + guard::RECEIVE_TIME_AHEAD as u64;
        assert_eq!(device.timer.armed, Some(sample + 10_000 + guard::WED_RECEIVE_TIME_AFTER as u64));
    }

    #[test]
    fn timed_windows_advance_by_exactly_one_interval() {
        let (mut wed, mut scheduler, mut device) = setup(true);
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(40_000, 10_000, 20));

        let first_sample = wed.sample_time;
        let first_radio = wed.sample_time_radio;
        for n in 1..=16u64 {
            device.radio.calls.clear();
            wed.handle_timer(&mut device, &mut scheduler);
            assert_eq!(wed.sample_time, first_sample + 40_000 * n);
            assert_eq!(wed.sample_time_radio, first_radio + 40_000 * n);
            assert_eq!(
                device.radio.calls,
                vec![RadioCall::ReceiveAt {
                    channel: 20,
                    start: (first_radio + 40_000 * n) as u32,
                    duration: 10_000,
                }]
            );
        }
    }

    #[test]
    fn timed_window_skipped_while_interface_disabled() {
        let (mut wed, mut scheduler, mut device) = setup(true);
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(40_000, 10_000, 20));
        scheduler.disable(&mut device).unwrap();
        device.radio.calls.clear();

        wed.handle_timer(&mut device, &mut scheduler);
        // The cadence keeps advancing, but no window reaches the adapter.
        assert!(device.radio.calls.is_empty());
        assert!(device.timer.armed.is_some());
    }

    #[test]
    fn manual_mode_alternates_receive_and_sleep() {
        let (mut wed, mut scheduler, mut device) = setup(false);
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(100_000, 20_000, 25));

        // Enabling runs the listen phase synchronously.
        assert_eq!(device.radio.calls, vec![RadioCall::Receive(25)]);

        device.radio.calls.clear();
        wed.handle_timer(&mut device, &mut scheduler);
        assert_eq!(device.radio.calls, vec![RadioCall::Sleep]);

        device.radio.calls.clear();
        wed.handle_timer(&mut device, &mut scheduler);
        assert_eq!(device.radio.calls, vec![RadioCall::Receive(25)]);
    }

    #[test]
    fn manual_mode_keeps_interval_fidelity() {
        let (mut wed, mut scheduler, mut device) = setup(false);
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(100_000, 20_000, 25));

        // The enable call already ran the first listen phase.
        let mut listen_total = 0u64;
        let mut listen_starts = vec![wed.sample_time - 20_000];
        for _ in 0..20 {
            let before = wed.sample_time;
            let entered_rx = wed.is_rx;
            wed.handle_timer(&mut device, &mut scheduler);
            if entered_rx {
                listen_starts.push(before);
                listen_total += wed.sample_time - before;
            }
        }

        // Each listen phase spans exactly the configured duration, and
        // consecutive listen starts are exactly one interval apart: no
        // accumulated drift.
        assert_eq!(listen_total, 20_000 * 10);
        for pair in listen_starts.windows(2) {
            assert_eq!(pair[1] - pair[0], 100_000);
        }
    }

    #[test]
    fn manual_mode_arms_timer_with_guard_offsets() {
        let (mut wed, mut scheduler, mut device) = setup(false);
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(100_000, 20_000, 25));

        // Listen phase: fire trails the boundary.
        assert_eq!(device.timer.armed, Some(wed.sample_time + guard::RECEIVE_ON_AFTER as u64));

        // Sleep phase: fire leads the boundary.
        wed.handle_timer(&mut device, &mut scheduler);
        assert_eq!(device.timer.armed, Some(wed.sample_time - guard::RECEIVE_ON_AHEAD as u64));
    }

    #[test]
    fn disabling_stops_the_timer_and_parks_the_interface() {
        let (mut wed, mut scheduler, mut device) = setup(false);
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(100_000, 20_000, 25));
        device.radio.calls.clear();

        wed.update_wakeup_listening(&mut device, &mut scheduler, false, config(100_000, 20_000, 25));
        assert!(!wed.is_running());
        assert!(device.timer.armed.is_none());
        assert_eq!(device.radio.calls, vec![RadioCall::Sleep]);

        // A stray late fire is ignored.
        device.radio.calls.clear();
        wed.handle_timer(&mut device, &mut scheduler);
        assert!(device.radio.calls.is_empty());
    }

    #[test]
    fn rejected_timed_window_retries_next_cycle() {
        let (mut wed, mut scheduler, mut device) = setup(true);
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(40_000, 10_000, 20));
        let first_radio = wed.sample_time_radio;

        // A higher-priority owner holds the radio; the timed window is
        // refused, but the cadence keeps advancing and the timer is rearmed.
        device.radio.calls.clear();
        device.radio.reject_next = true;
        wed.handle_timer(&mut device, &mut scheduler);
        assert!(device.radio.calls.is_empty());
        assert_eq!(wed.sample_time_radio, first_radio + 40_000);
        assert!(device.timer.armed.is_some());

        // The next cycle re-issues a fresh window on schedule.
        device.radio.calls.clear();
        wed.handle_timer(&mut device, &mut scheduler);
        assert_eq!(
            device.radio.calls,
            vec![RadioCall::ReceiveAt {
                channel: 20,
                start: (first_radio + 80_000) as u32,
                duration: 10_000,
            }]
        );
    }

    #[test]
    fn window_longer_than_interval_collapses_to_continuous_listening() {
        let (mut wed, mut scheduler, mut device) = setup(false);
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(20_000, 50_000, 25));

        // The clamped window fills the whole interval; the sleep phase is
        // empty and no fire may panic.
        assert_eq!(device.radio.calls, vec![RadioCall::Receive(25)]);
        let before = wed.sample_time;
        wed.handle_timer(&mut device, &mut scheduler);
        assert_eq!(wed.sample_time, before);

        device.radio.calls.clear();
        wed.handle_timer(&mut device, &mut scheduler);
        assert_eq!(device.radio.calls, vec![RadioCall::Receive(25)]);
        assert_eq!(wed.sample_time, before + 20_000);
    }

    #[test]
    fn transmit_preempts_window_and_mac_intent_is_restored() {
        let (mut wed, mut scheduler, mut device) = setup(true);
        // The MAC's resting intent outranks the wake-up listener.
        scheduler.receive(&mut device, RadioId::Mac, 11).unwrap();
        wed.update_wakeup_listening(&mut device, &mut scheduler, true, config(40_000, 10_000, 20));
        device.radio.calls.clear();

        let mut frame = TxFrame { channel: 11, ..Default::default() };
        frame.payload.extend_from_slice(&[0x41, 0xd8, 0x02]).unwrap();
        scheduler.transmit(&mut device, &frame).unwrap();
        assert_eq!(device.radio.calls, vec![RadioCall::Transmit { channel: 11 }]);

        device.radio.calls.clear();
        let event = RadioEvent::TransmitDone { frame: &frame, ack: None, result: TxResult::Done };
        scheduler.handle_event(&mut device, &event);

        // The completion rests the MAC interface at Enabled; the layer above
        // re-requests its receive, which outranks the wake-up listener.
        assert_eq!(scheduler.radio(RadioId::Mac).state(), State::Enabled);
        scheduler.receive(&mut device, RadioId::Mac, 11).unwrap();
        assert_eq!(device.radio.calls, vec![RadioCall::Receive(11)]);
    }
}
