//! Priority arbitration of the physical radio among its logical consumers.
//!
//! One half-duplex transceiver is shared by up to three consumers: the
//! primary MAC, the CSL receiver and the wake-up end device listener. Each
//! consumer owns a [`RadioInterface`] slot holding its desired state and a
//! numeric priority; [`RadioScheduler`] resolves the slots after every
//! request and drives the hardware from the highest-priority sleep/receive
//! intent. Transmit and energy scan bypass resolution entirely and always
//! win; when they complete the previous intent is re-applied.

use core::fmt::Write;

use crate::device::radio::types::{RadioEvent, TxFrame};
use crate::device::radio::Radio;
use crate::device::Device;
use crate::mac;

/// Max chars of one interface's [`RadioInterface::info`] rendering.
pub const INFO_STRING_SIZE: usize = 60;

/// Priority constants ordering the consumers' competing radio requests.
///
/// A single total order covers both concerns folded into one number: what the
/// radio is asked to do (transmit/scan above any receive, any receive above
/// sleep) and who is asking (losing a CSL or wake-up sample window is cheaper
/// than losing ordinary MAC traffic, so `RX_MAC > RX_CSL > RX_WED`). `MAX` is
/// reserved for disabled interfaces: parking them at the ceiling keeps any
/// stray later request from winning arbitration, while the resolver's
/// sleep-or-receive state check keeps them from ever driving the hardware.
pub mod priority {
    /// Floor; also the resting priority of an enabled, idle interface.
    pub const MIN: u8 = 0;
    /// Any consumer's sleep request.
    pub const SLEEP: u8 = 1;
    /// Lower bound of the receive band.
    pub const RX_MIN: u8 = 2;
    /// Wake-up end device sample window.
    pub const RX_WED: u8 = 7;
    /// CSL receiver sample window.
    pub const RX_CSL: u8 = 9;
    /// Primary MAC receive.
    pub const RX_MAC: u8 = 11;
    /// Upper bound of the receive band.
    pub const RX_MAX: u8 = 13;
    /// In-flight transmission.
    pub const TRANSMIT: u8 = 14;
    /// In-flight energy scan.
    pub const ENERGY_SCAN: u8 = 14;
    /// Ceiling; the parked priority of a disabled interface.
    pub const MAX: u8 = 15;
}

/// Identifies one logical radio consumer and its interface slot.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioId {
    /// The primary MAC: ordinary mesh traffic, transmit, energy scan.
    Mac,
    /// The CSL receiver sampling for frames buffered by the parent.
    #[cfg(feature = "csl")]
    Csl,
    /// The wake-up end device listening for a coordinator's wake-up frames.
    #[cfg(feature = "wed")]
    Wed,
}

/// Number of interface slots, fixed by the enabled roles.
pub const NUM_RADIOS: usize =
    1 + (cfg!(feature = "csl") as usize) + (cfg!(feature = "wed") as usize);

#[cfg(all(feature = "csl", feature = "wed"))]
const ALL_IDS: [RadioId; NUM_RADIOS] = [RadioId::Mac, RadioId::Csl, RadioId::Wed];
#[cfg(all(feature = "csl", not(feature = "wed")))]
const ALL_IDS: [RadioId; NUM_RADIOS] = [RadioId::Mac, RadioId::Csl];
#[cfg(all(not(feature = "csl"), feature = "wed"))]
const ALL_IDS: [RadioId; NUM_RADIOS] = [RadioId::Mac, RadioId::Wed];
#[cfg(all(not(feature = "csl"), not(feature = "wed")))]
const ALL_IDS: [RadioId; NUM_RADIOS] = [RadioId::Mac];

impl RadioId {
    /// Stable human-readable name, used by the log output.
    pub fn name(self) -> &'static str {
        match self {
            RadioId::Mac => "Mac",
            #[cfg(feature = "csl")]
            RadioId::Csl => "Csl",
            #[cfg(feature = "wed")]
            RadioId::Wed => "Wed",
        }
    }

    const fn index(self) -> usize {
        match self {
            RadioId::Mac => 0,
            #[cfg(feature = "csl")]
            RadioId::Csl => 1,
            #[cfg(feature = "wed")]
            RadioId::Wed => NUM_RADIOS - 1,
        }
    }

    const fn receive_priority(self) -> u8 {
        match self {
            RadioId::Mac => priority::RX_MAC,
            #[cfg(feature = "csl")]
            RadioId::Csl => priority::RX_CSL,
            #[cfg(feature = "wed")]
            RadioId::Wed => priority::RX_WED,
        }
    }
}

/// Desired state of one logical radio interface.
///
/// `Enabled` is the quiescent intent right after enabling or after a
/// transmit/energy scan completes, pending the next sleep or receive request.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    #[allow(missing_docs)]
    Disabled,
    #[allow(missing_docs)]
    Enabled,
    #[allow(missing_docs)]
    Sleep,
    #[allow(missing_docs)]
    Receive,
    #[allow(missing_docs)]
    Transmit,
    #[allow(missing_docs)]
    EnergyScan,
}

impl State {
    /// Stable human-readable name, used by the log output.
    pub fn name(self) -> &'static str {
        match self {
            State::Disabled => "Disabled",
            State::Enabled => "Enabled",
            State::Sleep => "Sleep",
            State::Receive => "Receive",
            State::Transmit => "Transmit",
            State::EnergyScan => "EnergyScan",
        }
    }
}

/// One consumer's slot in the arbitration table: desired state, current
/// priority and, when receiving, the channel. Mutated only through
/// [`RadioScheduler`]; never destroyed after construction.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub struct RadioInterface {
    id: RadioId,
    state: State,
    priority: u8,
    receive_priority: u8,
    channel: u8,
}

impl RadioInterface {
    fn new(id: RadioId) -> Self {
        let receive_priority = id.receive_priority();
        debug_assert!(
            priority::RX_MIN <= receive_priority && receive_priority <= priority::RX_MAX
        );
        Self { id, state: State::Disabled, priority: priority::MAX, receive_priority, channel: 0 }
    }

    fn set(&mut self, state: State, priority: u8) {
        self.state = state;
        self.priority = priority;
    }

    /// The consumer this slot belongs to.
    pub fn id(&self) -> RadioId {
        self.id
    }

    /// Current desired state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Current arbitration priority.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Channel of the most recent receive request.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Compact diagnostic rendering, e.g. `Mac[state=Receive,prio=11,ch=15]`.
    pub fn info(&self) -> heapless::String<INFO_STRING_SIZE> {
        let mut string = heapless::String::new();
        let _ = write!(
            string,
            "{}[state={},prio={},ch={}]",
            self.id.name(),
            self.state.name(),
            self.priority,
            self.channel
        );
        string
    }
}

/// Arbitrates radio access and drives the physical transceiver.
///
/// The scheduler is the only component permitted to call the
/// [`Radio`] primitives. All entry points run to completion on one logical
/// thread of control, so resolution never observes a torn intermediate state.
pub struct RadioScheduler {
    radios: [RadioInterface; NUM_RADIOS],
}

impl Default for RadioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioScheduler {
    /// Create the scheduler with every interface `Disabled`.
    pub fn new() -> Self {
        Self { radios: ALL_IDS.map(RadioInterface::new) }
    }

    /// Read access to one interface slot.
    pub fn radio(&self, id: RadioId) -> &RadioInterface {
        &self.radios[id.index()]
    }

    /// Enable the transceiver and move every interface to `Enabled` at the
    /// priority floor. On failure the error is propagated unchanged and no
    /// interface is modified.
    pub fn enable<D: Device>(&mut self, device: &mut D) -> Result<(), crate::Error<D>> {
        device.radio().enable().map_err(crate::device::Error::Radio)?;

        for radio in &mut self.radios {
            radio.set(State::Enabled, priority::MIN);
        }
        info!("radio enabled");
        Ok(())
    }

    /// Disable the transceiver and move every interface to `Disabled` at the
    /// priority ceiling. Refused while a transmit or energy scan is in
    /// flight, since the hardware cannot abandon either mid-operation.
    pub fn disable<D: Device>(&mut self, device: &mut D) -> Result<(), crate::Error<D>> {
        match self.radios[RadioId::Mac.index()].state {
            State::Transmit | State::EnergyScan => return Err(mac::Error::InvalidState.into()),
            _ => {}
        }
        device.radio().disable().map_err(crate::device::Error::Radio)?;

        for radio in &mut self.radios {
            radio.set(State::Disabled, priority::MAX);
        }
        info!("radio disabled");
        Ok(())
    }

    /// Request sleep on behalf of the given consumer and re-arbitrate.
    pub fn sleep<D: Device>(&mut self, device: &mut D, id: RadioId) -> Result<(), crate::Error<D>> {
        let radio = &mut self.radios[id.index()];
        if radio.state == State::Disabled {
            return Err(mac::Error::InvalidState.into());
        }
        radio.set(State::Sleep, priority::SLEEP);
        self.resolve(device);
        Ok(())
    }

    /// Request receive on the given channel on behalf of the given consumer
    /// and re-arbitrate.
    pub fn receive<D: Device>(
        &mut self,
        device: &mut D,
        id: RadioId,
        channel: u8,
    ) -> Result<(), crate::Error<D>> {
        let radio = &mut self.radios[id.index()];
        if radio.state == State::Disabled {
            return Err(mac::Error::InvalidState.into());
        }
        let receive_priority = radio.receive_priority;
        radio.set(State::Receive, receive_priority);
        radio.channel = channel;
        self.resolve(device);
        Ok(())
    }

    /// Request a hardware-timed receive window, bypassing arbitration. The
    /// transceiver serializes the window against its current arbitrated
    /// state; a rejection is propagated for the caller to retry on the next
    /// cycle.
    pub fn receive_at<D: Device>(
        &mut self,
        device: &mut D,
        channel: u8,
        start: u32,
        duration: u32,
    ) -> Result<(), crate::Error<D>> {
        device.radio().receive_at(channel, start, duration).map_err(crate::device::Error::Radio)?;
        Ok(())
    }

    /// Start transmitting on behalf of the primary MAC. The transmission
    /// preempts whichever receive or sleep intent currently drives the
    /// hardware; that intent is restored when [`Self::handle_event`] sees the
    /// completion.
    ///
    /// # Panics
    ///
    /// Panics if a transmit or energy scan is already in flight. The hardware
    /// cannot honor two outstanding operations; reaching this state is a
    /// serialization bug in the layer above.
    pub fn transmit<D: Device>(
        &mut self,
        device: &mut D,
        frame: &TxFrame,
    ) -> Result<(), crate::Error<D>> {
        let mac = &self.radios[RadioId::Mac.index()];
        assert!(
            !matches!(mac.state, State::Transmit | State::EnergyScan),
            "transmit requested while the radio is busy ({})",
            mac.state.name()
        );
        if mac.state == State::Disabled {
            return Err(mac::Error::InvalidState.into());
        }
        device.radio().transmit(frame).map_err(crate::device::Error::Radio)?;
        self.radios[RadioId::Mac.index()].set(State::Transmit, priority::TRANSMIT);
        trace!("tx started: ch={}, len={}", frame.channel, frame.payload.len());
        Ok(())
    }

    /// Start an energy scan on behalf of the primary MAC. Like
    /// [`Self::transmit`], the scan preempts the current intent until its
    /// completion is handled.
    pub fn energy_scan<D: Device>(
        &mut self,
        device: &mut D,
        channel: u8,
        duration: u16,
    ) -> Result<(), crate::Error<D>> {
        if !device.radio().supports_energy_scan() {
            return Err(mac::Error::NotImplemented.into());
        }
        let mac = &self.radios[RadioId::Mac.index()];
        if matches!(mac.state, State::Transmit | State::EnergyScan) {
            return Err(mac::Error::Busy.into());
        }
        if mac.state == State::Disabled {
            return Err(mac::Error::InvalidState.into());
        }
        device.radio().energy_scan(channel, duration).map_err(crate::device::Error::Radio)?;
        self.radios[RadioId::Mac.index()].set(State::EnergyScan, priority::ENERGY_SCAN);
        trace!("energy scan started: ch={}, duration={}ms", channel, duration);
        Ok(())
    }

    /// Handle a completion event from the transceiver.
    ///
    /// Resets the primary MAC interface to `Enabled` at the floor and
    /// immediately re-arbitrates, so the next-highest sleep/receive intent is
    /// re-applied to the now-free hardware before the caller runs its own
    /// completion processing. This is what lets a transmit or scan
    /// transiently preempt a receive window without the window's owner ever
    /// being told to stop.
    pub fn handle_event<D: Device>(&mut self, device: &mut D, event: &RadioEvent<'_>) {
        match event {
            RadioEvent::TransmitDone { result, .. } => {
                trace!("tx done: {:?}", result);
            }
            RadioEvent::EnergyScanDone { max_rssi } => {
                trace!("energy scan done: max_rssi={}", max_rssi);
            }
        }
        self.radios[RadioId::Mac.index()].set(State::Enabled, priority::MIN);
        self.resolve(device);
    }

    /// Re-drive the hardware from the highest-priority interface currently
    /// in `Sleep` or `Receive`.
    ///
    /// First-found wins ties, anchoring the tie-break on the primary MAC at
    /// index 0. The winning request is issued even when unchanged from the
    /// previous resolution; the transceiver's primitives are idempotent, so
    /// no last-applied cache is kept. Rejections are logged and retried
    /// naturally by the next resolution.
    fn resolve<D: Device>(&mut self, device: &mut D) {
        let mut winner: Option<usize> = None;
        let mut max_priority = priority::MIN;

        for (index, radio) in self.radios.iter().enumerate() {
            if radio.priority > max_priority {
                winner = Some(index);
                max_priority = radio.priority;
            }
        }

        for radio in &self.radios {
            trace!("resolve: {}", radio.info().as_str());
        }

        let Some(index) = winner else { return };
        let radio = &self.radios[index];

        match radio.state {
            State::Sleep => {
                trace!("resolve: {:?} sleeps the radio", radio.id);
                if let Err(error) = device.radio().sleep() {
                    warn!("resolve: sleep rejected: {:?}", error);
                }
            }
            State::Receive => {
                trace!("resolve: {:?} receives on ch={}", radio.id, radio.channel);
                if let Err(error) = device.radio().receive(radio.channel) {
                    warn!("resolve: receive rejected: {:?}", error);
                }
            }
            // Transmit, energy scan, disabled and idle interfaces never
            // drive the sleep-or-receive resolution.
            _ => {}
        }
    }
}
