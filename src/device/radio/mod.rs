//! Contract for the physical half-duplex transceiver.

pub mod types;
use core::fmt::Debug;
use types::*;

/// The physical transceiver provided by the calling code.
///
/// The hardware is in exactly one of {disabled, sleeping, receiving,
/// transmitting, energy-scanning} at a time. Every request either takes
/// effect immediately or is rejected immediately; `transmit` and
/// `energy_scan` additionally complete later through a [`RadioEvent`]
/// delivered to [`crate::radio::RadioScheduler::handle_event`]. Requests are
/// idempotent: re-issuing the current state is accepted and harmless.
///
/// Only [`crate::radio::RadioScheduler`] may call these primitives.
pub trait Radio: Sized {
    #[cfg(feature = "defmt")]
    #[allow(missing_docs)]
    type Error: Debug + defmt::Format;

    #[cfg(not(feature = "defmt"))]
    #[allow(missing_docs)]
    type Error: Debug;

    /// Power the transceiver on into its idle state.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Power the transceiver off.
    fn disable(&mut self) -> Result<(), Self::Error>;

    /// Turn the receiver off, keeping the transceiver powered.
    fn sleep(&mut self) -> Result<(), Self::Error>;

    /// Start receiving on the given channel.
    fn receive(&mut self, channel: u8) -> Result<(), Self::Error>;

    /// Schedule a hardware-timed receive window. `start` is in the radio's
    /// own microsecond clock domain, which may drift relative to
    /// [`crate::device::timer::Timer::now`]. Only meaningful when
    /// [`Self::supports_receive_timing`] reports `true`.
    fn receive_at(&mut self, channel: u8, start: u32, duration: u32) -> Result<(), Self::Error>;

    /// Start transmitting the given frame. Completion is reported through
    /// [`RadioEvent::TransmitDone`].
    fn transmit(&mut self, frame: &TxFrame) -> Result<(), Self::Error>;

    /// Start an energy scan of `duration` milliseconds on the given channel.
    /// Completion is reported through [`RadioEvent::EnergyScanDone`].
    fn energy_scan(&mut self, channel: u8, duration: u16) -> Result<(), Self::Error>;

    /// Whether the transceiver implements [`Self::receive_at`].
    fn supports_receive_timing(&self) -> bool;

    /// Whether the transceiver implements [`Self::energy_scan`].
    fn supports_energy_scan(&self) -> bool;

    /// Current time in the radio's microsecond clock domain.
    fn now(&mut self) -> u64;
}
