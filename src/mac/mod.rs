//! MAC-layer scheduling above the arbitrated radio.

#[cfg(feature = "wed")]
pub mod wed;

use crate::device::Device;

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Error {
    /// The request is not legal in the interface's current state, e.g.
    /// sleep or receive on a disabled interface.
    InvalidState,
    /// The radio is occupied by an in-flight transmit or energy scan.
    Busy,
    /// The transceiver lacks the required capability.
    NotImplemented,
}
impl<D> From<Error> for crate::Error<D>
where
    D: Device,
{
    fn from(value: Error) -> Self {
        Self::Mac(value)
    }
}

/// Guard offsets compensating for radio turnaround latency, in microseconds.
///
/// Turning the receiver on or off is not instantaneous; these are fixed
/// design parameters, not computed values.
pub mod guard {
    /// Lead applied to the first sample time when listening starts, so the
    /// first window fires promptly instead of one full interval later.
    pub const RECEIVE_TIME_AHEAD: u32 = 2000;
    /// Trailing slack after a hardware-timed window before the local timer
    /// fires to schedule the next one.
    pub const WED_RECEIVE_TIME_AFTER: u32 = 500;
    /// Lead before a manual sleep-phase boundary, anticipating the latency
    /// of the sleep request.
    pub const RECEIVE_ON_AHEAD: u32 = 192;
    /// Slack after a manual listen-phase boundary.
    pub const RECEIVE_ON_AFTER: u32 = 256;
}
