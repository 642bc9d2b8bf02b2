//! Frame and completion-event types exchanged with the transceiver.

use heapless::Vec;

/// Maximum PSDU size of an IEEE 802.15.4 frame.
pub const MAX_FRAME_SIZE: usize = 127;

/// An outgoing frame. Construction and security processing of the PSDU happen
/// in the layers above; this crate only carries the bytes to the transceiver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Default)]
pub struct TxFrame {
    /// Channel to transmit on.
    pub channel: u8,
    /// Frame bytes (PHY payload).
    pub payload: Vec<u8, MAX_FRAME_SIZE>,
}

/// An incoming frame, as delivered with a transmit-done acknowledgment.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Default)]
pub struct RxFrame {
    /// Channel the frame was received on.
    pub channel: u8,
    /// Received signal strength in dBm.
    pub rssi: i8,
    /// Frame bytes (PHY payload).
    pub payload: Vec<u8, MAX_FRAME_SIZE>,
}

/// Outcome of a transmission, delivered with [`RadioEvent::TransmitDone`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxResult {
    /// The frame was transmitted and acknowledged where required.
    Done,
    /// The frame was transmitted but no acknowledgment was received.
    NoAck,
    /// Transmission could not take place due to activity on the channel.
    ChannelAccessFailure,
    /// Transmission was aborted for another reason.
    Abort,
}

/// Asynchronous completion raised by the transceiver after an accepted
/// `transmit` or `energy_scan` request.
///
/// The caller delivers these to [`crate::radio::RadioScheduler::handle_event`]
/// on the same run-to-completion thread of control as all other requests, and
/// only afterwards runs its own transmit-done or scan-done processing.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub enum RadioEvent<'a> {
    /// A transmission finished.
    TransmitDone {
        /// The frame that was transmitted.
        frame: &'a TxFrame,
        /// The acknowledgment frame, if one was received.
        ack: Option<&'a RxFrame>,
        /// Outcome of the transmission.
        result: TxResult,
    },
    /// An energy scan finished.
    EnergyScanDone {
        /// The maximum RSSI encountered on the scanned channel.
        max_rssi: i8,
    },
}
