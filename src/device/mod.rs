//! Wrapper for all necessary functionality implemented by calling code.

pub mod radio;
pub mod timer;

use radio::Radio;
use timer::Timer;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Error<D>
where
    D: Device,
{
    Timer(<<D as Device>::Timer as Timer>::Error),
    Radio(<<D as Device>::Radio as Radio>::Error),
}
impl<D> From<Error<D>> for super::Error<D>
where
    D: Device,
{
    fn from(value: Error<D>) -> Self {
        Self::Device(value)
    }
}

/// Specification of end device-specific functionality provided by the caller.
pub trait Device {
    /// Timer provided by the calling code.
    type Timer: Timer;
    /// Transceiver provided by the calling code.
    type Radio: Radio;

    /// Get the caller-supplied timer implementation.
    fn timer(&mut self) -> &mut Self::Timer;
    /// Get the caller-supplied transceiver implementation.
    fn radio(&mut self) -> &mut Self::Radio;
}
