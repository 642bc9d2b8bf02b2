//! Single-shot timer in the local microsecond clock domain.

use core::fmt::Debug;

/// A single-shot "fire at absolute time" timer provided by the calling code.
///
/// There is no repeating-timer primitive: every fire re-arms the timer with a
/// freshly computed deadline. The caller routes the fire back into whichever
/// scheduler armed it (for the wake-up listener, `WedListener::handle_timer`).
pub trait Timer: Sized {
    #[cfg(feature = "defmt")]
    #[allow(missing_docs)]
    type Error: Debug + defmt::Format;

    #[cfg(not(feature = "defmt"))]
    #[allow(missing_docs)]
    type Error: Debug;

    /// Current time in microseconds. Wraps on overflow.
    fn now(&mut self) -> u64;

    /// Arm the timer to fire once at the given absolute time, replacing any
    /// previously armed deadline.
    fn fire_at(&mut self, micros: u64) -> Result<(), Self::Error>;

    /// Cancel the armed deadline. Stopping an unarmed timer is a no-op.
    fn stop(&mut self);
}
