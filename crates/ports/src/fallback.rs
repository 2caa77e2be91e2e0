//! Fallback measurement boundary contract.

use crate::EntryHandler;

/// Alternate first-input detection used when native observation is
/// unavailable.
///
/// Synthesized events go through the same handler contract as native ones.
pub trait FallbackMeasurePort {
    /// Deliver the synthesized event for the first qualifying interaction to
    /// `handler` (immediately, if one was already detected).
    fn measure(&self, handler: EntryHandler);

    /// Forget any detected interaction and pending handlers so a new first
    /// interaction can be detected.
    fn reset(&self);
}
