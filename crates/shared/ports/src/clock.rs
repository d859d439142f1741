use hublink_core::Timestamp;

/// Port for time abstraction
///
/// Transports measure polling intervals and message timeouts against this,
/// so tests can drive time by hand.
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
