/// A typed integration event.
///
/// Events are **immutable facts**; the serialized form is the wire contract
/// consumed by projectors (and, in production, by other services).
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Logical topic the event is published under.
    fn topic(&self) -> &'static str;

    /// Stable event name/type identifier (e.g. "cart.total_changed").
    fn event_type(&self) -> &'static str;
}
