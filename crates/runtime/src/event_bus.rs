/// How an event should be treated by a front end.
///
/// `Debug` events are internal bookkeeping (e.g. a stale response that was
/// dropped) and must never be shown to the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn is_user_visible(self) -> bool {
        self >= Severity::Info
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Position in the bus, strictly increasing over the bus lifetime.
    pub sequence: u64,
    pub severity: Severity,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_sequence: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, severity: Severity, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            sequence: self.next_sequence,
            severity,
            kind,
            message: message.into(),
        });
        self.next_sequence += 1;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events a UI should render as transient notifications.
    pub fn notifications(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(|e| e.severity.is_user_visible())
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, Severity};

    #[test]
    fn records_events_in_sequence() {
        let mut bus = EventBus::new();
        bus.emit(Severity::Info, "dataset", "loaded");
        bus.emit(Severity::Error, "simplify", "failed");
        assert_eq!(bus.events().len(), 2);
        assert_eq!(bus.events()[0].sequence, 0);
        assert_eq!(bus.events()[1].sequence, 1);
    }

    #[test]
    fn debug_events_are_not_notifications() {
        let mut bus = EventBus::new();
        bus.emit(Severity::Debug, "stale", "dropped #1");
        bus.emit(Severity::Warning, "upload", "no attribute file");
        let kinds: Vec<&str> = bus.notifications().map(|e| e.kind).collect();
        assert_eq!(kinds, vec!["upload"]);
    }

    #[test]
    fn drain_clears_events_but_keeps_sequence() {
        let mut bus = EventBus::new();
        bus.emit(Severity::Info, "k", "m");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
        bus.emit(Severity::Info, "k", "m2");
        assert_eq!(bus.events()[0].sequence, 1);
    }
}
