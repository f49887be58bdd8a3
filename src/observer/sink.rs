//! Where observer events go.

use crate::observer::events::ObserverEvent;

/// Receives every event the observer produces. Shared between tasks.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ObserverEvent);
}

/// Prints events to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: ObserverEvent) {
        println!("{}", event);
    }
}

#[cfg(test)]
pub use recording::RecordingSink;
