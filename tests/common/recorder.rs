use parking_lot::Mutex;
use std::sync::Arc;

/// Thread-safe event log for observing which guard steps ran
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
