use tracing::{error, info, warn};

/// Ordered, human-readable record of what the extractor did. Each entry is
/// also emitted as a tracing event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticTrace {
    entries: Vec<String>,
}

impl DiagnosticTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.entries.push(message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.entries.push(message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.entries.push(message);
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}
