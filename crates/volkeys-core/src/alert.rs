// Volkeys Alert Sink
// Human-readable anomaly reporting for the hosting application

use std::sync::Arc;

/// Receives anomaly messages the user should see, e.g. "unknown key
/// released, cleared all keys". Implemented by the hosting application;
/// [`LogAlert`] is the default when nothing better is wired up.
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Routes alerts to the log at warn level.
#[derive(Debug, Default)]
pub struct LogAlert;

impl AlertSink for LogAlert {
    fn alert(&self, message: &str) {
        log::warn!("{message}");
    }
}

pub(crate) fn default_sink() -> Arc<dyn AlertSink> {
    Arc::new(LogAlert)
}
