//! Operational helpers: logging and the in-memory scan journal.

use std::sync::Arc;

use asistencia_types::{config::OpsConfig, events::ScanEvent, AsistenciaError, Result};
use tokio::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| AsistenciaError::Ops(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| AsistenciaError::Ops(format!("tracing init error: {err}")))?;
    Ok(())
}

/// In-memory record of lifecycle, decode, and report events. Feeds the
/// operator display's recent-event pane; never persisted.
#[derive(Clone, Default)]
pub struct ScanJournal {
    events: Arc<Mutex<Vec<ScanEvent>>>,
}

impl ScanJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_event(&self, event: ScanEvent) -> Result<()> {
        self.events.lock().await.push(event);
        Ok(())
    }

    pub async fn snapshot_events(&self) -> Vec<ScanEvent> {
        self.events.lock().await.clone()
    }

    /// The most recent `limit` events, oldest first.
    pub async fn recent_events(&self, limit: usize) -> Vec<ScanEvent> {
        let events = self.events.lock().await;
        let start = events.len().saturating_sub(limit);
        events[start..].to_vec()
    }
}
