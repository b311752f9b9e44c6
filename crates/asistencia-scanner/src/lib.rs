//! Scan loop orchestration: camera, detector, reporter, and display wired
//! into the per-tick cycle.

use std::time::Instant;

use asistencia_camera::FrameSource;
use asistencia_ops::ScanJournal;
use asistencia_reporter::AttendanceReporter;
use asistencia_types::{
    config::{AsistenciaConfig, ScannerConfig},
    detect::{DecodeResult, Quad},
    events::{DecodeEvent, EventPayload, LifecyclePhase, ReportEvent, ScanEvent},
    Result,
};
use asistencia_vision::CodeDetector;
use tracing::{error, info, warn};

pub mod debounce;
pub mod feedback;

pub use debounce::ScanDebouncer;
pub use feedback::{Caption, FeedbackTone};

const MAX_VIEW_EVENTS: usize = 12;

/// Everything the operator display needs to draw one tick.
#[derive(Debug, Clone)]
pub struct ScanView {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Outline of the located code, present whenever one was found,
    /// independent of the cooldown gate.
    pub region: Option<Quad>,
    /// Outcome caption, present only on ticks that attempted a report.
    pub caption: Option<Caption>,
    pub prompt: &'static str,
    pub events: Vec<ScanEvent>,
}

/// Feedback renderer seam. The CLI implements it with a terminal UI; tests
/// record the views.
pub trait OperatorDisplay: Send {
    fn render(&mut self, view: &ScanView) -> Result<()>;
    /// Whether the operator asked to stop since the last poll.
    fn poll_quit(&mut self) -> Result<bool>;
}

pub struct Scanner<C, D, R, F>
where
    C: FrameSource,
    D: CodeDetector,
    R: AttendanceReporter,
    F: OperatorDisplay,
{
    camera: C,
    detector: D,
    reporter: R,
    display: F,
    journal: ScanJournal,
    debounce: ScanDebouncer,
}

impl<C, D, R, F> Scanner<C, D, R, F>
where
    C: FrameSource,
    D: CodeDetector,
    R: AttendanceReporter,
    F: OperatorDisplay,
{
    pub fn new(
        config: &ScannerConfig,
        camera: C,
        detector: D,
        reporter: R,
        display: F,
        journal: ScanJournal,
    ) -> Self {
        Self {
            camera,
            detector,
            reporter,
            display,
            journal,
            debounce: ScanDebouncer::new(config.cooldown()),
        }
    }

    pub fn debouncer(&self) -> &ScanDebouncer {
        &self.debounce
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn display(&self) -> &F {
        &self.display
    }

    /// Startup banner and device acquisition. A camera that cannot be opened
    /// aborts here, before the loop or the reporter is ever reached.
    pub async fn boot(&mut self, config: &AsistenciaConfig) -> Result<()> {
        info!("Iniciando sistema de escaneo QR para asistencia");
        info!("Enviando registros a: {}", config.reporter.endpoint_url);

        self.camera.open().await?;
        self.journal
            .record_event(ScanEvent::lifecycle(
                LifecyclePhase::Startup,
                Some("cámara lista".into()),
            ))
            .await?;
        Ok(())
    }

    /// Drive the per-frame cycle until the operator quits, the stream ends,
    /// or the device fails.
    pub async fn run(&mut self) -> Result<()> {
        self.journal
            .record_event(ScanEvent::lifecycle(LifecyclePhase::Ready, None))
            .await?;

        loop {
            let frame = match self.camera.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Fin del stream de video");
                    break;
                }
                Err(err) => {
                    error!("Error al capturar el frame: {err}");
                    return Err(err);
                }
            };

            let detection = match self.detector.detect(&frame).await {
                Ok(detection) => detection,
                Err(err) => {
                    warn!(error = %err, "Detector failed; treating tick as empty");
                    DecodeResult::default()
                }
            };

            let now = Instant::now();
            let mut caption = None;
            if let Some(payload) = detection.reportable_payload() {
                if self.debounce.should_report(now) {
                    info!("QR detectado: {payload}");
                    self.journal
                        .record_event(ScanEvent::new(EventPayload::Decode(DecodeEvent {
                            payload: payload.to_string(),
                            region: detection.region,
                        })))
                        .await?;

                    let outcome = self.reporter.report(payload).await;
                    feedback::log_outcome(&outcome);
                    self.journal
                        .record_event(ScanEvent::new(EventPayload::Report(ReportEvent {
                            outcome: outcome.clone(),
                        })))
                        .await?;

                    caption = Some(feedback::outcome_caption(&outcome));
                    // Commit on every attempt, success or failure; the next
                    // report window opens a full cooldown from now.
                    self.debounce.commit(now);
                }
            }

            let view = ScanView {
                frame_width: frame.width,
                frame_height: frame.height,
                region: detection.region,
                caption,
                prompt: feedback::SCAN_PROMPT,
                events: self.journal.recent_events(MAX_VIEW_EVENTS).await,
            };
            self.display.render(&view)?;

            if self.display.poll_quit()? {
                info!("Salida solicitada por el operador");
                break;
            }
        }

        self.journal
            .record_event(ScanEvent::lifecycle(LifecyclePhase::Shutdown, None))
            .await?;
        info!("Sistema detenido.");
        Ok(())
    }
}
