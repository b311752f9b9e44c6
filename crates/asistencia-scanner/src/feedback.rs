//! Operator feedback derived from report outcomes: caption text, tone, and
//! the matching console line.

use asistencia_types::report::ReportOutcome;
use tracing::{error, info};

/// Static instruction rendered on every tick.
pub const SCAN_PROMPT: &str = "Escanea tu QR | Presiona 'q' para salir";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTone {
    Positive,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub text: String,
    pub tone: FeedbackTone,
}

/// On-screen caption for one reporting attempt. Only notable estados earn
/// the parenthesized suffix; ordinary ones stay in the log.
pub fn outcome_caption(outcome: &ReportOutcome) -> Caption {
    match outcome {
        ReportOutcome::Success { kind, .. } => {
            let text = match outcome.notable_status() {
                Some(estado) => format!("{kind} ({estado})"),
                None => kind.clone(),
            };
            Caption {
                text,
                tone: FeedbackTone::Positive,
            }
        }
        ReportOutcome::ConnectionError => Caption {
            text: "SIN CONEXION".into(),
            tone: FeedbackTone::Alert,
        },
        ReportOutcome::ServerError { .. } | ReportOutcome::UnexpectedError { .. } => Caption {
            text: "ERROR".into(),
            tone: FeedbackTone::Alert,
        },
    }
}

/// Console line for one reporting attempt.
pub fn log_outcome(outcome: &ReportOutcome) {
    match outcome {
        ReportOutcome::Success { kind, status } => {
            info!(
                tipo = %kind,
                estado = status.as_deref().unwrap_or("-"),
                "Registro aceptado"
            );
        }
        ReportOutcome::ServerError { message } => error!("Error del servidor: {message}"),
        ReportOutcome::ConnectionError => error!("No se puede conectar con el backend"),
        ReportOutcome::UnexpectedError { message } => error!("Error inesperado: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notable_estado_earns_a_suffix() {
        let caption = outcome_caption(&ReportOutcome::Success {
            kind: "ENTRADA".into(),
            status: Some("tardanza".into()),
        });
        assert_eq!(caption.text, "ENTRADA (tardanza)");
        assert_eq!(caption.tone, FeedbackTone::Positive);
    }

    #[test]
    fn ordinary_estado_is_not_overlaid() {
        let caption = outcome_caption(&ReportOutcome::Success {
            kind: "ENTRADA".into(),
            status: Some("puntual".into()),
        });
        assert_eq!(caption.text, "ENTRADA");
    }

    #[test]
    fn failures_map_to_alert_captions() {
        assert_eq!(outcome_caption(&ReportOutcome::ConnectionError).text, "SIN CONEXION");

        let server = outcome_caption(&ReportOutcome::ServerError {
            message: "QR invalido".into(),
        });
        assert_eq!(server.text, "ERROR");
        assert_eq!(server.tone, FeedbackTone::Alert);

        let unexpected = outcome_caption(&ReportOutcome::UnexpectedError {
            message: "timeout".into(),
        });
        assert_eq!(unexpected.text, "ERROR");
    }
}
