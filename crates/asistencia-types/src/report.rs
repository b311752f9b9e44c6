use serde::{Deserialize, Serialize};

/// `estado` values the backend may attach to a successful registration that
/// deserve the operator's attention on screen.
pub const NOTABLE_ESTADOS: [&str; 3] = ["tardanza", "salida_temprano", "horas_extra"];

/// Classified result of one reporting attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportOutcome {
    /// Backend accepted the registration. `kind` is the uppercased `tipo`
    /// ("ENTRADA", "SALIDA", ...), `status` the optional `estado`.
    Success {
        kind: String,
        status: Option<String>,
    },
    /// Backend answered with a non-success status code.
    ServerError { message: String },
    /// The connection could not be established at all.
    ConnectionError,
    /// Anything else that went wrong during the attempt.
    UnexpectedError { message: String },
}

impl ReportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReportOutcome::Success { .. })
    }

    /// Whether the status deserves an on-screen suffix next to the kind.
    pub fn notable_status(&self) -> Option<&str> {
        match self {
            ReportOutcome::Success {
                status: Some(estado),
                ..
            } if NOTABLE_ESTADOS.contains(&estado.as_str()) => Some(estado),
            _ => None,
        }
    }
}

/// Request body sent to the attendance endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest {
    pub codigo_qr: String,
}

/// Success body returned by the attendance endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportReply {
    pub tipo: Option<String>,
    pub estado: Option<String>,
}

/// Error body returned by the attendance endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportErrorReply {
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notable_status_filters_ordinary_estados() {
        let tardy = ReportOutcome::Success {
            kind: "ENTRADA".into(),
            status: Some("tardanza".into()),
        };
        assert_eq!(tardy.notable_status(), Some("tardanza"));

        let punctual = ReportOutcome::Success {
            kind: "ENTRADA".into(),
            status: Some("puntual".into()),
        };
        assert!(punctual.notable_status().is_none());
        assert!(ReportOutcome::ConnectionError.notable_status().is_none());
    }
}
