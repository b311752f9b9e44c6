//! Outbound attendance reporting.

use std::{
    collections::VecDeque,
    sync::Mutex,
};

use async_trait::async_trait;
use asistencia_types::{
    config::ReporterConfig,
    report::{ReportErrorReply, ReportOutcome, ReportReply, ReportRequest},
};
use tracing::debug;

const DEFAULT_TIPO: &str = "registrado";
const UNKNOWN_SERVER_ERROR: &str = "Error desconocido";

/// Translates a decoded payload into one reporting attempt.
///
/// Classification is total: whatever happens on the wire comes back as a
/// `ReportOutcome`, never as an error that could unwind the scan loop.
#[async_trait]
pub trait AttendanceReporter: Send + Sync {
    async fn report(&self, codigo: &str) -> ReportOutcome;
}

/// Reporter that POSTs to the attendance endpoint over HTTP.
pub struct HttpReporter {
    agent: ureq::Agent,
    endpoint_url: String,
}

impl HttpReporter {
    pub fn new(config: &ReporterConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        Self {
            agent,
            endpoint_url: config.endpoint_url.clone(),
        }
    }
}

#[async_trait]
impl AttendanceReporter for HttpReporter {
    async fn report(&self, codigo: &str) -> ReportOutcome {
        let agent = self.agent.clone();
        let url = self.endpoint_url.clone();
        let request = ReportRequest {
            codigo_qr: codigo.to_string(),
        };

        // ureq is blocking; one attempt per call, bounded by the agent's
        // timeout, no retry until the next qualifying frame.
        match tokio::task::spawn_blocking(move || send_report(&agent, &url, &request)).await {
            Ok(outcome) => outcome,
            Err(err) => ReportOutcome::UnexpectedError {
                message: format!("reporter task failed: {err}"),
            },
        }
    }
}

fn send_report(agent: &ureq::Agent, url: &str, request: &ReportRequest) -> ReportOutcome {
    match agent.post(url).send_json(request) {
        Ok(response) => classify_success(response),
        Err(ureq::Error::Status(code, response)) => classify_server_error(code, response),
        Err(ureq::Error::Transport(transport)) => classify_transport(transport),
    }
}

fn classify_success(response: ureq::Response) -> ReportOutcome {
    let reply: ReportReply = match response.into_json() {
        Ok(reply) => reply,
        Err(err) => {
            return ReportOutcome::UnexpectedError {
                message: format!("respuesta ilegible del servidor: {err}"),
            }
        }
    };

    let kind = reply
        .tipo
        .filter(|tipo| !tipo.is_empty())
        .unwrap_or_else(|| DEFAULT_TIPO.to_string())
        .to_uppercase();
    let status = reply.estado.filter(|estado| !estado.is_empty());
    ReportOutcome::Success { kind, status }
}

fn classify_server_error(code: u16, response: ureq::Response) -> ReportOutcome {
    debug!(code, "Backend rejected the report");
    let message = response
        .into_json::<ReportErrorReply>()
        .ok()
        .and_then(|reply| reply.error)
        .unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string());
    ReportOutcome::ServerError { message }
}

fn classify_transport(transport: ureq::Transport) -> ReportOutcome {
    match transport.kind() {
        ureq::ErrorKind::Dns
        | ureq::ErrorKind::ConnectionFailed
        | ureq::ErrorKind::ProxyConnect => ReportOutcome::ConnectionError,
        _ => ReportOutcome::UnexpectedError {
            message: transport.to_string(),
        },
    }
}

/// Scripted reporter used for integration testing.
pub struct ScriptedReporter {
    outcomes: Mutex<VecDeque<ReportOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedReporter {
    /// Returns the given outcomes in order; further calls report success.
    pub fn with_outcomes(outcomes: Vec<ReportOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Payloads this reporter has been invoked with, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AttendanceReporter for ScriptedReporter {
    async fn report(&self, codigo: &str) -> ReportOutcome {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(codigo.to_string());
        }
        self.outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front())
            .unwrap_or(ReportOutcome::Success {
                kind: "REGISTRADO".to_string(),
                status: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        sync::mpsc,
        thread,
        time::Duration,
    };

    use super::*;

    /// Single-connection HTTP stub. Answers the first request with the given
    /// status and JSON body, and hands the raw request back through a channel.
    fn spawn_stub_server(status: u16, reason: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub server addr");
        let reason = reason.to_string();
        let body = body.to_string();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            stream
                .set_read_timeout(Some(Duration::from_secs(2)))
                .expect("set read timeout");

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Read until the header/body boundary has arrived; the request
            // body is tiny so a handful of reads suffices.
            loop {
                match stream.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        request.extend_from_slice(&buf[..n]);
                        let text = String::from_utf8_lossy(&request);
                        if text.contains("codigo_qr") || !text.contains("POST") {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }

            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });

        (format!("http://{addr}"), rx)
    }

    fn reporter_for(url: String) -> HttpReporter {
        HttpReporter::new(&ReporterConfig {
            endpoint_url: url,
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn success_reply_is_classified_with_estado() {
        let (url, rx) = spawn_stub_server(200, "OK", r#"{"tipo":"entrada","estado":"tardanza"}"#);
        let outcome = reporter_for(url).report("EMP-001").await;

        assert_eq!(
            outcome,
            ReportOutcome::Success {
                kind: "ENTRADA".into(),
                status: Some("tardanza".into()),
            }
        );
        let request = rx.recv_timeout(Duration::from_secs(2)).expect("request");
        assert!(request.contains(r#""codigo_qr":"EMP-001""#));
    }

    #[tokio::test]
    async fn missing_tipo_defaults_to_registrado() {
        let (url, _rx) = spawn_stub_server(200, "OK", "{}");
        let outcome = reporter_for(url).report("EMP-001").await;

        assert_eq!(
            outcome,
            ReportOutcome::Success {
                kind: "REGISTRADO".into(),
                status: None,
            }
        );
    }

    #[tokio::test]
    async fn rejected_report_carries_server_message() {
        let (url, _rx) = spawn_stub_server(400, "Bad Request", r#"{"error":"QR invalido"}"#);
        let outcome = reporter_for(url).report("EMP-001").await;

        assert_eq!(
            outcome,
            ReportOutcome::ServerError {
                message: "QR invalido".into(),
            }
        );
    }

    #[tokio::test]
    async fn unparseable_error_body_gets_generic_message() {
        let (url, _rx) = spawn_stub_server(500, "Internal Server Error", "<html>boom</html>");
        let outcome = reporter_for(url).report("EMP-001").await;

        assert_eq!(
            outcome,
            ReportOutcome::ServerError {
                message: UNKNOWN_SERVER_ERROR.into(),
            }
        );
    }

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        // Grab an ephemeral port, then close the listener so nothing answers.
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let outcome = reporter_for(format!("http://{addr}")).report("EMP-001").await;
        assert_eq!(outcome, ReportOutcome::ConnectionError);
    }

    #[tokio::test]
    async fn malformed_success_body_is_unexpected() {
        let (url, _rx) = spawn_stub_server(200, "OK", "this is not json");
        let outcome = reporter_for(url).report("EMP-001").await;

        assert!(matches!(outcome, ReportOutcome::UnexpectedError { .. }));
    }

    #[tokio::test]
    async fn scripted_reporter_records_calls() {
        let reporter = ScriptedReporter::with_outcomes(vec![ReportOutcome::ConnectionError]);
        assert_eq!(reporter.report("A").await, ReportOutcome::ConnectionError);
        assert!(reporter.report("B").await.is_success());
        assert_eq!(reporter.calls(), vec!["A".to_string(), "B".to_string()]);
    }
}
