//! Terminal rendering of the scan loop's per-tick view.

use std::{
    io::{self, Stdout},
    time::Duration,
};

use asistencia_scanner::{Caption, FeedbackTone, OperatorDisplay, ScanView};
use asistencia_types::{
    events::{EventPayload, ScanEvent},
    report::ReportOutcome,
    AsistenciaError, Result,
};
use crossterm::{
    event::{self, Event as CEvent, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Terminal,
};

const IDLE_STATUS: &str = "Esperando código QR";

pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    last_caption: Option<Caption>,
}

impl TerminalDisplay {
    pub fn new() -> Result<Self> {
        enable_raw_mode().map_err(ui_error)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(ui_error)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(ui_error)?;
        terminal.hide_cursor().map_err(ui_error)?;
        Ok(Self {
            terminal,
            last_caption: None,
        })
    }
}

impl OperatorDisplay for TerminalDisplay {
    fn render(&mut self, view: &ScanView) -> Result<()> {
        if view.caption.is_some() {
            self.last_caption = view.caption.clone();
        }
        let status_spans = caption_spans(self.last_caption.as_ref());
        let detection_line = detection_line(view);
        let items: Vec<ListItem> = view
            .events
            .iter()
            .rev()
            .map(|event| ListItem::new(format_event(event)))
            .collect();
        let prompt = view.prompt;

        self.terminal
            .draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints(
                        [
                            Constraint::Length(3),
                            Constraint::Length(3),
                            Constraint::Min(0),
                        ]
                        .as_ref(),
                    )
                    .split(f.size());

                let mut header_spans = vec![
                    Span::styled(
                        "Asistencia",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                ];
                header_spans.extend(status_spans.clone());
                header_spans.push(Span::raw("  "));
                header_spans.push(Span::styled(prompt, Style::default().fg(Color::Yellow)));

                let header = Paragraph::new(Line::from(header_spans))
                    .block(Block::default().borders(Borders::ALL).title("Estado"));
                f.render_widget(header, chunks[0]);

                let detection = Paragraph::new(Line::from(Span::raw(detection_line.clone())))
                    .block(Block::default().borders(Borders::ALL).title("Detección"));
                f.render_widget(detection, chunks[1]);

                let list = List::new(items.clone())
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title("Eventos recientes"),
                    )
                    .highlight_style(Style::default().fg(Color::Yellow));
                f.render_widget(list, chunks[2]);
            })
            .map_err(ui_error)?;
        Ok(())
    }

    fn poll_quit(&mut self) -> Result<bool> {
        if event::poll(Duration::from_millis(10)).map_err(ui_error)? {
            if let CEvent::Key(key) = event::read().map_err(ui_error)? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        // Restore the terminal on every exit path, fatal device errors
        // included.
        let _ = self.terminal.show_cursor();
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
    }
}

fn ui_error(err: io::Error) -> AsistenciaError {
    AsistenciaError::Ops(format!("terminal error: {err}"))
}

fn caption_spans(caption: Option<&Caption>) -> Vec<Span<'static>> {
    match caption {
        Some(caption) => {
            let color = match caption.tone {
                FeedbackTone::Positive => Color::Green,
                FeedbackTone::Alert => Color::Red,
            };
            vec![Span::styled(
                caption.text.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]
        }
        None => vec![Span::raw(IDLE_STATUS.to_string())],
    }
}

fn detection_line(view: &ScanView) -> String {
    match &view.region {
        Some(region) => {
            let corners: Vec<String> = region
                .iter()
                .map(|p| format!("({}, {})", p.x, p.y))
                .collect();
            format!(
                "Frame {}x{} | código en {}",
                view.frame_width,
                view.frame_height,
                corners.join(" ")
            )
        }
        None => format!(
            "Frame {}x{} | sin código",
            view.frame_width, view.frame_height
        ),
    }
}

fn format_event(event: &ScanEvent) -> String {
    let timestamp = event.timestamp.format("%H:%M:%S");
    match &event.payload {
        EventPayload::Lifecycle(lifecycle) => format!(
            "[{}] Lifecycle::{:?} {}",
            timestamp,
            lifecycle.phase,
            lifecycle.details.clone().unwrap_or_default()
        ),
        EventPayload::Decode(decode) => format!(
            "[{}] QR detectado: {} (contorno: {})",
            timestamp,
            decode.payload,
            if decode.region.is_some() { "sí" } else { "no" }
        ),
        EventPayload::Report(report) => match &report.outcome {
            ReportOutcome::Success { kind, status } => format!(
                "[{}] Registro: {}{}",
                timestamp,
                kind,
                status
                    .as_deref()
                    .map(|estado| format!(" ({estado})"))
                    .unwrap_or_default()
            ),
            ReportOutcome::ServerError { message } => {
                format!("[{}] Error del servidor: {}", timestamp, message)
            }
            ReportOutcome::ConnectionError => {
                format!("[{}] No se puede conectar con el backend", timestamp)
            }
            ReportOutcome::UnexpectedError { message } => {
                format!("[{}] Error inesperado: {}", timestamp, message)
            }
        },
    }
}
