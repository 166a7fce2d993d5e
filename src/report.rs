use crate::analysis::{Analysis, Outcome};
use crate::emotion::Emotion;
use crate::session::Session;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use image::Rgb;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Bar, BarChart, BarGroup, Block, BorderType, Borders, Paragraph, Widget, Wrap,
};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};
use std::io::{stdout, Stdout};
use std::time::Duration;

/// Rows needed by `draw`.
pub const REPORT_HEIGHT: u16 = 18;

// Percentages are charted in hundredths so two decimals survive
const CHART_SCALE: f64 = 100.;

/// Everything the results panel shows, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub dominant: Emotion,
    pub confidence: f64,
    pub faces: usize,
    pub chart: Vec<(Emotion, f64)>,
    pub description: &'static str,
    pub caption: String,
}

impl Report {
    pub fn new(analysis: &Analysis, session: &Session) -> Report {
        Report {
            dominant: analysis.dominant,
            confidence: analysis.scores.get(analysis.dominant),
            faces: analysis.faces.len(),
            chart: analysis.scores.ranked(),
            description: analysis.dominant.description(),
            caption: session.caption(),
        }
    }

    pub fn headline(&self) -> String {
        format!("{} {}", self.dominant.emoji(), self.dominant.title())
    }

    pub fn confidence_text(&self) -> String {
        format!("{:.2}% confidence", self.confidence)
    }
}

fn tui_color(c: Rgb<u8>) -> Color {
    Color::Rgb(c[0], c[1], c[2])
}

pub fn draw(frame: &mut Frame, area: Rect, report: &Report) {
    let [card, chart, about, caption] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(9),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .areas(area);

    let color = tui_color(report.dominant.color());

    let faces = match report.faces {
        1 => "1 face".to_string(),
        n => format!("{n} faces"),
    };
    let card_text = vec![
        Line::from(Span::styled(
            report.headline(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(report.confidence_text()),
        Line::from(Span::styled(faces, Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(
        Paragraph::new(card_text).block(
            Block::default()
                .borders(Borders::LEFT)
                .border_type(BorderType::Thick)
                .border_style(Style::default().fg(color)),
        ),
        card,
    );

    let bars: Vec<Bar> = report
        .chart
        .iter()
        .map(|(emotion, pct)| {
            let style = Style::default().fg(tui_color(emotion.color()));
            Bar::default()
                .label(Line::from(emotion.title()))
                .value((pct * CHART_SCALE).round() as u64)
                .text_value(format!("{pct:.2}%"))
                .style(style)
                .value_style(style.add_modifier(Modifier::REVERSED))
        })
        .collect();
    frame.render_widget(
        BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Emotion Analysis Results"),
            )
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .max((100. * CHART_SCALE) as u64)
            .data(BarGroup::default().bars(&bars)),
        chart,
    );

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{}: ", report.dominant.title()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(report.description),
        ]))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("What does this emotion mean?"),
        ),
        about,
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            report.caption.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
        caption,
    );
}

pub fn draw_error(frame: &mut Frame, area: Rect, message: &str) {
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("Error: {message}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .wrap(Wrap { trim: true }),
        area,
    );
}

pub fn draw_outcome(frame: &mut Frame, area: Rect, outcome: &Outcome, session: &Session) {
    match outcome {
        Ok(analysis) => draw(frame, area, &Report::new(analysis, session)),
        Err(e) => draw_error(frame, area, &e.to_string()),
    }
}

/// The results panel as plain lines, for when stdout is not a terminal.
pub fn plain_outcome(outcome: &Outcome, session: &Session) -> String {
    let analysis = match outcome {
        Ok(analysis) => analysis,
        Err(e) => return format!("Error: {e}"),
    };
    let report = Report::new(analysis, session);

    let mut lines = vec![
        report.headline(),
        report.confidence_text(),
        format!("faces: {}", report.faces),
    ];
    lines.extend(
        report
            .chart
            .iter()
            .map(|(emotion, pct)| format!("{:<10}{pct:>7.2}%", emotion.title())),
    );
    lines.push(format!("{}: {}", report.dominant.title(), report.description));
    lines.push(report.caption);
    lines.join("\n")
}

/// `q`, `Esc` or Ctrl-C. Raw mode turns Ctrl-C into a key event instead of SIGINT.
pub fn is_stop_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Inline results panel on stdout.
pub struct Console {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    raw: bool,
}

impl Console {
    pub fn inline() -> Result<Console> {
        let terminal = Terminal::with_options(
            CrosstermBackend::new(stdout()),
            TerminalOptions {
                viewport: Viewport::Inline(REPORT_HEIGHT),
            },
        )?;
        Ok(Console {
            terminal,
            raw: false,
        })
    }

    pub fn show(&mut self, outcome: &Outcome, session: &Session) -> Result<()> {
        self.terminal
            .draw(|f| draw_outcome(f, f.area(), outcome, session))?;
        Ok(())
    }

    /// Print a one-line message above the panel.
    pub fn notice(&mut self, level: NoticeLevel, message: &str) -> Result<()> {
        let style = match level {
            NoticeLevel::Info => Style::default(),
            NoticeLevel::Warning => Style::default().fg(Color::Yellow),
            NoticeLevel::Error => Style::default().fg(Color::Red),
        };
        let line = Line::from(Span::styled(message.to_string(), style));
        self.terminal.insert_before(1, |buf| {
            Paragraph::new(line).render(buf.area, buf);
        })?;
        Ok(())
    }

    /// Raw mode so stop keys can be read without waiting for Enter.
    pub fn watch_keys(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.raw = true;
        Ok(())
    }

    pub fn stop_requested(&mut self) -> Result<bool> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if is_stop_key(&key) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        if self.raw {
            let _ = terminal::disable_raw_mode();
        }
        let _ = self.terminal.show_cursor();
    }
}
