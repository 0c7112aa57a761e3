use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;
use writing_stats::{clock::Clock, timer::TimerStatus, util::format_hms};

use crate::{App, Dialog, DurationForm};

const HORIZONTAL_MARGIN: u16 = 2;
const DIALOG_PADDING: u16 = 4;
const FIELD_PLACEHOLDERS: [&str; 3] = ["Hours", "Min", "Sec"];

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let body = vec![
            Line::from(""),
            Line::from(Span::styled("writing session", bold_style)),
            Line::from(vec![
                Span::styled("tracking ", dim_style),
                Span::raw(self.file_name()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "(enter) new / running session   (q) quit",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ];
        Paragraph::new(body)
            .wrap(Wrap { trim: true })
            .render(chunks[0], buf);

        if let Some(notice) = &self.notice {
            Paragraph::new(Span::styled(
                notice.text.as_str(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
        }

        let status_style = match self.timer.status() {
            TimerStatus::Paused => Style::default().fg(Color::Yellow),
            TimerStatus::Running => Style::default().fg(Color::Green),
            TimerStatus::Idle | TimerStatus::Ended => Style::default(),
        };
        Paragraph::new(Span::styled(self.timer.display().label(), status_style))
            .alignment(Alignment::Right)
            .style(Style::default().add_modifier(Modifier::REVERSED))
            .render(chunks[2], buf);

        match &self.dialog {
            Dialog::Closed => {}
            Dialog::NewSession(form) => {
                render_dialog("New writing session", self.new_session_lines(form), area, buf)
            }
            Dialog::RunningSession => {
                render_dialog("Running session", self.running_session_lines(), area, buf)
            }
        }
    }
}

impl<C: Clock> App<C> {
    fn file_name(&self) -> String {
        let path = self.timer.documents().path();
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    fn new_session_lines(&self, form: &DurationForm) -> Vec<Line<'static>> {
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let focused_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

        let mut fields = vec![Span::raw("Duration  ")];
        for (i, value) in form.fields.iter().enumerate() {
            if i > 0 {
                fields.push(Span::raw(" : "));
            }
            let (text, style) = if value.is_empty() {
                (FIELD_PLACEHOLDERS[i].to_string(), dim_style)
            } else {
                (format!("{value:>4}"), Style::default())
            };
            let style = if i == form.focus {
                style.patch(focused_style)
            } else {
                style
            };
            fields.push(Span::styled(text, style));
        }

        let mut lines = vec![
            Line::from(Span::styled(format!("File: {}", self.file_name()), dim_style)),
            Line::from(""),
            Line::from(fields),
            Line::from(""),
            Line::from(Span::styled(
                "(enter) start session   (tab) next field   (esc) cancel",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ];

        if let Some(summary) = self.timer.last_summary() {
            lines.extend([
                Line::from(""),
                Line::from(Span::styled(
                    "Last session summary",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("Words Written: {}", summary.words_written())),
                Line::from(Span::styled(
                    format!("WPM: {}", summary.words_per_minute()),
                    dim_style,
                )),
                Line::from(format!("Duration: {}", format_hms(summary.elapsed))),
            ]);
        }

        lines
    }

    fn running_session_lines(&self) -> Vec<Line<'static>> {
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let started = match self.timer.started_at() {
            Some(started_at) => {
                let ago = (self.timer.now() - started_at).to_std().unwrap_or_default();
                format!(
                    "{} ({})",
                    started_at.with_timezone(&Local).format("%H:%M:%S"),
                    HumanTime::from(ago).to_text_en(Accuracy::Rough, Tense::Past)
                )
            }
            None => "Unknown time".to_string(),
        };
        let listening = self
            .timer
            .listening_file()
            .map(|file| file.file_name.clone())
            .unwrap_or_else(|| "No file".to_string());

        let toggle = if self.timer.status() == TimerStatus::Paused {
            "(p) play"
        } else {
            "(p) pause"
        };

        vec![
            Line::from(format!("Started at: {started}")),
            Line::from(Span::styled(format!("Listening to: {listening}"), dim_style)),
            Line::from(format!(
                "{}: {} left",
                self.timer.status(),
                format_hms(self.timer.remaining())
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("{toggle}   (s) stop   (esc) close"),
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ]
    }
}

fn line_width(line: &Line) -> u16 {
    line.spans
        .iter()
        .map(|span| span.content.width())
        .sum::<usize>()
        .try_into()
        .unwrap_or(u16::MAX)
}

fn render_dialog(title: &str, lines: Vec<Line<'static>>, area: Rect, buf: &mut Buffer) {
    let content_width = lines.iter().map(line_width).max().unwrap_or(0);
    let width = content_width
        .max(title.width() as u16)
        .saturating_add(DIALOG_PADDING)
        .min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = centered(area, width, height);

    Clear.render(popup, buf);
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    format!(" {title} "),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        )
        .render(popup, buf);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}
