use ratatui::{prelude::*, widgets::*};

use crate::accent::Rgb;
use crate::app::App;
use crate::config::FieldId;

/// Dark card background the focus ring is blended onto.
const CARD: Rgb = Rgb::new(0x15, 0x15, 0x1a);
const MUTED: Color = Color::Rgb(0xa0, 0xa0, 0xad);

// ============================================================================
// UI Rendering
// ============================================================================

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(2)])
        .split(f.size());

    render_header(f, app, chunks[0]);
    render_timer(f, app, chunks[1]);
    render_help(f, app, chunks[2]);

    if app.is_celebrating() {
        render_celebration(f, app);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let accent: Color = app.accent().base.into();

    let picker = match app.accent_input() {
        Some(input) => Line::from(vec![
            Span::styled("Accent ", Style::default().fg(MUTED)),
            Span::styled(input.to_string(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled("█", Style::default().fg(Color::Green)),
        ]),
        None => Line::from(vec![
            Span::styled("Accent ", Style::default().fg(MUTED)),
            Span::styled("■ ", Style::default().fg(accent)),
            Span::styled(app.accent().base.to_hex(), Style::default().fg(Color::Gray)),
            Span::styled(if app.accent_persisted() { "" } else { "*" }, Style::default().fg(Color::DarkGray)),
        ]),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(Span::styled(" 🍅 Pomodoro timer ", Style::default().fg(accent).add_modifier(Modifier::BOLD)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(20)])
        .split(inner);
    f.render_widget(
        Paragraph::new("Focus with gentle rhythm, rest with purpose.").style(Style::default().fg(MUTED)),
        row[0],
    );
    f.render_widget(Paragraph::new(picker).alignment(Alignment::Right), row[1]);
}

fn render_timer(f: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let accent: Color = app.accent().base.into();

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(10),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Percentage(10),
        ])
        .split(area);

    // Phase icon
    f.render_widget(Paragraph::new(session.phase().icon()).alignment(Alignment::Center), sections[1]);

    // Countdown
    f.render_widget(
        Paragraph::new(format_time(session.remaining()))
            .style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[3],
    );

    // Status
    let status = if session.is_complete() {
        "All pomodoros complete! Well done!".to_string()
    } else if session.is_paused() {
        format!("{} • {}/{} • paused", session.phase().name(), session.cycle(), session.config().total_cycles)
    } else {
        format!("{} • {}/{}", session.phase().name(), session.cycle(), session.config().total_cycles)
    };
    f.render_widget(
        Paragraph::new(status).style(Style::default().fg(MUTED)).alignment(Alignment::Center),
        sections[5],
    );

    // Progress
    let gauge_area = centered_width(60, sections[7]);
    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(accent).bg(Color::Black))
            .percent((session.progress_ratio() * 100.0) as u16),
        gauge_area,
    );

    render_buttons(f, app, centered_width(60, sections[9]));
    render_fields(f, app, centered_width(60, sections[11]));

    let now = chrono::Local::now();
    f.render_widget(
        Paragraph::new(now.format("%A, %B %d  •  %H:%M").to_string())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        sections[13],
    );
}

fn render_buttons(f: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let accent = app.accent();

    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let (label, fill) = if session.is_running() {
        ("Pause timer", accent.pressed())
    } else if session.is_complete() {
        ("Start new session", accent.base)
    } else {
        ("Start timer", accent.base)
    };

    f.render_widget(
        Paragraph::new(label)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).bg(fill.into()).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded)
                .border_style(Style::default().fg(fill.into()))),
        row[0],
    );
    f.render_widget(
        Paragraph::new("Reset")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded)
                .border_style(Style::default().fg(MUTED))),
        row[1],
    );
}

fn render_fields(f: &mut Frame, app: &App, area: Rect) {
    let locked = app.fields_locked();
    let ring: Color = app.accent().ring(CARD).into();

    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
        .split(area);

    for (id, cell) in FieldId::ALL.into_iter().zip(cells.iter()) {
        let field = app.editor().field(id);
        let focused = app.focus() == id && app.accent_input().is_none();

        let (border, text) = if locked {
            (Style::default().fg(Color::DarkGray), Style::default().fg(Color::DarkGray))
        } else if focused {
            (Style::default().fg(ring).add_modifier(Modifier::BOLD), Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        } else {
            (Style::default().fg(MUTED), Style::default().fg(Color::Gray))
        };

        let mut spans = vec![Span::styled(field.raw().to_string(), text)];
        if focused && !locked {
            spans.push(Span::styled("█", Style::default().fg(ring)));
        }

        f.render_widget(
            Paragraph::new(Line::from(spans))
                .alignment(Alignment::Center)
                .block(Block::default()
                    .title(format!(" {} ", id.label()))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border)),
            *cell,
        );
    }
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let controls = if app.accent_input().is_some() {
        Line::from(vec![
            span_key("0-9 a-f", app), Span::raw(" Hex  •  "),
            span_key("Enter", app), Span::raw(" Apply  •  "),
            span_key("Esc", app), Span::raw(" Cancel"),
        ])
    } else {
        Line::from(vec![
            span_key("Space", app), Span::raw(" Start/Pause  •  "),
            span_key("R", app), Span::raw(" Reset  •  "),
            span_key("Tab", app), Span::raw(" Next field  •  "),
            span_key("C", app), Span::raw(" Accent  •  "),
            span_key("Q", app), Span::raw(" Quit"),
        ])
    };
    f.render_widget(
        Paragraph::new(controls).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn span_key<'a>(text: &'a str, app: &App) -> Span<'a> {
    Span::styled(text, Style::default().fg(app.accent().base.into()).add_modifier(Modifier::BOLD))
}

fn render_celebration(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 40, f.size());
    let lines = vec![
        Line::from(""),
        Line::from("🎉"),
        Line::from(""),
        Line::from(Span::styled("Amazing work!", Style::default().fg(Color::White).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled("All pomodoros complete!", Style::default().fg(Color::Gray))),
    ];

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black))
            .block(Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(app.accent().base.into()))),
        area,
    );
}

pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn centered_width(w: u16, r: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w) / 2),
            Constraint::Percentage(w),
            Constraint::Percentage((100 - w) / 2),
        ])
        .split(r)[1]
}

fn centered_rect(w: u16, h: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h) / 2),
            Constraint::Percentage(h),
            Constraint::Percentage((100 - h) / 2),
        ])
        .split(r);

    centered_width(w, v[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accent::{AccentPreference, MemoryStore};
    use crate::app::Options;
    use crate::tone::SilentPlayer;
    use ratatui::backend::TestBackend;
    use std::time::{Duration, Instant};

    fn app() -> App {
        let options = Options { work_minutes: 1, rest_minutes: 1, cycles: 1, notifications: false };
        App::new(options, AccentPreference::new(Box::new(MemoryStore::default())), Box::new(SilentPlayer))
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| render_ui(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(1500), "25:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(3600), "60:00");
    }

    #[test]
    fn renders_countdown_and_status() {
        let text = screen(&app());
        assert!(text.contains("01:00"));
        assert!(text.contains("Focus time • 1/1"));
        assert!(text.contains("Start timer"));
        assert!(text.contains("#4f46e5"));
    }

    #[test]
    fn renders_celebration_after_completion() {
        let t0 = Instant::now();
        let mut app = app();
        app.start(t0);
        for s in 1..=120 {
            app.update(t0 + Duration::from_secs(s));
        }
        assert!(screen(&app).contains("Amazing work!"));

        app.update(t0 + Duration::from_secs(123));
        let text = screen(&app);
        assert!(!text.contains("Amazing work!"));
        assert!(text.contains("Start new session"));
        assert!(text.contains("All pomodoros complete! Well done!"));
    }
}
