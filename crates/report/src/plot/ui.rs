//! Live chart layout.
//!
//! ┌ UPS monitor ─ 2024-05-01 12:00:00  62.0%  Low ┐
//! │ Load Voltage (V)                              │
//! │ Current (A)                                   │
//! │ Power (W)                                     │
//! └ q / Esc / Ctrl-C: stop monitoring ────────────┘

use super::history::{ChartHistory, Metric};
use ratatui::{prelude::*, widgets::*};

pub fn draw(f: &mut Frame, history: &ChartHistory) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_title(f, rows[0], history);
    for (metric, area) in Metric::ALL.into_iter().zip(&rows[1..4]) {
        draw_chart(f, *area, history, metric);
    }
    draw_keys(f, rows[4]);
}

fn draw_title(f: &mut Frame, area: Rect, history: &ChartHistory) {
    let status = if history.status().is_empty() {
        "waiting for first reading…"
    } else {
        history.status()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" UPS monitor ", Style::default().bold().fg(Color::Cyan)),
            Span::raw(format!(" {status} ")),
            Span::styled(
                format!(" missed: {} ", history.missed()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    f.render_widget(block, area);
}

fn color(metric: Metric) -> Color {
    match metric {
        Metric::Voltage => Color::Yellow,
        Metric::Current => Color::Green,
        Metric::Power => Color::Magenta,
    }
}

fn draw_chart(f: &mut Frame, area: Rect, history: &ChartHistory, metric: Metric) {
    let title = match history.latest(metric) {
        Some(v) => format!(" {}  {v:.4} ", metric.title()),
        None => format!(" {} ", metric.title()),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if history.is_empty() {
        f.render_widget(block, area);
        return;
    }

    let data = history.series(metric);
    let [x_lo, x_hi] = history.x_bounds();
    let [y_lo, y_hi] = history.y_bounds(metric);

    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color(metric)))
        .data(&data)];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(Axis::default().bounds([x_lo, x_hi]))
        .y_axis(Axis::default().bounds([y_lo, y_hi]).labels(vec![
            Line::from(format!("{y_lo:.3}")),
            Line::from(format!("{y_hi:.3}")),
        ]));
    f.render_widget(chart, area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(" q / Esc / Ctrl-C: stop monitoring")
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use ratatui::backend::TestBackend;
    use ups_core::{DerivedRecord, HostMetrics, PhysicalSample, PowerStage, RemainingTime};

    fn screen(history: &ChartHistory) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw(f, history)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn empty_history_shows_waiting_title() {
        let text = screen(&ChartHistory::new());
        assert!(text.contains("UPS monitor"));
        assert!(text.contains("Load Voltage (V)"));
        assert!(text.contains("Power (W)"));
    }

    #[test]
    fn renders_latest_reading_in_titles() {
        let mut h = ChartHistory::new();
        h.push(&DerivedRecord {
            sample: PhysicalSample {
                voltage_v: 12.0,
                current_a: -0.25,
                power_w: -3.0,
                timestamp: Local::now(),
            },
            battery_pct: 88.0,
            remaining_time: RemainingTime::Indeterminate,
            stage: PowerStage::High,
            host: HostMetrics::default(),
        });
        let text = screen(&h);
        assert!(text.contains("12.0000"));
        assert!(text.contains("High"));
    }
}
