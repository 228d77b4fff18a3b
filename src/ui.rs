pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, AppState, Field, NoticeLevel},
    clock::Clock,
    util::{format_remaining, format_zone_seconds},
    zone::Zone,
};

use self::charting::{bar_value, format_slice, pie_slices, zone_color, NO_DATA_MESSAGE};

const HORIZONTAL_MARGIN: u16 = 1;

fn zone_keys(zone: Zone) -> &'static str {
    match zone {
        Zone::Corner => "c/1",
        Zone::Lateral => "l/2",
        Zone::Center => "m/3",
    }
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Min(0),    // panes
                Constraint::Length(1), // notice
                Constraint::Length(1), // legend
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(outer[0]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // setup form
                Constraint::Length(3), // countdown
                Constraint::Min(5),    // zones
            ])
            .split(columns[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(12)])
            .split(columns[1]);

        // Setup form
        let editing = self.state == AppState::Setup;
        let field_line = |label: &'static str, value: &str, field: Field| {
            let focused = editing && self.focus == field;
            let value_style = if focused {
                bold_style.add_modifier(Modifier::UNDERLINED)
            } else if editing {
                Style::default()
            } else {
                dim_style
            };
            let cursor = if focused { "▏" } else { "" };
            Line::from(vec![
                Span::raw(label),
                Span::styled(format!("{value}{cursor}"), value_style),
            ])
        };
        Paragraph::new(vec![
            field_line("Animal ID: ", &self.animal_id_input, Field::AnimalId),
            field_line("Duration (s): ", &self.duration_input, Field::Duration),
        ])
        .block(Block::default().borders(Borders::ALL).title("Test Setup"))
        .render(left[0], buf);

        // Countdown
        let timer_style = if self.controller.is_running() {
            bold_style.fg(Color::Yellow)
        } else {
            bold_style
        };
        Paragraph::new(Span::styled(
            format!("Remaining: {}", format_remaining(self.remaining_secs())),
            timer_style,
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Timer"))
        .render(left[1], buf);

        // Zone rows
        let snapshot = self.zone_snapshot();
        let active = self.active_zone();
        let zone_lines: Vec<Line> = snapshot
            .iter()
            .map(|(zone, secs)| {
                let mut label_style = Style::default().fg(zone_color(zone)).patch(bold_style);
                if active == Some(zone) {
                    label_style = label_style.add_modifier(Modifier::REVERSED);
                }
                Line::from(vec![
                    Span::styled(format!(" {:<8}", zone.to_string()), label_style),
                    Span::styled(format!(" ({}) ", zone_keys(zone)), dim_style),
                    Span::raw(format_zone_seconds(secs)),
                ])
            })
            .collect();
        Paragraph::new(zone_lines)
            .block(Block::default().borders(Borders::ALL).title("Zones"))
            .render(left[2], buf);

        // Report text
        let report_widget = match &self.report_text {
            Some(text) => Paragraph::new(text.as_str()),
            None => Paragraph::new(Span::styled(
                "Press (g) during or after a test to generate the report.",
                italic_style,
            )),
        };
        report_widget
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Report"))
            .render(right[0], buf);

        // Time distribution
        let chart_block = Block::default()
            .borders(Borders::ALL)
            .title("Time per Zone");
        match self.report.as_ref().map(|r| r.pie_series()) {
            Some(Some(series)) => {
                let bars: Vec<Bar> = pie_slices(&series)
                    .into_iter()
                    .map(|(zone, pct)| {
                        Bar::default()
                            .value(bar_value(pct))
                            .label(Line::from(zone.to_string()))
                            .text_value(format_slice(pct))
                            .style(Style::default().fg(zone_color(zone)))
                    })
                    .collect();
                BarChart::default()
                    .block(chart_block)
                    .bar_width(9)
                    .bar_gap(2)
                    .max(1000)
                    .data(BarGroup::default().bars(&bars))
                    .render(right[1], buf);
            }
            Some(None) => {
                Paragraph::new(Span::styled(NO_DATA_MESSAGE, dim_style))
                    .alignment(Alignment::Center)
                    .block(chart_block)
                    .render(right[1], buf);
            }
            None => chart_block.render(right[1], buf),
        }

        if let Some(notice) = &self.notice {
            let color = match notice.level {
                NoticeLevel::Info => Color::Cyan,
                NoticeLevel::Warning => Color::Yellow,
                NoticeLevel::Error => Color::Red,
            };
            Paragraph::new(Span::styled(
                notice.text.as_str(),
                bold_style.fg(color),
            ))
            .alignment(Alignment::Center)
            .render(outer[1], buf);
        }

        let legend = match self.state {
            AppState::Setup => "(tab) switch field / (enter) start / (esc)ape",
            AppState::Testing => "(c)orner (l)ateral (m) center / (s)top / (g)enerate / (e)xport / (esc)ape",
            AppState::Finished => "(g)enerate report / (e)xport / (n)ew test / (esc)ape",
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(outer[2], buf);
    }
}
