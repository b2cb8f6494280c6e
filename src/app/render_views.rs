use std::time::Instant;

use chrono::Local;
use ratatui::prelude::{Line, Span};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::{
    constants::GRID,
    domain::block_position,
    engine::{
        Mode,
        clock::{block_label, elapsed_blocks},
    },
};

use super::{App, UiMode, ui_helpers, view_style};

impl App {
    fn grid_lines(&self) -> Vec<Line<'static>> {
        let width = self.appearance.block_size as usize;
        let text_style = Style::default()
            .fg(self.appearance.main_text)
            .bg(self.appearance.background);
        let editing = self.planner.mode() == Mode::Edit;

        let mut header = vec![Span::styled("      ", text_style)];
        for col in 0..GRID.cols {
            header.push(Span::styled(
                ui_helpers::centre_in_cell(&format!(":{}0", col), width + 1),
                text_style,
            ));
        }

        let mut lines = vec![Line::from(header)];
        for row in 0..GRID.rows {
            let mut spans = vec![Span::styled(format!("{:02}:00 ", row), text_style)];
            for col in 0..GRID.cols {
                let cell = self.planner.appearance(row, col);
                let selected = editing && row == self.cursor_row && col == self.cursor_col;
                let content = if selected {
                    format!("[{}]", cell.icon)
                } else {
                    cell.icon.clone()
                };
                spans.push(Span::styled(
                    ui_helpers::centre_in_cell(&content, width),
                    view_style::block_style(cell.color, selected),
                ));
                spans.push(Span::styled(" ", text_style));
            }
            lines.push(Line::from(spans));
        }
        lines
    }

    fn status_lines(&self) -> Vec<Line<'static>> {
        let main = Style::default().fg(self.appearance.main_text);
        let secondary = Style::default().fg(self.appearance.secondary_text);
        let plan = self
            .current_plan
            .clone()
            .unwrap_or_else(|| "unsaved plan".to_string());

        let (mode_label, detail) = match self.planner.mode() {
            Mode::Edit => {
                let id = self.planner.grid().get(self.cursor_row, self.cursor_col);
                let activity = self.planner.catalog().resolve(id);
                (
                    "EDIT",
                    format!(
                        "{} {}",
                        block_label(self.cursor_row, self.cursor_col),
                        activity.label()
                    ),
                )
            }
            Mode::Time => {
                let now = Local::now();
                let (row, col) = block_position(elapsed_blocks(&now) + 1);
                let activity = self.planner.catalog().resolve(self.planner.grid().get(row, col));
                let next = self
                    .planner
                    .scheduler()
                    .time_until_due(Instant::now())
                    .map(ui_helpers::format_countdown)
                    .unwrap_or_default();
                (
                    "TIME",
                    format!(
                        "{} now: {} · refresh in {}",
                        now.format("%H:%M:%S"),
                        activity.label(),
                        next
                    ),
                )
            }
        };

        let mut first = vec![
            Span::styled(mode_label, main.add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", plan), secondary),
        ];
        if let Some(progress) = self.planner.productive_readout() {
            first.push(Span::styled(format!("  productive {}", progress), main));
        }

        let hint = match self.planner.mode() {
            Mode::Edit => "enter link · x unlink · t time · s save/load · q quit",
            Mode::Time => "t edit · s save/load · q quit",
        };
        let footer = self
            .notice
            .clone()
            .unwrap_or_else(|| hint.to_string());

        vec![
            Line::from(first),
            Line::from(Span::styled(detail, secondary)),
            Line::from(Span::styled(footer, secondary.add_modifier(Modifier::ITALIC))),
        ]
    }

    pub(super) fn draw_frame(&mut self, f: &mut Frame) {
        let size = f.size();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(
                Line::from(Span::styled(
                    "dayblocks",
                    Style::default()
                        .fg(self.appearance.main_text)
                        .add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Left),
            )
            .title(
                Line::from(Span::styled(
                    Local::now().format("%H:%M").to_string(),
                    Style::default().fg(self.appearance.main_text),
                ))
                .alignment(Alignment::Right),
            )
            .border_style(Style::default().fg(self.appearance.foreground))
            .style(Style::default().bg(self.appearance.background));

        let inner = block.inner(size);
        f.render_widget(block, size);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(GRID.rows as u16 + 1),
                Constraint::Min(3),
            ])
            .split(inner);

        f.render_widget(Paragraph::new(self.grid_lines()), chunks[0]);
        f.render_widget(Paragraph::new(self.status_lines()), chunks[1]);

        match self.ui_mode {
            UiMode::ActivityModal => self.render_activity_modal(f, size),
            UiMode::PlanModal { load_only } => self.render_plan_modal(f, size, load_only),
            UiMode::Main => {}
        }
    }
}
