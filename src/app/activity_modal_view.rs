use ratatui::prelude::{Line, Span};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Style, Stylize},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState},
};

use crate::engine::clock::block_label;

use super::{App, view_style};

impl App {
    pub(super) fn render_activity_modal(&self, f: &mut Frame, terminal_size: Rect) {
        let modal_rect = self.modal_rect(terminal_size);
        let choices = self.planner.catalog().choices();
        let text = self.appearance.secondary_text;

        let items: Vec<ListItem> = choices
            .iter()
            .enumerate()
            .map(|(i, activity)| {
                let marker = if activity.productive { "★" } else { " " };
                let line = Line::from(vec![
                    Span::raw("● ").fg(activity.color),
                    Span::raw(activity.label().to_string()),
                    Span::raw(format!(" {}", marker)),
                ]);

                if i == self.picker_index {
                    ListItem::new(line).style(view_style::highlight_style(activity.color))
                } else {
                    ListItem::new(line).style(Style::default().fg(text))
                }
            })
            .collect();

        let border_color = choices
            .get(self.picker_index)
            .map(|activity| activity.color)
            .unwrap_or(self.appearance.foreground);

        let mut list_state = ListState::default();
        list_state.select(Some(self.picker_index));

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(Line::from(Span::styled(
                        format!(
                            "Activity for {}",
                            block_label(self.cursor_row, self.cursor_col)
                        ),
                        Style::default().fg(text),
                    )))
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(border_color))
                    .style(Style::default().bg(self.appearance.background)),
            )
            .highlight_style(Style::default());

        f.render_widget(Clear, modal_rect);
        f.render_stateful_widget(list, modal_rect, &mut list_state);
    }
}
