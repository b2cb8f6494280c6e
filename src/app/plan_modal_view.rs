use ratatui::prelude::{Line, Span};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState},
};

use super::{App, view_style};

impl App {
    pub(super) fn render_plan_modal(&self, f: &mut Frame, terminal_size: Rect, load_only: bool) {
        let modal_rect = self.modal_rect(terminal_size);
        let text = self.appearance.secondary_text;
        let highlight = view_style::highlight_style(Color::White);

        let mut items: Vec<ListItem> = self
            .plan_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let current = self.current_plan.as_deref() == Some(name.as_str());
                let label = if current {
                    format!("{} (current)", name)
                } else {
                    name.clone()
                };
                let item = ListItem::new(Line::from(Span::raw(label)));
                if i == self.plan_index {
                    item.style(highlight)
                } else {
                    item.style(Style::default().fg(text))
                }
            })
            .collect();

        if !load_only {
            let label = if self.save_name.is_empty() {
                "+ Save as...".to_string()
            } else {
                format!("+ Save as: {}", self.save_name)
            };
            let item = ListItem::new(Line::from(Span::raw(label)));
            items.push(if self.is_on_save_row() {
                item.style(highlight)
            } else {
                item.style(Style::default().fg(text))
            });
        }

        let title = if load_only {
            "Choose a plan"
        } else {
            "Save / Load"
        };

        let mut list_state = ListState::default();
        list_state.select(Some(self.plan_index));

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(Line::from(Span::styled(title, Style::default().fg(text))))
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(self.appearance.foreground))
                    .style(Style::default().bg(self.appearance.background)),
            )
            .highlight_style(Style::default());

        f.render_widget(Clear, modal_rect);
        f.render_stateful_widget(list, modal_rect, &mut list_state);
    }
}
