use std::time::Instant;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};

use crate::{domain::ActivityId, engine::Mode};

use super::{App, UiMode, ui_helpers};

impl App {
    pub(super) fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.ui_mode {
            UiMode::ActivityModal => {
                self.handle_activity_modal_key(key);
                false
            }
            UiMode::PlanModal { load_only } => {
                self.handle_plan_modal_key(key, load_only);
                false
            }
            UiMode::Main => self.handle_normal_key(key),
        }
    }

    fn handle_activity_modal_key(&mut self, key: KeyEvent) {
        let choices = self.planner.catalog().choices().len();

        match key.code {
            KeyCode::Esc => self.close_modal(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.picker_index = ui_helpers::wrap_prev_index(self.picker_index, choices);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.picker_index = ui_helpers::wrap_next_index(self.picker_index, choices);
            }
            KeyCode::Enter => {
                let chosen = self
                    .planner
                    .catalog()
                    .choices()
                    .get(self.picker_index)
                    .map(|activity| activity.id.clone());
                if let Some(id) = chosen {
                    self.link_selected_block(id);
                }
                self.close_modal();
            }
            _ => {}
        }

        self.render_needed = true;
    }

    fn handle_plan_modal_key(&mut self, key: KeyEvent, load_only: bool) {
        let rows = if load_only {
            self.plan_names.len()
        } else {
            self.plan_names.len() + 1
        };

        match key.code {
            KeyCode::Esc => {
                if load_only {
                    self.set_notice("Starting with an empty plan");
                }
                self.close_modal();
            }
            KeyCode::Up => {
                self.plan_index = ui_helpers::wrap_prev_index(self.plan_index, rows);
            }
            KeyCode::Down => {
                self.plan_index = ui_helpers::wrap_next_index(self.plan_index, rows);
            }
            KeyCode::Enter => {
                if self.is_on_save_row() {
                    if !load_only && !self.save_name.trim().is_empty() && self.save_plan() {
                        self.close_modal();
                    }
                } else if let Some(name) = self.plan_names.get(self.plan_index).cloned() {
                    self.load_plan(&name);
                    self.close_modal();
                }
            }
            KeyCode::Char(c) if !load_only && self.is_on_save_row() => {
                self.save_name.push(c);
            }
            KeyCode::Backspace if !load_only && self.is_on_save_row() => {
                self.save_name.pop();
            }
            _ => {}
        }

        self.render_needed = true;
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        let editing = self.planner.mode() == Mode::Edit;

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1, 0),
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(0, -1),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(0, 1),
            KeyCode::Enter if editing => self.open_activity_modal(),
            KeyCode::Char('x') | KeyCode::Delete if editing => {
                self.link_selected_block(ActivityId::unlinked());
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                self.planner.toggle_mode(&Local::now(), Instant::now());
                self.notice = None;
                self.render_needed = true;
            }
            KeyCode::Char('s') | KeyCode::Char('S') => self.open_plan_modal(false),
            _ => {}
        }

        false
    }
}
