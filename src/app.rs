use std::{
    io,
    time::{Duration, Instant},
};

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use tracing::{info, warn};

use crate::{
    constants::{GRID, TIME_SETTINGS},
    domain::BlockGrid,
    engine::Planner,
    notify::{Notifier, SilentNotifier, SoundNotifier},
    settings::Appearance,
    storage::{self, DataPaths, PlanDiscovery, StorageError},
};

mod activity_modal_view;
mod event_handlers;
mod plan_modal_view;
mod plan_state;
mod render_views;
mod ui_helpers;
mod view_style;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UiMode {
    Main,
    ActivityModal,
    PlanModal { load_only: bool },
}

struct App {
    planner: Planner,
    appearance: Appearance,
    paths: DataPaths,
    ui_mode: UiMode,
    cursor_row: usize,
    cursor_col: usize,
    picker_index: usize,
    plan_names: Vec<String>,
    plan_index: usize,
    save_name: String,
    current_plan: Option<String>,
    notice: Option<String>,
    render_needed: bool,
}

impl App {
    fn new(paths: DataPaths, mute: bool) -> Result<Self, StorageError> {
        paths.ensure_dirs()?;
        let settings = storage::load_or_create_settings(&paths.settings)?;
        let appearance = settings.appearance();
        let catalog = settings.catalog();

        let notifier: Box<dyn Notifier> = if mute {
            Box::new(SilentNotifier)
        } else {
            Box::new(SoundNotifier::new(paths.tunes_dir.clone()))
        };

        let mut app = Self {
            planner: Planner::new(BlockGrid::new(), catalog, notifier),
            appearance,
            paths,
            ui_mode: UiMode::Main,
            cursor_row: 0,
            cursor_col: 0,
            picker_index: 0,
            plan_names: Vec::new(),
            plan_index: 0,
            save_name: String::new(),
            current_plan: None,
            notice: None,
            render_needed: true,
        };

        match storage::discover_plans(&app.paths.plans_dir) {
            PlanDiscovery::None => {}
            PlanDiscovery::Single(name) => app.load_plan(&name),
            PlanDiscovery::Multiple(_) => app.open_plan_modal(true),
        }

        Ok(app)
    }

    fn open_activity_modal(&mut self) {
        let current = self.planner.grid().get(self.cursor_row, self.cursor_col);
        self.picker_index = self
            .planner
            .catalog()
            .choices()
            .iter()
            .position(|activity| &activity.id == current)
            .unwrap_or(0);
        self.ui_mode = UiMode::ActivityModal;
        self.render_needed = true;
    }

    fn open_plan_modal(&mut self, load_only: bool) {
        self.plan_names = storage::list_plans(&self.paths.plans_dir);
        self.plan_index = if load_only || self.plan_names.is_empty() {
            0
        } else {
            self.plan_names.len()
        };
        self.save_name = self.current_plan.clone().unwrap_or_default();
        self.ui_mode = UiMode::PlanModal { load_only };
        self.render_needed = true;
    }

    fn close_modal(&mut self) {
        self.ui_mode = UiMode::Main;
        self.render_needed = true;
    }

    fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
        self.render_needed = true;
    }

    fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let rows = GRID.rows as isize;
        let cols = GRID.cols as isize;
        self.cursor_row = (self.cursor_row as isize + d_row).rem_euclid(rows) as usize;
        self.cursor_col = (self.cursor_col as isize + d_col).rem_euclid(cols) as usize;
        self.render_needed = true;
    }

    /// Half the terminal, centred, at least ten rows tall when it fits.
    fn modal_rect(&self, terminal_size: Rect) -> Rect {
        let target_width = terminal_size.width / 2;
        let target_height = (terminal_size.height / 2).max(10);

        let max_width = terminal_size.width.saturating_sub(2).max(1);
        let max_height = terminal_size.height.saturating_sub(2).max(1);

        let modal_width = target_width.clamp(1, max_width);
        let modal_height = target_height.clamp(1, max_height);

        let modal_x = (terminal_size.width.saturating_sub(modal_width)) / 2;
        let modal_y = (terminal_size.height.saturating_sub(modal_height)) / 2;

        Rect::new(modal_x, modal_y, modal_width, modal_height)
    }
}

pub fn run_ui(paths: DataPaths, mute: bool) -> io::Result<()> {
    let mut app = App::new(paths, mute).map_err(io::Error::other)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let poll_rate = Duration::from_millis(TIME_SETTINGS.poll_ms);
    let clock_rate = Duration::from_secs(1);
    let mut last_clock = Instant::now();

    info!("ui started");
    let result = loop {
        if let Some(outcome) = app.planner.poll(&Local::now(), Instant::now()) {
            if outcome.changed {
                app.render_needed = true;
            }
        }

        if last_clock.elapsed() >= clock_rate {
            app.render_needed = true;
            last_clock = Instant::now();
        }

        if app.render_needed {
            if let Err(e) = terminal.draw(|f| app.draw_frame(f)) {
                break Err(e);
            }
            app.render_needed = false;
        }

        match event::poll(poll_rate) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) {
                        break Ok(());
                    }
                }
                Ok(Event::Resize(_, _)) => app.render_needed = true,
                Ok(_) => {}
                Err(e) => break Err(e),
            },
            Ok(false) => {}
            Err(e) => break Err(e),
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        warn!(error = %e, "ui loop stopped");
    }
    result
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf, time::SystemTime};

    use super::*;

    #[test]
    fn test_modal_rect_is_centred_half() {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = PathBuf::from(format!("/tmp/dayblocks_modal_rect_{}", now));
        let app = App::new(DataPaths::in_dir(&dir), true).unwrap();

        assert_eq!(app.modal_rect(Rect::new(0, 0, 80, 40)), Rect::new(20, 10, 40, 20));
        assert_eq!(app.modal_rect(Rect::new(0, 0, 40, 12)), Rect::new(10, 1, 20, 10));
        assert_eq!(app.modal_rect(Rect::new(0, 0, 10, 6)), Rect::new(2, 1, 5, 4));

        fs::remove_dir_all(dir).ok();
    }
}
