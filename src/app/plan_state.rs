use chrono::Local;

use crate::{domain::ActivityId, storage};

use super::App;

impl App {
    pub(super) fn load_plan(&mut self, name: &str) {
        match storage::load_plan(&self.paths.plans_dir, name, self.planner.catalog()) {
            Ok(grid) => {
                self.planner.replace_grid(grid, &Local::now());
                self.current_plan = Some(name.to_string());
                self.set_notice(format!("Loaded {}", name));
            }
            Err(e) => self.set_notice(format!("Error: {}", e)),
        }
    }

    pub(super) fn save_plan(&mut self) -> bool {
        let name = self.save_name.trim().to_string();
        match storage::save_plan(&self.paths.plans_dir, &name, self.planner.grid()) {
            Ok(_) => {
                self.current_plan = Some(name.clone());
                self.set_notice(format!("Saved {}", name));
                true
            }
            Err(e) => {
                self.set_notice(format!("Error: {}", e));
                false
            }
        }
    }

    pub(super) fn link_selected_block(&mut self, id: ActivityId) {
        if let Err(e) = self
            .planner
            .set_cell(self.cursor_row, self.cursor_col, id)
        {
            self.set_notice(format!("Error: {}", e));
        }
        self.render_needed = true;
    }

    pub(super) fn is_on_save_row(&self) -> bool {
        self.plan_index == self.plan_names.len()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf, time::SystemTime};

    use super::*;
    use crate::{domain::BlockGrid, storage::DataPaths};

    fn unique_dir(prefix: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        PathBuf::from(format!("/tmp/{}_{}", prefix, now))
    }

    #[test]
    fn test_failed_load_keeps_previous_plan() {
        let dir = unique_dir("dayblocks_app_failed_load");
        let mut app = App::new(DataPaths::in_dir(&dir), true).unwrap();

        let mut grid = BlockGrid::new();
        grid.fill(49..61, &ActivityId::new("Work"));
        storage::save_plan(&app.paths.plans_dir, "weekday", &grid).unwrap();
        app.load_plan("weekday");
        assert_eq!(app.planner.grid(), &grid);
        assert_eq!(app.current_plan.as_deref(), Some("weekday"));

        let mut doc = BlockGrid::new().serialize();
        doc.remove("23");
        fs::write(
            app.paths.plans_dir.join("broken.toml"),
            toml::to_string(&doc).unwrap(),
        )
        .unwrap();

        app.load_plan("broken");
        assert_eq!(app.planner.grid(), &grid);
        assert_eq!(app.current_plan.as_deref(), Some("weekday"));
        let notice = app.notice.clone().unwrap_or_default();
        assert!(notice.starts_with("Error:"), "{}", notice);
        assert!(notice.contains("23"), "{}", notice);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_single_saved_plan_loads_at_startup() {
        let dir = unique_dir("dayblocks_app_single_plan");
        let paths = DataPaths::in_dir(&dir);
        let mut grid = BlockGrid::new();
        grid.fill(1..7, &ActivityId::new("Sleep"));
        storage::save_plan(&paths.plans_dir, "rest", &grid).unwrap();

        let app = App::new(paths, true).unwrap();
        assert_eq!(app.current_plan.as_deref(), Some("rest"));
        assert_eq!(app.planner.grid(), &grid);

        fs::remove_dir_all(dir).ok();
    }
}
