use std::time::Instant;

use chrono::Timelike;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    domain::{ActivityCatalog, ActivityId, BlockGrid, ProductiveProgress, productive_progress},
    notify::Notifier,
};

pub mod clock;
pub mod display;
pub mod scheduler;

use clock::{elapsed_blocks, tick_delay};
use display::{BlockAppearance, DisplaySynchronizer};
use scheduler::TickScheduler;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Edit,
    Time,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub changed: bool,
    pub notified: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlannerError {
    #[error("blocks can only be changed in edit mode")]
    NotEditable,
    #[error("unknown activity \"{0}\"")]
    UnknownActivity(String),
}

/// Owns the plan and drives the edit/time display modes.
pub struct Planner {
    grid: BlockGrid,
    catalog: ActivityCatalog,
    mode: Mode,
    display: DisplaySynchronizer,
    scheduler: TickScheduler,
    notifier: Box<dyn Notifier>,
    progress: ProductiveProgress,
}

impl Planner {
    pub fn new(grid: BlockGrid, catalog: ActivityCatalog, notifier: Box<dyn Notifier>) -> Self {
        let mut display = DisplaySynchronizer::new();
        display.apply_edit_display(&grid, &catalog);
        let progress = productive_progress(&grid, &catalog, 0);

        Self {
            grid,
            catalog,
            mode: Mode::Edit,
            display,
            scheduler: TickScheduler::new(),
            notifier,
            progress,
        }
    }

    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    pub fn catalog(&self) -> &ActivityCatalog {
        &self.catalog
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn appearance(&self, row: usize, col: usize) -> &BlockAppearance {
        self.display.applied(row, col)
    }

    /// Productive blocks elapsed over planned, only shown in time mode.
    pub fn productive_readout(&self) -> Option<ProductiveProgress> {
        match self.mode {
            Mode::Time => Some(self.progress),
            Mode::Edit => None,
        }
    }

    pub fn set_cell(&mut self, row: usize, col: usize, id: ActivityId) -> Result<(), PlannerError> {
        if self.mode != Mode::Edit {
            return Err(PlannerError::NotEditable);
        }
        if !self.catalog.contains(&id) {
            return Err(PlannerError::UnknownActivity(id.0));
        }

        debug!(row, col, activity = %id, "linking block");
        self.grid.set(row, col, id);
        self.display
            .apply_edit_cell(&self.grid, &self.catalog, row, col);
        Ok(())
    }

    pub fn replace_grid<T: Timelike>(&mut self, grid: BlockGrid, now: &T) {
        self.grid = grid;
        match self.mode {
            Mode::Edit => self.display.apply_edit_display(&self.grid, &self.catalog),
            Mode::Time => {
                self.sync_pass(now);
            }
        }
    }

    pub fn enter_time_mode<T: Timelike>(&mut self, now: &T, instant: Instant) {
        if self.mode == Mode::Time {
            return;
        }

        info!("entering time mode");
        self.mode = Mode::Time;
        self.sync_pass(now);
        self.scheduler.arm(tick_delay(now), instant);
    }

    pub fn enter_edit_mode(&mut self) {
        if self.mode == Mode::Edit {
            return;
        }

        info!("entering edit mode");
        self.mode = Mode::Edit;
        self.scheduler.cancel();
        self.display.apply_edit_display(&self.grid, &self.catalog);
    }

    pub fn toggle_mode<T: Timelike>(&mut self, now: &T, instant: Instant) {
        match self.mode {
            Mode::Edit => self.enter_time_mode(now, instant),
            Mode::Time => self.enter_edit_mode(),
        }
    }

    /// Runs a scheduled tick if one is due.
    pub fn poll<T: Timelike>(&mut self, now: &T, instant: Instant) -> Option<TickOutcome> {
        if self.scheduler.poll(instant) {
            Some(self.on_tick(now, instant))
        } else {
            None
        }
    }

    pub fn on_tick<T: Timelike>(&mut self, now: &T, instant: Instant) -> TickOutcome {
        if self.mode != Mode::Time {
            return TickOutcome::default();
        }

        let changed = self.sync_pass(now);
        if changed {
            self.notifier.notify();
        }

        let delay = tick_delay(now);
        debug!(changed, delay_secs = delay.as_secs(), "tick");
        self.scheduler.arm(delay, instant);

        TickOutcome {
            changed,
            notified: changed,
        }
    }

    fn sync_pass<T: Timelike>(&mut self, now: &T) -> bool {
        self.progress = productive_progress(&self.grid, &self.catalog, elapsed_blocks(now));
        self.display
            .sync_time_display(&self.grid, &self.catalog, now)
    }
}
