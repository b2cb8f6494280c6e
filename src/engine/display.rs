use chrono::Timelike;
use ratatui::style::Color;

use crate::{
    constants::{BLOCK_COUNT, ELAPSED_COLOR, GRID},
    domain::{ActivityCatalog, BlockGrid, block_index},
};

use super::clock::elapsed_blocks;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockAppearance {
    pub color: Color,
    pub icon: String,
}

impl BlockAppearance {
    pub fn elapsed() -> Self {
        Self {
            color: ELAPSED_COLOR,
            icon: String::new(),
        }
    }
}

pub fn edit_appearance(
    grid: &BlockGrid,
    catalog: &ActivityCatalog,
    row: usize,
    col: usize,
) -> BlockAppearance {
    let activity = catalog.resolve(grid.get(row, col));
    BlockAppearance {
        color: activity.color,
        icon: activity.icon.clone(),
    }
}

pub fn time_appearance(
    grid: &BlockGrid,
    catalog: &ActivityCatalog,
    row: usize,
    col: usize,
    elapsed: usize,
) -> BlockAppearance {
    if block_index(row, col) <= elapsed {
        BlockAppearance::elapsed()
    } else {
        edit_appearance(grid, catalog, row, col)
    }
}

/// Last-applied appearance per block. Only used to tell whether a sync pass
/// changed anything and to hand the presentation layer what to draw.
#[derive(Debug, Clone)]
pub struct DisplaySynchronizer {
    applied: Vec<Option<BlockAppearance>>,
    blank: BlockAppearance,
}

impl Default for DisplaySynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySynchronizer {
    pub fn new() -> Self {
        Self {
            applied: vec![None; BLOCK_COUNT],
            blank: BlockAppearance {
                color: Color::Reset,
                icon: String::new(),
            },
        }
    }

    pub fn applied(&self, row: usize, col: usize) -> &BlockAppearance {
        self.applied[row * GRID.cols + col]
            .as_ref()
            .unwrap_or(&self.blank)
    }

    fn apply(&mut self, row: usize, col: usize, target: BlockAppearance) -> bool {
        let slot = &mut self.applied[row * GRID.cols + col];
        if slot.as_ref() == Some(&target) {
            return false;
        }
        *slot = Some(target);
        true
    }

    pub fn apply_edit_display(&mut self, grid: &BlockGrid, catalog: &ActivityCatalog) {
        for row in 0..GRID.rows {
            for col in 0..GRID.cols {
                self.applied[row * GRID.cols + col] =
                    Some(edit_appearance(grid, catalog, row, col));
            }
        }
    }

    pub fn apply_edit_cell(
        &mut self,
        grid: &BlockGrid,
        catalog: &ActivityCatalog,
        row: usize,
        col: usize,
    ) {
        self.apply(row, col, edit_appearance(grid, catalog, row, col));
    }

    /// Applies the time render to every block whose target differs from what
    /// was last applied. Returns true iff at least one block changed.
    pub fn sync_time_display<T: Timelike>(
        &mut self,
        grid: &BlockGrid,
        catalog: &ActivityCatalog,
        now: &T,
    ) -> bool {
        let elapsed = elapsed_blocks(now);
        let mut changed = false;
        for row in 0..GRID.rows {
            for col in 0..GRID.cols {
                let target = time_appearance(grid, catalog, row, col, elapsed);
                changed |= self.apply(row, col, target);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::domain::{ActivityId, block_position, tests::sample_catalog};

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn scenario_grid() -> BlockGrid {
        let mut grid = BlockGrid::new();
        grid.fill(1..74, &ActivityId::new("Work"));
        grid
    }

    #[test]
    fn test_edit_render_ignores_time() {
        let catalog = sample_catalog();
        let grid = scenario_grid();

        let mut morning = DisplaySynchronizer::new();
        morning.apply_edit_display(&grid, &catalog);
        let mut night = DisplaySynchronizer::new();
        night.sync_time_display(&grid, &catalog, &at(23, 55));
        night.apply_edit_display(&grid, &catalog);

        for row in 0..GRID.rows {
            for col in 0..GRID.cols {
                assert_eq!(morning.applied(row, col), night.applied(row, col));
            }
        }
        assert_eq!(morning.applied(0, 0).icon, "W");
    }

    #[test]
    fn test_time_render_marks_elapsed_regardless_of_activity() {
        let catalog = sample_catalog();
        let grid = scenario_grid();
        let mut sync = DisplaySynchronizer::new();

        assert!(sync.sync_time_display(&grid, &catalog, &at(12, 20)));

        for index in 1..=74 {
            let (row, col) = block_position(index);
            assert_eq!(sync.applied(row, col), &BlockAppearance::elapsed());
        }
        for index in 75..=144 {
            let (row, col) = block_position(index);
            assert_eq!(sync.applied(row, col).color, catalog.unlinked().color);
        }
    }

    #[test]
    fn test_second_sync_without_change_reports_false() {
        let catalog = sample_catalog();
        let grid = scenario_grid();
        let mut sync = DisplaySynchronizer::new();

        assert!(sync.sync_time_display(&grid, &catalog, &at(9, 0)));
        assert!(!sync.sync_time_display(&grid, &catalog, &at(9, 0)));
        assert!(!sync.sync_time_display(&grid, &catalog, &at(9, 9)));
        assert!(sync.sync_time_display(&grid, &catalog, &at(9, 10)));
    }

    #[test]
    fn test_crossing_into_same_looking_block_is_still_a_change() {
        let catalog = sample_catalog();
        let grid = BlockGrid::new();
        let mut sync = DisplaySynchronizer::new();

        sync.sync_time_display(&grid, &catalog, &at(3, 0));
        assert!(sync.sync_time_display(&grid, &catalog, &at(3, 10)));
    }

    #[test]
    fn test_midnight_rollover_restores_planned_blocks() {
        let catalog = sample_catalog();
        let grid = scenario_grid();
        let mut sync = DisplaySynchronizer::new();

        sync.sync_time_display(&grid, &catalog, &at(23, 59));
        assert!(sync.sync_time_display(&grid, &catalog, &at(0, 0)));
        assert_eq!(sync.applied(0, 0).icon, "W");
        assert_eq!(sync.applied(23, 5).color, catalog.unlinked().color);
    }
}
