use std::time::Duration;

use chrono::Timelike;

use crate::constants::{BLOCK_COUNT, GRID, TIME_SETTINGS};

/// Number of blocks whose end time has passed today. A block only completes
/// at its closing boundary, so 23:50-23:59 yields 143 and midnight resets to 0.
pub fn elapsed_blocks<T: Timelike>(time: &T) -> usize {
    let blocks = time.hour() as usize * GRID.cols
        + (time.minute() / GRID.minutes_per_block) as usize;
    blocks.min(BLOCK_COUNT)
}

/// Delay until one second past the next ten-minute boundary.
pub fn tick_delay<T: Timelike>(time: &T) -> Duration {
    let interval = TIME_SETTINGS.interval_minutes as i64;
    let minute = time.minute() as i64;
    let second = time.second().min(59) as i64;

    let delay = (interval - minute % interval) * 60 - 60
        + (60 - second)
        + TIME_SETTINGS.safety_margin_secs;

    Duration::from_secs(delay.max(TIME_SETTINGS.min_delay_secs) as u64)
}

pub fn block_start_label(row: usize, col: usize) -> String {
    format!("{:02}:{}0", row % GRID.rows, col)
}

/// `HH:MM-HH:MM` for a block; the final block of the day ends at `00:00`.
pub fn block_label(row: usize, col: usize) -> String {
    let (end_row, end_col) = if col + 1 == GRID.cols {
        ((row + 1) % GRID.rows, 0)
    } else {
        (row, col + 1)
    };
    format!(
        "{}-{}",
        block_start_label(row, col),
        block_start_label(end_row, end_col)
    )
}
