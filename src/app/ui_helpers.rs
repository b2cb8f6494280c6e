use std::time::Duration;

pub fn wrap_prev_index(current: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else if current == 0 {
        len - 1
    } else {
        current - 1
    }
}

pub fn wrap_next_index(current: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else if current + 1 >= len {
        0
    } else {
        current + 1
    }
}

pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Centres `text` in a cell `width` columns wide, clipping if it does not fit.
pub fn centre_in_cell(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width).collect();
    let used = clipped.chars().count();
    let left = (width - used) / 2;
    let right = width - used - left;
    format!("{}{}{}", " ".repeat(left), clipped, " ".repeat(right))
}
