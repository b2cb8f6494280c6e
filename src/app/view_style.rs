use ratatui::style::{Color, Modifier, Style};

pub(super) fn text_color_for_bg(bg_color: Color) -> Color {
    if let Color::Rgb(r, g, b) = bg_color {
        let brightness = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
        if brightness > 128 {
            Color::Black
        } else {
            Color::White
        }
    } else {
        Color::White
    }
}

pub(super) fn block_style(bg_color: Color, selected: bool) -> Style {
    let style = Style::default().bg(bg_color).fg(text_color_for_bg(bg_color));
    if selected {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

pub(super) fn highlight_style(bg_color: Color) -> Style {
    Style::default()
        .fg(text_color_for_bg(bg_color))
        .bg(bg_color)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_color_contrasts_with_background() {
        assert_eq!(text_color_for_bg(Color::Rgb(255, 255, 255)), Color::Black);
        assert_eq!(text_color_for_bg(Color::Rgb(0, 0, 0)), Color::White);
        assert_eq!(text_color_for_bg(Color::Reset), Color::White);
    }
}
