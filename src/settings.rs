use indexmap::IndexMap;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Activity, ActivityCatalog, ActivityId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    pub appearance: AppearanceSettings,
    /// Kept in file order, which is also the picker order.
    #[serde(default)]
    pub activities: IndexMap<String, ActivitySettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppearanceSettings {
    pub main_text_colour: String,
    pub select_window_text_colour: String,
    pub background_colour: String,
    pub foreground_colour: String,
    pub unlinked_colour: String,
    pub button_size: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySettings {
    pub icon: String,
    pub colour: String,
    #[serde(default)]
    pub productive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appearance {
    pub main_text: Color,
    pub secondary_text: Color,
    pub background: Color,
    pub foreground: Color,
    pub unlinked: Color,
    pub block_size: u16,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            main_text_colour: "#ffffff".to_string(),
            select_window_text_colour: "#ffffff".to_string(),
            background_colour: "#3d3d3d".to_string(),
            foreground_colour: "#3d3d3d".to_string(),
            unlinked_colour: "#999999".to_string(),
            button_size: 4,
        }
    }
}

impl Default for SettingsDocument {
    fn default() -> Self {
        let defaults: [(&str, &str, &str, bool); 10] = [
            ("Sleep", "☾", "#000075", false),
            ("Work", "⚒", "#808000", true),
            ("Break", "◷", "#f032e6", false),
            ("Planning", "▦", "#800000", true),
            ("Exercise", "⚑", "#f58231", false),
            ("Read", "▤", "#e6194b", false),
            ("Eat", "✚", "#3cb44b", false),
            ("Shower", "≈", "#4363d8", false),
            ("Movie", "▶", "#911eb4", false),
            ("Hobby", "✎", "#9a6324", false),
        ];

        let activities = defaults
            .into_iter()
            .map(|(name, icon, colour, productive)| {
                (
                    name.to_string(),
                    ActivitySettings {
                        icon: icon.to_string(),
                        colour: colour.to_string(),
                        productive,
                    },
                )
            })
            .collect();

        Self {
            appearance: AppearanceSettings::default(),
            activities,
        }
    }
}

fn parse_colour(raw: &str, fallback: &str, field: &str) -> Color {
    raw.trim().parse::<Color>().unwrap_or_else(|_| {
        warn!(field, value = raw, "unrecognised colour, using default");
        fallback.parse::<Color>().unwrap_or(Color::Gray)
    })
}

impl SettingsDocument {
    pub fn appearance(&self) -> Appearance {
        let defaults = AppearanceSettings::default();
        let a = &self.appearance;
        Appearance {
            main_text: parse_colour(&a.main_text_colour, &defaults.main_text_colour, "main_text_colour"),
            secondary_text: parse_colour(
                &a.select_window_text_colour,
                &defaults.select_window_text_colour,
                "select_window_text_colour",
            ),
            background: parse_colour(
                &a.background_colour,
                &defaults.background_colour,
                "background_colour",
            ),
            foreground: parse_colour(
                &a.foreground_colour,
                &defaults.foreground_colour,
                "foreground_colour",
            ),
            unlinked: parse_colour(&a.unlinked_colour, &defaults.unlinked_colour, "unlinked_colour"),
            block_size: a.button_size.max(2),
        }
    }

    pub fn catalog(&self) -> ActivityCatalog {
        let activities = self
            .activities
            .iter()
            .map(|(name, settings)| Activity {
                id: ActivityId::new(name.clone()),
                color: parse_colour(&settings.colour, "#808080", name),
                icon: settings.icon.chars().take(2).collect(),
                productive: settings.productive,
            })
            .collect();

        ActivityCatalog::new(activities, self.appearance().unlinked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document_has_ten_activities() {
        let doc = SettingsDocument::default();
        assert_eq!(doc.activities.len(), 10);

        let catalog = doc.catalog();
        assert!(catalog.is_productive(&ActivityId::new("Work")));
        assert!(catalog.is_productive(&ActivityId::new("Planning")));
        assert!(!catalog.is_productive(&ActivityId::new("Sleep")));
        assert_eq!(
            catalog.resolve(&ActivityId::new("Sleep")).color,
            Color::Rgb(0, 0, 0x75)
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let doc = SettingsDocument::default();
        let text = toml::to_string_pretty(&doc).unwrap();
        assert!(text.contains("[appearance]"));

        let parsed: SettingsDocument = toml::from_str(&text).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_bad_colour_falls_back() {
        let mut doc = SettingsDocument::default();
        doc.appearance.unlinked_colour = "not-a-colour".to_string();
        doc.appearance.button_size = 0;

        let appearance = doc.appearance();
        assert_eq!(appearance.unlinked, Color::Rgb(0x99, 0x99, 0x99));
        assert_eq!(appearance.block_size, 2);
        assert_eq!(doc.catalog().unlinked().color, appearance.unlinked);
    }

    #[test]
    fn test_activities_keep_file_order() {
        let text = r##"
[appearance]
main_text_colour = "#ffffff"
select_window_text_colour = "#ffffff"
background_colour = "#3d3d3d"
foreground_colour = "#3d3d3d"
unlinked_colour = "#999999"
button_size = 4

[activities.Work]
icon = "W"
colour = "#808000"
productive = true

[activities.Break]
icon = "B"
colour = "#f032e6"
productive = false

[activities.Admin]
icon = "A"
colour = "#800000"
productive = false
"##;
        let doc: SettingsDocument = toml::from_str(text).unwrap();
        let catalog = doc.catalog();
        let names: Vec<&str> = catalog
            .choices()
            .iter()
            .map(|activity| activity.id.as_str())
            .collect();
        assert_eq!(names, vec!["-1", "Work", "Break", "Admin"]);

        let written = toml::to_string_pretty(&doc).unwrap();
        let work = written.find("[activities.Work]").unwrap();
        let admin = written.find("[activities.Admin]").unwrap();
        assert!(work < admin);
    }
}
