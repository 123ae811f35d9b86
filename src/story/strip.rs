//! The horizontally scrolling highlight strip: its appearance settings and a
//! plain-text rendering used by the CLI.

use owo_colors::{OwoColorize, Rgb};
use serde::{Deserialize, Serialize};

use super::Story;

/// Longest display name shown under an avatar before it is ellipsized.
const MAX_NAME_CHARS: usize = 12;

/// Appearance of the highlight strip and its cells.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StripAppearance {
    /// Height of the strip, which is also the cell height.
    /// Default: 100
    pub cell_height: f64,
    /// Colour of the name under each avatar.
    pub display_name_color: String,
    /// Ring colour for unseen highlights; None uses the accent colour.
    pub border_color: Option<String>,
    /// Ring width; 0 draws no ring.
    pub border_width: f64,
    pub show_scroll_indicators: bool,
}

impl Default for StripAppearance {
    fn default() -> Self {
        Self {
            cell_height: 100.0,
            display_name_color: "black".to_string(),
            border_color: None,
            border_width: 0.0,
            show_scroll_indicators: false,
        }
    }
}

impl StripAppearance {
    pub fn validate(&self) -> Result<(), String> {
        if !self.cell_height.is_finite() || self.cell_height <= 0.0 {
            return Err(format!(
                "strip.cell_height must be positive, got {}",
                self.cell_height
            ));
        }
        if !self.border_width.is_finite() || self.border_width < 0.0 {
            return Err(format!(
                "strip.border_width must not be negative, got {}",
                self.border_width
            ));
        }
        if parse_color(&self.display_name_color).is_none() {
            return Err(format!(
                "strip.display_name_color is not a colour: {}",
                self.display_name_color
            ));
        }
        if let Some(border) = &self.border_color {
            if parse_color(border).is_none() {
                return Err(format!("strip.border_color is not a colour: {border}"));
            }
        }
        Ok(())
    }
}

/// Parse `#rrggbb` or one of a handful of colour names.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        return Some(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?));
    }
    let rgb = match value.to_ascii_lowercase().as_str() {
        "black" => Rgb(0, 0, 0),
        "white" => Rgb(255, 255, 255),
        "gray" | "grey" => Rgb(107, 114, 128),
        "red" => Rgb(239, 68, 68),
        "green" => Rgb(34, 197, 94),
        "blue" => Rgb(59, 130, 246),
        "cyan" => Rgb(34, 211, 238),
        "pink" => Rgb(236, 72, 153),
        _ => return None,
    };
    Some(rgb)
}

/// Renders the strip as one line of indexed highlight cells.
#[derive(Debug, Clone)]
pub struct StripView {
    appearance: StripAppearance,
    use_color: bool,
    accent: Rgb,
    muted: Rgb,
}

impl StripView {
    pub fn new(appearance: StripAppearance) -> Self {
        Self {
            appearance,
            use_color: false,
            accent: Rgb(236, 72, 153),
            muted: Rgb(107, 114, 128),
        }
    }

    /// Enable or disable ANSI colour in the output.
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.use_color = enabled;
        self
    }

    /// Ring marker for a cell: filled for unseen, hollow for seen.
    pub fn marker(story: &Story) -> &'static str {
        if story.seen {
            "○"
        } else {
            "◉"
        }
    }

    pub fn render(&self, stories: &[Story]) -> String {
        if stories.is_empty() {
            return "(no highlights)".to_string();
        }

        let ring = self
            .appearance
            .border_color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(self.accent);
        let name_color = parse_color(&self.appearance.display_name_color).unwrap_or(self.muted);

        let cells: Vec<String> = stories
            .iter()
            .enumerate()
            .map(|(index, story)| {
                let marker = Self::marker(story);
                let name = truncate(&story.display_name, MAX_NAME_CHARS);
                if !self.use_color {
                    return format!("[{index}] {marker} {name}");
                }
                let marker = if story.seen {
                    marker.color(self.muted).to_string()
                } else {
                    marker.color(ring).bold().to_string()
                };
                format!("[{index}] {marker} {}", name.color(name_color))
            })
            .collect();

        let mut line = cells.join("  ");
        if self.appearance.show_scroll_indicators && stories.len() > 1 {
            line.push_str(" ›");
        }
        line
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stories() -> Vec<Story> {
        let mut seen = Story::new("b", "Beta");
        seen.seen = true;
        vec![Story::new("a", "Alpha"), seen]
    }

    #[test]
    fn test_default_appearance_matches_strip_layout() {
        let appearance = StripAppearance::default();
        assert_eq!(appearance.cell_height, 100.0);
        assert_eq!(appearance.border_width, 0.0);
        assert!(appearance.border_color.is_none());
        assert!(!appearance.show_scroll_indicators);
        assert!(appearance.validate().is_ok());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff8000"), Some(Rgb(255, 128, 0)));
        assert_eq!(parse_color("Black"), Some(Rgb(0, 0, 0)));
        assert!(parse_color("#ff80").is_none());
        assert!(parse_color("#gg0000").is_none());
        assert!(parse_color("mauve").is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let height = StripAppearance {
            cell_height: 0.0,
            ..Default::default()
        };
        assert!(height.validate().unwrap_err().contains("cell_height"));

        let border = StripAppearance {
            border_color: Some("nope".into()),
            ..Default::default()
        };
        assert!(border.validate().unwrap_err().contains("border_color"));
    }

    #[test]
    fn test_render_plain() {
        let view = StripView::new(StripAppearance::default());
        assert_eq!(view.render(&stories()), "[0] ◉ Alpha  [1] ○ Beta");
    }

    #[test]
    fn test_render_empty() {
        let view = StripView::new(StripAppearance::default());
        assert_eq!(view.render(&[]), "(no highlights)");
    }

    #[test]
    fn test_render_scroll_indicator() {
        let view = StripView::new(StripAppearance {
            show_scroll_indicators: true,
            ..Default::default()
        });
        assert!(view.render(&stories()).ends_with(" ›"));
    }

    #[test]
    fn test_render_colored_keeps_names() {
        let view = StripView::new(StripAppearance::default()).with_color(true);
        let output = view.render(&stories());
        assert!(output.contains("Alpha"));
        assert!(output.contains("\u{1b}["));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 12), "short");
        assert_eq!(truncate("Ünïcödé-strip-name", 8), "Ünïcödé…");
    }
}
