use ratatui::style::Color;

use crate::model::config::{ThemeVariant, UiConfig};
use crate::model::task::Priority;
use crate::notify::Severity;

/// Parsed color theme for the TUI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub variant: ThemeVariant,
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub cyan: Color,
    pub selection_bg: Color,
}

impl Theme {
    /// Neutral terminal palette
    pub fn plain() -> Self {
        Theme {
            variant: ThemeVariant::Plain,
            background: Color::Reset,
            text: Color::Gray,
            text_bright: Color::White,
            highlight: Color::Blue,
            dim: Color::DarkGray,
            red: Color::Red,
            yellow: Color::Yellow,
            green: Color::Green,
            cyan: Color::Cyan,
            selection_bg: Color::Rgb(0x26, 0x32, 0x48),
        }
    }

    /// Dark purple background with saturated accents
    pub fn neon() -> Self {
        Theme {
            variant: ThemeVariant::Neon,
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            text: Color::Rgb(0xB0, 0xAA, 0xFF),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x7D, 0x78, 0xBF),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            green: Color::Rgb(0x44, 0xFF, 0x88),
            cyan: Color::Rgb(0x44, 0xDD, 0xFF),
            selection_bg: Color::Rgb(0x3D, 0x14, 0x38),
        }
    }

    /// Theme for the configured variant with `[ui.colors]` overrides applied.
    /// Unknown slots and malformed colors are ignored.
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = match ui.theme {
            ThemeVariant::Plain => Theme::plain(),
            ThemeVariant::Neon => Theme::neon(),
        };
        for (key, value) in &ui.colors {
            let Some(color) = parse_hex_color(value) else {
                continue;
            };
            let slot = match key.as_str() {
                "background" => &mut theme.background,
                "text" => &mut theme.text,
                "text_bright" => &mut theme.text_bright,
                "highlight" => &mut theme.highlight,
                "dim" => &mut theme.dim,
                "red" => &mut theme.red,
                "yellow" => &mut theme.yellow,
                "green" => &mut theme.green,
                "cyan" => &mut theme.cyan,
                "selection_bg" => &mut theme.selection_bg,
                _ => continue,
            };
            *slot = color;
        }
        theme
    }

    pub fn priority_color(&self, priority: Priority) -> Color {
        match priority {
            Priority::High => self.red,
            Priority::Medium => self.yellow,
            Priority::Low => self.green,
        }
    }

    pub fn severity_color(&self, severity: Severity) -> Color {
        match severity {
            Severity::Success => self.green,
            Severity::Error => self.red,
            Severity::Warning => self.yellow,
            Severity::Info => self.cyan,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::plain()
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF4444"), Some(Color::Rgb(0xFF, 0x44, 0x44)));
        assert_eq!(parse_hex_color("FF4444"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }

    #[test]
    fn test_variant_and_overrides() {
        let mut ui = UiConfig::default();
        assert_eq!(Theme::from_config(&ui), Theme::plain());

        ui.theme = ThemeVariant::Neon;
        ui.colors.insert("highlight".into(), "#00FF00".into());
        ui.colors.insert("bogus".into(), "#000000".into());
        ui.colors.insert("red".into(), "crimson".into());
        let theme = Theme::from_config(&ui);
        assert_eq!(theme.variant, ThemeVariant::Neon);
        assert_eq!(theme.highlight, Color::Rgb(0x00, 0xFF, 0x00));
        assert_eq!(theme.red, Theme::neon().red);
    }
}
