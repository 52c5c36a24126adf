//! Colours for the terminal display.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::SeverityBand;

/// Color and style theme for the terminal display.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Colour of the reading text.
    pub text: Color,
    /// Colour of the trend line.
    pub trace: Color,
    pub normal: Color,
    pub warning: Color,
    pub critical: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for the panel title.
    pub title: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            text: Color::White,
            trace: Color::Cyan,
            normal: Color::Green,
            warning: Color::Yellow,
            critical: Color::Red,
            border: Color::Gray,
            title: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            text: Color::Black,
            trace: Color::Blue,
            normal: Color::Green,
            warning: Color::Yellow,
            critical: Color::Red,
            border: Color::DarkGray,
            title: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a severity band
    pub fn band_style(&self, band: SeverityBand) -> Style {
        match band {
            SeverityBand::Normal => Style::default().fg(self.normal),
            SeverityBand::Warning => Style::default().fg(self.warning),
            SeverityBand::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }
}
