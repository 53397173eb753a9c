//! Colors and styles for the widget.
//!
//! Everything is neutral except the accent, which comes from the widget
//! configuration and tints the header, launcher and bot messages.

use mozbot_engine::WidgetConfig;
use ratatui::style::{Color, Modifier, Style};

/// Fixed colors.
pub struct Palette;

impl Palette {
    pub const BG: Color = Color::Rgb(255, 255, 255);
    pub const FG: Color = Color::Rgb(55, 65, 81);
    pub const DIM: Color = Color::Rgb(156, 163, 175);
    pub const ON_ACCENT: Color = Color::Rgb(255, 255, 255);
    pub const USER_BG: Color = Color::Rgb(243, 244, 246);
    pub const BORDER: Color = Color::Rgb(209, 213, 219);

    /// Fallback accent (#3B82F6).
    pub const ACCENT: Color = Color::Rgb(59, 130, 246);
}

/// Style set for one widget, derived from its accent color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Palette::ACCENT,
        }
    }
}

impl Theme {
    pub fn from_config(config: &WidgetConfig) -> Self {
        let accent = config
            .accent_rgb()
            .map_or(Palette::ACCENT, |(r, g, b)| Color::Rgb(r, g, b));
        Self { accent }
    }

    /// Panel background and body text.
    pub fn base(&self) -> Style {
        Style::default().fg(Palette::FG).bg(Palette::BG)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(Palette::DIM).bg(Palette::BG)
    }

    /// Header bar and launcher button.
    pub fn header(&self) -> Style {
        Style::default()
            .fg(Palette::ON_ACCENT)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header_status(&self) -> Style {
        Style::default().fg(Palette::ON_ACCENT).bg(self.accent)
    }

    pub fn bot_message(&self) -> Style {
        Style::default().fg(Palette::ON_ACCENT).bg(self.accent)
    }

    pub fn user_message(&self) -> Style {
        Style::default().fg(Palette::FG).bg(Palette::USER_BG)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(Palette::BORDER).bg(Palette::BG)
    }

    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.accent).bg(Palette::BG)
    }

    /// Send marker; dimmed while the send control is disabled.
    pub fn send(&self, enabled: bool) -> Style {
        if enabled {
            Style::default()
                .fg(self.accent)
                .bg(Palette::BG)
                .add_modifier(Modifier::BOLD)
        } else {
            self.dim()
        }
    }
}
