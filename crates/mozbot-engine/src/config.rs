//! Configuration types for the mozbot widget.
//!
//! [`WidgetConfig`] holds the display and behavior parameters a session is
//! created with. It is validated once, when the session is constructed, and
//! never changes afterwards.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Display and behavior parameters for one embedded widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Name shown in the panel header and on the launcher.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// Text of the bot message the log is seeded with.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Accent color as a `#RGB` or `#RRGGBB` hex string.
    #[serde(default = "default_primary_color")]
    pub primary_color: String,

    /// Screen corner the widget is anchored to.
    #[serde(default)]
    pub position: Position,

    /// Extra style text supplied by the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,

    /// Simulated thinking delay before a canned reply lands.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,

    /// Delay after opening before the input field is focused.
    #[serde(default = "default_focus_delay_ms")]
    pub focus_delay_ms: u64,
}

pub(crate) fn default_bot_name() -> String {
    "MozBot Assistant".into()
}

pub(crate) fn default_welcome_message() -> String {
    "Hello! How can I help you today?".into()
}

pub(crate) fn default_primary_color() -> String {
    "#3B82F6".into()
}

fn default_reply_delay_ms() -> u64 {
    1500
}

fn default_focus_delay_ms() -> u64 {
    300
}

/// Screen corner the widget is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl Position {
    /// All positions, in the order the settings page lists them.
    pub const ALL: [Position; 4] = [
        Position::BottomRight,
        Position::BottomLeft,
        Position::TopRight,
        Position::TopLeft,
    ];

    /// Whether the widget hugs the top edge.
    pub fn is_top(self) -> bool {
        matches!(self, Self::TopRight | Self::TopLeft)
    }

    /// Whether the widget hugs the left edge.
    pub fn is_left(self) -> bool {
        matches!(self, Self::BottomLeft | Self::TopLeft)
    }

    /// Kebab-case name, as stored in settings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
            Self::TopRight => "top-right",
            Self::TopLeft => "top-left",
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Position {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ConfigError::InvalidPosition(s.to_string()))
    }
}

impl WidgetConfig {
    /// Check the invariants a session relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_name.trim().is_empty() {
            return Err(ConfigError::EmptyBotName);
        }
        if self.welcome_message.trim().is_empty() {
            return Err(ConfigError::EmptyWelcomeMessage);
        }
        if !is_hex_color(&self.primary_color) {
            return Err(ConfigError::InvalidColor(self.primary_color.clone()));
        }
        Ok(())
    }

    /// Accent color as RGB components.
    ///
    /// Returns `None` when the color is not a valid hex string.
    pub fn accent_rgb(&self) -> Option<(u8, u8, u8)> {
        parse_hex_color(&self.primary_color)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            welcome_message: default_welcome_message(),
            primary_color: default_primary_color(),
            position: Position::default(),
            custom_css: None,
            reply_delay_ms: default_reply_delay_ms(),
            focus_delay_ms: default_focus_delay_ms(),
        }
    }
}

fn hex_color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex color pattern is valid")
    })
}

/// Check whether `s` is a `#RGB` or `#RRGGBB` color.
pub fn is_hex_color(s: &str) -> bool {
    hex_color_re().is_match(s)
}

/// Parse a `#RGB` or `#RRGGBB` color into components.
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    if !is_hex_color(s) {
        return None;
    }
    let digits = &s[1..];
    if digits.len() == 3 {
        // #abc is shorthand for #aabbcc
        let nibble = |i: usize| u8::from_str_radix(&digits[i..=i], 16).ok().map(|d| d * 17);
        Some((nibble(0)?, nibble(1)?, nibble(2)?))
    } else {
        let component = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some((component(0)?, component(2)?, component(4)?))
    }
}

/// Errors that can occur when working with widget configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Accent color is not a hex color.
    #[error("Invalid color: {0:?} (expected #RGB or #RRGGBB)")]
    InvalidColor(String),

    /// Position is not one of the four corners.
    #[error("Invalid position: {0:?}")]
    InvalidPosition(String),

    #[error("Bot name must not be empty")]
    EmptyBotName,

    #[error("Welcome message must not be empty")]
    EmptyWelcomeMessage,
}
