//! Site settings record.
//!
//! The CMS plugin keeps every widget option in a single named record. Here it
//! is a JSON file. The widget itself only ever sees the [`WidgetConfig`]
//! derived from it.

use crate::config::{
    default_bot_name, default_primary_color, default_welcome_message, is_hex_color, ConfigError,
    Position, WidgetConfig,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Persisted plugin options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    /// Whether the widget is shown on the site.
    #[serde(default)]
    pub enabled: bool,

    /// Bot identifier issued by the dashboard.
    #[serde(default)]
    pub bot_id: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    #[serde(default = "default_primary_color")]
    pub primary_color: String,

    #[serde(default)]
    pub position: Position,

    /// Page slugs the widget is shown on; `all` means every page.
    #[serde(default = "default_show_on_pages")]
    pub show_on_pages: Vec<String>,

    #[serde(default)]
    pub exclude_pages: Vec<String>,

    #[serde(default)]
    pub custom_css: String,
}

fn default_show_on_pages() -> Vec<String> {
    vec!["all".into()]
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_id: String::new(),
            api_key: String::new(),
            bot_name: default_bot_name(),
            welcome_message: default_welcome_message(),
            primary_color: default_primary_color(),
            position: Position::default(),
            show_on_pages: default_show_on_pages(),
            exclude_pages: Vec::new(),
            custom_css: String::new(),
        }
    }
}

impl SiteSettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(SettingsError::Io)?;
        serde_json::from_str(&content).map_err(SettingsError::Parse)
    }

    /// Save settings to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(self).map_err(SettingsError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SettingsError::Io)?;
        }
        std::fs::write(path, content).map_err(SettingsError::Io)
    }

    /// Normalize user-entered values the way the settings form does on save.
    ///
    /// Text fields are trimmed and an invalid color falls back to the
    /// default. Markup is stripped from the custom CSS, including whole
    /// `<script>` and `<style>` elements. An empty page list means every page.
    #[must_use]
    pub fn sanitize(mut self) -> Self {
        self.bot_id = self.bot_id.trim().to_string();
        self.api_key = self.api_key.trim().to_string();
        self.bot_name = self.bot_name.trim().to_string();
        self.welcome_message = self.welcome_message.trim().to_string();
        self.primary_color = self.primary_color.trim().to_string();
        if !is_hex_color(&self.primary_color) {
            self.primary_color = default_primary_color();
        }
        self.custom_css = strip_tags(&self.custom_css);
        self.show_on_pages = self
            .show_on_pages
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if self.show_on_pages.is_empty() {
            self.show_on_pages = default_show_on_pages();
        }
        self
    }

    /// The save guard: an enabled widget needs a bot identifier.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.enabled && self.bot_id.trim().is_empty() {
            return Err(SettingsError::MissingBotId);
        }
        Ok(())
    }

    /// Build the widget configuration from the appearance fields.
    ///
    /// Blank name or welcome text fall back to the defaults.
    pub fn widget_config(&self) -> Result<WidgetConfig, SettingsError> {
        let or_default = |value: &str, default: fn() -> String| {
            if value.trim().is_empty() {
                default()
            } else {
                value.to_string()
            }
        };
        let config = WidgetConfig {
            bot_name: or_default(&self.bot_name, default_bot_name),
            welcome_message: or_default(&self.welcome_message, default_welcome_message),
            primary_color: self.primary_color.clone(),
            position: self.position,
            custom_css: Some(self.custom_css.clone()).filter(|css| !css.trim().is_empty()),
            ..WidgetConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"))
}

/// `<script>` and `<style>` elements, matched up to their own closing tag.
fn element_res() -> &'static [Regex; 2] {
    static RES: OnceLock<[Regex; 2]> = OnceLock::new();
    RES.get_or_init(|| {
        ["script", "style"].map(|name| {
            Regex::new(&format!(r"(?is)<{name}[^>]*?>.*?</{name}>"))
                .expect("element pattern is valid")
        })
    })
}

/// Remove markup from `input`.
///
/// `<script>` and `<style>` elements go together with their contents. Other
/// tags are dropped and the text between them kept. The result is trimmed.
pub fn strip_tags(input: &str) -> String {
    let mut text = input.to_string();
    for re in element_res() {
        text = re.replace_all(&text, "").into_owned();
    }
    tag_re().replace_all(&text, "").trim().to_string()
}

/// Errors that can occur when working with site settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// I/O error reading or writing settings.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing settings JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing settings to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Widget enabled without a bot identifier.
    #[error("Please enter a Bot ID before enabling the widget")]
    MissingBotId,

    /// Appearance fields do not form a valid widget configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SiteSettings::default();
        assert!(!settings.enabled);
        assert!(settings.bot_id.is_empty());
        assert_eq!(settings.bot_name, "MozBot Assistant");
        assert_eq!(settings.primary_color, "#3B82F6");
        assert_eq!(settings.position, Position::BottomRight);
        assert_eq!(settings.show_on_pages, vec!["all"]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_enabled_without_bot_id_fails() {
        let settings = SiteSettings {
            enabled: true,
            bot_id: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::MissingBotId)
        ));

        let settings = SiteSettings {
            enabled: true,
            bot_id: "bot-42".into(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_sanitize() {
        let settings = SiteSettings {
            bot_id: "  bot-1 ".into(),
            bot_name: " Ava ".into(),
            primary_color: "not-a-color".into(),
            custom_css: "<script>alert(1)</script>.mozbot { color: red; }".into(),
            show_on_pages: vec![" ".into()],
            ..Default::default()
        }
        .sanitize();

        assert_eq!(settings.bot_id, "bot-1");
        assert_eq!(settings.bot_name, "Ava");
        assert_eq!(settings.primary_color, "#3B82F6");
        assert_eq!(settings.custom_css, ".mozbot { color: red; }");
        assert_eq!(settings.show_on_pages, vec!["all"]);
    }

    #[test]
    fn test_widget_config_from_settings() {
        let settings = SiteSettings {
            bot_name: "Ava".into(),
            welcome_message: String::new(),
            primary_color: "#10b981".into(),
            position: Position::TopLeft,
            custom_css: ".x{}".into(),
            ..Default::default()
        };
        let config = settings.widget_config().unwrap();
        assert_eq!(config.bot_name, "Ava");
        assert_eq!(config.welcome_message, "Hello! How can I help you today?");
        assert_eq!(config.primary_color, "#10b981");
        assert_eq!(config.position, Position::TopLeft);
        assert_eq!(config.custom_css.as_deref(), Some(".x{}"));
        assert_eq!(config.reply_delay_ms, 1500);
    }

    #[test]
    fn test_widget_config_rejects_bad_color() {
        let settings = SiteSettings {
            primary_color: "red".into(),
            ..Default::default()
        };
        assert!(matches!(
            settings.widget_config(),
            Err(SettingsError::Config(ConfigError::InvalidColor(_)))
        ));
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".mozbot").join("settings.json");
        let settings = SiteSettings {
            enabled: true,
            bot_id: "bot-7".into(),
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(SiteSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_settings_partial_json() {
        let settings: SiteSettings =
            serde_json::from_str(r#"{"enabled": true, "position": "bottom-left"}"#).unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.position, Position::BottomLeft);
        assert_eq!(settings.welcome_message, "Hello! How can I help you today?");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("a <b>bold</b> move"), "a bold move");
        assert_eq!(strip_tags("no tags"), "no tags");
        assert_eq!(strip_tags("<b\n class=x>body{}"), "body{}");
    }

    #[test]
    fn test_strip_tags_drops_script_and_style_contents() {
        assert_eq!(
            strip_tags("<style>body{}</style>.a{} <script>alert(1)</script>"),
            ".a{}"
        );
        assert_eq!(
            strip_tags("<SCRIPT type=\"text/javascript\">\nx()\n</Script>.b{}<style>p{}</style>"),
            ".b{}"
        );
        assert_eq!(strip_tags(".c{} <script>"), ".c{}");
    }
}
