//! Page configuration
//!
//! Everything is defaulted, so a page without a config blob gets the stock
//! landing page behaviour. A page may override any field with an inline
//! `<script type="application/json" id="glass-config">` block.

use serde::Deserialize;
use std::time::Duration;

use crate::error::PageError;
use crate::theme::Theme;

/// DOM id of the optional inline JSON config block
pub const CONFIG_ELEMENT_ID: &str = "glass-config";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// localStorage key holding "light" / "dark"
    pub storage_key: String,

    pub backgrounds: BackgroundConfig,

    pub timing: TimingConfig,

    pub clock: ClockConfig,

    pub selectors: Selectors,

    /// tracing-subscriber EnvFilter directive
    pub log_filter: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            storage_key: "theme".to_string(),
            backgrounds: BackgroundConfig::default(),
            timing: TimingConfig::default(),
            clock: ClockConfig::default(),
            selectors: Selectors::default(),
            log_filter: "glass_landing=info".to_string(),
        }
    }
}

impl PageConfig {
    /// Parse a JSON config blob. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, PageError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Config from an optional inline blob, falling back to defaults when the
    /// blob is absent, blank or malformed.
    pub fn from_blob(blob: Option<&str>) -> Self {
        match blob.map(str::trim) {
            None | Some("") => Self::default(),
            Some(json) => Self::from_json(json).unwrap_or_else(|e| {
                tracing::warn!("Ignoring page config: {}", e);
                Self::default()
            }),
        }
    }
}

/// Ordered background image candidates per theme
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub light: Vec<String>,
    pub dark: Vec<String>,
}

impl BackgroundConfig {
    pub fn candidates(&self, theme: Theme) -> &[String] {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        // The misspelled directory is what the deployed page actually ships.
        let dark = [
            "bacrkgound/background.jpg",
            "background/background.jpg",
            "background.jpg",
        ];
        let light = [
            "bacrkgound/background_light.jpg",
            "bacrkgound/background-light.jpg",
            "background_light.jpg",
            "background-light.jpg",
            "light_background.jpg",
            "light-background.jpg",
            "background.jpg",
        ];
        Self {
            light: light.iter().map(|s| s.to_string()).collect(),
            dark: dark.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Durations in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub theme_transition_ms: u64,
    pub toggle_animation_ms: u64,
    pub navigation_delay_ms: u64,
    pub clock_interval_ms: u64,
}

impl TimingConfig {
    pub fn theme_transition(&self) -> Duration {
        Duration::from_millis(self.theme_transition_ms)
    }

    pub fn toggle_animation(&self) -> Duration {
        Duration::from_millis(self.toggle_animation_ms)
    }

    pub fn navigation_delay(&self) -> Duration {
        Duration::from_millis(self.navigation_delay_ms)
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            theme_transition_ms: 450,
            toggle_animation_ms: 360,
            navigation_delay_ms: 320,
            clock_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// chrono strftime pattern for the date line
    pub date_pattern: String,
    /// POSIX locale name, e.g. "ru_RU"
    pub locale: String,
    /// Lowercase the date line; Russian short dates are written "вт, 07 окт"
    pub lowercase: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            date_pattern: "%a, %d %b".to_string(),
            locale: "ru_RU".to_string(),
            lowercase: true,
        }
    }
}

/// CSS selectors for the elements the page script enhances
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub glass_buttons: String,
    pub video: String,
    pub theme_toggle: String,
    pub toggle_wrap: String,
    pub meta_reveal: String,
    pub clock_hh_mm: String,
    pub clock_ss: String,
    pub clock_date: String,
    pub price_toggle: String,
    pub price_panel: String,
    pub click_sound: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            glass_buttons: ".glass-btn".to_string(),
            video: ".bg-video".to_string(),
            theme_toggle: "#theme-toggle".to_string(),
            toggle_wrap: ".theme-toggle".to_string(),
            meta_reveal: ".meta-reveal".to_string(),
            clock_hh_mm: "#clock-hhmm".to_string(),
            clock_ss: "#clock-ss".to_string(),
            clock_date: "#clock-date".to_string(),
            price_toggle: ".price-toggle".to_string(),
            price_panel: ".price-panel".to_string(),
            click_sound: "#click-sound".to_string(),
        }
    }
}
