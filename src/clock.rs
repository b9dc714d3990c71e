//! Live clock: HH:MM, seconds and a localized short date, refreshed on an
//! interval.

use chrono::{DateTime, FixedOffset, Local, Locale, TimeZone};
use std::fmt::Display;
use std::rc::Rc;
use std::time::Duration;

use crate::config::ClockConfig;
use crate::error::PageError;
use crate::host::{Element, Timers};

const FALLBACK_LOCALE: Locale = Locale::ru_RU;

#[derive(Clone, Debug)]
pub struct ClockFormat {
    pub date_pattern: String,
    pub locale: Locale,
    pub lowercase: bool,
}

impl ClockFormat {
    pub fn from_config(config: &ClockConfig) -> Result<Self, PageError> {
        let locale = Locale::try_from(config.locale.as_str())
            .map_err(|_| PageError::UnknownLocale(config.locale.clone()))?;
        Ok(Self {
            date_pattern: config.date_pattern.clone(),
            locale,
            lowercase: config.lowercase,
        })
    }

    /// Like `from_config`, but an unknown locale falls back to ru_RU
    pub fn from_config_lossy(config: &ClockConfig) -> Self {
        Self::from_config(config).unwrap_or_else(|e| {
            tracing::warn!("{}, using {:?}", e, FALLBACK_LOCALE);
            Self {
                date_pattern: config.date_pattern.clone(),
                locale: FALLBACK_LOCALE,
                lowercase: config.lowercase,
            }
        })
    }
}

impl Default for ClockFormat {
    fn default() -> Self {
        Self::from_config_lossy(&ClockConfig::default())
    }
}

/// Formatted clock text for one instant
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockReading {
    pub hh_mm: String,
    pub ss: String,
    pub date: String,
}

impl ClockReading {
    pub fn at<Tz>(now: &DateTime<Tz>, format: &ClockFormat) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut date = strip_period(
            &now.format_localized(&format.date_pattern, format.locale)
                .to_string(),
        );
        if format.lowercase {
            date = date.to_lowercase();
        }
        Self {
            hh_mm: now.format("%H:%M").to_string(),
            ss: now.format("%S").to_string(),
            date,
        }
    }
}

/// Drop the abbreviation period some locales put after short month names
/// ("окт." -> "окт")
pub fn strip_period(text: &str) -> String {
    text.replacen('.', "", 1)
}

/// Clock text targets; each is optional
#[derive(Default)]
pub struct ClockElements {
    pub hh_mm: Option<Rc<dyn Element>>,
    pub ss: Option<Rc<dyn Element>>,
    pub date: Option<Rc<dyn Element>>,
}

impl ClockElements {
    fn is_empty(&self) -> bool {
        self.hh_mm.is_none() && self.date.is_none()
    }
}

type NowFn = Box<dyn Fn() -> DateTime<FixedOffset>>;

pub struct LiveClock {
    elements: ClockElements,
    format: ClockFormat,
    now: NowFn,
}

impl LiveClock {
    pub fn new(elements: ClockElements, format: ClockFormat) -> Self {
        Self::with_now(elements, format, Box::new(|| Local::now().fixed_offset()))
    }

    /// Clock reading time from `now` instead of the system clock
    pub fn with_now(elements: ClockElements, format: ClockFormat, now: NowFn) -> Self {
        Self {
            elements,
            format,
            now,
        }
    }

    pub fn tick(&self) {
        if self.elements.is_empty() {
            return;
        }
        let reading = ClockReading::at(&(self.now)(), &self.format);

        if let Some(el) = &self.elements.hh_mm {
            el.set_text(&reading.hh_mm);
        }
        if let Some(el) = &self.elements.ss {
            el.set_text(&reading.ss);
        }
        if let Some(el) = &self.elements.date {
            el.set_text(&reading.date);
        }
    }

    /// Tick now, then every `period` for the life of the page
    pub fn start(self: Rc<Self>, timers: &dyn Timers, period: Duration) {
        self.tick();
        if let Err(e) = timers.set_interval(period, Box::new(move || self.tick())) {
            tracing::warn!("Clock not scheduled: {}", e);
        }
    }
}
