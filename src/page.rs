//! Page assembly - builds every component from the elements found on the
//! page and routes host events to them.
//!
//! Each feature is independent: a missing element disables that feature only.

use std::rc::Rc;

use crate::buttons::{ClickEvent, ClickOutcome, GlassButton};
use crate::clock::{ClockElements, ClockFormat, LiveClock};
use crate::config::PageConfig;
use crate::host::{Checkbox, Element, Host, Media, Sound};
use crate::panel::DisclosurePanel;
use crate::reveal::RevealOnClick;
use crate::sound::ClickSound;
use crate::theme::{ThemeController, ThemeElements};
use crate::video::BackgroundVideo;

/// Elements located on the page. Everything except the root is optional.
pub struct PageElements {
    pub root: Rc<dyn Element>,
    pub video: Option<Rc<dyn Media>>,
    pub video_source: Option<Rc<dyn Element>>,
    pub theme_toggle: Option<Rc<dyn Checkbox>>,
    pub toggle_wrap: Option<Rc<dyn Element>>,
    pub meta_reveal: Option<Rc<dyn Element>>,
    pub clock: ClockElements,
    pub price_toggle: Option<Rc<dyn Element>>,
    pub price_panel: Option<Rc<dyn Element>>,
    pub click_sound: Option<Rc<dyn Sound>>,
    pub buttons: Vec<Rc<dyn Element>>,
}

impl PageElements {
    /// Page with only a root element
    pub fn bare(root: Rc<dyn Element>) -> Self {
        Self {
            root,
            video: None,
            video_source: None,
            theme_toggle: None,
            toggle_wrap: None,
            meta_reveal: None,
            clock: ClockElements::default(),
            price_toggle: None,
            price_panel: None,
            click_sound: None,
            buttons: Vec::new(),
        }
    }
}

/// What the host glue still has to wire after boot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootReport {
    /// Subscribe to system color-scheme changes
    pub follow_system: bool,
}

pub struct Page {
    host: Host,
    config: PageConfig,
    theme: ThemeController,
    video: Option<Rc<BackgroundVideo>>,
    clock: Option<Rc<LiveClock>>,
    panel: Option<DisclosurePanel>,
    reveal: Option<RevealOnClick>,
    buttons: Vec<GlassButton>,
}

impl Page {
    pub fn new(host: Host, elements: PageElements, config: PageConfig) -> Self {
        let sound = ClickSound::new(elements.click_sound);

        let video = elements.video.map(|video| {
            Rc::new(BackgroundVideo::new(
                elements.root.clone(),
                video,
                elements.video_source,
            ))
        });

        let theme = ThemeController::new(
            &host,
            ThemeElements {
                root: elements.root.clone(),
                toggle: elements.theme_toggle,
                toggle_wrap: elements.toggle_wrap,
                video: video.clone(),
            },
            &config,
            sound.clone(),
        );

        let clock = (elements.clock.hh_mm.is_some() || elements.clock.date.is_some()).then(|| {
            Rc::new(LiveClock::new(
                elements.clock,
                ClockFormat::from_config_lossy(&config.clock),
            ))
        });

        let panel = match (elements.price_toggle, elements.price_panel) {
            (Some(toggle), Some(panel)) => {
                Some(DisclosurePanel::new(toggle, panel, sound.clone()))
            }
            _ => None,
        };

        let reveal = elements
            .meta_reveal
            .map(|el| RevealOnClick::new(el, sound.clone()));

        let buttons = elements
            .buttons
            .into_iter()
            .map(|el| {
                GlassButton::new(
                    el,
                    sound.clone(),
                    host.navigator.clone(),
                    host.timers.clone(),
                    config.timing.navigation_delay(),
                )
            })
            .collect();

        Self {
            host,
            config,
            theme,
            video,
            clock,
            panel,
            reveal,
            buttons,
        }
    }

    /// Apply the initial theme, start the clock, collapse the panel and
    /// kick off video playback.
    pub fn boot(&self) -> BootReport {
        let follow_system = self.theme.initialize();

        if let Some(clock) = &self.clock {
            clock
                .clone()
                .start(self.host.timers.as_ref(), self.config.timing.clock_interval());
        }
        if let Some(panel) = &self.panel {
            panel.set_open(false);
        }
        if let Some(video) = &self.video {
            video.try_play();
        }

        tracing::debug!(
            "Page booted: {} buttons, clock={}, panel={}, video={}",
            self.buttons.len(),
            self.clock.is_some(),
            self.panel.is_some(),
            self.video.is_some()
        );
        BootReport { follow_system }
    }

    // ---- event routing ----

    pub fn on_theme_toggle(&self, checked: bool) {
        self.theme.toggle(checked);
    }

    pub fn on_system_scheme_change(&self, prefers_light: bool) {
        self.theme.follow_system(prefers_light);
    }

    pub fn on_reveal_click(&self) {
        if let Some(reveal) = &self.reveal {
            reveal.on_click();
        }
    }

    pub fn on_price_toggle_click(&self) {
        if let Some(panel) = &self.panel {
            panel.on_toggle_click();
        }
    }

    pub fn on_resize(&self) {
        if let Some(panel) = &self.panel {
            panel.on_resize();
        }
    }

    pub fn on_button_pointer_move(&self, index: usize, client_x: f64, client_y: f64) {
        if let Some(button) = self.buttons.get(index) {
            button.on_pointer_move(client_x, client_y);
        }
    }

    pub fn on_button_pointer_leave(&self, index: usize) {
        if let Some(button) = self.buttons.get(index) {
            button.on_pointer_leave();
        }
    }

    pub fn on_button_click(&self, index: usize, event: &ClickEvent) -> ClickOutcome {
        self.buttons
            .get(index)
            .map_or(ClickOutcome::Ignored, |button| button.on_click(event))
    }

    pub fn on_video_can_play(&self) {
        if let Some(video) = &self.video {
            video.on_can_play();
        }
    }

    pub fn on_user_gesture(&self) {
        if let Some(video) = &self.video {
            video.on_user_gesture();
        }
    }

    // ---- accessors ----

    pub fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub fn panel(&self) -> Option<&DisclosurePanel> {
        self.panel.as_ref()
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_clock(&self) -> bool {
        self.clock.is_some()
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }
}
