//! Theme management with localStorage persistence.
//!
//! The controller owns the light/dark state of the page: the root class, the
//! background image chain, the background video source and the toggle
//! control all follow it.

pub mod resolver;
pub mod store;

use std::cell::Cell;
use std::rc::Rc;

use crate::config::{BackgroundConfig, PageConfig};
use crate::host::{Checkbox, ColorScheme, Element, Host, Spawner};
use crate::sound::ClickSound;
use crate::timer::ClassPulse;
use crate::video::BackgroundVideo;

pub use resolver::{Resolution, ResourceResolver};
pub use store::PreferenceStore;

pub const THEME_LIGHT_CLASS: &str = "theme-light";
pub const THEME_TRANSITION_CLASS: &str = "theme-transition";
pub const TOGGLE_ANIMATING_CLASS: &str = "is-animating";
pub const BG_IMAGE_PROPERTY: &str = "--bg-image";

/// Concrete theme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn from_is_light(is_light: bool) -> Self {
        if is_light {
            Theme::Light
        } else {
            Theme::Dark
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self, Theme::Light)
    }

    /// Video element attribute carrying this theme's source URL
    pub fn video_data_attribute(&self) -> &'static str {
        match self {
            Theme::Light => "data-light",
            Theme::Dark => "data-dark",
        }
    }
}

/// Stored preference
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    Unset,
}

impl ThemePreference {
    /// Empty means unset. Any other value that is not "light" reads as dark,
    /// so a stale or foreign value still counts as an explicit choice.
    pub fn parse(s: &str) -> Self {
        match s {
            "" => ThemePreference::Unset,
            "light" => ThemePreference::Light,
            _ => ThemePreference::Dark,
        }
    }

    pub fn theme(&self) -> Option<Theme> {
        match self {
            ThemePreference::Light => Some(Theme::Light),
            ThemePreference::Dark => Some(Theme::Dark),
            ThemePreference::Unset => None,
        }
    }
}

/// Elements the theme controller drives
pub struct ThemeElements {
    /// `<html>`
    pub root: Rc<dyn Element>,
    /// `#theme-toggle` checkbox
    pub toggle: Option<Rc<dyn Checkbox>>,
    /// `.theme-toggle` wrapper that plays the flip animation
    pub toggle_wrap: Option<Rc<dyn Element>>,
    pub video: Option<Rc<BackgroundVideo>>,
}

pub struct ThemeController {
    root: Rc<dyn Element>,
    toggle: Option<Rc<dyn Checkbox>>,
    video: Option<Rc<BackgroundVideo>>,
    store: PreferenceStore,
    color_scheme: Rc<dyn ColorScheme>,
    resolver: Rc<ResourceResolver>,
    spawner: Rc<dyn Spawner>,
    backgrounds: BackgroundConfig,
    transition: ClassPulse,
    toggle_pulse: Option<ClassPulse>,
    sound: ClickSound,
    current: Cell<Theme>,
    /// Set once the visitor picks a theme; system changes are ignored after
    explicit: Cell<bool>,
}

impl ThemeController {
    pub fn new(
        host: &Host,
        elements: ThemeElements,
        config: &PageConfig,
        sound: ClickSound,
    ) -> Self {
        let timing = &config.timing;
        let transition = ClassPulse::new(
            elements.root.clone(),
            THEME_TRANSITION_CLASS,
            timing.theme_transition(),
            host.timers.clone(),
        );
        let toggle_pulse = elements.toggle_wrap.map(|wrap| {
            ClassPulse::new(
                wrap,
                TOGGLE_ANIMATING_CLASS,
                timing.toggle_animation(),
                host.timers.clone(),
            )
        });

        Self {
            root: elements.root,
            toggle: elements.toggle,
            video: elements.video,
            store: PreferenceStore::new(host.storage.clone(), config.storage_key.clone()),
            color_scheme: host.color_scheme.clone(),
            resolver: Rc::new(ResourceResolver::new(host.images.clone())),
            spawner: host.spawner.clone(),
            backgrounds: config.backgrounds.clone(),
            transition,
            toggle_pulse,
            sound,
            current: Cell::new(Theme::default()),
            explicit: Cell::new(false),
        }
    }

    /// Apply the stored theme, or the system one when nothing is stored.
    /// No animation on first paint.
    ///
    /// Returns true when no preference was stored, i.e. the page should keep
    /// following system color-scheme changes.
    pub fn initialize(&self) -> bool {
        let stored = self.store.load();
        let theme = stored
            .theme()
            .unwrap_or_else(|| Theme::from_is_light(self.color_scheme.prefers_light()));

        tracing::info!(
            "Theme initialised: {} ({})",
            theme.as_str(),
            if stored.theme().is_some() { "stored" } else { "system" }
        );
        self.explicit.set(stored.theme().is_some());
        self.set_theme(theme, false);
        !self.explicit.get()
    }

    pub fn set_theme(&self, theme: Theme, animate: bool) {
        if animate {
            self.transition.trigger();
            if let Some(pulse) = &self.toggle_pulse {
                pulse.trigger();
            }
        }

        self.current.set(theme);
        self.root.toggle_class(THEME_LIGHT_CLASS, theme.is_light());
        self.resolve_background(theme);
        if let Some(video) = &self.video {
            video.apply_theme(theme);
        }
        if let Some(toggle) = &self.toggle {
            toggle.set_checked(theme.is_light());
        }
    }

    /// Toggle `change` handler
    pub fn toggle(&self, checked: bool) {
        self.sound.play();
        let theme = Theme::from_is_light(checked);
        self.explicit.set(true);
        self.store.save(theme);
        self.set_theme(theme, true);
    }

    /// System color-scheme `change` handler
    pub fn follow_system(&self, prefers_light: bool) {
        if self.explicit.get() {
            tracing::debug!("Ignoring system scheme change, theme chosen explicitly");
            return;
        }
        self.set_theme(Theme::from_is_light(prefers_light), true);
    }

    pub fn current(&self) -> Theme {
        self.current.get()
    }

    /// Currently applied background image
    pub fn background(&self) -> Option<String> {
        self.resolver.current()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_active()
    }

    fn resolve_background(&self, theme: Theme) {
        let candidates = self.backgrounds.candidates(theme).to_vec();
        let resolver = self.resolver.clone();
        let root = self.root.clone();
        let video = self.video.clone();

        self.spawner.spawn(Box::pin(async move {
            resolver
                .resolve(&candidates, |path| {
                    apply_background(root.as_ref(), video.as_deref(), path)
                })
                .await;
        }));
    }
}

fn apply_background(root: &dyn Element, video: Option<&BackgroundVideo>, path: &str) {
    root.set_style_property(BG_IMAGE_PROPERTY, &format!("url(\"{}\")", path));
    if let Some(video) = video {
        video.set_poster(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::KeyValueStore;
    use crate::sim::{SimElement, SimHost};
    use std::time::Duration;

    struct Fixture {
        sim: SimHost,
        root: Rc<SimElement>,
        toggle: Rc<SimElement>,
        wrap: Rc<SimElement>,
        video: Rc<SimElement>,
        sound: Rc<SimElement>,
        theme: ThemeController,
    }

    fn fixture(sim: SimHost) -> Fixture {
        let root = SimElement::new();
        let toggle = SimElement::new();
        let wrap = SimElement::new();
        let sound = SimElement::new();
        let video = SimElement::new()
            .with_attribute("data-light", "light.mp4")
            .with_attribute("data-dark", "dark.mp4");
        let source = SimElement::new();
        let bg = Rc::new(BackgroundVideo::new(root.clone(), video.clone(), Some(source)));

        let theme = ThemeController::new(
            &sim.host(),
            ThemeElements {
                root: root.clone(),
                toggle: Some(toggle.clone()),
                toggle_wrap: Some(wrap.clone()),
                video: Some(bg),
            },
            &PageConfig::default(),
            ClickSound::new(Some(sound.clone())),
        );
        Fixture {
            sim,
            root,
            toggle,
            wrap,
            video,
            sound,
            theme,
        }
    }

    #[test]
    fn test_theme_parse_roundtrip() {
        assert_eq!(ThemePreference::parse("light").theme(), Some(Theme::Light));
        assert_eq!(ThemePreference::parse("dark").theme(), Some(Theme::Dark));
        assert_eq!(ThemePreference::parse("LIGHT"), ThemePreference::Dark);
        assert_eq!(ThemePreference::parse("sepia"), ThemePreference::Dark);
        assert_eq!(ThemePreference::parse(""), ThemePreference::Unset);
        assert_eq!(Theme::Light.as_str(), "light");
    }

    #[test]
    fn test_initialize_prefers_stored_over_system() {
        let sim = SimHost::new();
        sim.storage.set_item("theme", "dark").unwrap();
        sim.color_scheme.set_prefers_light(true);
        let f = fixture(sim);

        let follow = f.theme.initialize();

        assert!(!follow);
        assert_eq!(f.theme.current(), Theme::Dark);
        assert!(!f.root.has_class(THEME_LIGHT_CLASS));
        assert!(!f.toggle.is_checked());
        // First paint is not animated
        assert!(!f.root.has_class(THEME_TRANSITION_CLASS));
        assert!(!f.wrap.has_class(TOGGLE_ANIMATING_CLASS));
        assert_eq!(f.sound.plays(), 0);
    }

    #[test]
    fn test_initialize_falls_back_to_system_and_follows_it() {
        let sim = SimHost::new();
        sim.color_scheme.set_prefers_light(true);
        let f = fixture(sim);

        assert!(f.theme.initialize());
        assert_eq!(f.theme.current(), Theme::Light);
        assert!(f.root.has_class(THEME_LIGHT_CLASS));
        assert!(f.toggle.is_checked());

        f.theme.follow_system(false);
        assert_eq!(f.theme.current(), Theme::Dark);
        assert!(f.root.has_class(THEME_TRANSITION_CLASS));
        assert_eq!(f.sim.storage.item("theme"), None);
    }

    #[test]
    fn test_explicit_choice_stops_following_system() {
        let f = fixture(SimHost::new());
        f.theme.initialize();

        f.theme.toggle(true);
        f.theme.follow_system(false);
        assert_eq!(f.theme.current(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists_animates_and_clicks() {
        let f = fixture(SimHost::new());
        f.theme.initialize();

        f.theme.toggle(true);

        assert_eq!(f.sim.storage.item("theme").as_deref(), Some("light"));
        assert_eq!(f.sound.plays(), 1);
        assert!(f.root.has_class(THEME_LIGHT_CLASS));
        assert!(f.root.has_class(THEME_TRANSITION_CLASS));
        assert!(f.wrap.has_class(TOGGLE_ANIMATING_CLASS));

        f.sim.advance(Duration::from_millis(360));
        assert!(!f.wrap.has_class(TOGGLE_ANIMATING_CLASS));
        assert!(f.root.has_class(THEME_TRANSITION_CLASS));

        f.sim.advance(Duration::from_millis(90));
        assert!(!f.root.has_class(THEME_TRANSITION_CLASS));
    }

    #[test]
    fn test_rapid_toggles_clear_transition_once_after_last() {
        let f = fixture(SimHost::new());
        f.theme.initialize();

        f.theme.set_theme(Theme::Light, true);
        f.sim.advance(Duration::from_millis(300));
        f.theme.set_theme(Theme::Dark, true);
        let second_call = f.sim.timers.now();

        f.sim.advance(Duration::from_millis(449));
        assert!(f.root.has_class(THEME_TRANSITION_CLASS));
        assert!(f.theme.is_transitioning());

        f.sim.advance(Duration::from_millis(1));
        assert!(!f.root.has_class(THEME_TRANSITION_CLASS));
        assert_eq!(f.sim.timers.now() - second_call, Duration::from_millis(450));
        // One clear for the transition, one for the toggle wrapper
        assert_eq!(f.sim.timers.fired(), 2);
    }

    #[test]
    fn test_background_applied_to_root_and_poster() {
        let sim = SimHost::new();
        sim.images.make_available("background/background.jpg");
        let f = fixture(sim);

        f.theme.initialize();
        f.sim.spawner.run_until_stalled();

        assert_eq!(
            f.root.style(BG_IMAGE_PROPERTY).as_deref(),
            Some("url(\"background/background.jpg\")")
        );
        assert_eq!(
            f.video.attribute("poster").as_deref(),
            Some("background/background.jpg")
        );
        assert_eq!(f.theme.background().as_deref(), Some("background/background.jpg"));
    }

    #[test]
    fn test_missing_light_backgrounds_keep_dark_one() {
        let sim = SimHost::new();
        sim.images.make_available("bacrkgound/background.jpg");
        let f = fixture(sim);
        f.theme.initialize();
        f.sim.spawner.run_until_stalled();

        f.theme.set_theme(Theme::Light, true);
        f.sim.spawner.run_until_stalled();

        assert_eq!(f.theme.current(), Theme::Light);
        assert_eq!(f.theme.background().as_deref(), Some("bacrkgound/background.jpg"));
    }

    #[test]
    fn test_redundant_apply_rechecks_but_keeps_video() {
        let f = fixture(SimHost::new());
        f.theme.initialize();
        f.sim.spawner.run_until_stalled();
        let probes = f.sim.images.probed().len();
        assert_eq!(probes, 3);

        f.theme.set_theme(Theme::Dark, false);
        f.sim.spawner.run_until_stalled();

        assert_eq!(f.sim.images.probed().len(), probes * 2);
        assert_eq!(f.video.reloads(), 1);
    }

    #[test]
    fn test_unavailable_storage_still_switches() {
        let sim = SimHost::new();
        sim.storage.set_unavailable(true);
        let f = fixture(sim);

        assert!(f.theme.initialize());
        f.theme.toggle(true);
        assert_eq!(f.theme.current(), Theme::Light);
    }
}
