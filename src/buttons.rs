//! Glass buttons: pointer-following glow and delayed navigation on click.
//!
//! A plain click plays the click sound, restarts the press animation and
//! navigates once the animation had time to show. Modified clicks
//! (open in new tab, download, ...) are left to the browser.

use std::rc::Rc;
use std::time::Duration;

use crate::host::{Element, Navigator, Timers};
use crate::sound::ClickSound;

pub const PRESSED_CLASS: &str = "is-pressed";
pub const POINTER_X_PROPERTY: &str = "--mx";
pub const POINTER_Y_PROPERTY: &str = "--my";

/// The parts of a DOM click the button cares about
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickEvent {
    pub default_prevented: bool,
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl ClickEvent {
    pub fn has_modifier(&self) -> bool {
        self.meta || self.ctrl || self.shift || self.alt
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Browser default applies
    Ignored,
    /// Caller must `preventDefault()`; navigation is scheduled
    Handled,
}

pub struct GlassButton {
    element: Rc<dyn Element>,
    sound: ClickSound,
    navigator: Rc<dyn Navigator>,
    timers: Rc<dyn Timers>,
    delay: Duration,
}

impl GlassButton {
    pub fn new(
        element: Rc<dyn Element>,
        sound: ClickSound,
        navigator: Rc<dyn Navigator>,
        timers: Rc<dyn Timers>,
        delay: Duration,
    ) -> Self {
        Self {
            element,
            sound,
            navigator,
            timers,
            delay,
        }
    }

    /// `pointermove` handler: glow position as a percentage of the box
    pub fn on_pointer_move(&self, client_x: f64, client_y: f64) {
        let rect = self.element.bounding_rect();
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let x = (client_x - rect.left) / rect.width * 100.0;
        let y = (client_y - rect.top) / rect.height * 100.0;
        self.element
            .set_style_property(POINTER_X_PROPERTY, &format!("{}%", x));
        self.element
            .set_style_property(POINTER_Y_PROPERTY, &format!("{}%", y));
    }

    /// `pointerleave` handler
    pub fn on_pointer_leave(&self) {
        self.element.remove_style_property(POINTER_X_PROPERTY);
        self.element.remove_style_property(POINTER_Y_PROPERTY);
    }

    pub fn on_click(&self, event: &ClickEvent) -> ClickOutcome {
        if event.default_prevented || event.has_modifier() {
            return ClickOutcome::Ignored;
        }
        let Some(href) = self.element.attribute("href").filter(|h| !h.is_empty()) else {
            return ClickOutcome::Ignored;
        };

        self.sound.play();
        self.element.remove_class(PRESSED_CLASS);
        self.element.force_reflow();
        self.element.add_class(PRESSED_CLASS);

        let new_tab = self.element.attribute("target").as_deref() == Some("_blank");
        let navigator = self.navigator.clone();
        let navigate = Box::new(move || {
            let result = if new_tab {
                navigator.open_new(&href)
            } else {
                navigator.assign(&href)
            };
            if let Err(e) = result {
                tracing::warn!("{}", e);
            }
        });
        if let Err(e) = self.timers.set_timeout(self.delay, navigate) {
            tracing::warn!("Navigation not scheduled: {}", e);
        }
        ClickOutcome::Handled
    }
}
