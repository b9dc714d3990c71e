//! Pricing disclosure panel (accordion).
//!
//! Closed <-> Open. The open height is the panel's natural content height
//! measured at the moment it is applied, so it follows responsive reflow
//! on resize.

use std::cell::Cell;
use std::rc::Rc;

use crate::host::Element;
use crate::sound::ClickSound;

pub const PANEL_OPEN_CLASS: &str = "is-open";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

pub struct DisclosurePanel {
    toggle: Rc<dyn Element>,
    panel: Rc<dyn Element>,
    sound: ClickSound,
    state: Cell<PanelState>,
}

impl DisclosurePanel {
    pub fn new(toggle: Rc<dyn Element>, panel: Rc<dyn Element>, sound: ClickSound) -> Self {
        Self {
            toggle,
            panel,
            sound,
            state: Cell::new(PanelState::Closed),
        }
    }

    pub fn state(&self) -> PanelState {
        self.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state.get() == PanelState::Open
    }

    pub fn set_open(&self, open: bool) {
        let state = if open {
            PanelState::Open
        } else {
            PanelState::Closed
        };
        self.state.set(state);
        self.toggle
            .set_attribute("aria-expanded", if open { "true" } else { "false" });
        self.panel.toggle_class(PANEL_OPEN_CLASS, open);
        if open {
            self.apply_natural_height();
        } else {
            self.panel.set_style_property("max-height", "0px");
        }
    }

    /// Toggle button `click` handler
    pub fn on_toggle_click(&self) {
        self.sound.play();
        self.set_open(!self.is_open());
    }

    /// Window `resize` handler
    pub fn on_resize(&self) {
        if self.is_open() {
            self.apply_natural_height();
        }
    }

    fn apply_natural_height(&self) {
        let height = self.panel.scroll_height();
        self.panel
            .set_style_property("max-height", &format!("{}px", height));
    }
}
