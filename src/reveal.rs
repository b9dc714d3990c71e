//! One-way reveal for the `.meta-reveal` block.

use std::rc::Rc;

use crate::host::Element;
use crate::sound::ClickSound;

pub const REVEALED_CLASS: &str = "is-revealed";

pub struct RevealOnClick {
    element: Rc<dyn Element>,
    sound: ClickSound,
}

impl RevealOnClick {
    pub fn new(element: Rc<dyn Element>, sound: ClickSound) -> Self {
        Self { element, sound }
    }

    pub fn on_click(&self) {
        self.sound.play();
        self.element.add_class(REVEALED_CLASS);
    }

    pub fn is_revealed(&self) -> bool {
        self.element.has_class(REVEALED_CLASS)
    }
}
