//! Click feedback sound shared by every interactive element.

use std::rc::Rc;

use crate::host::Sound;

/// Optional `#click-sound`. Absent sound or refused playback are no-ops.
#[derive(Clone, Default)]
pub struct ClickSound {
    sound: Option<Rc<dyn Sound>>,
}

impl ClickSound {
    pub fn new(sound: Option<Rc<dyn Sound>>) -> Self {
        Self { sound }
    }

    pub fn play(&self) {
        let Some(sound) = &self.sound else { return };
        if let Err(e) = sound.play_from_start() {
            tracing::debug!("Click sound not played: {}", e);
        }
    }
}
