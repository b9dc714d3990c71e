//! Background video: theme-dependent source and autoplay handling.

use std::rc::Rc;

use crate::host::{Element, Media};
use crate::theme::Theme;

/// Root class set once the current source can play
pub const VIDEO_READY_CLASS: &str = "video-ready";

pub struct BackgroundVideo {
    root: Rc<dyn Element>,
    video: Rc<dyn Media>,
    /// The `<source>` child; without it the source is never swapped
    source: Option<Rc<dyn Element>>,
}

impl BackgroundVideo {
    pub fn new(
        root: Rc<dyn Element>,
        video: Rc<dyn Media>,
        source: Option<Rc<dyn Element>>,
    ) -> Self {
        Self {
            root,
            video,
            source,
        }
    }

    /// Source URL for a theme from `data-light` / `data-dark`
    pub fn source_for(&self, theme: Theme) -> Option<String> {
        self.video.attribute(theme.video_data_attribute())
    }

    pub fn current_source(&self) -> Option<String> {
        self.source.as_ref().and_then(|s| s.attribute("src"))
    }

    pub fn apply_theme(&self, theme: Theme) {
        if let Some(src) = self.source_for(theme) {
            self.set_source(&src);
        }
    }

    /// Swap the source and restart playback. Same source is a no-op so the
    /// running video is not interrupted.
    pub fn set_source(&self, src: &str) {
        let Some(source) = &self.source else { return };
        if src.is_empty() || source.attribute("src").as_deref() == Some(src) {
            return;
        }

        tracing::debug!("Background video source -> {}", src);
        self.root.remove_class(VIDEO_READY_CLASS);
        source.set_attribute("src", src);
        self.video.reload();
        self.try_play();
    }

    pub fn set_poster(&self, path: &str) {
        self.video.set_attribute("poster", path);
    }

    /// Fire-and-forget playback attempt
    pub fn try_play(&self) {
        self.video.play();
    }

    /// `canplay` handler
    pub fn on_can_play(&self) {
        self.root.add_class(VIDEO_READY_CLASS);
    }

    /// First pointerdown / touchstart: browsers that blocked autoplay allow
    /// playback after a gesture
    pub fn on_user_gesture(&self) {
        self.try_play();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimElement;

    fn setup() -> (Rc<SimElement>, Rc<SimElement>, Rc<SimElement>, BackgroundVideo) {
        let root = SimElement::new();
        let video = SimElement::new()
            .with_attribute("data-light", "light.mp4")
            .with_attribute("data-dark", "dark.mp4");
        let source = SimElement::new();
        let bg = BackgroundVideo::new(root.clone(), video.clone(), Some(source.clone()));
        (root, video, source, bg)
    }

    #[test]
    fn test_theme_source_swap() {
        let (root, video, source, bg) = setup();
        root.add_class(VIDEO_READY_CLASS);

        bg.apply_theme(Theme::Light);
        assert_eq!(source.attribute("src").as_deref(), Some("light.mp4"));
        assert!(!root.has_class(VIDEO_READY_CLASS));
        assert_eq!(video.reloads(), 1);
        assert_eq!(video.plays(), 1);

        bg.on_can_play();
        assert!(root.has_class(VIDEO_READY_CLASS));
    }

    #[test]
    fn test_same_source_does_not_restart() {
        let (root, video, _source, bg) = setup();
        bg.apply_theme(Theme::Dark);
        bg.on_can_play();

        bg.apply_theme(Theme::Dark);
        bg.set_source("");
        assert_eq!(video.reloads(), 1);
        assert_eq!(video.plays(), 1);
        assert!(root.has_class(VIDEO_READY_CLASS));
        assert_eq!(bg.current_source().as_deref(), Some("dark.mp4"));
    }

    #[test]
    fn test_missing_source_element_never_swaps() {
        let root = SimElement::new();
        let video = SimElement::new().with_attribute("data-light", "light.mp4");
        let bg = BackgroundVideo::new(root, video.clone(), None);

        bg.apply_theme(Theme::Light);
        assert_eq!(video.reloads(), 0);

        bg.on_user_gesture();
        assert_eq!(video.plays(), 1);
    }
}
