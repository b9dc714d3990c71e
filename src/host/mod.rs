//! Host abstraction - everything the page components need from the browser.
//!
//! Components only see these traits. `crate::web` implements them with
//! `web-sys`; `crate::sim` implements them in memory for tests.

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Duration;

use crate::error::PageError;

/// Element bounding box in client coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A styled DOM element. Mutations are infallible from the caller's side;
/// implementations swallow host refusals.
pub trait Element {
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    fn has_class(&self, class: &str) -> bool;

    fn toggle_class(&self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);

    /// Set an inline style property (custom properties included)
    fn set_style_property(&self, name: &str, value: &str);
    fn remove_style_property(&self, name: &str);

    fn set_text(&self, text: &str);

    /// Natural content height in px
    fn scroll_height(&self) -> i32;
    fn bounding_rect(&self) -> Rect;

    /// Force a synchronous layout so a removed-then-added class restarts
    /// its CSS animation
    fn force_reflow(&self);
}

/// Checkbox input (the theme toggle)
pub trait Checkbox {
    fn is_checked(&self) -> bool;
    fn set_checked(&self, checked: bool);
}

/// Video element
pub trait Media: Element {
    /// Start playback. Rejections (autoplay policy) are absorbed.
    fn play(&self);
    /// Re-read `<source>` children
    fn reload(&self);
}

/// Short feedback sound
pub trait Sound {
    /// Rewind to zero and play
    fn play_from_start(&self) -> Result<(), PageError>;
}

/// Durable string key-value storage (localStorage)
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), PageError>;
}

/// OS / browser color-scheme preference
pub trait ColorScheme {
    fn prefers_light(&self) -> bool;
}

/// Probes whether an image URL loads
#[async_trait(?Send)]
pub trait ImageProbe {
    async fn probe(&self, url: &str) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub i32);

/// setTimeout / setInterval
pub trait Timers {
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>)
        -> Result<TimerId, PageError>;
    fn clear_timeout(&self, id: TimerId);
    fn set_interval(&self, period: Duration, task: Box<dyn FnMut()>)
        -> Result<TimerId, PageError>;
}

/// Runs futures on the host's single-threaded event loop
pub trait Spawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Page navigation
pub trait Navigator {
    /// Replace the current location
    fn assign(&self, href: &str) -> Result<(), PageError>;
    /// Open in a new browsing context without an opener
    fn open_new(&self, href: &str) -> Result<(), PageError>;
}

/// Bundle of host services shared by all components
#[derive(Clone)]
pub struct Host {
    pub storage: Rc<dyn KeyValueStore>,
    pub color_scheme: Rc<dyn ColorScheme>,
    pub images: Rc<dyn ImageProbe>,
    pub timers: Rc<dyn Timers>,
    pub spawner: Rc<dyn Spawner>,
    pub navigator: Rc<dyn Navigator>,
}
