//! `web-sys` implementations of the host traits.

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    HtmlElement, HtmlImageElement, HtmlInputElement, HtmlMediaElement, MediaQueryList, Storage,
    Window,
};

use crate::error::PageError;
use crate::host::{
    Checkbox, ColorScheme, Element, ImageProbe, KeyValueStore, Media, Navigator, Rect, Sound,
    Spawner, TimerId, Timers,
};

fn js_error(e: JsValue) -> String {
    format!("{:?}", e)
}

fn millis(d: Duration) -> i32 {
    i32::try_from(d.as_millis()).unwrap_or(i32::MAX)
}

/// Await a play() promise, absorbing autoplay rejections
fn absorb_playback(what: &'static str, result: Result<js_sys::Promise, JsValue>) {
    match result {
        Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                tracing::debug!("{} playback refused: {:?}", what, e);
            }
        }),
        Err(e) => tracing::debug!("{} playback failed: {:?}", what, e),
    }
}

// =============================================================================
// Elements
// =============================================================================

pub struct DomElement(HtmlElement);

impl DomElement {
    pub fn new(element: HtmlElement) -> Self {
        Self(element)
    }
}

impl Element for DomElement {
    fn add_class(&self, class: &str) {
        let _ = self.0.class_list().add_1(class);
    }

    fn remove_class(&self, class: &str) {
        let _ = self.0.class_list().remove_1(class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let _ = self.0.set_attribute(name, value);
    }

    fn set_style_property(&self, name: &str, value: &str) {
        let _ = self.0.style().set_property(name, value);
    }

    fn remove_style_property(&self, name: &str) {
        let _ = self.0.style().remove_property(name);
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn scroll_height(&self) -> i32 {
        self.0.scroll_height()
    }

    fn bounding_rect(&self) -> Rect {
        let r = self.0.get_bounding_client_rect();
        Rect {
            left: r.left(),
            top: r.top(),
            width: r.width(),
            height: r.height(),
        }
    }

    fn force_reflow(&self) {
        // Reading layout flushes pending style changes
        let _ = self.0.offset_width();
    }
}

pub struct DomCheckbox(HtmlInputElement);

impl DomCheckbox {
    pub fn new(input: HtmlInputElement) -> Self {
        Self(input)
    }
}

impl Checkbox for DomCheckbox {
    fn is_checked(&self) -> bool {
        self.0.checked()
    }

    fn set_checked(&self, checked: bool) {
        self.0.set_checked(checked);
    }
}

/// `<video>` element
pub struct DomVideo {
    element: DomElement,
    media: HtmlMediaElement,
}

impl DomVideo {
    pub fn new(media: HtmlMediaElement) -> Self {
        Self {
            element: DomElement::new(media.clone().into()),
            media,
        }
    }
}

impl Element for DomVideo {
    fn add_class(&self, class: &str) {
        self.element.add_class(class)
    }

    fn remove_class(&self, class: &str) {
        self.element.remove_class(class)
    }

    fn has_class(&self, class: &str) -> bool {
        self.element.has_class(class)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.element.attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.element.set_attribute(name, value)
    }

    fn set_style_property(&self, name: &str, value: &str) {
        self.element.set_style_property(name, value)
    }

    fn remove_style_property(&self, name: &str) {
        self.element.remove_style_property(name)
    }

    fn set_text(&self, text: &str) {
        self.element.set_text(text)
    }

    fn scroll_height(&self) -> i32 {
        self.element.scroll_height()
    }

    fn bounding_rect(&self) -> Rect {
        self.element.bounding_rect()
    }

    fn force_reflow(&self) {
        self.element.force_reflow()
    }
}

impl Media for DomVideo {
    fn play(&self) {
        absorb_playback("Video", self.media.play());
    }

    fn reload(&self) {
        self.media.load();
    }
}

/// `<audio id="click-sound">`
pub struct DomSound(HtmlMediaElement);

impl DomSound {
    pub fn new(media: HtmlMediaElement) -> Self {
        Self(media)
    }
}

impl Sound for DomSound {
    fn play_from_start(&self) -> Result<(), PageError> {
        self.0.set_current_time(0.0);
        let promise = self
            .0
            .play()
            .map_err(|e| PageError::Playback(js_error(e)))?;
        absorb_playback("Click sound", Ok(promise));
        Ok(())
    }
}

// =============================================================================
// Window services
// =============================================================================

pub struct LocalStorage {
    window: Window,
}

impl LocalStorage {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn storage(&self) -> Result<Storage, PageError> {
        match self.window.local_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err(PageError::StorageUnavailable),
            // Privacy modes throw on access
            Err(e) => Err(PageError::Storage(js_error(e))),
        }
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PageError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| PageError::Storage(js_error(e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| PageError::Storage(js_error(e)))
    }
}

/// `(prefers-color-scheme: light)`; without matchMedia the page is dark
pub struct SystemScheme {
    query: Option<MediaQueryList>,
}

impl SystemScheme {
    pub const QUERY: &'static str = "(prefers-color-scheme: light)";

    pub fn new(query: Option<MediaQueryList>) -> Self {
        Self { query }
    }
}

impl ColorScheme for SystemScheme {
    fn prefers_light(&self) -> bool {
        self.query.as_ref().is_some_and(MediaQueryList::matches)
    }
}

/// Probes by loading into a detached `<img>`
pub struct ImageLoader;

#[async_trait(?Send)]
impl ImageProbe for ImageLoader {
    async fn probe(&self, url: &str) -> bool {
        let Ok(img) = HtmlImageElement::new() else {
            return false;
        };

        let (tx, rx) = oneshot::channel::<bool>();
        let tx = Rc::new(RefCell::new(Some(tx)));
        let settle = |loaded: bool| {
            let tx = tx.clone();
            Closure::<dyn FnMut()>::new(move || {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(loaded);
                }
            })
        };
        let onload = settle(true);
        let onerror = settle(false);
        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        img.set_src(url);

        let loaded = rx.await.unwrap_or(false);
        img.set_onload(None);
        img.set_onerror(None);
        loaded
    }
}

/// A scheduled timeout's callback, kept alive until it has run or been
/// cleared
struct PendingTimeout {
    _callback: Closure<dyn FnMut()>,
    done: Rc<Cell<bool>>,
}

pub struct WindowTimers {
    window: Window,
    timeouts: RefCell<HashMap<i32, PendingTimeout>>,
}

impl WindowTimers {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            timeouts: RefCell::new(HashMap::new()),
        }
    }

    /// Timeout callbacks still held
    pub fn held_callbacks(&self) -> usize {
        self.timeouts.borrow().len()
    }

    // A callback is only dropped after it has returned, never while the
    // browser is running it.
    fn sweep(&self) {
        self.timeouts
            .borrow_mut()
            .retain(|_, pending| !pending.done.get());
    }
}

impl Timers for WindowTimers {
    fn set_timeout(
        &self,
        delay: Duration,
        task: Box<dyn FnOnce()>,
    ) -> Result<TimerId, PageError> {
        self.sweep();

        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let callback = Closure::once(move || {
            task();
            flag.set(true);
        });
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis(delay),
            )
            .map_err(|e| PageError::Timer(js_error(e)))?;

        self.timeouts
            .borrow_mut()
            .insert(id, PendingTimeout { _callback: callback, done });
        Ok(TimerId(id))
    }

    fn clear_timeout(&self, id: TimerId) {
        self.window.clear_timeout_with_handle(id.0);
        self.timeouts.borrow_mut().remove(&id.0);
        self.sweep();
    }

    fn set_interval(
        &self,
        period: Duration,
        task: Box<dyn FnMut()>,
    ) -> Result<TimerId, PageError> {
        let callback = Closure::wrap(task);
        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis(period),
            )
            .map_err(|e| PageError::Timer(js_error(e)))?;
        // Intervals run for the life of the page
        callback.forget();
        Ok(TimerId(id))
    }
}

pub struct WebSpawner;

impl Spawner for WebSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

pub struct WindowNavigator {
    window: Window,
}

impl WindowNavigator {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Navigator for WindowNavigator {
    fn assign(&self, href: &str) -> Result<(), PageError> {
        self.window
            .location()
            .set_href(href)
            .map_err(|e| PageError::Navigation {
                href: href.to_string(),
                reason: js_error(e),
            })
    }

    fn open_new(&self, href: &str) -> Result<(), PageError> {
        self.window
            .open_with_url_and_target_and_features(href, "_blank", "noopener")
            .map(|_| ())
            .map_err(|e| PageError::Navigation {
                href: href.to_string(),
                reason: js_error(e),
            })
    }
}
