//! Deterministic in-memory host.
//!
//! Drives page behaviour without a browser: elements record their classes,
//! attributes and styles, timers run off a manual clock, and probe chains run
//! on a `LocalPool` that the caller pumps explicitly.

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;
use std::time::Duration;

use crate::error::PageError;
use crate::host::{
    Checkbox, ColorScheme, Element, Host, ImageProbe, KeyValueStore, Media, Navigator, Rect,
    Sound, Spawner, TimerId, Timers,
};

// =============================================================================
// Elements
// =============================================================================

/// Recording element. Also stands in for checkboxes, video and audio.
#[derive(Default)]
pub struct SimElement {
    classes: RefCell<BTreeSet<String>>,
    attributes: RefCell<BTreeMap<String, String>>,
    style: RefCell<BTreeMap<String, String>>,
    text: RefCell<String>,
    scroll_height: Cell<i32>,
    rect: Cell<Rect>,
    checked: Cell<bool>,
    reflows: Cell<u32>,
    plays: Cell<u32>,
    reloads: Cell<u32>,
    play_fails: Cell<bool>,
}

impl SimElement {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_attribute(self: Rc<Self>, name: &str, value: &str) -> Rc<Self> {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn style(&self, name: &str) -> Option<String> {
        self.style.borrow().get(name).cloned()
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn classes(&self) -> Vec<String> {
        self.classes.borrow().iter().cloned().collect()
    }

    pub fn set_scroll_height(&self, px: i32) {
        self.scroll_height.set(px);
    }

    pub fn set_rect(&self, rect: Rect) {
        self.rect.set(rect);
    }

    pub fn reflows(&self) -> u32 {
        self.reflows.get()
    }

    /// Times `play` / `play_from_start` was called
    pub fn plays(&self) -> u32 {
        self.plays.get()
    }

    pub fn reloads(&self) -> u32 {
        self.reloads.get()
    }

    /// Make `play_from_start` fail, like a blocked autoplay
    pub fn set_play_fails(&self, fails: bool) {
        self.play_fails.set(fails);
    }
}

impl Element for SimElement {
    fn add_class(&self, class: &str) {
        self.classes.borrow_mut().insert(class.to_string());
    }

    fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().remove(class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn set_style_property(&self, name: &str, value: &str) {
        self.style
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn remove_style_property(&self, name: &str) {
        self.style.borrow_mut().remove(name);
    }

    fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
    }

    fn scroll_height(&self) -> i32 {
        self.scroll_height.get()
    }

    fn bounding_rect(&self) -> Rect {
        self.rect.get()
    }

    fn force_reflow(&self) {
        self.reflows.set(self.reflows.get() + 1);
    }
}

impl Checkbox for SimElement {
    fn is_checked(&self) -> bool {
        self.checked.get()
    }

    fn set_checked(&self, checked: bool) {
        self.checked.set(checked);
    }
}

impl Media for SimElement {
    fn play(&self) {
        self.plays.set(self.plays.get() + 1);
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }
}

impl Sound for SimElement {
    fn play_from_start(&self) -> Result<(), PageError> {
        if self.play_fails.get() {
            return Err(PageError::Playback("NotAllowedError".to_string()));
        }
        self.plays.set(self.plays.get() + 1);
        Ok(())
    }
}

// =============================================================================
// Storage / preference
// =============================================================================

/// localStorage stand-in. Share one `Rc` between stores to model a reload.
#[derive(Default)]
pub struct SimStorage {
    items: RefCell<HashMap<String, String>>,
    unavailable: Cell<bool>,
}

impl SimStorage {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Model private mode / disabled storage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    pub fn item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

impl KeyValueStore for SimStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PageError> {
        if self.unavailable.get() {
            return Err(PageError::StorageUnavailable);
        }
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PageError> {
        if self.unavailable.get() {
            return Err(PageError::StorageUnavailable);
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct SimColorScheme {
    light: Cell<bool>,
}

impl SimColorScheme {
    pub fn new(prefers_light: bool) -> Rc<Self> {
        Rc::new(Self {
            light: Cell::new(prefers_light),
        })
    }

    pub fn set_prefers_light(&self, light: bool) {
        self.light.set(light);
    }
}

impl ColorScheme for SimColorScheme {
    fn prefers_light(&self) -> bool {
        self.light.get()
    }
}

// =============================================================================
// Image probe
// =============================================================================

/// Image loader with scripted outcomes. Unknown URLs fail.
///
/// In gated mode every probe stays pending until [`SimImages::release`].
#[derive(Default)]
pub struct SimImages {
    available: RefCell<BTreeSet<String>>,
    probed: RefCell<Vec<String>>,
    gated: Cell<bool>,
    waiting: RefCell<Vec<(String, oneshot::Sender<bool>)>>,
}

impl SimImages {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn gated() -> Rc<Self> {
        let images = Self::default();
        images.gated.set(true);
        Rc::new(images)
    }

    pub fn make_available(&self, url: &str) {
        self.available.borrow_mut().insert(url.to_string());
    }

    /// Every URL probed so far, in order
    pub fn probed(&self) -> Vec<String> {
        self.probed.borrow().clone()
    }

    /// Complete the oldest pending probe for `url`. Returns false when none
    /// is pending.
    pub fn release(&self, url: &str, loaded: bool) -> bool {
        let mut waiting = self.waiting.borrow_mut();
        let Some(pos) = waiting.iter().position(|(u, _)| u == url) else {
            return false;
        };
        let (_, tx) = waiting.remove(pos);
        tx.send(loaded).is_ok()
    }

    pub fn pending(&self) -> usize {
        self.waiting.borrow().len()
    }
}

#[async_trait(?Send)]
impl ImageProbe for SimImages {
    async fn probe(&self, url: &str) -> bool {
        self.probed.borrow_mut().push(url.to_string());
        if !self.gated.get() {
            return self.available.borrow().contains(url);
        }
        let (tx, rx) = oneshot::channel();
        self.waiting.borrow_mut().push((url.to_string(), tx));
        rx.await.unwrap_or(false)
    }
}

// =============================================================================
// Timers
// =============================================================================

enum TimerTask {
    Once(Box<dyn FnOnce()>),
    Every(Duration, Box<dyn FnMut()>),
}

struct TimerEntry {
    id: TimerId,
    due: Duration,
    task: TimerTask,
}

/// Manual clock. Nothing fires until [`SimTimers::advance`].
#[derive(Default)]
pub struct SimTimers {
    now: Cell<Duration>,
    next_id: Cell<i32>,
    entries: RefCell<Vec<TimerEntry>>,
    fired: Cell<u32>,
    failing: Cell<bool>,
}

impl SimTimers {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Callbacks run so far (timeouts and interval ticks)
    pub fn fired(&self) -> u32 {
        self.fired.get()
    }

    pub fn pending(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Refuse every new timeout / interval
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Move the clock forward, running every callback that falls due in
    /// order of deadline.
    pub fn advance(&self, dt: Duration) {
        let target = self.now.get() + dt;
        loop {
            let next = {
                let mut entries = self.entries.borrow_mut();
                let earliest = entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.due <= target)
                    .min_by_key(|(_, e)| (e.due, e.id.0))
                    .map(|(i, _)| i);
                earliest.map(|i| entries.remove(i))
            };
            let Some(entry) = next else { break };

            self.now.set(entry.due);
            self.fired.set(self.fired.get() + 1);
            match entry.task {
                TimerTask::Once(task) => task(),
                TimerTask::Every(period, mut task) => {
                    task();
                    self.entries.borrow_mut().push(TimerEntry {
                        id: entry.id,
                        due: entry.due + period.max(Duration::from_millis(1)),
                        task: TimerTask::Every(period, task),
                    });
                }
            }
        }
        self.now.set(target);
    }

    fn check_available(&self) -> Result<(), PageError> {
        if self.failing.get() {
            return Err(PageError::Timer("timers refused".to_string()));
        }
        Ok(())
    }

    fn schedule(&self, due: Duration, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        self.entries.borrow_mut().push(TimerEntry { id, due, task });
        id
    }
}

impl Timers for SimTimers {
    fn set_timeout(
        &self,
        delay: Duration,
        task: Box<dyn FnOnce()>,
    ) -> Result<TimerId, PageError> {
        self.check_available()?;
        Ok(self.schedule(self.now.get() + delay, TimerTask::Once(task)))
    }

    fn clear_timeout(&self, id: TimerId) {
        self.entries.borrow_mut().retain(|e| e.id != id);
    }

    fn set_interval(
        &self,
        period: Duration,
        task: Box<dyn FnMut()>,
    ) -> Result<TimerId, PageError> {
        self.check_available()?;
        Ok(self.schedule(self.now.get() + period, TimerTask::Every(period, task)))
    }
}

// =============================================================================
// Executor / navigation
// =============================================================================

/// Single-threaded executor pumped by the test
pub struct SimSpawner {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl SimSpawner {
    pub fn new() -> Rc<Self> {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Rc::new(Self {
            pool: RefCell::new(pool),
            spawner,
        })
    }

    /// Poll every spawned task until none can make progress
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }
}

impl Spawner for SimSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.spawner.spawn_local(task) {
            tracing::warn!("Sim executor refused task: {}", e);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Assign(String),
    OpenNew(String),
}

#[derive(Default)]
pub struct SimNavigator {
    history: RefCell<Vec<Navigation>>,
}

impl SimNavigator {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn history(&self) -> Vec<Navigation> {
        self.history.borrow().clone()
    }
}

impl Navigator for SimNavigator {
    fn assign(&self, href: &str) -> Result<(), PageError> {
        self.history
            .borrow_mut()
            .push(Navigation::Assign(href.to_string()));
        Ok(())
    }

    fn open_new(&self, href: &str) -> Result<(), PageError> {
        self.history
            .borrow_mut()
            .push(Navigation::OpenNew(href.to_string()));
        Ok(())
    }
}

// =============================================================================
// SimHost
// =============================================================================

/// All sim services plus the [`Host`] bundle built from them
pub struct SimHost {
    pub storage: Rc<SimStorage>,
    pub color_scheme: Rc<SimColorScheme>,
    pub images: Rc<SimImages>,
    pub timers: Rc<SimTimers>,
    pub spawner: Rc<SimSpawner>,
    pub navigator: Rc<SimNavigator>,
}

impl SimHost {
    pub fn new() -> Self {
        Self::with_images(SimImages::new())
    }

    pub fn with_images(images: Rc<SimImages>) -> Self {
        Self {
            storage: SimStorage::new(),
            color_scheme: SimColorScheme::new(false),
            images,
            timers: SimTimers::new(),
            spawner: SimSpawner::new(),
            navigator: SimNavigator::new(),
        }
    }

    pub fn host(&self) -> Host {
        Host {
            storage: self.storage.clone(),
            color_scheme: self.color_scheme.clone(),
            images: self.images.clone(),
            timers: self.timers.clone(),
            spawner: self.spawner.clone(),
            navigator: self.navigator.clone(),
        }
    }

    /// Advance the clock and drain any probe chains it unblocked
    pub fn advance(&self, dt: Duration) {
        self.timers.advance(dt);
        self.spawner.run_until_stalled();
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let timers = SimTimers::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (label, ms) in [("b", 20u64), ("a", 10), ("c", 30)] {
            let log = log.clone();
            timers
                .set_timeout(
                    Duration::from_millis(ms),
                    Box::new(move || log.borrow_mut().push(label)),
                )
                .unwrap();
        }

        timers.advance(Duration::from_millis(25));
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(timers.now(), Duration::from_millis(25));

        timers.advance(Duration::from_millis(5));
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_cleared_timeout_never_fires() {
        let timers = SimTimers::new();
        let hit = Rc::new(Cell::new(false));
        let flag = hit.clone();
        let id = timers
            .set_timeout(Duration::from_millis(5), Box::new(move || flag.set(true)))
            .unwrap();

        timers.clear_timeout(id);
        timers.advance(Duration::from_secs(1));
        assert!(!hit.get());
        assert_eq!(timers.fired(), 0);
    }

    #[test]
    fn test_interval_repeats() {
        let timers = SimTimers::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        timers
            .set_interval(Duration::from_secs(1), Box::new(move || c.set(c.get() + 1)))
            .unwrap();

        timers.advance(Duration::from_millis(3500));
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_gated_probe_waits_for_release() {
        let images = SimImages::gated();
        let spawner = SimSpawner::new();
        let result = Rc::new(Cell::new(None));

        let probe = images.clone();
        let out = result.clone();
        spawner.spawn(Box::pin(async move {
            out.set(Some(probe.probe("a.jpg").await));
        }));

        spawner.run_until_stalled();
        assert_eq!(result.get(), None);
        assert_eq!(images.pending(), 1);

        assert!(images.release("a.jpg", true));
        spawner.run_until_stalled();
        assert_eq!(result.get(), Some(true));
        assert!(!images.release("a.jpg", true));
    }
}
