//! Browser-only checks for the `web-sys` host.
//!
//! Run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use glass_landing::host::{ColorScheme, KeyValueStore, Timers};
use glass_landing::theme::store::PreferenceStore;
use glass_landing::theme::{Theme, ThemePreference};
use glass_landing::web::dom::{LocalStorage, SystemScheme, WindowTimers};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn window() -> web_sys::Window {
    web_sys::window().expect("test runs in a browser")
}

#[wasm_bindgen_test]
fn preference_round_trips_through_local_storage() {
    let storage = Rc::new(LocalStorage::new(window()));
    let store = PreferenceStore::new(storage.clone(), "glass-test-theme".to_string());

    store.save(Theme::Light);
    assert_eq!(store.load(), ThemePreference::Light);
    assert_eq!(
        storage.get_item("glass-test-theme").unwrap().as_deref(),
        Some("light")
    );

    store.save(Theme::Dark);
    assert_eq!(store.load(), ThemePreference::Dark);
}

#[wasm_bindgen_test]
fn missing_media_query_means_dark() {
    assert!(!SystemScheme::new(None).prefers_light());
}

async fn sleep_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let _ = window().set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
    });
    let _ = JsFuture::from(promise).await;
}

#[wasm_bindgen_test]
fn cleared_timeout_releases_its_callback() {
    let timers = WindowTimers::new(window());

    let first = timers
        .set_timeout(Duration::from_secs(60), Box::new(|| {}))
        .unwrap();
    let second = timers
        .set_timeout(Duration::from_secs(60), Box::new(|| {}))
        .unwrap();
    assert_eq!(timers.held_callbacks(), 2);

    timers.clear_timeout(first);
    assert_eq!(timers.held_callbacks(), 1);
    timers.clear_timeout(second);
    assert_eq!(timers.held_callbacks(), 0);
}

#[wasm_bindgen_test]
async fn fired_timeout_is_released_on_next_schedule() {
    let timers = WindowTimers::new(window());
    let ran = Rc::new(Cell::new(false));

    let flag = ran.clone();
    timers
        .set_timeout(Duration::from_millis(1), Box::new(move || flag.set(true)))
        .unwrap();
    sleep_ms(30).await;
    assert!(ran.get());

    let next = timers
        .set_timeout(Duration::from_secs(60), Box::new(|| {}))
        .unwrap();
    assert_eq!(timers.held_callbacks(), 1);
    timers.clear_timeout(next);
}
