//! Browser entry point.
//!
//! Locates the page elements, builds the [`Page`] on the `web-sys` host and
//! installs the DOM listeners. Listeners live as long as the page.

pub mod dom;
mod logging;

use anyhow::Context;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, Event, EventTarget, HtmlElement, HtmlInputElement,
    HtmlMediaElement, MediaQueryListEvent, MouseEvent,
};

use crate::buttons::{ClickEvent, ClickOutcome};
use crate::clock::ClockElements;
use crate::config::{PageConfig, CONFIG_ELEMENT_ID};
use crate::host::{Checkbox, Element, Host, Media, Sound};
use crate::page::{Page, PageElements};
use dom::{
    DomCheckbox, DomElement, DomSound, DomVideo, ImageLoader, LocalStorage, SystemScheme,
    WebSpawner, WindowNavigator, WindowTimers,
};

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    logging::install_panic_hook();
    run().map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

fn run() -> anyhow::Result<()> {
    let window = web_sys::window().context("no window")?;
    let document = window.document().context("no document")?;

    let blob = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content());
    let config = PageConfig::from_blob(blob.as_deref());
    logging::init(&config.log_filter);
    tracing::info!("Starting Glass Landing v{}", crate::VERSION);

    let root = document
        .document_element()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .context("document has no root element")?;

    let sel = &config.selectors;
    let video: Option<HtmlMediaElement> = query(&document, &sel.video);
    let video_source: Option<HtmlElement> = video
        .as_ref()
        .and_then(|v| v.query_selector("source").ok().flatten())
        .and_then(|el| el.dyn_into().ok());
    let toggle: Option<HtmlInputElement> = query(&document, &sel.theme_toggle);
    let reveal: Option<HtmlElement> = query(&document, &sel.meta_reveal);
    let price_toggle: Option<HtmlElement> = query(&document, &sel.price_toggle);
    let price_panel: Option<HtmlElement> = query(&document, &sel.price_panel);
    let buttons = query_all(&document, &sel.glass_buttons);

    let elements = PageElements {
        root: element(root),
        video: video.clone().map(|v| Rc::new(DomVideo::new(v)) as Rc<dyn Media>),
        video_source: video_source.map(element),
        theme_toggle: toggle
            .clone()
            .map(|t| Rc::new(DomCheckbox::new(t)) as Rc<dyn Checkbox>),
        toggle_wrap: query(&document, &sel.toggle_wrap).map(element),
        meta_reveal: reveal.clone().map(element),
        clock: ClockElements {
            hh_mm: query(&document, &sel.clock_hh_mm).map(element),
            ss: query(&document, &sel.clock_ss).map(element),
            date: query(&document, &sel.clock_date).map(element),
        },
        price_toggle: price_toggle.clone().map(element),
        price_panel: price_panel.clone().map(element),
        click_sound: query::<HtmlMediaElement>(&document, &sel.click_sound)
            .map(|s| Rc::new(DomSound::new(s)) as Rc<dyn Sound>),
        buttons: buttons.iter().cloned().map(element).collect(),
    };

    let scheme = window.match_media(SystemScheme::QUERY).ok().flatten();
    let host = Host {
        storage: Rc::new(LocalStorage::new(window.clone())),
        color_scheme: Rc::new(SystemScheme::new(scheme.clone())),
        images: Rc::new(ImageLoader),
        timers: Rc::new(WindowTimers::new(window.clone())),
        spawner: Rc::new(WebSpawner),
        navigator: Rc::new(WindowNavigator::new(window.clone())),
    };

    let page = Rc::new(Page::new(host, elements, config));
    let report = page.boot();

    if report.follow_system {
        if let Some(scheme) = &scheme {
            let page = page.clone();
            listen(scheme, "change", move |e| {
                if let Some(e) = e.dyn_ref::<MediaQueryListEvent>() {
                    page.on_system_scheme_change(e.matches());
                }
            });
        }
    }

    if let Some(toggle) = toggle {
        let page = page.clone();
        let input = toggle.clone();
        listen(&toggle, "change", move |_| page.on_theme_toggle(input.checked()));
    }

    if let Some(reveal) = reveal {
        let page = page.clone();
        listen(&reveal, "click", move |_| page.on_reveal_click());
    }

    if price_toggle.is_some() && price_panel.is_some() {
        if let Some(price_toggle) = &price_toggle {
            let page = page.clone();
            listen(price_toggle, "click", move |_| page.on_price_toggle_click());
        }
        let resize_page = page.clone();
        listen(&window, "resize", move |_| resize_page.on_resize());
    }

    for (index, button) in buttons.iter().enumerate() {
        let p = page.clone();
        listen(button, "pointermove", move |e| {
            if let Some(e) = e.dyn_ref::<MouseEvent>() {
                p.on_button_pointer_move(index, e.client_x() as f64, e.client_y() as f64);
            }
        });

        let p = page.clone();
        listen(button, "pointerleave", move |_| p.on_button_pointer_leave(index));

        let p = page.clone();
        listen(button, "click", move |e| {
            let Some(mouse) = e.dyn_ref::<MouseEvent>() else {
                return;
            };
            let click = ClickEvent {
                default_prevented: e.default_prevented(),
                meta: mouse.meta_key(),
                ctrl: mouse.ctrl_key(),
                shift: mouse.shift_key(),
                alt: mouse.alt_key(),
            };
            if p.on_button_click(index, &click) == ClickOutcome::Handled {
                e.prevent_default();
            }
        });
    }

    if let Some(video) = &video {
        let p = page.clone();
        listen(video, "canplay", move |_| p.on_video_can_play());

        for (event, passive) in [("pointerdown", false), ("touchstart", true)] {
            let p = page.clone();
            listen_once(&document, event, passive, move |_| p.on_user_gesture());
        }
    }

    tracing::info!("Page ready ({} glass buttons)", page.button_count());
    Ok(())
}

fn element(el: HtmlElement) -> Rc<dyn Element> {
    Rc::new(DomElement::new(el))
}

fn query<T: JsCast>(document: &Document, selector: &str) -> Option<T> {
    document
        .query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<T>().ok())
}

fn query_all(document: &Document, selector: &str) -> Vec<HtmlElement> {
    let Ok(list) = document.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect()
}

fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    if let Err(e) =
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        tracing::warn!("Cannot listen for {}: {:?}", event, e);
    }
    closure.forget();
}

fn listen_once(
    target: &EventTarget,
    event: &str,
    passive: bool,
    handler: impl FnMut(Event) + 'static,
) {
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    options.set_passive(passive);

    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
        event,
        closure.as_ref().unchecked_ref(),
        &options,
    ) {
        tracing::warn!("Cannot listen for {}: {:?}", event, e);
    }
    closure.forget();
}
