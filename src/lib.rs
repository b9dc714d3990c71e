//! Glass Landing - page enhancement layer
//!
//! Compiled to WebAssembly and loaded by the static landing page. Provides:
//! - Light/dark theme with localStorage persistence and system fallback
//! - Background image fallback chain and theme-dependent background video
//! - Live clock
//! - Pricing accordion panel
//! - Pointer-reactive glass buttons with delayed navigation
//!
//! All behaviour is written against the traits in [`host`]. The `web` module
//! (wasm32 only) binds them to the DOM; `sim` (tests and the `sim` feature)
//! binds them to an in-memory page.

pub mod buttons;
pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod page;
pub mod panel;
pub mod reveal;
pub mod sound;
pub mod theme;
pub mod timer;
pub mod video;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::PageConfig;
pub use error::PageError;
pub use page::{BootReport, Page, PageElements};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
