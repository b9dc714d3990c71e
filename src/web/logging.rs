//! tracing -> browser console.

use std::io;
use std::sync::Once;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use wasm_bindgen::JsValue;
use web_sys::console;

const DEFAULT_FILTER: &str = "glass_landing=info";

/// Install the console subscriber. `filter` uses EnvFilter syntax; an
/// invalid directive falls back to the default.
pub fn init(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|e| {
        console::warn_1(&format!("Bad log filter `{}`: {}", filter, e).into());
        EnvFilter::new(DEFAULT_FILTER)
    });

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_ansi(false)
                .with_target(false)
                .with_writer(ConsoleMakeWriter),
        )
        .try_init();
    if result.is_err() {
        console::warn_1(&"Logging already initialised".into());
    }
}

/// Route panics to `console.error` instead of an opaque `unreachable`
pub fn install_panic_hook() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!("panic at {}:{}: {info}", loc.file(), loc.line()),
                None => format!("panic: {info}"),
            };
            console::error_1(&msg.into());
        }));
    });
}

struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Buffers one formatted event and emits it on drop
struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buf: Vec::new(),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buf);
        let msg = JsValue::from_str(text.trim_end());
        if self.level == Level::ERROR {
            console::error_1(&msg);
        } else if self.level == Level::WARN {
            console::warn_1(&msg);
        } else if self.level == Level::INFO {
            console::info_1(&msg);
        } else {
            console::debug_1(&msg);
        }
    }
}
