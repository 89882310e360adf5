//! Diagnostic logging setup
//!
//! stdout carries the encoded response, so every log line goes to stderr.
//! The level starts at `WARN` and is raised once the request's `debug`
//! parameter has been read.

use once_cell::sync::OnceCell;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Registry};

static RELOAD_HANDLE: OnceCell<reload::Handle<LevelFilter, Registry>> = OnceCell::new();

/// Level used before the request has been decoded
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::WARN;

/// Install the global subscriber
///
/// Calling this more than once is harmless; later calls do nothing.
pub fn init() {
    RELOAD_HANDLE.get_or_init(|| {
        let (filter, handle) = reload::Layer::new(DEFAULT_LEVEL);
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        );
        // Fails when another subscriber is installed; the handle then stays inert.
        let _ = subscriber.try_init();
        handle
    });
}

/// Switch between the default level and `DEBUG`
pub fn set_debug(debug: bool) {
    let level = if debug { LevelFilter::DEBUG } else { DEFAULT_LEVEL };
    reload_level(level);
}

fn reload_level(level: LevelFilter) {
    let Some(handle) = RELOAD_HANDLE.get() else {
        return;
    };
    if let Err(e) = handle.reload(level) {
        eprintln!("protoc-gen-template: failed to reload log filter: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_debug_before_init_is_noop() {
        set_debug(true);
        set_debug(false);
    }

    #[test]
    fn test_init_twice() {
        init();
        init();
        set_debug(true);
        set_debug(false);
    }
}
