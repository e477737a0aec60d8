use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install the process logger at the given level.
///
/// Returns `false` if a logger was already installed.
pub fn init(level: LevelFilter) -> bool {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return false;
    }
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .try_init()
        .is_ok()
}

/// Install the process logger using a filter string such as
/// `"info"` or `"blecast=debug"`. `RUST_LOG` wins when set.
pub fn init_with_filter(filter: &str) -> bool {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return false;
    }
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(env_filter) => builder.parse_filters(&env_filter),
        Err(_) => builder.parse_filters(filter),
    };
    builder.try_init().is_ok()
}
