//! Verbose console output, switched on by `VERBOSE` or `--verbose`.

use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Switches the extra crawl and storage chatter on or off for the whole process.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// `println!` that only prints in verbose mode.
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if $crate::debug::is_verbose() {
            println!($($arg)*);
        }
    };
}

/// `eprintln!` that only prints in verbose mode. Used for failures the run recovers from.
#[macro_export]
macro_rules! verbose_eprintln {
    ($($arg:tt)*) => {
        if $crate::debug::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}
