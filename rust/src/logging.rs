//! Verbosity-gated logging for the backtracking search.
//!
//! Logging compiles down to a single comparison when disabled (verbosity=0).
//! Levels:
//! - 0: SILENT (nothing)
//! - 1: CHANGES (placements committed or undone, final outcome)
//! - 2: CHECKS (rejected candidate starts and the reason)
//! - 3: DEBUG (timeline construction, node counters)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Whether a message at `level` is emitted under `verbosity`.
#[inline]
pub const fn enabled(verbosity: u8, level: u8) -> bool {
    verbosity >= level
}

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: placements, backtracking undo, search outcome.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_CHANGES) {
            eprintln!($($arg)*);
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
///
/// Used for: candidate rejections during search.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_CHECKS) {
            eprintln!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_DEBUG) {
            eprintln!($($arg)*);
        }
    };
}
