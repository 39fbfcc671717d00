//! Pipeline warnings with colored terminal output.
//!
//! Provides deduplication to avoid spamming the same warning multiple times.
//! Used by the HTML, CSS, layout and fetch components to report unsupported
//! input without failing the document.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// ANSI color codes for terminal output
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Global set of warnings we've already printed (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about unsupported input (prints once per unique message).
///
/// # Example
/// ```
/// use kestrel_common::warning::warn_once;
/// warn_once("CSS", "unsupported property 'margin'");
/// ```
pub fn warn_once(component: &str, message: &str) {
    if first_report(component, message) {
        eprintln!("{YELLOW}[Kestrel {component}] ⚠ {message}{RESET}");
    }
}

/// Record `[component] message`; `true` the first time it is seen.
fn first_report(component: &str, message: &str) -> bool {
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(format!("[{component}] {message}"))
}

/// Clear all recorded warnings (call when starting a new session).
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
