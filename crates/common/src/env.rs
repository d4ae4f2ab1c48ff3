//! Environment-variable expansion for candidate path patterns.
//!
//! Three placeholder styles are recognised so a single pattern list can be
//! written for either family of platforms:
//!
//! - `%VAR%` (Windows)
//! - `${VAR}`
//! - `$VAR`
//!
//! Lookup on Windows-style placeholders is case-insensitive, matching how
//! the Windows environment behaves.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%([A-Za-z_][A-Za-z0-9_()]*)%|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("placeholder regex is valid")
});

/// Expands placeholders against the process environment.
///
/// Returns `None` if any referenced variable is unset, so callers can skip a
/// pattern that cannot name a real file.
pub fn expand_env(pattern: &str) -> Option<String> {
    expand_env_with(pattern, lookup_var)
}

/// Expands placeholders using `lookup` as the variable source.
pub fn expand_env_with<F>(pattern: &str, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = false;
    let expanded = PLACEHOLDER.replace_all(pattern, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match lookup(name) {
            Some(value) => value,
            None => {
                missing = true;
                String::new()
            }
        }
    });

    if missing {
        None
    } else {
        Some(expanded.into_owned())
    }
}

fn lookup_var(name: &str) -> Option<String> {
    if let Ok(value) = std::env::var(name) {
        return Some(value);
    }
    if cfg!(windows) {
        return std::env::vars()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value);
    }
    None
}
