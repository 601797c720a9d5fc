//! Explicit configuration passed in at construction. No process-wide
//! settings maps; the binary assembles these from its environment.

use std::time::Duration;

use crate::{DEFAULT_WINDOW, HISTORY_PATH};

/// Country/language configuration for a lookup, keyed by a short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleConfig {
    pub code: String,
    /// Geolocation parameter (`gl`).
    pub gl: String,
    /// Interface language parameter (`hl`).
    pub hl: String,
    pub google_domain: String,
    pub location: String,
}

impl LocaleConfig {
    pub fn us() -> Self {
        LocaleConfig {
            code: "us".into(),
            gl: "us".into(),
            hl: "en".into(),
            google_domain: "google.com".into(),
            location: "United States".into(),
        }
    }

    pub fn fr() -> Self {
        LocaleConfig {
            code: "fr".into(),
            gl: "fr".into(),
            hl: "fr".into(),
            google_domain: "google.fr".into(),
            location: "France".into(),
        }
    }

    /// Looks up a built-in locale by its code.
    pub fn builtin(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "us" => Some(Self::us()),
            "fr" => Some(Self::fr()),
            _ => None,
        }
    }
}

/// Connection settings for the HTTP search provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        ProviderConfig {
            api_key: api_key.into(),
            endpoint: "https://google.serper.dev/search".into(),
            timeout: Duration::from_secs(20),
        }
    }
}

/// Reconciler behavior knobs.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Size of the provider result window to scan, typically the top 100.
    pub window_size: usize,
    /// Whether the *historical* match key includes the locale. Same-day
    /// dedup is always locale-scoped; this only controls whether yesterday's
    /// observation under another locale counts as history. Off by default:
    /// a keyword's history is tracked per domain+keyword across locales.
    pub locale_scoped_history: bool,
    /// Ledger path used by the CLI driver.
    pub history_path: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            window_size: DEFAULT_WINDOW,
            locale_scoped_history: false,
            history_path: HISTORY_PATH.into(),
        }
    }
}
