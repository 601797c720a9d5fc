//! Keyword rank tracker.
//!
//! The core is [`reconcile::Reconciler`]: for a (domain, keyword, locale, day)
//! it performs at most one provider lookup per day, appends the observation to
//! an append-only history ledger and computes the rank change against the most
//! recent prior observation. The provider and the ledger sit behind traits so
//! backends can be swapped freely.

mod macros;

pub mod config;
pub mod content;
pub mod error;
pub mod model;
pub mod process;
pub mod provider;
pub mod reconcile;
pub mod store;

pub use error::{Error, Result};

/// Default ledger location used by the CLI driver.
const HISTORY_PATH: &str = "rank_history.jsonl";
/// Default search-results window (top N) scanned for the tracked domain.
const DEFAULT_WINDOW: usize = 100;
/// How many top-ranking competitor pages the content analysis pulls.
const COMPETITOR_LINKS: usize = 3;
/// How many high-weight competitor terms are considered when extracting
/// terms missing from the user's text.
const MISSING_TERM_CANDIDATES: usize = 15;
