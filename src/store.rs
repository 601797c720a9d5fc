//! Append-only history ledger.
//!
//! The ledger is assumed append-ordered, so both lookups scan from the end:
//! the latest prior entry for a keyword is found in O(k) for k = entries
//! appended since that keyword was last checked.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::{fs, io::AsyncWriteExt};

use crate::error::StoreError;
use crate::model::{normalize_keyword, Observation};

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The authoritative observation for (domain, keyword, date), if one was
    /// already recorded. `locale` narrows the match when given.
    async fn find_same_day(
        &self,
        domain: &str,
        keyword: &str,
        date: NaiveDate,
        locale: Option<&str>,
    ) -> Result<Option<Observation>, StoreError>;

    /// The most recent observation strictly before `date` for the same
    /// domain+keyword.
    async fn find_latest_before(
        &self,
        domain: &str,
        keyword: &str,
        date: NaiveDate,
        locale: Option<&str>,
    ) -> Result<Option<Observation>, StoreError>;

    /// Appends one observation to the ledger. Existing entries are never
    /// mutated or deleted.
    async fn append(&self, observation: &Observation) -> Result<(), StoreError>;
}

fn matches(obs: &Observation, domain: &str, keyword_key: &str, locale: Option<&str>) -> bool {
    obs.domain == domain
        && normalize_keyword(&obs.keyword) == keyword_key
        && locale.map_or(true, |l| obs.locale == l)
}

/// Vec-backed store for tests and throwaway runs. Append-ordered.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<Observation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Observation>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn find_same_day(
        &self,
        domain: &str,
        keyword: &str,
        date: NaiveDate,
        locale: Option<&str>,
    ) -> Result<Option<Observation>, StoreError> {
        let key = normalize_keyword(keyword);
        Ok(self
            .lock()
            .iter()
            .rev()
            .find(|o| o.date == date && matches(o, domain, &key, locale))
            .cloned())
    }

    async fn find_latest_before(
        &self,
        domain: &str,
        keyword: &str,
        date: NaiveDate,
        locale: Option<&str>,
    ) -> Result<Option<Observation>, StoreError> {
        let key = normalize_keyword(keyword);
        Ok(self
            .lock()
            .iter()
            .rev()
            .find(|o| o.date < date && matches(o, domain, &key, locale))
            .cloned())
    }

    async fn append(&self, observation: &Observation) -> Result<(), StoreError> {
        self.lock().push(observation.clone());
        Ok(())
    }
}

/// JSON-lines ledger on disk, one observation per line in append order.
/// A missing file reads as empty history; corrupt lines are skipped at this
/// boundary rather than surfaced.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlStore { path: path.into() }
    }

    async fn read_all(&self) -> Result<Vec<Observation>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Read(e)),
        };
        Ok(raw
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }
}

#[async_trait]
impl HistoryStore for JsonlStore {
    async fn find_same_day(
        &self,
        domain: &str,
        keyword: &str,
        date: NaiveDate,
        locale: Option<&str>,
    ) -> Result<Option<Observation>, StoreError> {
        let key = normalize_keyword(keyword);
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .rev()
            .find(|o| o.date == date && matches(o, domain, &key, locale)))
    }

    async fn find_latest_before(
        &self,
        domain: &str,
        keyword: &str,
        date: NaiveDate,
        locale: Option<&str>,
    ) -> Result<Option<Observation>, StoreError> {
        let key = normalize_keyword(keyword);
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .rev()
            .find(|o| o.date < date && matches(o, domain, &key, locale)))
    }

    async fn append(&self, observation: &Observation) -> Result<(), StoreError> {
        let line = serde_json::to_string(observation)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(StoreError::Write)?;
        file.write_all(line.as_bytes())
            .await
            .map_err(StoreError::Write)?;
        file.write_all(b"\n").await.map_err(StoreError::Write)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RankPosition;

    fn obs(date: &str, keyword: &str, locale: &str, position: u32) -> Observation {
        Observation {
            date: date.parse().unwrap(),
            domain: "example.com".into(),
            keyword: keyword.into(),
            locale: locale.into(),
            position: RankPosition::Ranked(position),
            url: None,
            delta: None,
        }
    }

    #[tokio::test]
    async fn latest_before_picks_most_recent_prior_entry() {
        let store = MemoryStore::new();
        store.append(&obs("2026-08-18", "x", "us", 20)).await.unwrap();
        store.append(&obs("2026-08-19", "x", "us", 15)).await.unwrap();
        store.append(&obs("2026-08-21", "x", "us", 9)).await.unwrap();

        let today = "2026-08-21".parse().unwrap();
        let prior = store
            .find_latest_before("example.com", "x", today, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(prior.date.to_string(), "2026-08-19");
        assert_eq!(prior.position, RankPosition::Ranked(15));
    }

    #[tokio::test]
    async fn keyword_match_is_case_insensitive() {
        let store = MemoryStore::new();
        store.append(&obs("2026-08-20", "Best Robot", "us", 4)).await.unwrap();

        let today = "2026-08-20".parse().unwrap();
        let hit = store
            .find_same_day("example.com", "  best robot ", today, None)
            .await
            .unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn locale_filter_narrows_matches() {
        let store = MemoryStore::new();
        store.append(&obs("2026-08-19", "x", "fr", 3)).await.unwrap();

        let today = "2026-08-21".parse().unwrap();
        let scoped = store
            .find_latest_before("example.com", "x", today, Some("us"))
            .await
            .unwrap();
        assert!(scoped.is_none());
        let unscoped = store
            .find_latest_before("example.com", "x", today, None)
            .await
            .unwrap();
        assert!(unscoped.is_some());
    }

    fn temp_ledger(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("ranktrack-{}-{}.jsonl", name, std::process::id()));
        let _ = std::fs::remove_file(&p);
        p
    }

    #[tokio::test]
    async fn jsonl_store_appends_and_scans() {
        let path = temp_ledger("append");
        let store = JsonlStore::new(&path);

        store.append(&obs("2026-08-19", "x", "us", 12)).await.unwrap();
        store.append(&obs("2026-08-21", "x", "us", 7)).await.unwrap();

        let today = "2026-08-21".parse().unwrap();
        let same_day = store
            .find_same_day("example.com", "x", today, Some("us"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same_day.position, RankPosition::Ranked(7));

        let prior = store
            .find_latest_before("example.com", "x", today, Some("us"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(prior.position, RankPosition::Ranked(12));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn jsonl_store_tolerates_polluted_and_corrupt_lines() {
        let path = temp_ledger("polluted");
        std::fs::write(
            &path,
            concat!(
                r#"{"date":"2026-08-19","domain":"example.com","keyword":"x","locale":"us","position":"'12 "}"#,
                "\n",
                "not json at all\n",
            ),
        )
        .unwrap();

        let store = JsonlStore::new(&path);
        let today = "2026-08-21".parse().unwrap();
        let prior = store
            .find_latest_before("example.com", "x", today, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(prior.position, RankPosition::Ranked(12));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_ledger_reads_as_empty_history() {
        let store = JsonlStore::new("/nonexistent/dir/ledger.jsonl");
        let today = "2026-08-21".parse().unwrap();
        let prior = store
            .find_latest_before("example.com", "x", today, None)
            .await
            .unwrap();
        assert!(prior.is_none());
    }
}
