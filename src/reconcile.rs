//! Rank history reconciliation.
//!
//! One provider lookup per (domain, keyword, day) at most: a same-day record
//! in the ledger is authoritative and short-circuits the provider call, which
//! keeps repeated runs within the provider's call quota. Every failure path
//! degrades for the affected keyword only; a batch never aborts.

use chrono::{Local, NaiveDate};

use crate::config::{LocaleConfig, ReconcilerConfig};
use crate::info_time;
use crate::model::{normalize_domain, rank_delta, Observation, ObservationResult, RankPosition};
use crate::provider::RankLookupProvider;
use crate::store::HistoryStore;

pub struct Reconciler<P, S> {
    provider: P,
    store: S,
    config: ReconcilerConfig,
}

impl<P: RankLookupProvider, S: HistoryStore> Reconciler<P, S> {
    pub fn new(provider: P, store: S, config: ReconcilerConfig) -> Self {
        Reconciler {
            provider,
            store,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reconciles one keyword for `today`.
    ///
    /// 1. A same-day ledger record (always locale-scoped) is reused as-is.
    /// 2. Otherwise the provider is invoked exactly once; a provider error
    ///    degrades to the "not found" sentinel.
    /// 3. The delta is computed against the latest ledger record strictly
    ///    before `today`. The historical match is locale-scoped only when
    ///    [`ReconcilerConfig::locale_scoped_history`] is set.
    /// 4. Exactly one observation is appended iff step 2 ran and the lookup
    ///    itself did not error. Errored lookups are not persisted, so a
    ///    later retry the same day can still perform a fresh lookup.
    pub async fn reconcile(
        &self,
        domain: &str,
        keyword: &str,
        locale: &LocaleConfig,
        today: NaiveDate,
    ) -> ObservationResult {
        let domain_key = normalize_domain(domain);
        let history_locale = self
            .config
            .locale_scoped_history
            .then_some(locale.code.as_str());

        let same_day = match self
            .store
            .find_same_day(&domain_key, keyword, today, Some(&locale.code))
            .await
        {
            Ok(hit) => hit,
            Err(e) => {
                info_time!("history read failed for {:?}: {}", keyword, e);
                None
            }
        };

        let (position, url, fresh_lookup, lookup_errored) = match &same_day {
            Some(existing) => (existing.position, existing.url.clone(), false, false),
            None => match self
                .provider
                .lookup(keyword, &domain_key, locale, self.config.window_size)
                .await
            {
                Ok(found) => (found.position, found.url, true, false),
                Err(e) => {
                    info_time!("lookup failed for {:?}: {}", keyword, e);
                    (RankPosition::NotFound, None, true, true)
                }
            },
        };

        let prior = match self
            .store
            .find_latest_before(&domain_key, keyword, today, history_locale)
            .await
        {
            Ok(prior) => prior,
            Err(e) => {
                info_time!("history read failed for {:?}: {}", keyword, e);
                None
            }
        };
        let delta = prior.and_then(|p| rank_delta(p.position, position));

        let observation = Observation {
            date: today,
            domain: domain_key,
            keyword: same_day
                .as_ref()
                .map(|o| o.keyword.clone())
                .unwrap_or_else(|| keyword.trim().to_string()),
            locale: locale.code.clone(),
            position,
            url,
            delta,
        };

        let persisted = if same_day.is_some() {
            true
        } else if lookup_errored {
            false
        } else {
            match self.store.append(&observation).await {
                Ok(()) => true,
                Err(e) => {
                    info_time!("save failed for {:?}: {}", observation.keyword, e);
                    false
                }
            }
        };

        ObservationResult {
            observation,
            fresh_lookup,
            persisted,
        }
    }

    /// Processes keywords strictly in order, one fully reconciled before the
    /// next begins. Keywords are independent; a failure in one never stops
    /// the rest.
    pub async fn reconcile_batch(
        &self,
        domain: &str,
        keywords: &[String],
        locale: &LocaleConfig,
        today: NaiveDate,
    ) -> Vec<ObservationResult> {
        let mut results = Vec::with_capacity(keywords.len());
        for (i, keyword) in keywords.iter().enumerate() {
            info_time!("checking {:?} ({}/{})", keyword, i + 1, keywords.len());
            results.push(self.reconcile(domain, keyword, locale, today).await);
        }
        results
    }
}

/// Batch KPIs: how many keywords were tracked and how many sit in the
/// top 3 / top 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub tracked: usize,
    pub top_3: usize,
    pub top_10: usize,
}

pub fn summarize(results: &[ObservationResult]) -> BatchSummary {
    let ranks = || {
        results
            .iter()
            .filter_map(|r| r.observation.position.as_rank())
    };
    BatchSummary {
        tracked: results.len(),
        top_3: ranks().filter(|&p| p <= 3).count(),
        top_10: ranks().filter(|&p| p <= 10).count(),
    }
}
