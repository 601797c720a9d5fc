//! CLI drivers wiring the HTTP provider, the on-disk ledger and the
//! reconciler together.

use chrono::Local;
use reqwest::Client;

use crate::config::{LocaleConfig, ProviderConfig, ReconcilerConfig};
use crate::content::{self, DEFAULT_STOP_WORDS};
use crate::info_time;
use crate::model::RankPosition;
use crate::provider::HttpSearchProvider;
use crate::reconcile::{summarize, Reconciler};
use crate::store::JsonlStore;
use crate::{Error, Result, COMPETITOR_LINKS};

fn provider_from_env() -> Result<HttpSearchProvider> {
    let api_key = std::env::var("SERP_API_KEY").map_err(|_| Error::MissingApiKey)?;
    Ok(HttpSearchProvider::new(ProviderConfig::new(api_key))?)
}

fn locale(code: &str) -> Result<LocaleConfig> {
    LocaleConfig::builtin(code).ok_or_else(|| Error::UnknownLocale(code.to_string()))
}

/// Tracks `keywords` for `domain` in the given locale, appending today's
/// observations to the ledger and printing positions, deltas and KPIs.
pub async fn run_tracking(domain: &str, keywords: &[String], locale_code: &str) -> Result<()> {
    let locale = locale(locale_code)?;
    let provider = provider_from_env()?;
    let config = ReconcilerConfig::default();
    let store = JsonlStore::new(&config.history_path);
    let window = config.window_size;
    let reconciler = Reconciler::new(provider, store, config);

    let today = Local::now().date_naive();
    let start_time = Local::now();
    let results = reconciler
        .reconcile_batch(domain, keywords, &locale, today)
        .await;
    info_time!(start_time, "Tracked {} keywords", results.len());

    println!("{:<30} {:>8} {:>7}  URL", "KEYWORD", "POSITION", "DELTA");
    for result in &results {
        let obs = &result.observation;
        let position = match obs.position {
            RankPosition::Ranked(n) => n.to_string(),
            RankPosition::NotFound => format!(">{window}"),
        };
        let delta = obs
            .delta
            .map(|d| format!("{d:+}"))
            .unwrap_or_else(|| "-".into());
        let note = if result.persisted { "" } else { "  (not persisted)" };
        println!(
            "{:<30} {:>8} {:>7}  {}{}",
            obs.keyword,
            position,
            delta,
            obs.url.as_deref().unwrap_or("-"),
            note,
        );
    }

    let summary = summarize(&results);
    println!(
        "tracked: {}   top 3: {}   top 10: {}",
        summary.tracked, summary.top_3, summary.top_10
    );
    Ok(())
}

/// Scores the draft in `text_path` against the pages currently ranking for
/// `query` and lists the competitor terms the draft is missing.
pub async fn run_analysis(query: &str, text_path: &str, locale_code: &str) -> Result<()> {
    let locale = locale(locale_code)?;
    let provider = provider_from_env()?;
    let user_text = tokio::fs::read_to_string(text_path).await?;

    let links = provider.top_links(query, &locale, COMPETITOR_LINKS).await?;
    if links.is_empty() {
        info_time!("no search results for {:?}", query);
        return Ok(());
    }

    let client = Client::new();
    let texts = content::fetch_competitor_texts(&client, &links).await?;
    let report = content::similarity_report(&user_text, &texts, DEFAULT_STOP_WORDS);

    println!("similarity score : {:.1}%", report.score);
    println!("your words       : {}", report.user_word_count);
    println!("competitor avg   : {}", report.avg_competitor_word_count);
    if report.missing_terms.is_empty() {
        println!("no missing terms, the draft covers the competitor vocabulary");
    } else {
        println!("missing terms    : {}", report.missing_terms.join(", "));
    }
    Ok(())
}
