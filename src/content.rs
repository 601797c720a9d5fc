//! Competitor content analysis: fetches top-ranking pages, extracts their
//! text and scores the user's draft against them with TF-IDF cosine
//! similarity. Also surfaces high-weight competitor terms the draft lacks.

use std::collections::{HashMap, HashSet};

use chrono::Local;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::task::{spawn_blocking, JoinSet};

use crate::{info_time, Error, Result, MISSING_TERM_CANDIDATES};

/// English + French function words, matching the markets the built-in
/// locales cover.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "of", "to", "in", "for", "is", "on", "with", "that", "this", "it",
    "le", "la", "les", "des", "du", "un", "une", "et", "en", "pour", "que", "dans", "est", "au",
    "aux", "ce", "ces", "sur", "par", "plus",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityReport {
    /// Cosine similarity of the draft against the competitor centroid,
    /// as a percentage rounded to one decimal.
    pub score: f64,
    pub user_word_count: usize,
    pub avg_competitor_word_count: usize,
    /// High-weight competitor terms absent from the draft, strongest first.
    pub missing_terms: Vec<String>,
}

/// Downloads each link and extracts its readable text. Links that fail to
/// download or parse are skipped; the order of the returned texts is not
/// significant.
pub async fn fetch_competitor_texts(client: &Client, links: &[String]) -> Result<Vec<String>> {
    let mut tasks = JoinSet::new();
    for link in links {
        tasks.spawn({
            // Client uses Arc so we can clone cheaply
            let client = client.clone();
            let link = link.clone();
            async move { fetch_clean_text(client, link).await }
        });
    }

    let mut texts = Vec::with_capacity(links.len());
    while let Some(task) = tasks.join_next().await {
        match task? {
            Ok(text) if !text.trim().is_empty() => texts.push(text),
            Ok(_) => info_time!("skipping an empty competitor page"),
            Err(e) => info_time!("skipping a competitor page: {}", e),
        }
    }
    Ok(texts)
}

async fn fetch_clean_text(client: Client, link: String) -> Result<String> {
    let html = client.get(&link).send().await?.text().await?;
    // scraper's DOM types are not Send, so parsing stays on a blocking thread
    let text = spawn_blocking(move || extract_text(&html)).await??;
    Ok(text)
}

/// Pulls the visible copy out of a page: headings, paragraphs and list items.
pub fn extract_text(html: &str) -> Result<String> {
    let doc = Html::parse_document(html);
    let selector = create_selector("p, h1, h2, h3, li")?;

    let mut out = String::new();
    for element in doc.select(&selector) {
        for chunk in element.text() {
            let chunk = chunk.trim();
            if !chunk.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(chunk);
            }
        }
    }
    Ok(out)
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseSelector(sel_str.into()))
}

/// Scores `user_text` against the competitor corpus.
///
/// TF-IDF with smoothed idf and l2-normalized document vectors; the score is
/// the cosine similarity of the user vector against the mean competitor
/// vector. Missing terms are drawn from the top competitor terms by mean
/// weight that never occur in the user text.
pub fn similarity_report(
    user_text: &str,
    competitor_texts: &[String],
    stop_words: &[&str],
) -> SimilarityReport {
    let user_word_count = user_text.split_whitespace().count();
    let comp_word_counts: Vec<usize> = competitor_texts
        .iter()
        .map(|t| t.split_whitespace().count())
        .collect();
    let avg_competitor_word_count = if comp_word_counts.is_empty() {
        0
    } else {
        comp_word_counts.iter().sum::<usize>() / comp_word_counts.len()
    };

    let stop: HashSet<&str> = stop_words.iter().copied().collect();
    let docs: Vec<HashMap<String, usize>> = competitor_texts
        .iter()
        .map(|t| term_counts(t, &stop))
        .chain(std::iter::once(term_counts(user_text, &stop)))
        .collect();

    let mut vocab: Vec<&str> = docs
        .iter()
        .flat_map(|d| d.keys().map(String::as_str))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    vocab.sort_unstable();

    if vocab.is_empty() || competitor_texts.is_empty() {
        return SimilarityReport {
            score: 0.0,
            user_word_count,
            avg_competitor_word_count,
            missing_terms: Vec::new(),
        };
    }

    // smoothed idf, as if every term occurred in one extra document
    let n_docs = docs.len() as f64;
    let idf: Vec<f64> = vocab
        .iter()
        .map(|term| {
            let df = docs.iter().filter(|d| d.contains_key(*term)).count() as f64;
            ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
        })
        .collect();

    let vectors: Vec<Vec<f64>> = docs
        .iter()
        .map(|doc| {
            let mut v: Vec<f64> = vocab
                .iter()
                .zip(&idf)
                .map(|(term, idf)| doc.get(*term).copied().unwrap_or(0) as f64 * idf)
                .collect();
            let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > 0.0 {
                for x in &mut v {
                    *x /= norm;
                }
            }
            v
        })
        .collect();

    let (user_vec, comp_vecs) = vectors
        .split_last()
        .expect("the user document is always present");
    let centroid: Vec<f64> = (0..vocab.len())
        .map(|i| comp_vecs.iter().map(|v| v[i]).sum::<f64>() / comp_vecs.len() as f64)
        .collect();

    let score = (cosine(user_vec, &centroid) * 1000.0).round() / 10.0;

    // top competitor terms by mean weight that the user text never uses
    let mut weighted: Vec<(usize, f64)> = centroid.iter().copied().enumerate().collect();
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1).then(vocab[a.0].cmp(vocab[b.0])));
    let missing_terms = weighted
        .into_iter()
        .take(MISSING_TERM_CANDIDATES)
        .filter(|(i, w)| *w > 0.0 && user_vec[*i] == 0.0)
        .map(|(i, _)| vocab[i].to_string())
        .collect();

    SimilarityReport {
        score,
        user_word_count,
        avg_competitor_word_count,
        missing_terms,
    }
}

/// Lower-cased alphanumeric tokens of at least two characters, stop words
/// removed.
fn term_counts(text: &str, stop: &HashSet<&str>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2 && !stop.contains(t))
    {
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    counts
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_visible_copy_only() {
        let html = r#"
            <html><head><title>t</title><script>var x = 1;</script></head>
            <body>
              <h1>Robot cookers</h1>
              <p>The best robot cooker of 2026.</p>
              <ul><li>cheap</li><li>fast</li></ul>
              <div>stray div text</div>
            </body></html>
        "#;
        let text = extract_text(html).unwrap();
        assert!(text.contains("Robot cookers"));
        assert!(text.contains("best robot cooker"));
        assert!(text.contains("cheap"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("stray div text"));
    }

    #[test]
    fn identical_texts_score_near_one_hundred() {
        let competitors = vec!["robot cooker recipes pressure steam".to_string()];
        let report = similarity_report(
            "robot cooker recipes pressure steam",
            &competitors,
            DEFAULT_STOP_WORDS,
        );
        assert!(report.score > 99.0, "score was {}", report.score);
        assert!(report.missing_terms.is_empty());
    }

    #[test]
    fn disjoint_texts_score_zero() {
        let competitors = vec!["alpha beta gamma".to_string()];
        let report = similarity_report("delta epsilon zeta", &competitors, DEFAULT_STOP_WORDS);
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn missing_terms_are_competitor_terms_absent_from_the_draft() {
        let competitors = vec![
            "pressure cooker recipes pressure settings".to_string(),
            "pressure cooker manual settings".to_string(),
        ];
        let report = similarity_report("cooker recipes", &competitors, DEFAULT_STOP_WORDS);
        assert!(report.missing_terms.contains(&"pressure".to_string()));
        assert!(report.missing_terms.contains(&"settings".to_string()));
        assert!(!report.missing_terms.contains(&"cooker".to_string()));
    }

    #[test]
    fn word_counts_and_empty_corpus() {
        let report = similarity_report("one two three", &[], DEFAULT_STOP_WORDS);
        assert_eq!(report.user_word_count, 3);
        assert_eq!(report.avg_competitor_word_count, 0);
        assert_eq!(report.score, 0.0);

        let competitors = vec!["a b c d".to_string(), "a b".to_string()];
        let report = similarity_report("x", &competitors, &[]);
        assert_eq!(report.avg_competitor_word_count, 3);
    }
}
