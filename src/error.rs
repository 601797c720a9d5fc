use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid selector: {0}")]
    ParseSelector(String),

    #[error("Unknown locale code: {0}")]
    UnknownLocale(String),

    #[error("SERP_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Failures talking to the rank lookup provider. The reconciler degrades
/// these to the "not found" sentinel for the affected keyword; they never
/// abort the rest of a batch.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Failures at the history store boundary. Read failures degrade to "no
/// history available", write failures to "not persisted"; neither crashes
/// the reconciliation of other keywords.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("history write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("corrupt history record: {0}")]
    Corrupt(#[from] serde_json::Error),
}
