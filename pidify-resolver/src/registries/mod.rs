//! Registry client adapters
//!
//! One thin, swappable adapter per identifier source. Each issues a search
//! query and returns an ordered sequence of raw candidate records exactly as
//! the registry shaped them. No retry logic and no knowledge of scoring here;
//! the resilience layer owns retries and the matcher owns scores.

use crate::models::RegistrySource;
use async_trait::async_trait;
use thiserror::Error;

pub mod crossref;
pub mod orcid;
pub mod ror;

pub use crossref::CrossrefClient;
pub use orcid::OrcidClient;
pub use ror::RorClient;

const USER_AGENT: &str = "pidify/0.1.0 (https://github.com/pidify/pidify)";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Registry call failures
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Connection or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Registry signalled throttling (HTTP 429/503)
    #[error("Rate limited by registry")]
    RateLimited,

    /// Unparsable or structurally unexpected payload
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl QueryError {
    /// Transient failures are worth retrying; a malformed payload is not,
    /// since the registry will return the same bytes again.
    pub fn is_transient(&self) -> bool {
        matches!(self, QueryError::Network(_) | QueryError::RateLimited)
    }
}

/// One raw search result before scoring
#[derive(Debug, Clone)]
pub struct RawCandidate {
    /// Persistent identifier the registry assigns
    pub identifier: String,
    /// Primary display label
    pub display_label: String,
    /// Alternate labels (aliases, acronyms, alt-names), when offered
    pub alt_labels: Vec<String>,
    /// Registry item verbatim, for provenance
    pub payload: serde_json::Value,
}

/// Search request handed to a registry client.
///
/// `term` is the normalized primary term and must be non-empty; auxiliary
/// filters narrow candidates before scoring when the registry supports them.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub term: String,
    /// Affiliation filter for person searches
    pub affiliation: Option<String>,
    /// Award/opportunity number filter for funding-work searches
    pub award_number: Option<String>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            affiliation: None,
            award_number: None,
        }
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn with_award_number(mut self, award_number: impl Into<String>) -> Self {
        self.award_number = Some(award_number.into());
        self
    }

    /// Deterministic cache key covering the term and every auxiliary filter
    pub fn cache_key(&self) -> String {
        format!(
            "{}|aff={}|award={}",
            self.term,
            self.affiliation.as_deref().unwrap_or(""),
            self.award_number.as_deref().unwrap_or("")
        )
    }
}

/// Per-registry search adapter.
///
/// Three concrete instances: person (ORCID), organization (ROR), and
/// funding-work (CrossRef). Tests substitute deterministic implementations
/// through this seam.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Which registry this adapter fronts
    fn source(&self) -> RegistrySource;

    /// Issue one search and return raw candidates in registry order.
    ///
    /// # Errors
    /// `QueryError::Network` on connection/timeout, `QueryError::RateLimited`
    /// when the registry throttles, `QueryError::Malformed` on an unparsable
    /// payload.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawCandidate>, QueryError>;
}

/// Shared HTTP client construction: descriptive User-Agent, bounded timeout
pub(crate) fn http_client() -> Result<reqwest::Client, QueryError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| QueryError::Network(e.to_string()))
}

/// Map an HTTP status to the query-error taxonomy. 2xx passes through.
pub(crate) fn check_status(status: reqwest::StatusCode) -> Result<(), QueryError> {
    if status.as_u16() == 429 || status.as_u16() == 503 {
        return Err(QueryError::RateLimited);
    }
    if !status.is_success() {
        return Err(QueryError::Network(format!("HTTP {}", status.as_u16())));
    }
    Ok(())
}

pub(crate) fn send_error(err: reqwest::Error) -> QueryError {
    QueryError::Network(err.to_string())
}
