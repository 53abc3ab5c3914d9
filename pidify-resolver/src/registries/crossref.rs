//! CrossRef funding-work registry client
//!
//! Queries the CrossRef works API for award records. The opportunity/award
//! number narrows candidates server-side (`filter=award.number:`) before any
//! scoring happens; funder names on each work stay in the payload for the
//! corroboration pass.

use super::{check_status, http_client, send_error, QueryError, RawCandidate, RegistryClient, SearchQuery};
use crate::models::RegistrySource;
use async_trait::async_trait;

const CROSSREF_BASE_URL: &str = "https://api.crossref.org";
const MAX_ROWS: u32 = 20;

/// CrossRef works/award search client
pub struct CrossrefClient {
    http: reqwest::Client,
    base_url: String,
}

impl CrossrefClient {
    pub fn new() -> Result<Self, QueryError> {
        Ok(Self {
            http: http_client()?,
            base_url: CROSSREF_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl RegistryClient for CrossrefClient {
    fn source(&self) -> RegistrySource {
        RegistrySource::Funding
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawCandidate>, QueryError> {
        let mut params: Vec<(String, String)> = vec![
            ("rows".to_string(), MAX_ROWS.to_string()),
            ("query.bibliographic".to_string(), query.term.clone()),
        ];
        if let Some(award) = &query.award_number {
            params.push(("filter".to_string(), format!("award.number:{}", award)));
        }

        tracing::debug!(term = %query.term, award = ?query.award_number, "CrossRef works search");

        let url = format!("{}/works", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(send_error)?;

        check_status(response.status())?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| QueryError::Malformed(e.to_string()))?;

        let items = body
            .get("message")
            .and_then(|m| m.get("items"))
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                QueryError::Malformed("message.items missing from CrossRef response".to_string())
            })?;

        let candidates = items
            .iter()
            .filter_map(|item| {
                let doi = item.get("DOI")?.as_str()?;
                let titles = item.get("title").and_then(|v| v.as_array());
                let display = titles
                    .and_then(|t| t.first())
                    .and_then(|v| v.as_str())
                    .unwrap_or(doi)
                    .to_string();

                // Secondary title entries become alias labels
                let alt_labels = titles
                    .map(|t| {
                        t.iter()
                            .skip(1)
                            .filter_map(|v| v.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_default();

                Some(RawCandidate {
                    identifier: doi.to_string(),
                    display_label: display,
                    alt_labels,
                    payload: item.clone(),
                })
            })
            .collect();

        Ok(candidates)
    }
}

/// Funder names attached to a CrossRef work.
///
/// Narrow accessor for the corroboration logic; the policy never walks the
/// payload itself.
pub fn funder_names(payload: &serde_json::Value) -> Vec<String> {
    payload
        .get("funder")
        .and_then(|v| v.as_array())
        .map(|funders| {
            funders
                .iter()
                .filter_map(|f| f.get("name").and_then(|v| v.as_str()).map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Funder DOIs attached to a CrossRef work (kept for audit output)
pub fn funder_ids(payload: &serde_json::Value) -> Vec<String> {
    payload
        .get("funder")
        .and_then(|v| v.as_array())
        .map(|funders| {
            funders
                .iter()
                .filter_map(|f| f.get("DOI").and_then(|v| v.as_str()).map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_funder_names() {
        let payload = json!({
            "DOI": "10.1000/example",
            "funder": [
                {"name": "National Science Foundation", "DOI": "10.13039/100000001"},
                {"name": "Example Trust"}
            ]
        });
        assert_eq!(
            funder_names(&payload),
            vec!["National Science Foundation", "Example Trust"]
        );
        assert_eq!(funder_ids(&payload), vec!["10.13039/100000001"]);
    }

    #[test]
    fn tolerates_missing_funder_block() {
        let payload = json!({"DOI": "10.1000/example"});
        assert!(funder_names(&payload).is_empty());
        assert!(funder_ids(&payload).is_empty());
    }
}
