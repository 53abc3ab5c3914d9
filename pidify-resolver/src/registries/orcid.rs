//! ORCID person registry client
//!
//! Queries the public ORCID expanded-search API by given-and-family names,
//! optionally narrowed by affiliation organization name. Also hosts the
//! ORCID iD format/checksum validation used for iDs supplied directly in the
//! source document.

use super::{check_status, http_client, send_error, QueryError, RawCandidate, RegistryClient, SearchQuery};
use crate::models::RegistrySource;
use async_trait::async_trait;

const ORCID_BASE_URL: &str = "https://pub.orcid.org/v3.0";
const MAX_ROWS: u32 = 20;

/// ORCID expanded-search client
pub struct OrcidClient {
    http: reqwest::Client,
    base_url: String,
}

impl OrcidClient {
    pub fn new() -> Result<Self, QueryError> {
        Ok(Self {
            http: http_client()?,
            base_url: ORCID_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl RegistryClient for OrcidClient {
    fn source(&self) -> RegistrySource {
        RegistrySource::Person
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawCandidate>, QueryError> {
        let mut q = format!("given-and-family-names:\"{}\"", query.term);
        if let Some(affiliation) = &query.affiliation {
            q.push_str(&format!(" AND affiliation-org-name:\"{}\"", affiliation));
        }

        tracing::debug!(query = %q, "ORCID expanded-search");

        let url = format!("{}/expanded-search/", self.base_url);
        let rows = MAX_ROWS.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[("q", q.as_str()), ("rows", rows.as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(send_error)?;

        check_status(response.status())?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| QueryError::Malformed(e.to_string()))?;

        let items = match body.get("expanded-result") {
            Some(serde_json::Value::Array(items)) => items.as_slice(),
            // ORCID returns null instead of [] when nothing matched
            Some(serde_json::Value::Null) | None => &[],
            Some(_) => {
                return Err(QueryError::Malformed(
                    "expanded-result is not an array".to_string(),
                ))
            }
        };

        let candidates = items
            .iter()
            .filter_map(|item| {
                let orcid_id = item.get("orcid-id")?.as_str()?;
                let given = item.get("given-names").and_then(|v| v.as_str()).unwrap_or("");
                let family = item.get("family-names").and_then(|v| v.as_str()).unwrap_or("");
                let display = format!("{} {}", given, family).trim().to_string();
                if display.is_empty() {
                    tracing::warn!(orcid_id, "Skipping ORCID result without a name");
                    return None;
                }

                Some(RawCandidate {
                    identifier: orcid_id.to_string(),
                    display_label: display,
                    // "Family, Given" ordering is handled by the token-set
                    // scorer; no alias labels needed
                    alt_labels: Vec::new(),
                    payload: item.clone(),
                })
            })
            .collect();

        Ok(candidates)
    }
}

/// Validate an ORCID iD: 0000-0000-0000-000X shape plus the ISO 7064 11-2
/// check digit.
pub fn is_valid_orcid(id: &str) -> bool {
    let compact: Vec<char> = id.chars().filter(|c| *c != '-').collect();
    if compact.len() != 16 {
        return false;
    }
    if id.split('-').count() != 4 || id.split('-').any(|g| g.len() != 4) {
        return false;
    }

    let mut total: u32 = 0;
    for c in &compact[..15] {
        let digit = match c.to_digit(10) {
            Some(d) => d,
            None => return false,
        };
        total = (total + digit) * 2;
    }

    let remainder = total % 11;
    let check = (12 - remainder) % 11;
    let expected = if check == 10 {
        'X'
    } else {
        char::from_digit(check, 10).unwrap_or('0')
    };

    compact[15] == expected
}
