//! ROR organization registry client
//!
//! Queries the ROR affiliation-matching endpoint. ROR's own `chosen`/`score`
//! hints stay untouched in the payload; candidate scoring is done locally so
//! every source is judged by the same yardstick.

use super::{check_status, http_client, send_error, QueryError, RawCandidate, RegistryClient, SearchQuery};
use crate::models::RegistrySource;
use async_trait::async_trait;

const ROR_BASE_URL: &str = "https://api.ror.org";

/// ROR affiliation search client
pub struct RorClient {
    http: reqwest::Client,
    base_url: String,
}

impl RorClient {
    pub fn new() -> Result<Self, QueryError> {
        Ok(Self {
            http: http_client()?,
            base_url: ROR_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl RegistryClient for RorClient {
    fn source(&self) -> RegistrySource {
        RegistrySource::Organization
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawCandidate>, QueryError> {
        tracing::debug!(affiliation = %query.term, "ROR affiliation search");

        let url = format!("{}/organizations", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("affiliation", query.term.as_str())])
            .send()
            .await
            .map_err(send_error)?;

        check_status(response.status())?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| QueryError::Malformed(e.to_string()))?;

        let items = body
            .get("items")
            .and_then(|v| v.as_array())
            .ok_or_else(|| QueryError::Malformed("items missing from ROR response".to_string()))?;

        let candidates = items
            .iter()
            .filter_map(|item| {
                let organization = item.get("organization")?;
                let id = organization.get("id")?.as_str()?;
                let name = organization.get("name")?.as_str()?;

                let mut alt_labels: Vec<String> = Vec::new();
                for key in ["aliases", "acronyms"] {
                    if let Some(values) = organization.get(key).and_then(|v| v.as_array()) {
                        alt_labels
                            .extend(values.iter().filter_map(|v| v.as_str().map(String::from)));
                    }
                }
                if let Some(labels) = organization.get("labels").and_then(|v| v.as_array()) {
                    alt_labels.extend(
                        labels
                            .iter()
                            .filter_map(|l| l.get("label").and_then(|v| v.as_str()).map(String::from)),
                    );
                }

                Some(RawCandidate {
                    identifier: id.to_string(),
                    display_label: name.to_string(),
                    alt_labels,
                    payload: item.clone(),
                })
            })
            .collect();

        Ok(candidates)
    }
}

/// FundRef funder id recorded for a ROR organization, when one exists.
///
/// Narrow accessor for the registry-specific payload shape; nothing outside
/// this module knows where FundRef ids live.
pub fn fundref_id(payload: &serde_json::Value) -> Option<String> {
    let fundref = payload
        .get("organization")?
        .get("external_ids")?
        .get("FundRef")?;

    if let Some(preferred) = fundref.get("preferred").and_then(|v| v.as_str()) {
        return Some(preferred.to_string());
    }

    // No preferred id: unambiguous only when exactly one id is listed
    let all = fundref.get("all").and_then(|v| v.as_array())?;
    if all.len() == 1 {
        return all[0].as_str().map(String::from);
    }
    None
}
