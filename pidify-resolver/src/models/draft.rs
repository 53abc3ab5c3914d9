//! Draft record: the unresolved metadata extracted upstream
//!
//! Produced by the extraction collaborator (outside this crate) and treated
//! as read-only input for the whole resolution run.

use serde::{Deserialize, Serialize};

/// Structured, unresolved metadata from one data-management-plan document.
///
/// Immutable once produced by the upstream extractor; the engine only ever
/// borrows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRecord {
    /// DMP identifier (typically a DOI), passed through untouched
    pub dmp_id: String,
    /// Principal investigator name as printed in the document
    pub pi_name: String,
    /// ORCID iD printed in the document, when the document carries one.
    /// A valid value short-circuits the person lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pi_orcid: Option<String>,
    /// Institutional affiliation as printed
    pub affiliation_name: String,
    /// Funder name as printed
    pub funder_name: String,
    /// Funding opportunity number, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_opportunity_number: Option<String>,
    /// Award title, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_record() {
        let json = r#"{
            "dmp_id": "https://doi.org/10.48321/D1234",
            "pi_name": "Jane Smith",
            "affiliation_name": "University of Example",
            "funder_name": "National Science Foundation"
        }"#;

        let record: DraftRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.pi_name, "Jane Smith");
        assert!(record.pi_orcid.is_none());
        assert!(record.funding_opportunity_number.is_none());
    }

    #[test]
    fn deserializes_full_record() {
        let json = r#"{
            "dmp_id": "https://doi.org/10.48321/D1234",
            "pi_name": "Jane Smith",
            "pi_orcid": "0000-0002-1825-0097",
            "affiliation_name": "University of Example",
            "funder_name": "National Science Foundation",
            "funding_opportunity_number": "NSF-21-561",
            "award_title": "Collaborative Research: Example Award"
        }"#;

        let record: DraftRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.pi_orcid.as_deref(), Some("0000-0002-1825-0097"));
        assert_eq!(record.funding_opportunity_number.as_deref(), Some("NSF-21-561"));
    }
}
