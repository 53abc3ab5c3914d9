//! Resolution outcome types
//!
//! One `ResolvedField` per resolvable draft field, assembled into the final
//! `PidifiedRecord`. Candidates and resolved fields are created once and
//! never revised within a run; `raw_payload` stays traceable to the exact
//! registry response.

use serde::{Deserialize, Serialize};

/// Identifier source a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrySource {
    /// ORCID person registry
    #[serde(rename = "PERSON_REGISTRY")]
    Person,
    /// ROR organization registry
    #[serde(rename = "ORG_REGISTRY")]
    Organization,
    /// CrossRef funding-work registry
    #[serde(rename = "FUNDING_REGISTRY")]
    Funding,
}

impl RegistrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrySource::Person => "PERSON_REGISTRY",
            RegistrySource::Organization => "ORG_REGISTRY",
            RegistrySource::Funding => "FUNDING_REGISTRY",
        }
    }
}

/// Resolvable field of a draft record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Pi,
    Affiliation,
    Funding,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Pi => "pi",
            FieldKind::Affiliation => "affiliation",
            FieldKind::Funding => "funding",
        }
    }

    /// Registry source backing this field
    pub fn source(&self) -> RegistrySource {
        match self {
            FieldKind::Pi => RegistrySource::Person,
            FieldKind::Affiliation => RegistrySource::Organization,
            FieldKind::Funding => RegistrySource::Funding,
        }
    }
}

/// Terminal status of one field resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    /// Exactly one candidate cleared the threshold unambiguously
    Accepted,
    /// Multiple candidates within epsilon of the best; none chosen
    Ambiguous,
    /// No candidate cleared the threshold (or none returned)
    Unresolved,
    /// Registry call failed after retries, or the task hit the deadline.
    /// Distinct from Unresolved so operators can tell "service failed" from
    /// "no match exists".
    Error,
}

/// One registry search result scored against a draft value.
///
/// `raw_payload` holds the registry's item verbatim for audit and is never
/// mutated after creation. The score is assigned by the matcher, not by the
/// registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub source: RegistrySource,
    /// Persistent identifier (ORCID iD, ROR ID, DOI)
    pub identifier: String,
    pub display_label: String,
    /// Alternate labels the registry offers (aliases, acronyms, alt-names)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_labels: Vec<String>,
    /// Registry item exactly as returned, for provenance
    pub raw_payload: serde_json::Value,
    pub score: f64,
}

/// Outcome of resolving one draft field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedField {
    pub field: String,
    pub status: ResolutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen: Option<CandidateMatch>,
    /// Runner-up candidates, highest score first, ties by identifier
    pub alternates: Vec<CandidateMatch>,
    pub confidence: f64,
    /// Human-readable diagnostic sufficient to explain the decision
    pub reason: String,
}

impl ResolvedField {
    pub fn accepted(
        field: FieldKind,
        chosen: CandidateMatch,
        alternates: Vec<CandidateMatch>,
        reason: impl Into<String>,
    ) -> Self {
        let confidence = chosen.score;
        Self {
            field: field.as_str().to_string(),
            status: ResolutionStatus::Accepted,
            chosen: Some(chosen),
            alternates,
            confidence,
            reason: reason.into(),
        }
    }

    pub fn ambiguous(
        field: FieldKind,
        alternates: Vec<CandidateMatch>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.as_str().to_string(),
            status: ResolutionStatus::Ambiguous,
            chosen: None,
            alternates,
            confidence: 0.0,
            reason: reason.into(),
        }
    }

    pub fn unresolved(
        field: FieldKind,
        alternates: Vec<CandidateMatch>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.as_str().to_string(),
            status: ResolutionStatus::Unresolved,
            chosen: None,
            alternates,
            confidence: 0.0,
            reason: reason.into(),
        }
    }

    pub fn error(field: FieldKind, reason: impl Into<String>) -> Self {
        Self {
            field: field.as_str().to_string(),
            status: ResolutionStatus::Error,
            chosen: None,
            alternates: Vec::new(),
            confidence: 0.0,
            reason: reason.into(),
        }
    }
}

/// The system's output artifact: the draft identifiers plus one resolved
/// field per resolvable input field. Assembled once, after all field tasks
/// complete or time out, in fixed field order regardless of task completion
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PidifiedRecord {
    pub dmp_id: String,
    pub pi: ResolvedField,
    pub affiliation: ResolvedField,
    pub funding: ResolvedField,
}
