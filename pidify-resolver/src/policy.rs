//! Resolution policy: acceptance thresholds, tie-breaks, corroboration
//!
//! Turns a ranked candidate list into a terminal per-field decision. All
//! numbers come from configuration; the decision procedure itself is fixed.

use crate::models::{CandidateMatch, FieldKind, ResolutionStatus, ResolvedField};
use crate::normalize;
use crate::registries::{crossref, ror};
use pidify_common::config::{ResolverConfig, Thresholds};

/// Per-field decision rules built from the run configuration
pub struct ResolutionPolicy {
    thresholds: Thresholds,
    epsilon: f64,
    max_alternates: usize,
    corroboration_bonus: f64,
}

impl ResolutionPolicy {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            thresholds: config.thresholds.clone(),
            epsilon: config.epsilon,
            max_alternates: config.max_alternates,
            corroboration_bonus: config.corroboration_bonus,
        }
    }

    /// Acceptance threshold for a field type
    pub fn threshold_for(&self, field: FieldKind) -> f64 {
        match field {
            FieldKind::Pi => self.thresholds.person,
            FieldKind::Affiliation => self.thresholds.organization,
            FieldKind::Funding => self.thresholds.funding,
        }
    }

    /// Decide one field from its ranked candidates.
    ///
    /// The threshold comparison is inclusive: a score exactly at threshold is
    /// accepted. Two candidates closer than epsilon are indistinguishable and
    /// produce AMBIGUOUS with every within-epsilon candidate listed.
    pub fn decide(&self, field: FieldKind, mut ranked: Vec<CandidateMatch>) -> ResolvedField {
        if ranked.is_empty() {
            return ResolvedField::unresolved(field, Vec::new(), "no candidates returned");
        }

        let top = ranked[0].score;
        let second = ranked.get(1).map(|c| c.score).unwrap_or(0.0);
        let threshold = self.threshold_for(field);

        if top < threshold {
            ranked.truncate(self.max_alternates);
            return ResolvedField::unresolved(
                field,
                ranked,
                format!(
                    "best score below threshold ({:.4} < {:.2})",
                    top, threshold
                ),
            );
        }

        if top - second < self.epsilon {
            ranked.retain(|c| top - c.score < self.epsilon);
            let reason = format!(
                "multiple candidates within epsilon ({} candidates within {:.2} of best score {:.4})",
                ranked.len(),
                self.epsilon,
                top
            );
            return ResolvedField::ambiguous(field, ranked, reason);
        }

        let chosen = ranked.remove(0);
        ranked.truncate(self.max_alternates);
        let reason = format!(
            "accepted with score {:.4} (threshold {:.2}, margin {:.4})",
            top,
            threshold,
            top - second
        );
        ResolvedField::accepted(field, chosen, ranked, reason)
    }

    /// Corroboration boost for an accepted funding match.
    ///
    /// When the funding work's registry payload names a funder whose
    /// normalized form equals the resolved organization's normalized label,
    /// confidence rises by the configured bonus, capped at 1.0, and the
    /// corroboration is recorded in the reason. Status never changes here;
    /// an AMBIGUOUS or UNRESOLVED funding field is never retroactively
    /// accepted.
    pub fn corroborate(&self, funding: &mut ResolvedField, organization: &ResolvedField) {
        if funding.status != ResolutionStatus::Accepted
            || organization.status != ResolutionStatus::Accepted
        {
            return;
        }
        let (Some(funding_chosen), Some(org_chosen)) = (&funding.chosen, &organization.chosen)
        else {
            return;
        };

        let org_label = normalize::normalize(&org_chosen.display_label);
        if org_label.is_empty() {
            return;
        }

        let name_match = crossref::funder_names(&funding_chosen.raw_payload)
            .iter()
            .any(|name| normalize::normalize(name) == org_label);

        // Second signal: the work's funder DOI carries the FundRef id the
        // organization registry records for the resolved institution
        let id_match = ror::fundref_id(&org_chosen.raw_payload)
            .map(|fundref| {
                crossref::funder_ids(&funding_chosen.raw_payload)
                    .iter()
                    .any(|doi| doi.ends_with(&fundref))
            })
            .unwrap_or(false);

        if name_match || id_match {
            funding.confidence = (funding.confidence + self.corroboration_bonus).min(1.0);
            funding.reason.push_str(&format!(
                "; funder corroborated by resolved affiliation \"{}\" (+{:.2})",
                org_chosen.display_label, self.corroboration_bonus
            ));
            tracing::info!(
                funder = %funding_chosen.identifier,
                organization = %org_chosen.identifier,
                confidence = funding.confidence,
                "Funding match corroborated by resolved organization"
            );
        }
    }
}
