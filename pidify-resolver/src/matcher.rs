//! Similarity scoring and candidate ranking
//!
//! Blended score in [0, 1] between a draft field value and a candidate
//! label: token-set overlap handles reordering ("Smith, Jane" vs
//! "Jane Smith"), normalized edit distance handles minor misspellings.
//! Weights are fixed and documented, not learned. An exact normalized-string
//! match is forced to 1.0 regardless of the blended formula, guarding
//! against floating-point drift.

use crate::models::{CandidateMatch, RegistrySource};
use crate::normalize;
use crate::registries::RawCandidate;
use std::collections::BTreeSet;

/// Token-set overlap weight
const WEIGHT_TOKEN_OVERLAP: f64 = 0.6;
/// Normalized edit-distance weight
const WEIGHT_EDIT_SIMILARITY: f64 = 0.4;

/// Score a candidate label against a draft value.
///
/// Both sides run through the same normalizer the query construction uses.
/// Returns 0.0 when either side normalizes to nothing.
pub fn score(draft_value: &str, candidate_label: &str) -> f64 {
    let draft_norm = normalize::normalize(draft_value);
    let label_norm = normalize::normalize(candidate_label);

    if draft_norm.is_empty() || label_norm.is_empty() {
        return 0.0;
    }

    // Exact normalized match short-circuits the blend
    if draft_norm == label_norm {
        return 1.0;
    }

    let overlap = token_set_overlap(&draft_norm, &label_norm);
    let edit = strsim::normalized_levenshtein(&draft_norm, &label_norm);

    (WEIGHT_TOKEN_OVERLAP * overlap + WEIGHT_EDIT_SIMILARITY * edit).clamp(0.0, 1.0)
}

/// Jaccard overlap between the token sets of two normalized strings
fn token_set_overlap(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();

    intersection as f64 / union as f64
}

/// Rank raw candidates against a draft value.
///
/// A candidate's score is the maximum over its display label and any
/// alternate labels the registry offered. Result is sorted score-descending
/// with a stable lexical tie-break on identifier (determinism requirement).
/// An empty candidate list yields an empty ranked list, not an error.
pub fn rank(
    draft_value: &str,
    source: RegistrySource,
    candidates: Vec<RawCandidate>,
) -> Vec<CandidateMatch> {
    let mut ranked: Vec<CandidateMatch> = candidates
        .into_iter()
        .map(|raw| {
            let best = std::iter::once(raw.display_label.as_str())
                .chain(raw.alt_labels.iter().map(String::as_str))
                .map(|label| score(draft_value, label))
                .fold(0.0_f64, f64::max);

            CandidateMatch {
                source,
                identifier: raw.identifier,
                display_label: raw.display_label,
                alt_labels: raw.alt_labels,
                raw_payload: raw.payload,
                score: best,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.identifier.cmp(&b.identifier))
    });

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(id: &str, label: &str) -> RawCandidate {
        RawCandidate {
            identifier: id.to_string(),
            display_label: label.to_string(),
            alt_labels: vec![],
            payload: json!({}),
        }
    }

    #[test]
    fn exact_match_scores_one() {
        assert_eq!(score("Jane Smith", "Jane Smith"), 1.0);
    }

    #[test]
    fn exact_normalized_match_scores_one() {
        // Different surface forms, identical canonical form
        assert_eq!(score("University of Example", "Univ. of Example"), 1.0);
        assert_eq!(score("José García", "Jose Garcia"), 1.0);
    }

    #[test]
    fn reordered_name_scores_high() {
        let s = score("Smith, Jane", "Jane Smith");
        // Token overlap is perfect; only edit distance differs
        assert!(s > 0.6, "reordered name scored {}", s);
        assert!(s < 1.0);
    }

    #[test]
    fn unrelated_labels_score_low() {
        let s = score("Jane Smith", "Wolfgang Amadeus Mozart");
        assert!(s < 0.3, "unrelated labels scored {}", s);
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(score("", "Jane Smith"), 0.0);
        assert_eq!(score("Jane Smith", "..."), 0.0);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        for (a, b) in [
            ("Jane Smith", "Jane Smith"),
            ("Jane Smith", "J. Smith"),
            ("National Science Foundation", "National Institutes of Health"),
            ("a", "b"),
        ] {
            let s = score(a, b);
            assert!((0.0..=1.0).contains(&s), "score({a:?}, {b:?}) = {s}");
        }
    }

    #[test]
    fn rank_sorts_by_score_descending() {
        let ranked = rank(
            "University of Example",
            RegistrySource::Organization,
            vec![
                raw("https://ror.org/03zzz", "Example Institute"),
                raw("https://ror.org/01aaa", "University of Example"),
                raw("https://ror.org/02bbb", "University of Examples"),
            ],
        );

        assert_eq!(ranked[0].identifier, "https://ror.org/01aaa");
        assert_eq!(ranked[0].score, 1.0);
        assert!(ranked[0].score >= ranked[1].score);
        assert!(ranked[1].score >= ranked[2].score);
    }

    #[test]
    fn rank_breaks_ties_lexically_by_identifier() {
        // Identical labels produce identical scores; order must still be stable
        let ranked = rank(
            "Jane Smith",
            RegistrySource::Person,
            vec![
                raw("0000-0002-9999-0000", "Jane Smith"),
                raw("0000-0001-1111-0000", "Jane Smith"),
            ],
        );

        assert_eq!(ranked[0].identifier, "0000-0001-1111-0000");
        assert_eq!(ranked[1].identifier, "0000-0002-9999-0000");
    }

    #[test]
    fn rank_empty_input_yields_empty_output() {
        let ranked = rank("Jane Smith", RegistrySource::Person, vec![]);
        assert!(ranked.is_empty());
    }

    #[test]
    fn alt_labels_lift_score() {
        let mut candidate = raw("10.13039/100000001", "NSF");
        candidate.alt_labels = vec!["National Science Foundation".to_string()];

        let ranked = rank(
            "National Science Foundation",
            RegistrySource::Funding,
            vec![candidate],
        );
        assert_eq!(ranked[0].score, 1.0);
    }
}
