//! Text normalization for identifier matching
//!
//! Pure text transform used identically for query construction and scoring,
//! so scoring is query-symmetric:
//! - Unicode NFKD fold with combining-mark (diacritic) stripping
//! - Lowercase conversion
//! - Punctuation stripping (non-alphanumerics become spaces)
//! - Whitespace collapsing
//! - Canonical mapping of common institutional abbreviations
//!   ("univ" and "university" collapse to the same token)

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Abbreviation → canonical token pairs for institutional and organizational
/// name variants. Both sides of each pair normalize to the canonical form.
const CANONICAL_TOKENS: &[(&str, &str)] = &[
    ("univ", "university"),
    ("inst", "institute"),
    ("instn", "institution"),
    ("coll", "college"),
    ("acad", "academy"),
    ("lab", "laboratory"),
    ("labs", "laboratory"),
    ("dept", "department"),
    ("natl", "national"),
    ("intl", "international"),
    ("assn", "association"),
    ("fdn", "foundation"),
    ("ctr", "center"),
    ("centre", "center"),
    ("tech", "technology"),
    ("sci", "science"),
];

/// Normalize a text field into its canonical token sequence.
///
/// Deterministic, no side effects.
pub fn tokens(text: &str) -> Vec<String> {
    // NFKD fold, drop combining marks so "José" and "Jose" collapse
    let folded: String = text.nfkd().filter(|c| !is_combining_mark(*c)).collect();

    let stripped: String = folded
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();

    stripped
        .split_whitespace()
        .map(canonical_token)
        .collect()
}

/// Normalize a text field into a single canonical string (tokens joined by
/// one space). Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    tokens(text).join(" ")
}

/// Map an already-lowercased token to its canonical form
fn canonical_token(token: &str) -> String {
    for (abbr, canonical) in CANONICAL_TOKENS {
        if token == *abbr || token == *canonical {
            return (*canonical).to_string();
        }
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Smith, Jane"), "smith jane");
        assert_eq!(normalize("AT&T Research"), "at t research");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize("José García"), "jose garcia");
        assert_eq!(normalize("Université de Montréal"), "universite de montreal");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  Jane   Smith  "), "jane smith");
    }

    #[test]
    fn abbreviations_collapse_with_full_forms() {
        assert_eq!(normalize("Univ. of Example"), normalize("University of Example"));
        assert_eq!(normalize("Natl. Inst. of Health"), normalize("National Institute of Health"));
        assert_eq!(normalize("Example Research Ctr"), normalize("Example Research Center"));
    }

    #[test]
    fn tokenizes_in_order() {
        assert_eq!(
            tokens("University of Example"),
            vec!["university", "of", "example"]
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  ...  "), "");
        assert!(tokens("").is_empty());
    }

    #[test]
    fn query_symmetry() {
        // The same transform serves query construction and scoring
        let a = normalize("Univ. of Éxample");
        let b = normalize(&normalize("University of Example"));
        assert_eq!(a, b);
    }
}
