//! Name-similarity scoring for labels without an identifier match.
//!
//! Scorers are injected into the reconciler through the [`Similarity`] trait,
//! so any `Fn(&str, &str) -> f64` can stand in for the bundled ones.

use cyanea_core::Scored;

use crate::lookup::CanonicalLookup;
use crate::term::{normalize_label, OntologyTerm};

/// A similarity score in `[0, 1]` between two labels, 1 meaning identical.
pub trait Similarity {
    fn score(&self, a: &str, b: &str) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64,
{
    fn score(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// `1 - levenshtein(a, b) / max(|a|, |b|)` over case-folded characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl Similarity for NormalizedLevenshtein {
    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(&normalize_label(a), &normalize_label(b))
    }
}

/// Jaro-Winkler similarity over case-folded characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Similarity for JaroWinkler {
    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(&normalize_label(a), &normalize_label(b))
    }
}

/// A canonical term proposed for a label by name similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub term: &'a OntologyTerm,
    /// The name or synonym of `term` that scored best.
    pub matched: &'a str,
    pub score: f64,
}

impl Scored for Candidate<'_> {
    fn score(&self) -> f64 {
        self.score
    }
}

/// Rank canonical terms by their best-scoring name or synonym against `query`.
///
/// Returns at most `limit` candidates, one per term, ordered by descending
/// score and then by ontology id so the order is stable for any lookup.
pub fn best_matches<'a, L, S>(
    query: &str,
    lookup: &'a L,
    scorer: &S,
    limit: usize,
) -> Vec<Candidate<'a>>
where
    L: CanonicalLookup + ?Sized,
    S: Similarity + ?Sized,
{
    let mut candidates: Vec<Candidate<'a>> = lookup
        .terms()
        .filter_map(|term| {
            std::iter::once(term.name())
                .chain(term.synonyms().iter().map(String::as_str))
                .map(|label| (label, scorer.score(query, label)))
                .filter(|(_, s)| s.is_finite())
                .max_by(|x, y| x.1.total_cmp(&y.1))
                .map(|(matched, score)| Candidate { term, matched, score })
        })
        .collect();

    candidates.sort_by(|x, y| {
        y.score
            .total_cmp(&x.score)
            .then_with(|| x.term.display_key().cmp(y.term.display_key()))
    });
    candidates.truncate(limit);
    candidates
}
