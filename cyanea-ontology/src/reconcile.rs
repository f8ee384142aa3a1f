//! Reconciliation of externally-sourced labels against a canonical vocabulary.
//!
//! Each [`ExternalRecord`] is resolved to either a borrowed canonical term or a
//! newly created standalone term:
//!
//! 1. When the record's identifier resolves, the canonical term is used if its
//!    name equals the label ignoring case, or equals the label with one trailing
//!    `s` removed, or one of its synonyms equals either form. Otherwise a new term
//!    is created from the record alone.
//! 2. Records without a resolvable identifier are matched against every
//!    canonical name and synonym in the same way, then by name similarity.
//!
//! Near matches attach the label as a synonym of the canonical term. Those
//! synonyms, and parent links, are kept as pending edits in the
//! [`ReconciliationResult`] and reach a store only through an explicit commit.
//! A label that could bind to two different terms is an
//! [`CyaneaError::AmbiguousMatch`], never a silent first pick.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use cyanea_core::{CyaneaError, Result, Summarizable};
use tracing::{debug, info, warn};

use crate::lookup::CanonicalLookup;
use crate::record::ExternalRecord;
use crate::similarity::{best_matches, Candidate, NormalizedLevenshtein, Similarity};
use crate::term::{normalize_label, OntologyTerm};

/// Tuning knobs for [`Reconciler`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReconcileConfig {
    /// Minimum similarity for a fuzzy candidate to be bound (default 0.9).
    pub fuzzy_threshold: f64,
    /// Minimum similarity for a candidate to be kept as a suggestion on a
    /// newly created term (default 0.6).
    pub suggestion_floor: f64,
    /// Scores closer than this to the best one count as a tie (default 1e-9).
    pub tie_epsilon: f64,
    /// Try the label with one trailing `s` removed (default true).
    pub strip_plural: bool,
    /// Bind fuzzy candidates above the threshold as synonyms; when false they
    /// are only suggested (default true).
    pub attach_fuzzy: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.9,
            suggestion_floor: 0.6,
            tie_epsilon: 1e-9,
            strip_plural: true,
            attach_fuzzy: true,
        }
    }
}

impl ReconcileConfig {
    /// Check that thresholds lie in `[0, 1]` and the tie tolerance is non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("suggestion_floor", self.suggestion_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CyaneaError::InvalidInput(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if !(self.tie_epsilon >= 0.0 && self.tie_epsilon.is_finite()) {
            return Err(CyaneaError::InvalidInput(format!(
                "tie_epsilon must be a finite non-negative number, got {}",
                self.tie_epsilon
            )));
        }
        Ok(())
    }
}

/// How a label was bound to a canonical term.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchKind {
    /// The label equals the term name, ignoring case.
    Name,
    /// The label minus a trailing `s` equals the term name.
    Singular,
    /// The label or its singular form equals an existing synonym.
    Synonym,
    /// Best name-similarity candidate.
    Fuzzy { score: f64 },
}

/// What a single external label resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    /// An existing canonical term, borrowed from the lookup.
    Canonical {
        term: &'a OntologyTerm,
        kind: MatchKind,
        /// Whether the record's own identifier led to the term.
        by_identifier: bool,
    },
    /// A new standalone term owned by the result until committed.
    Created {
        term: OntologyTerm,
        /// The record's identifier when it was not found in the lookup.
        unresolved_identifier: Option<String>,
        /// Closest canonical term, advisory only.
        suggestion: Option<Candidate<'a>>,
    },
}

impl Resolution<'_> {
    /// The term as resolved, without pending edits.
    pub fn term(&self) -> &OntologyTerm {
        match self {
            Resolution::Canonical { term, .. } => *term,
            Resolution::Created { term, .. } => term,
        }
    }

    pub fn uid(&self) -> &str {
        self.term().uid()
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Resolution::Created { .. })
    }
}

/// Labels mapped to canonical or new terms, plus the edits a commit applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationResult<'a> {
    entries: Vec<(String, Resolution<'a>)>,
    index: HashMap<String, usize>,
    pending_synonyms: BTreeMap<String, Vec<String>>,
    pending_parents: BTreeMap<String, Vec<String>>,
    parent_terms: BTreeMap<String, &'a OntologyTerm>,
    unresolved_parents: Vec<(String, String)>,
}

impl<'a> ReconciliationResult<'a> {
    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolution for an original (non-normalized) label.
    pub fn get(&self, label: &str) -> Option<&Resolution<'a>> {
        self.index.get(label).map(|&i| &self.entries[i].1)
    }

    /// Labels and resolutions in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolution<'a>)> {
        self.entries.iter().map(|(label, r)| (label.as_str(), r))
    }

    /// The term a label resolved to, with pending synonyms and parents applied.
    ///
    /// Borrowed when nothing is pending, owned otherwise.
    pub fn resolved_term(&self, label: &str) -> Option<Cow<'_, OntologyTerm>> {
        match self.get(label)? {
            Resolution::Created { term, .. } => Some(Cow::Borrowed(term)),
            Resolution::Canonical { term, .. } => Some(self.with_pending(term)),
        }
    }

    /// Synonyms waiting to be added to the canonical term with this uid.
    pub fn pending_synonyms(&self, uid: &str) -> &[String] {
        self.pending_synonyms
            .get(uid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Parent uids waiting to be added to the canonical term with this uid.
    pub fn pending_parents(&self, uid: &str) -> &[String] {
        self.pending_parents
            .get(uid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `(label, parent_label)` pairs whose parent could not be found.
    pub fn unresolved_parents(&self) -> &[(String, String)] {
        &self.unresolved_parents
    }

    /// Newly created terms, in first-seen order.
    pub fn created_terms(&self) -> Vec<&OntologyTerm> {
        self.entries
            .iter()
            .filter_map(|(_, r)| match r {
                Resolution::Created { term, .. } => Some(term),
                Resolution::Canonical { .. } => None,
            })
            .collect()
    }

    /// Every canonical term the result refers to, as a label target or a
    /// parent, once each.
    pub fn canonical_terms(&self) -> Vec<&'a OntologyTerm> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut out = Vec::new();
        let from_entries = self.entries.iter().filter_map(|(_, r)| match r {
            Resolution::Canonical { term, .. } => Some(*term),
            Resolution::Created { .. } => None,
        });
        for term in from_entries.chain(self.parent_terms.values().copied()) {
            if seen.insert(term.uid()) {
                out.push(term);
            }
        }
        out
    }

    /// Whether the canonical term with this uid has pending edits.
    pub fn has_pending(&self, uid: &str) -> bool {
        self.pending_synonyms.contains_key(uid) || self.pending_parents.contains_key(uid)
    }

    pub(crate) fn with_pending<'t>(&self, term: &'t OntologyTerm) -> Cow<'t, OntologyTerm> {
        if !self.has_pending(term.uid()) {
            return Cow::Borrowed(term);
        }
        let updated = term
            .clone()
            .with_synonyms(self.pending_synonyms(term.uid()).iter().cloned())
            .with_parent_ids(self.pending_parents(term.uid()).iter().cloned());
        Cow::Owned(updated)
    }

    fn insert(&mut self, label: &str, resolution: Resolution<'a>) -> Result<()> {
        if let Some(&i) = self.index.get(label) {
            let existing = &self.entries[i].1;
            if existing.uid() == resolution.uid()
                && existing.term().ontology_id() == resolution.term().ontology_id()
            {
                debug!(
                    label,
                    kept = ?existing.term().description(),
                    dropped = ?resolution.term().description(),
                    "duplicate label, same target"
                );
                return Ok(());
            }
            return Err(CyaneaError::AmbiguousMatch {
                label: label.to_string(),
                candidates: vec![
                    existing.term().display_key().to_string(),
                    resolution.term().display_key().to_string(),
                ],
            });
        }

        if let Resolution::Canonical { term, kind, .. } = &resolution {
            if !matches!(kind, MatchKind::Name) {
                self.attach_synonym(term, label);
            }
        }
        self.index.insert(label.to_string(), self.entries.len());
        self.entries.push((label.to_string(), resolution));
        Ok(())
    }

    fn attach_synonym(&mut self, term: &OntologyTerm, label: &str) {
        let synonym = label.trim();
        if term.has_label(synonym) {
            return;
        }
        let key = normalize_label(synonym);
        let pending = self.pending_synonyms.entry(term.uid().to_string()).or_default();
        if pending.iter().any(|s| normalize_label(s) == key) {
            return;
        }
        debug!(synonym, target = term.display_key(), "synonym pending");
        pending.push(synonym.to_string());
    }

    fn link_parent(&mut self, child: usize, parent_uid: String) {
        match &mut self.entries[child].1 {
            Resolution::Created { term, .. } => {
                term.add_parent(parent_uid);
            }
            Resolution::Canonical { term, .. } => {
                let term: &'a OntologyTerm = *term;
                if term.uid() == parent_uid || term.parent_ids().contains(&parent_uid) {
                    return;
                }
                let pending = self.pending_parents.entry(term.uid().to_string()).or_default();
                if !pending.contains(&parent_uid) {
                    pending.push(parent_uid);
                }
            }
        }
    }
}

impl Summarizable for ReconciliationResult<'_> {
    fn summary(&self) -> String {
        let created = self.created_terms().len();
        let n_synonyms: usize = self.pending_synonyms.values().map(Vec::len).sum();
        format!(
            "ReconciliationResult: {} labels ({} canonical, {} created), {} pending synonyms",
            self.entries.len(),
            self.entries.len() - created,
            created,
            n_synonyms
        )
    }
}

/// Maps external records onto a canonical vocabulary.
///
/// The similarity scorer is injected; [`NormalizedLevenshtein`] is the default.
#[derive(Debug, Clone)]
pub struct Reconciler<S = NormalizedLevenshtein> {
    config: ReconcileConfig,
    scorer: S,
}

impl Default for Reconciler<NormalizedLevenshtein> {
    fn default() -> Self {
        Self {
            config: ReconcileConfig::default(),
            scorer: NormalizedLevenshtein,
        }
    }
}

impl Reconciler<NormalizedLevenshtein> {
    /// Create a reconciler with the default scorer. Fails on an invalid config.
    pub fn new(config: ReconcileConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scorer: NormalizedLevenshtein,
        })
    }
}

impl<S: Similarity> Reconciler<S> {
    /// Replace the similarity scorer.
    pub fn with_scorer<T: Similarity>(self, scorer: T) -> Reconciler<T> {
        Reconciler {
            config: self.config,
            scorer,
        }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Resolve every record against `lookup`.
    ///
    /// Pure: nothing is written anywhere; identical inputs give identical results.
    pub fn reconcile<'a, L>(
        &self,
        records: &[ExternalRecord],
        lookup: &'a L,
    ) -> Result<ReconciliationResult<'a>>
    where
        L: CanonicalLookup + ?Sized,
    {
        let mut result = ReconciliationResult::default();
        for record in records {
            let resolution = self.resolve(record, lookup)?;
            result.insert(record.label(), resolution)?;
        }
        self.link_parents(records, lookup, &mut result)?;

        info!(
            labels = result.len(),
            created = result.created_terms().len(),
            pending_synonyms = result.pending_synonyms.len(),
            unresolved_parents = result.unresolved_parents.len(),
            "reconciliation finished"
        );
        Ok(result)
    }

    fn resolve<'a, L>(&self, record: &ExternalRecord, lookup: &'a L) -> Result<Resolution<'a>>
    where
        L: CanonicalLookup + ?Sized,
    {
        let label = record.label();
        let key = normalize_label(label);
        let singular = self.singular(&key);

        let mut unresolved_identifier = None;
        if let Some(id) = record.external_id() {
            match lookup.by_ontology_id(id) {
                Some(term) => {
                    if let Some(kind) = match_term(term, &key, singular.as_deref()) {
                        debug!(label, ontology_id = id, ?kind, "matched by identifier");
                        return Ok(Resolution::Canonical {
                            term,
                            kind,
                            by_identifier: true,
                        });
                    }
                    debug!(
                        label,
                        ontology_id = id,
                        canonical = term.name(),
                        "label differs from canonical name, creating term"
                    );
                    return Ok(Resolution::Created {
                        term: new_term(record)?,
                        unresolved_identifier: None,
                        suggestion: None,
                    });
                }
                None => {
                    warn!(label, ontology_id = id, "identifier not in canonical lookup");
                    unresolved_identifier = Some(id.to_string());
                }
            }
        }

        let hits = label_hits(lookup, &key, singular.as_deref());
        match hits.as_slice() {
            [(term, kind)] => {
                debug!(label, target = term.display_key(), ?kind, "matched by label");
                return Ok(Resolution::Canonical {
                    term: *term,
                    kind: *kind,
                    by_identifier: false,
                });
            }
            [] => {}
            _ => return Err(ambiguous(label, hits.iter().map(|(t, _)| *t))),
        }

        let mut ranked = best_matches(label, lookup, &self.scorer, 2).into_iter();
        let best = ranked.next();
        let runner_up = ranked.next();

        let tied = match (&best, &runner_up) {
            (Some(top), Some(second)) => top.score - second.score <= self.config.tie_epsilon,
            _ => false,
        };

        if self.config.attach_fuzzy {
            if let Some(top) = best.as_ref().filter(|c| c.score >= self.config.fuzzy_threshold) {
                if let (true, Some(second)) = (tied, runner_up.as_ref()) {
                    return Err(ambiguous(label, [top.term, second.term]));
                }
                debug!(label, target = top.term.display_key(), score = top.score, "fuzzy match");
                return Ok(Resolution::Canonical {
                    term: top.term,
                    kind: MatchKind::Fuzzy { score: top.score },
                    by_identifier: false,
                });
            }
        }

        // A tied best candidate is no suggestion at all.
        let suggestion = best.filter(|c| !tied && c.score >= self.config.suggestion_floor);
        debug!(
            label,
            suggestion = suggestion.as_ref().map(|c| c.term.display_key()),
            "no canonical match, creating term"
        );
        Ok(Resolution::Created {
            term: new_term(record)?,
            unresolved_identifier,
            suggestion,
        })
    }

    fn link_parents<'a, L>(
        &self,
        records: &[ExternalRecord],
        lookup: &'a L,
        result: &mut ReconciliationResult<'a>,
    ) -> Result<()>
    where
        L: CanonicalLookup + ?Sized,
    {
        // Batch labels by normalized key, one entry per distinct uid.
        let mut batch: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, (label, resolution)) in result.entries.iter().enumerate() {
            let slot = batch.entry(normalize_label(label)).or_default();
            if !slot.iter().any(|&j| result.entries[j].1.uid() == resolution.uid()) {
                slot.push(i);
            }
        }

        for record in records {
            let Some(parent_label) = record.parent_label() else {
                continue;
            };
            let Some(&child) = result.index.get(record.label()) else {
                continue;
            };

            let in_batch = match result.index.get(parent_label) {
                Some(&i) => Some(i),
                None => match batch.get(&normalize_label(parent_label)).map(Vec::as_slice) {
                    Some([i]) => Some(*i),
                    Some(many) if many.len() > 1 => {
                        let terms = many.iter().map(|&i| result.entries[i].1.term());
                        return Err(ambiguous(parent_label, terms));
                    }
                    _ => None,
                },
            };

            let parent_uid = match in_batch {
                Some(i) => result.entries[i].1.uid().to_string(),
                None => {
                    let key = normalize_label(parent_label);
                    let singular = self.singular(&key);
                    let hits = label_hits(lookup, &key, singular.as_deref());
                    match hits.as_slice() {
                        [(term, _)] => {
                            result.parent_terms.insert(term.uid().to_string(), *term);
                            term.uid().to_string()
                        }
                        [] => {
                            warn!(label = record.label(), parent_label, "parent not found");
                            let pair = (record.label().to_string(), parent_label.to_string());
                            if !result.unresolved_parents.contains(&pair) {
                                result.unresolved_parents.push(pair);
                            }
                            continue;
                        }
                        _ => return Err(ambiguous(parent_label, hits.iter().map(|(t, _)| *t))),
                    }
                }
            };
            result.link_parent(child, parent_uid);
        }
        Ok(())
    }

    fn singular(&self, key: &str) -> Option<String> {
        if !self.config.strip_plural {
            return None;
        }
        key.strip_suffix('s')
            .filter(|s| !s.trim().is_empty())
            .map(String::from)
    }
}

/// Resolve records with the default configuration and scorer.
pub fn reconcile<'a, L>(
    records: &[ExternalRecord],
    lookup: &'a L,
) -> Result<ReconciliationResult<'a>>
where
    L: CanonicalLookup + ?Sized,
{
    Reconciler::<NormalizedLevenshtein>::default().reconcile(records, lookup)
}

fn match_term(term: &OntologyTerm, key: &str, singular: Option<&str>) -> Option<MatchKind> {
    let name = normalize_label(term.name());
    if name == key {
        Some(MatchKind::Name)
    } else if singular == Some(name.as_str()) {
        Some(MatchKind::Singular)
    } else if term.has_synonym(key) || singular.is_some_and(|s| term.has_synonym(s)) {
        Some(MatchKind::Synonym)
    } else {
        None
    }
}

/// Distinct canonical terms matching the label or its singular form by name or synonym.
fn label_hits<'a, L>(
    lookup: &'a L,
    key: &str,
    singular: Option<&str>,
) -> Vec<(&'a OntologyTerm, MatchKind)>
where
    L: CanonicalLookup + ?Sized,
{
    let mut hits: Vec<(&'a OntologyTerm, MatchKind)> = Vec::new();
    for form in std::iter::once(key).chain(singular) {
        for term in lookup.find_by_label(form) {
            if hits.iter().any(|(t, _)| t.uid() == term.uid()) {
                continue;
            }
            if let Some(kind) = match_term(term, key, singular) {
                hits.push((term, kind));
            }
        }
    }
    hits.sort_by(|a, b| a.0.display_key().cmp(b.0.display_key()));
    hits
}

fn ambiguous<'a>(label: &str, terms: impl IntoIterator<Item = &'a OntologyTerm>) -> CyaneaError {
    let mut candidates: Vec<String> = terms
        .into_iter()
        .map(|t| t.display_key().to_string())
        .collect();
    candidates.sort();
    candidates.dedup();
    warn!(label, ?candidates, "ambiguous match");
    CyaneaError::AmbiguousMatch {
        label: label.to_string(),
        candidates,
    }
}

fn new_term(record: &ExternalRecord) -> Result<OntologyTerm> {
    Ok(OntologyTerm::external(record.label(), record.external_id())?
        .with_description(record.description().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::Ontology;

    fn cell_ontology() -> Ontology {
        let cell = OntologyTerm::canonical("cell", "CL:0000000").unwrap();
        let leukocyte = OntologyTerm::canonical("leukocyte", "CL:0000738")
            .unwrap()
            .with_synonyms(["white blood cell"])
            .with_parent_ids([cell.uid().to_string()]);
        let t_cell = OntologyTerm::canonical("T cell", "CL:0000084")
            .unwrap()
            .with_synonyms(["T-lymphocyte"])
            .with_parent_ids([leukocyte.uid().to_string()]);
        let b_cell = OntologyTerm::canonical("B cell", "CL:0000236")
            .unwrap()
            .with_synonyms(["B-lymphocyte"]);
        let nk = OntologyTerm::canonical("natural killer cell", "CL:0000623")
            .unwrap()
            .with_synonyms(["NK cell"]);
        let nk_like = OntologyTerm::canonical("NK cell", "CL:9000001").unwrap();
        let macrophage = OntologyTerm::canonical("macrophage", "CL:0000235").unwrap();
        Ontology::new(vec![cell, leukocyte, t_cell, b_cell, nk, nk_like, macrophage]).unwrap()
    }

    fn rec(label: &str, id: Option<&str>) -> ExternalRecord {
        ExternalRecord::new(label, id).unwrap()
    }

    #[test]
    fn test_exact_name_is_unchanged() {
        let onto = cell_ontology();
        let result = reconcile(&[rec("t CELL", Some("CL:0000084"))], &onto).unwrap();
        match result.get("t CELL").unwrap() {
            Resolution::Canonical { term, kind, by_identifier } => {
                assert_eq!(term.name(), "T cell");
                assert_eq!(*kind, MatchKind::Name);
                assert!(*by_identifier);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
        let uid = onto.get("CL:0000084").unwrap().uid();
        assert!(result.pending_synonyms(uid).is_empty());
        assert!(matches!(result.resolved_term("t CELL"), Some(Cow::Borrowed(_))));
    }

    #[test]
    fn test_plural_becomes_synonym() {
        let onto = cell_ontology();
        let result = reconcile(&[rec("T cells", Some("CL:0000084"))], &onto).unwrap();
        let resolution = result.get("T cells").unwrap();
        assert!(matches!(
            resolution,
            Resolution::Canonical { kind: MatchKind::Singular, .. }
        ));
        let term = result.resolved_term("T cells").unwrap();
        assert_eq!(term.name(), "T cell");
        assert_eq!(term.synonyms(), &["T-lymphocyte".to_string(), "T cells".to_string()]);
        // The borrowed canonical term itself is untouched.
        assert_eq!(onto.get("CL:0000084").unwrap().synonyms().len(), 1);
    }

    #[test]
    fn test_plural_and_singular_share_term() {
        let onto = cell_ontology();
        let records = [rec("T cells", Some("CL:0000084")), rec("T cell", Some("CL:0000084"))];
        let result = reconcile(&records, &onto).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(
            result.get("T cells").unwrap().uid(),
            result.get("T cell").unwrap().uid()
        );
        let term = result.resolved_term("T cell").unwrap();
        let count = term.synonyms().iter().filter(|s| s.as_str() == "T cells").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_synonym_match_by_identifier() {
        let onto = cell_ontology();
        let result = reconcile(&[rec("T-lymphocytes", Some("CL:0000084"))], &onto).unwrap();
        assert!(matches!(
            result.get("T-lymphocytes").unwrap(),
            Resolution::Canonical { kind: MatchKind::Synonym, .. }
        ));
        let uid = onto.get("CL:0000084").unwrap().uid();
        assert_eq!(result.pending_synonyms(uid), &["T-lymphocytes".to_string()]);

        let exact = reconcile(&[rec("t-lymphocyte", Some("CL:0000084"))], &onto).unwrap();
        assert!(exact.pending_synonyms(uid).is_empty());
    }

    #[test]
    fn test_identifier_with_unrelated_label_creates_term() {
        let onto = cell_ontology();
        let records = [rec("Tem/Trm cytotoxic T cells", Some("CL:0000084"))
            .with_description(Some("Effector memory"))];
        let result = reconcile(&records, &onto).unwrap();
        match result.get("Tem/Trm cytotoxic T cells").unwrap() {
            Resolution::Created { term, unresolved_identifier, suggestion } => {
                assert_eq!(term.name(), "Tem/Trm cytotoxic T cells");
                assert_eq!(term.ontology_id(), Some("CL:0000084"));
                assert_eq!(term.description(), Some("Effector memory"));
                assert!(!term.is_canonical());
                assert!(unresolved_identifier.is_none());
                assert!(suggestion.is_none());
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_unmapped_without_match_creates_standalone() {
        let onto = cell_ontology();
        let result = reconcile(&[rec("B-cell lineage", None)], &onto).unwrap();
        let resolution = result.get("B-cell lineage").unwrap();
        assert!(resolution.is_created());
        let term = resolution.term();
        assert_eq!(term.name(), "B-cell lineage");
        assert_eq!(term.ontology_id(), None);
    }

    #[test]
    fn test_fuzzy_attach_and_suggestion() {
        let onto = cell_ontology();
        let result = reconcile(&[rec("Macrophages (alveolar)", None)], &onto).unwrap();
        match result.get("Macrophages (alveolar)").unwrap() {
            Resolution::Created { suggestion, .. } => {
                assert!(suggestion.is_none());
            }
            other => panic!("unexpected resolution: {other:?}"),
        }

        let result = reconcile(&[rec("Macrophagez", None)], &onto).unwrap();
        assert!(matches!(
            result.get("Macrophagez").unwrap(),
            Resolution::Canonical { kind: MatchKind::Fuzzy { .. }, .. }
        ));

        let cfg = ReconcileConfig {
            attach_fuzzy: false,
            ..ReconcileConfig::default()
        };
        let reconciler = Reconciler::new(cfg).unwrap();
        let result = reconciler.reconcile(&[rec("Macrophagez", None)], &onto).unwrap();
        match result.get("Macrophagez").unwrap() {
            Resolution::Created { suggestion: Some(c), .. } => {
                assert_eq!(c.term.name(), "macrophage");
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_missing_identifier_falls_through() {
        let onto = cell_ontology();
        let result = reconcile(&[rec("B cells", Some("CL:9999999"))], &onto).unwrap();
        match result.get("B cells").unwrap() {
            Resolution::Canonical { term, kind, by_identifier } => {
                assert_eq!(term.ontology_id(), Some("CL:0000236"));
                assert_eq!(*kind, MatchKind::Singular);
                assert!(!*by_identifier);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }

        let result = reconcile(&[rec("Plasmablasts", Some("CL:9999999"))], &onto).unwrap();
        match result.get("Plasmablasts").unwrap() {
            Resolution::Created { unresolved_identifier, .. } => {
                assert_eq!(unresolved_identifier.as_deref(), Some("CL:9999999"));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_ambiguous_label_is_an_error() {
        let onto = cell_ontology();
        // "NK cells" -> "NK cell": name of CL:9000001 and synonym of CL:0000623.
        let err = reconcile(&[rec("NK cells", None)], &onto).unwrap_err();
        match err {
            CyaneaError::AmbiguousMatch { label, candidates } => {
                assert_eq!(label, "NK cells");
                assert_eq!(candidates, vec!["CL:0000623", "CL:9000001"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identifier_disambiguates() {
        let onto = cell_ontology();
        let result = reconcile(&[rec("NK cells", Some("CL:0000623"))], &onto).unwrap();
        assert_eq!(
            result.get("NK cells").unwrap().term().ontology_id(),
            Some("CL:0000623")
        );
    }

    #[test]
    fn test_same_label_two_targets_is_ambiguous() {
        let onto = cell_ontology();
        let records = [
            rec("lymphocytes", Some("CL:0000084")),
            rec("lymphocytes", Some("CL:0000236")),
        ];
        let err = reconcile(&records, &onto).unwrap_err();
        assert!(matches!(err, CyaneaError::AmbiguousMatch { .. }));

        let records = [
            rec("NK cell", Some("CL:0000623")),
            rec("NK cell", Some("CL:9000001")),
        ];
        match reconcile(&records, &onto).unwrap_err() {
            CyaneaError::AmbiguousMatch { candidates, .. } => {
                assert_eq!(candidates, vec!["CL:0000623", "CL:9000001"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fuzzy_tie_is_ambiguous() {
        let onto = cell_ontology();
        let flat = |_: &str, _: &str| 0.95;
        let reconciler = Reconciler::new(ReconcileConfig::default())
            .unwrap()
            .with_scorer(flat);
        let err = reconciler.reconcile(&[rec("something", None)], &onto).unwrap_err();
        assert!(matches!(err, CyaneaError::AmbiguousMatch { .. }));
    }

    #[test]
    fn test_fuzzy_tie_is_advisory_without_attach() {
        let onto = Ontology::new(vec![
            OntologyTerm::canonical("alpha", "X:1").unwrap(),
            OntologyTerm::canonical("beta", "X:2").unwrap(),
        ])
        .unwrap();
        let cfg = ReconcileConfig {
            attach_fuzzy: false,
            ..ReconcileConfig::default()
        };
        let reconciler = Reconciler::new(cfg)
            .unwrap()
            .with_scorer(|_: &str, _: &str| 0.95);
        let result = reconciler.reconcile(&[rec("zzzz", None)], &onto).unwrap();
        match result.get("zzzz").unwrap() {
            Resolution::Created { term, suggestion, .. } => {
                assert_eq!(term.name(), "zzzz");
                assert!(suggestion.is_none());
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_parent_label_ignores_case() {
        let onto = cell_ontology();
        let records = [
            rec("Lymphoid lineage", None),
            rec("B-cell lineage", None).with_parent_label(Some("lymphoid lineage")),
        ];
        let result = reconcile(&records, &onto).unwrap();
        let parent_uid = result.get("Lymphoid lineage").unwrap().uid().to_string();
        assert_eq!(
            result.get("B-cell lineage").unwrap().term().parent_ids(),
            &[parent_uid]
        );
        assert!(result.unresolved_parents().is_empty());
    }

    #[test]
    fn test_parent_label_two_batch_targets_is_ambiguous() {
        let onto = cell_ontology();
        let records = [
            rec("Lymphoid lineage", None),
            rec("LYMPHOID LINEAGE", None),
            rec("B-cell lineage", None).with_parent_label(Some("lymphoid lineage")),
        ];
        let err = reconcile(&records, &onto).unwrap_err();
        match err {
            CyaneaError::AmbiguousMatch { label, candidates } => {
                assert_eq!(label, "lymphoid lineage");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parents_link_within_batch() {
        let onto = cell_ontology();
        let records = [
            rec("Lymphoid lineage", None),
            rec("B-cell lineage", None).with_parent_label(Some("Lymphoid lineage")),
            rec("T cells", Some("CL:0000084")).with_parent_label(Some("Lymphoid lineage")),
        ];
        let result = reconcile(&records, &onto).unwrap();
        let parent_uid = result.get("Lymphoid lineage").unwrap().uid().to_string();

        let b = result.get("B-cell lineage").unwrap().term();
        assert_eq!(b.parent_ids(), &[parent_uid.clone()]);

        let t_uid = onto.get("CL:0000084").unwrap().uid();
        assert_eq!(result.pending_parents(t_uid), &[parent_uid.clone()]);
        let t = result.resolved_term("T cells").unwrap();
        assert!(t.parent_ids().contains(&parent_uid));
    }

    #[test]
    fn test_parent_from_canonical_and_unresolved() {
        let onto = cell_ontology();
        let records = [
            rec("Cycling cells", None).with_parent_label(Some("Leukocytes")),
            rec("Other cells", None).with_parent_label(Some("Nowhere")),
        ];
        let result = reconcile(&records, &onto).unwrap();
        let leuko = onto.get("CL:0000738").unwrap();
        assert_eq!(
            result.get("Cycling cells").unwrap().term().parent_ids(),
            &[leuko.uid().to_string()]
        );
        assert!(result.canonical_terms().iter().any(|t| t.uid() == leuko.uid()));
        assert_eq!(
            result.unresolved_parents(),
            &[("Other cells".to_string(), "Nowhere".to_string())]
        );
    }

    #[test]
    fn test_idempotent() {
        let onto = cell_ontology();
        let records = [
            rec("T cells", Some("CL:0000084")),
            rec("B-cell lineage", None),
            rec("Macrophagez", None).with_parent_label(Some("white blood cells")),
        ];
        let a = reconcile(&records, &onto).unwrap();
        let b = reconcile(&records, &onto).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_strip_plural_disabled() {
        let onto = cell_ontology();
        let cfg = ReconcileConfig {
            strip_plural: false,
            attach_fuzzy: false,
            ..ReconcileConfig::default()
        };
        let result = Reconciler::new(cfg)
            .unwrap()
            .reconcile(&[rec("T cells", Some("CL:0000084"))], &onto)
            .unwrap();
        assert!(result.get("T cells").unwrap().is_created());
    }

    #[test]
    fn test_config_validation() {
        assert!(ReconcileConfig::default().validate().is_ok());
        let bad = ReconcileConfig {
            fuzzy_threshold: 1.5,
            ..ReconcileConfig::default()
        };
        assert!(Reconciler::new(bad).is_err());
        let bad = ReconcileConfig {
            tie_epsilon: -1.0,
            ..ReconcileConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_summary() {
        let onto = cell_ontology();
        let records = [rec("T cells", Some("CL:0000084")), rec("B-cell lineage", None)];
        let result = reconcile(&records, &onto).unwrap();
        assert_eq!(
            result.summary(),
            "ReconciliationResult: 2 labels (1 canonical, 1 created), 1 pending synonyms"
        );
    }
}
