//! Record stores and committing reconciliation results.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use cyanea_core::{ContentAddressable, CyaneaError, Result, Summarizable};
use tracing::{debug, info};

use crate::reconcile::ReconciliationResult;
use crate::term::OntologyTerm;

/// Outcome of saving one term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// The save/query interface of an external record store.
pub trait RecordStore {
    /// Insert or replace the term with the same uid.
    fn save(&mut self, term: &OntologyTerm) -> Result<SaveOutcome>;

    /// The stored term with this uid.
    fn get(&self, uid: &str) -> Result<Option<OntologyTerm>>;

    /// The stored canonical term with this ontology id.
    fn find_by_ontology_id(&self, ontology_id: &str) -> Result<Option<OntologyTerm>>;
}

/// Counts of what a commit wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl CommitSummary {
    fn record(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Inserted => self.inserted += 1,
            SaveOutcome::Updated => self.updated += 1,
            SaveOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Total number of terms saved.
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

impl ReconciliationResult<'_> {
    /// Save every term the result refers to.
    ///
    /// Canonical terms go first, with pending synonyms and parents applied,
    /// then created terms. A term already in the store keeps what it has and
    /// gains the new synonyms and parents, so earlier commits are never undone.
    /// A pending parent may be a created term of this batch, which exists in
    /// the store only once the whole commit has finished.
    /// Committing the same result twice leaves the store unchanged the second time.
    pub fn commit<S: RecordStore + ?Sized>(&self, store: &mut S) -> Result<CommitSummary> {
        let mut summary = CommitSummary::default();
        for term in self.canonical_terms() {
            let term = merge_stored(&*store, self.with_pending(term))?;
            let outcome = store.save(&term)?;
            debug!(uid = term.uid(), ?outcome, "saved canonical term");
            summary.record(outcome);
        }
        for term in self.created_terms() {
            let term = merge_stored(&*store, Cow::Borrowed(term))?;
            let outcome = store.save(&term)?;
            debug!(uid = term.uid(), ?outcome, "saved created term");
            summary.record(outcome);
        }
        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "commit finished"
        );
        Ok(summary)
    }
}

/// The stored term under `term`'s uid with `term`'s synonyms and parents
/// appended, or `term` itself when nothing is stored yet.
fn merge_stored<'t, S>(store: &S, term: Cow<'t, OntologyTerm>) -> Result<Cow<'t, OntologyTerm>>
where
    S: RecordStore + ?Sized,
{
    let Some(mut stored) = store.get(term.uid())? else {
        return Ok(term);
    };
    for synonym in term.synonyms() {
        stored.add_synonym(synonym.as_str());
    }
    for parent in term.parent_ids() {
        stored.add_parent(parent.as_str());
    }
    Ok(Cow::Owned(stored))
}

/// An in-memory [`RecordStore`] keyed by uid.
///
/// Rejects a canonical term whose ontology id already belongs to a different
/// canonical term.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    terms: BTreeMap<String, OntologyTerm>,
    canonical_ids: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Stored terms ordered by uid.
    pub fn iter(&self) -> impl Iterator<Item = &OntologyTerm> {
        self.terms.values()
    }
}

impl RecordStore for MemoryStore {
    fn save(&mut self, term: &OntologyTerm) -> Result<SaveOutcome> {
        if term.is_canonical() {
            if let Some(id) = term.ontology_id() {
                match self.canonical_ids.get(id) {
                    Some(owner) if owner != term.uid() => {
                        return Err(CyaneaError::InvalidInput(format!(
                            "ontology id {id} already belongs to canonical term {owner}"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        self.canonical_ids.insert(id.to_string(), term.uid().to_string());
                    }
                }
            }
        }

        let outcome = match self.terms.get(term.uid()) {
            None => SaveOutcome::Inserted,
            Some(old) if old.content_hash() == term.content_hash() => SaveOutcome::Unchanged,
            Some(_) => SaveOutcome::Updated,
        };
        if outcome != SaveOutcome::Unchanged {
            self.terms.insert(term.uid().to_string(), term.clone());
        }
        Ok(outcome)
    }

    fn get(&self, uid: &str) -> Result<Option<OntologyTerm>> {
        Ok(self.terms.get(uid).cloned())
    }

    fn find_by_ontology_id(&self, ontology_id: &str) -> Result<Option<OntologyTerm>> {
        Ok(self
            .canonical_ids
            .get(ontology_id.trim())
            .and_then(|uid| self.terms.get(uid))
            .cloned())
    }
}

impl Summarizable for MemoryStore {
    fn summary(&self) -> String {
        let canonical = self.terms.values().filter(|t| t.is_canonical()).count();
        format!(
            "MemoryStore: {} terms ({} canonical, {} external)",
            self.terms.len(),
            canonical,
            self.terms.len() - canonical
        )
    }
}
