//! Canonical vocabularies and the lookup capability the reconciler consumes.

use std::collections::HashMap;

use cyanea_core::{CyaneaError, Result, Summarizable};

use crate::term::{normalize_label, OntologyTerm};

/// Read-only access to a set of canonical terms.
pub trait CanonicalLookup {
    /// The canonical term with this ontology id, if any.
    fn by_ontology_id(&self, ontology_id: &str) -> Option<&OntologyTerm>;

    /// All canonical terms.
    fn terms(&self) -> Box<dyn Iterator<Item = &OntologyTerm> + '_>;

    /// Terms whose name or a synonym equals `label`, ignoring case.
    ///
    /// The default scans [`terms`](Self::terms); implementations with an
    /// index should override it.
    fn find_by_label(&self, label: &str) -> Vec<&OntologyTerm> {
        self.terms().filter(|t| t.has_label(label)).collect()
    }
}

impl CanonicalLookup for HashMap<String, OntologyTerm> {
    fn by_ontology_id(&self, ontology_id: &str) -> Option<&OntologyTerm> {
        self.get(ontology_id.trim())
    }

    fn terms(&self) -> Box<dyn Iterator<Item = &OntologyTerm> + '_> {
        Box::new(self.values())
    }
}

/// An indexed canonical vocabulary (e.g. the Cell Ontology).
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    terms: Vec<OntologyTerm>,
    by_id: HashMap<String, usize>,
    by_uid: HashMap<String, usize>,
    by_label: HashMap<String, Vec<usize>>,
}

impl Ontology {
    /// Build an ontology from canonical terms.
    ///
    /// Every term must be canonical and carry an ontology id unique within the set.
    pub fn new(terms: Vec<OntologyTerm>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(terms.len());
        let mut by_uid = HashMap::with_capacity(terms.len());
        let mut by_label: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, term) in terms.iter().enumerate() {
            if !term.is_canonical() {
                return Err(CyaneaError::InvalidInput(format!(
                    "'{}' is not a canonical term",
                    term.name()
                )));
            }
            let id = term.ontology_id().ok_or_else(|| {
                CyaneaError::InvalidInput(format!("'{}' has no ontology id", term.name()))
            })?;
            if by_id.insert(id.to_string(), i).is_some() {
                return Err(CyaneaError::InvalidInput(format!(
                    "duplicate ontology id {id}"
                )));
            }
            by_uid.insert(term.uid().to_string(), i);

            let labels = std::iter::once(term.name()).chain(term.synonyms().iter().map(String::as_str));
            for label in labels {
                let slot = by_label.entry(normalize_label(label)).or_default();
                if !slot.contains(&i) {
                    slot.push(i);
                }
            }
        }

        Ok(Self {
            terms,
            by_id,
            by_uid,
            by_label,
        })
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the ontology has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over terms in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &OntologyTerm> {
        self.terms.iter()
    }

    /// Look up a term by ontology id.
    pub fn get(&self, ontology_id: &str) -> Option<&OntologyTerm> {
        self.by_id.get(ontology_id.trim()).map(|&i| &self.terms[i])
    }

    /// Like [`get`](Self::get), but an unknown id is an error.
    pub fn require(&self, ontology_id: &str) -> Result<&OntologyTerm> {
        self.get(ontology_id)
            .ok_or_else(|| CyaneaError::MissingIdentifier(ontology_id.trim().to_string()))
    }

    /// Look up a term by uid.
    pub fn get_by_uid(&self, uid: &str) -> Option<&OntologyTerm> {
        self.by_uid.get(uid).map(|&i| &self.terms[i])
    }

    /// Direct parents of `term` that are part of this ontology.
    pub fn parents(&self, term: &OntologyTerm) -> Vec<&OntologyTerm> {
        term.parent_ids()
            .iter()
            .filter_map(|uid| self.get_by_uid(uid))
            .collect()
    }

    /// Direct children of `term`.
    pub fn children(&self, term: &OntologyTerm) -> Vec<&OntologyTerm> {
        self.terms
            .iter()
            .filter(|t| t.parent_ids().iter().any(|p| p == term.uid()))
            .collect()
    }
}

impl CanonicalLookup for Ontology {
    fn by_ontology_id(&self, ontology_id: &str) -> Option<&OntologyTerm> {
        self.get(ontology_id)
    }

    fn terms(&self) -> Box<dyn Iterator<Item = &OntologyTerm> + '_> {
        Box::new(self.terms.iter())
    }

    fn find_by_label(&self, label: &str) -> Vec<&OntologyTerm> {
        self.by_label
            .get(&normalize_label(label))
            .map(|idx| idx.iter().map(|&i| &self.terms[i]).collect())
            .unwrap_or_default()
    }
}

impl Summarizable for Ontology {
    fn summary(&self) -> String {
        let n_synonyms: usize = self.terms.iter().map(|t| t.synonyms().len()).sum();
        format!("Ontology: {} terms, {} synonyms", self.terms.len(), n_synonyms)
    }
}
