//! Ontology term reconciliation for the Cyanea ecosystem.
//!
//! Maps free-text labels from third-party resources (classifier metadata
//! sheets, marker tables) onto canonical ontology records:
//!
//! - **Terms**: [`OntologyTerm`] with explicit synonym and parent collections
//! - **External rows**: [`ExternalRecord`], immutable once read
//! - **Canonical lookup**: [`CanonicalLookup`] and the indexed [`Ontology`]
//! - **Similarity**: injected [`Similarity`] scorers for labels without an identifier
//! - **Reconciliation**: [`Reconciler`] producing a [`ReconciliationResult`]
//! - **Commit**: [`RecordStore`] and the in-memory [`MemoryStore`]
//!
//! # Quick start
//!
//! ```
//! use cyanea_ontology::{reconcile, ExternalRecord, Ontology, OntologyTerm};
//!
//! let ontology = Ontology::new(vec![
//!     OntologyTerm::canonical("T cell", "CL:0000084").unwrap(),
//! ]).unwrap();
//!
//! let records = vec![
//!     ExternalRecord::new("T cells", Some("CL:0000084")).unwrap(),
//!     ExternalRecord::new("B-cell lineage", None).unwrap(),
//! ];
//! let result = reconcile(&records, &ontology).unwrap();
//!
//! let t_cell = result.resolved_term("T cells").unwrap();
//! assert_eq!(t_cell.name(), "T cell");
//! assert_eq!(t_cell.synonyms(), &["T cells".to_string()]);
//!
//! let lineage = result.get("B-cell lineage").unwrap();
//! assert!(lineage.is_created());
//! assert_eq!(lineage.term().ontology_id(), None);
//! ```

pub mod term;
pub mod record;
pub mod lookup;
pub mod similarity;
pub mod reconcile;
pub mod store;

pub use term::{normalize_label, OntologyTerm, TermSource, UID_LEN};
pub use record::ExternalRecord;
pub use lookup::{CanonicalLookup, Ontology};
pub use similarity::{best_matches, Candidate, JaroWinkler, NormalizedLevenshtein, Similarity};
pub use reconcile::{
    reconcile, MatchKind, ReconcileConfig, ReconciliationResult, Reconciler, Resolution,
};
pub use store::{CommitSummary, MemoryStore, RecordStore, SaveOutcome};
