//! File format parsing for the Cyanea ontology tooling.
//!
//! Supported formats:
//! - **CSV/TSV** external label tables, via the `csv` feature (enabled by default)
//! - **OBO** canonical ontologies, via the `obo` feature (enabled by default)
//! - **Ontology services** URL builders and OLS response parsing, via the `fetch` feature

#[cfg(feature = "csv")]
pub mod csv;

#[cfg(feature = "obo")]
pub mod obo;

#[cfg(feature = "fetch")]
pub mod fetch;

// Re-exports for convenience.

#[cfg(feature = "csv")]
pub use csv::{parse_external_records, read_external_records, ColumnMap};

#[cfg(feature = "obo")]
pub use obo::{parse_obo, parse_obo_str, read_ontology};

#[cfg(feature = "fetch")]
pub use fetch::{parse_ols_search_response, OboPurl, OlsHit, OlsUrl};
