//! URL builders and response parsers for ontology services.
//!
//! Covers OBO Foundry PURLs for downloading whole ontologies and the EBI
//! Ontology Lookup Service (OLS4) REST API for term search. No HTTP client
//! is included: these are pure URL builders and text parsers.

use cyanea_core::{CyaneaError, Result};
use cyanea_ontology::OntologyTerm;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Percent-encoding helper
// ---------------------------------------------------------------------------

/// Percent-encode a query string value byte by byte over its UTF-8 form.
///
/// Unreserved ASCII characters and `:` (as in CURIEs) pass through.
fn percent_encode(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len() * 3);
    for b in input.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b':' => {
                out.push(b as char)
            }
            _ => {
                out.push('%');
                out.push(HEX[usize::from(b >> 4)] as char);
                out.push(HEX[usize::from(b & 0x0f)] as char);
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// OBO Foundry
// ---------------------------------------------------------------------------

/// URL builder for OBO Foundry permanent URLs.
pub struct OboPurl;

impl OboPurl {
    const BASE: &'static str = "http://purl.obolibrary.org/obo";

    /// URL of the OBO release of an ontology, e.g. `cl` or `uberon`.
    ///
    /// ```
    /// use cyanea_io::fetch::OboPurl;
    /// assert_eq!(OboPurl::obo("CL"), "http://purl.obolibrary.org/obo/cl.obo");
    /// ```
    pub fn obo(ontology: &str) -> String {
        format!("{}/{}.obo", Self::BASE, ontology.to_lowercase())
    }

    /// URL of the OWL release of an ontology.
    pub fn owl(ontology: &str) -> String {
        format!("{}/{}.owl", Self::BASE, ontology.to_lowercase())
    }

    /// Term IRI for a CURIE such as `CL:0000084`.
    pub fn term_iri(curie: &str) -> Result<String> {
        let (prefix, local) = curie.split_once(':').ok_or_else(|| {
            CyaneaError::InvalidInput(format!("'{curie}' is not a CURIE"))
        })?;
        if prefix.is_empty() || local.is_empty() {
            return Err(CyaneaError::InvalidInput(format!("'{curie}' is not a CURIE")));
        }
        Ok(format!("{}/{}_{}", Self::BASE, prefix, local))
    }
}

// ---------------------------------------------------------------------------
// OLS4
// ---------------------------------------------------------------------------

/// URL builder for the EBI Ontology Lookup Service.
pub struct OlsUrl;

impl OlsUrl {
    const BASE: &'static str = "https://www.ebi.ac.uk/ols4/api";

    /// Build a term search URL restricted to one ontology.
    ///
    /// With `exact`, only terms whose label or synonym equals the query match.
    pub fn search(query: &str, ontology: &str, rows: usize, exact: bool) -> String {
        let mut url = format!(
            "{}/search?q={}&ontology={}&rows={}",
            Self::BASE,
            percent_encode(query),
            percent_encode(&ontology.to_lowercase()),
            rows,
        );
        if exact {
            url.push_str("&exact=true");
        }
        url
    }

    /// Build a URL that fetches one term by its OBO id.
    pub fn term(ontology: &str, obo_id: &str) -> String {
        format!(
            "{}/ontologies/{}/terms?obo_id={}",
            Self::BASE,
            percent_encode(&ontology.to_lowercase()),
            percent_encode(obo_id),
        )
    }
}

/// One document from an OLS search response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OlsHit {
    pub obo_id: String,
    pub label: String,
    pub description: Option<String>,
}

impl OlsHit {
    /// Canonical term for this hit.
    pub fn to_term(&self) -> Result<OntologyTerm> {
        Ok(OntologyTerm::canonical(self.label.as_str(), self.obo_id.as_str())?
            .with_description(self.description.clone().unwrap_or_default()))
    }
}

/// Parse an OLS search response into hits.
///
/// Expected shape:
/// ```json
/// {"response":{"numFound":1,"docs":[{"obo_id":"CL:0000084","label":"T cell","description":["..."]}]}}
/// ```
/// Documents without an `obo_id` or `label` (e.g. properties) are skipped.
pub fn parse_ols_search_response(json: &str) -> Result<Vec<OlsHit>> {
    let root: Value =
        serde_json::from_str(json).map_err(|e| CyaneaError::Parse(format!("OLS response: {e}")))?;
    let docs = root
        .pointer("/response/docs")
        .and_then(Value::as_array)
        .ok_or_else(|| CyaneaError::Parse("OLS response: missing response.docs".into()))?;

    let hits = docs
        .iter()
        .filter_map(|doc| {
            let obo_id = doc.get("obo_id")?.as_str()?;
            let label = doc.get("label")?.as_str()?;
            let description = match doc.get("description") {
                Some(Value::Array(items)) => items.first().and_then(Value::as_str),
                Some(Value::String(s)) => Some(s.as_str()),
                _ => None,
            };
            Some(OlsHit {
                obo_id: obo_id.to_string(),
                label: label.to_string(),
                description: description.map(String::from),
            })
        })
        .collect();
    Ok(hits)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
