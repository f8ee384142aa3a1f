//! Ontology term records.
//!
//! An [`OntologyTerm`] is a plain data record: relationships to other terms
//! (synonyms, parents) are explicit owned collections that only grow through
//! [`OntologyTerm::add_synonym`] and [`OntologyTerm::add_parent`].

use cyanea_core::{sha256, short_uid, Annotated, ContentAddressable, CyaneaError, Result, Summarizable};

/// Length of a term uid in hex characters.
pub const UID_LEN: usize = 12;

/// Where a term record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TermSource {
    /// Authoritative record from a public reference vocabulary.
    Canonical,
    /// Record created from a third-party label without canonical linkage.
    External,
}

impl core::fmt::Display for TermSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TermSource::Canonical => write!(f, "canonical"),
            TermSource::External => write!(f, "external"),
        }
    }
}

/// Case- and whitespace-insensitive form of a label used for comparisons.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// An ontology term with its synonyms and parent links.
///
/// `synonyms` and `parent_ids` keep insertion order and never hold duplicates.
/// `synonyms` never contains the term's own name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OntologyTerm {
    uid: String,
    name: String,
    ontology_id: Option<String>,
    description: Option<String>,
    synonyms: Vec<String>,
    parent_ids: Vec<String>,
    source: TermSource,
}

impl OntologyTerm {
    /// Create a canonical term. The uid is derived from `ontology_id`.
    pub fn canonical(name: impl Into<String>, ontology_id: impl Into<String>) -> Result<Self> {
        let name = checked_name(name.into())?;
        let ontology_id = ontology_id.into().trim().to_string();
        if ontology_id.is_empty() {
            return Err(CyaneaError::InvalidInput(format!(
                "canonical term '{name}' has an empty ontology id"
            )));
        }
        Ok(Self {
            uid: Self::canonical_uid(&ontology_id)?,
            name,
            ontology_id: Some(ontology_id),
            description: None,
            synonyms: Vec::new(),
            parent_ids: Vec::new(),
            source: TermSource::Canonical,
        })
    }

    /// Create a standalone term from an external label. The uid is derived
    /// from the name, so the same label always yields the same uid.
    pub fn external(name: impl Into<String>, ontology_id: Option<&str>) -> Result<Self> {
        let name = checked_name(name.into())?;
        let ontology_id = ontology_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        Ok(Self {
            uid: short_uid("external", &name, UID_LEN)?,
            name,
            ontology_id,
            description: None,
            synonyms: Vec::new(),
            parent_ids: Vec::new(),
            source: TermSource::External,
        })
    }

    /// Uid a canonical term with the given ontology id receives.
    pub fn canonical_uid(ontology_id: &str) -> Result<String> {
        short_uid("ontology_id", ontology_id.trim(), UID_LEN)
    }

    /// Set the description. Blank text clears it.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        let trimmed = description.trim();
        self.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Add synonyms, skipping duplicates.
    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for s in synonyms {
            self.add_synonym(s);
        }
        self
    }

    /// Add parent uids, skipping duplicates.
    pub fn with_parent_ids<I, S>(mut self, parent_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for p in parent_ids {
            self.add_parent(p);
        }
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn ontology_id(&self) -> Option<&str> {
        self.ontology_id.as_deref()
    }

    pub fn synonyms(&self) -> &[String] {
        &self.synonyms
    }

    pub fn parent_ids(&self) -> &[String] {
        &self.parent_ids
    }

    pub fn source(&self) -> TermSource {
        self.source
    }

    pub fn is_canonical(&self) -> bool {
        self.source == TermSource::Canonical
    }

    /// Whether `label` equals the name or a synonym, ignoring case.
    pub fn has_label(&self, label: &str) -> bool {
        let key = normalize_label(label);
        normalize_label(&self.name) == key || self.has_synonym(&key)
    }

    /// Whether a synonym equals `label`, ignoring case.
    pub fn has_synonym(&self, label: &str) -> bool {
        let key = normalize_label(label);
        self.synonyms.iter().any(|s| normalize_label(s) == key)
    }

    /// Append a synonym. Returns `false` if it is blank, equal to the name,
    /// or already present (all compared case-insensitively).
    pub fn add_synonym(&mut self, synonym: impl Into<String>) -> bool {
        let synonym = synonym.into();
        let synonym = synonym.trim();
        if synonym.is_empty() || self.has_label(synonym) {
            return false;
        }
        self.synonyms.push(synonym.to_string());
        true
    }

    /// Append a parent uid. Returns `false` for self-links and duplicates.
    pub fn add_parent(&mut self, parent_uid: impl Into<String>) -> bool {
        let parent_uid = parent_uid.into();
        if parent_uid == self.uid || self.parent_ids.contains(&parent_uid) {
            return false;
        }
        self.parent_ids.push(parent_uid);
        true
    }

    /// Label used in reports: the ontology id when present, else the name.
    pub fn display_key(&self) -> &str {
        self.ontology_id.as_deref().unwrap_or(&self.name)
    }
}

fn checked_name(name: String) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CyaneaError::InvalidInput("term name is empty".into()));
    }
    Ok(trimmed.to_string())
}

impl Annotated for OntologyTerm {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl ContentAddressable for OntologyTerm {
    fn content_hash(&self) -> String {
        let mut buf = String::new();
        for field in [
            self.uid.as_str(),
            self.name.as_str(),
            self.ontology_id.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
        ] {
            buf.push_str(field);
            buf.push('\u{1f}');
        }
        buf.push_str(&self.synonyms.join("\u{1e}"));
        buf.push('\u{1f}');
        buf.push_str(&self.parent_ids.join("\u{1e}"));
        buf.push('\u{1f}');
        buf.push_str(&self.source.to_string());
        sha256(buf.as_bytes())
    }
}

impl Summarizable for OntologyTerm {
    fn summary(&self) -> String {
        format!(
            "OntologyTerm {} '{}' ({}, {} synonyms, {} parents)",
            self.display_key(),
            self.name,
            self.source,
            self.synonyms.len(),
            self.parent_ids.len()
        )
    }
}
