//! Rows from third-party tables that have not been reconciled yet.

use cyanea_core::{CyaneaError, Result};

/// A (label, identifier, description, parent label) row from an external table.
///
/// Fields are read-only once constructed. Blank optional values are stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExternalRecord {
    label: String,
    external_id: Option<String>,
    description: Option<String>,
    parent_label: Option<String>,
}

impl ExternalRecord {
    /// Create a record. Fails if `label` is blank.
    ///
    /// The label is kept exactly as given, since reconciliation results are
    /// keyed by the original text.
    pub fn new(label: impl Into<String>, external_id: Option<&str>) -> Result<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(CyaneaError::InvalidInput(
                "external record has an empty label".into(),
            ));
        }
        Ok(Self {
            label,
            external_id: non_blank(external_id),
            description: None,
            parent_label: None,
        })
    }

    pub fn with_description(mut self, description: Option<&str>) -> Self {
        self.description = non_blank(description);
        self
    }

    pub fn with_parent_label(mut self, parent_label: Option<&str>) -> Self {
        self.parent_label = non_blank(parent_label);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parent_label(&self) -> Option<&str> {
        self.parent_label.as_deref()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_label_rejected() {
        assert!(matches!(
            ExternalRecord::new("  ", Some("CL:0000084")),
            Err(CyaneaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_label_kept_verbatim() {
        let r = ExternalRecord::new(" T cells", Some(" CL:0000084 ")).unwrap();
        assert_eq!(r.label(), " T cells");
        assert_eq!(r.external_id(), Some("CL:0000084"));
    }

    #[test]
    fn test_blank_optionals_are_none() {
        let r = ExternalRecord::new("Mast cells", Some(""))
            .unwrap()
            .with_description(Some("  "))
            .with_parent_label(Some("Myeloid"));
        assert_eq!(r.external_id(), None);
        assert_eq!(r.description(), None);
        assert_eq!(r.parent_label(), Some("Myeloid"));
    }
}
