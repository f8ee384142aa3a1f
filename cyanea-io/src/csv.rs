//! CSV/TSV readers for external label tables.
//!
//! Third-party resources ship their label sheets as delimited text with
//! their own column names; a [`ColumnMap`] says which columns hold the
//! label, the ontology identifier, the description, and the parent label.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ::csv::{ReaderBuilder, StringRecord};
use cyanea_core::{CyaneaError, Result};
use cyanea_ontology::ExternalRecord;

/// Names of the columns that make up an [`ExternalRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnMap {
    pub label: String,
    pub external_id: String,
    pub description: Option<String>,
    pub parent_label: Option<String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            label: "label".into(),
            external_id: "ontology_id".into(),
            description: Some("description".into()),
            parent_label: Some("parent_label".into()),
        }
    }
}

impl ColumnMap {
    /// Columns of the CellTypist immune encyclopedia sheet, where low-hierarchy
    /// cell types are nested under high-hierarchy ones.
    pub fn celltypist() -> Self {
        Self {
            label: "Low-hierarchy cell types".into(),
            external_id: "Cell Ontology ID".into(),
            description: Some("Description".into()),
            parent_label: Some("High-hierarchy cell types".into()),
        }
    }
}

struct ColumnIndex {
    label: usize,
    external_id: usize,
    description: Option<usize>,
    parent_label: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, columns: &ColumnMap) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            find(name).ok_or_else(|| {
                CyaneaError::Parse(format!("missing column '{name}' in header"))
            })
        };
        Ok(Self {
            label: required(&columns.label)?,
            external_id: required(&columns.external_id)?,
            // Optional columns may be absent from a given sheet.
            description: columns.description.as_deref().and_then(find),
            parent_label: columns.parent_label.as_deref().and_then(find),
        })
    }
}

/// Read external records from a CSV file, or TSV when the extension is
/// `.tsv` or `.txt`.
pub fn read_external_records(
    path: impl AsRef<Path>,
    columns: &ColumnMap,
) -> Result<Vec<ExternalRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        CyaneaError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("txt") => b'\t',
        _ => b',',
    };
    parse_external_records(file, delimiter, columns)
        .map_err(|e| match e {
            CyaneaError::Parse(msg) => CyaneaError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
}

/// Parse external records from delimited text with a header row.
///
/// Blank identifier, description, and parent cells are read as absent.
/// A row with a blank label is an error.
pub fn parse_external_records<R: Read>(
    reader: R,
    delimiter: u8,
    columns: &ColumnMap,
) -> Result<Vec<ExternalRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| CyaneaError::Parse(e.to_string()))?
        .clone();
    let index = ColumnIndex::resolve(&headers, columns)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| CyaneaError::Parse(e.to_string()))?;
        let line = row.position().map_or(0, |p| p.line());
        if row.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let cell = |i: Option<usize>| i.and_then(|i| row.get(i));

        let label = row.get(index.label).unwrap_or_default();
        let record = ExternalRecord::new(label, row.get(index.external_id))
            .map_err(|_| CyaneaError::Parse(format!("line {line}: empty label")))?
            .with_description(cell(index.description))
            .with_parent_label(cell(index.parent_label));
        records.push(record);
    }
    Ok(records)
}
