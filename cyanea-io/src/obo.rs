//! OBO flat file parser for canonical ontologies.
//!
//! Reads `[Term]` stanzas from OBO 1.4 files such as `cl.obo` and turns them
//! into canonical [`OntologyTerm`]s. Only the tags reconciliation needs are
//! kept: `id`, `name`, `def`, `synonym`, `is_a`, and `is_obsolete`. Other
//! stanza types (`[Typedef]`, `[Instance]`) and the header are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cyanea_core::{CyaneaError, Result};
use cyanea_ontology::{Ontology, OntologyTerm};

#[derive(Default)]
struct StanzaBuilder {
    line: usize,
    id: Option<String>,
    name: Option<String>,
    def: Option<String>,
    synonyms: Vec<String>,
    is_a: Vec<String>,
    obsolete: bool,
}

impl StanzaBuilder {
    fn starting_at(line: usize) -> Self {
        Self {
            line,
            ..Self::default()
        }
    }

    fn build(self) -> Result<Option<OntologyTerm>> {
        if self.obsolete {
            return Ok(None);
        }
        let id = self.id.ok_or_else(|| {
            CyaneaError::Parse(format!("[Term] at line {} has no id", self.line))
        })?;
        let name = self.name.ok_or_else(|| {
            CyaneaError::Parse(format!("[Term] {id} at line {} has no name", self.line))
        })?;

        let mut parents = Vec::with_capacity(self.is_a.len());
        for parent in &self.is_a {
            parents.push(OntologyTerm::canonical_uid(parent)?);
        }
        let term = OntologyTerm::canonical(name, id)?
            .with_description(self.def.unwrap_or_default())
            .with_synonyms(self.synonyms)
            .with_parent_ids(parents);
        Ok(Some(term))
    }
}

/// Parse an OBO file into canonical terms.
pub fn parse_obo(path: impl AsRef<Path>) -> Result<Vec<OntologyTerm>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        CyaneaError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let reader = BufReader::new(file);
    let mut lines = Vec::new();
    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| {
            CyaneaError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: line {}: {}", path.display(), line_num + 1, e),
            ))
        })?;
        lines.push(line);
    }
    parse_obo_lines(lines.iter().map(String::as_str)).map_err(|e| match e {
        CyaneaError::Parse(msg) => CyaneaError::Parse(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse OBO text into canonical terms.
///
/// # Examples
///
/// ```
/// # use cyanea_io::obo::parse_obo_str;
/// let input = "format-version: 1.2\n\n\
///              [Term]\n\
///              id: CL:0000084\n\
///              name: T cell\n\
///              synonym: \"T-lymphocyte\" EXACT []\n";
/// let terms = parse_obo_str(input).unwrap();
/// assert_eq!(terms.len(), 1);
/// assert_eq!(terms[0].synonyms(), &["T-lymphocyte".to_string()]);
/// ```
pub fn parse_obo_str(input: &str) -> Result<Vec<OntologyTerm>> {
    parse_obo_lines(input.lines())
}

/// Parse an OBO file straight into an indexed [`Ontology`].
pub fn read_ontology(path: impl AsRef<Path>) -> Result<Ontology> {
    Ontology::new(parse_obo(path)?)
}

fn parse_obo_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<Vec<OntologyTerm>> {
    let mut terms = Vec::new();
    let mut current: Option<StanzaBuilder> = None;

    for (line_num, raw) in lines.enumerate() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            if let Some(stanza) = current.take() {
                terms.extend(stanza.build()?);
            }
            if line == "[Term]" {
                current = Some(StanzaBuilder::starting_at(line_num + 1));
            }
            continue;
        }

        // Header tags and non-Term stanzas.
        let Some(stanza) = current.as_mut() else {
            continue;
        };

        let Some((tag, value)) = line.split_once(':') else {
            return Err(CyaneaError::Parse(format!(
                "line {}: expected 'tag: value', got '{}'",
                line_num + 1,
                line
            )));
        };
        let value = value.trim();

        match tag.trim() {
            "id" => stanza.id = Some(value.to_string()),
            "name" => stanza.name = Some(value.to_string()),
            "def" => stanza.def = Some(quoted(value, line_num + 1)?),
            "synonym" => stanza.synonyms.push(quoted(value, line_num + 1)?),
            "is_a" => {
                // "CL:0000542 {qualifiers} ! lymphocyte"; comment already stripped.
                let parent = value.split_whitespace().next().unwrap_or_default();
                if !parent.is_empty() {
                    stanza.is_a.push(parent.to_string());
                }
            }
            "is_obsolete" => stanza.obsolete = value == "true",
            _ => {}
        }
    }

    if let Some(stanza) = current {
        terms.extend(stanza.build()?);
    }
    Ok(terms)
}

/// Drop a trailing `! comment`, leaving `!` inside quoted strings alone.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '!' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}

/// The text between the first pair of unescaped double quotes.
fn quoted(value: &str, line_num: usize) -> Result<String> {
    let body = value.strip_prefix('"').ok_or_else(|| {
        CyaneaError::Parse(format!("line {line_num}: expected quoted text, got '{value}'"))
    })?;
    let mut out = String::with_capacity(body.len());
    let mut escaped = false;
    for c in body.chars() {
        match c {
            _ if escaped => {
                out.push(c);
                escaped = false;
            }
            '\\' => escaped = true,
            '"' => return Ok(out),
            _ => out.push(c),
        }
    }
    Err(CyaneaError::Parse(format!("line {line_num}: unterminated quoted text")))
}
