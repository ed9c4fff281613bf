//! Append-only collection of conversion anomalies.
//!
//! Every stage of the pipeline reports what it could not convert faithfully here instead of
//! failing. A [`Diagnostics`] collector is scoped to a single note conversion; the CLI gathers
//! them per note for reporting.

use crate::ir::nodes::NoteId;
use std::fmt;

/// The enumerated kinds of anomaly the engine knows how to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// A link construct with no usable target URL
    EmptyLink,
    /// An internal-link shape with no matching note in the index
    UnresolvedInternalLink,
    /// Media hosted outside the local attachment set
    ExternalMediaReference,
    /// A definition list that starts with a definition instead of a term
    NonstandardDefinitionList,
    /// Structural and indentation cues of a list item disagree
    AmbiguousListNesting,
    /// A style declaration outside the normalization table that looks malformed
    UnmappedStyleAttribute,
    /// An element the converter has no mapping for
    UnknownElement,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::EmptyLink => "empty-link",
            DiagnosticKind::UnresolvedInternalLink => "unresolved-internal-link",
            DiagnosticKind::ExternalMediaReference => "external-media-reference",
            DiagnosticKind::NonstandardDefinitionList => "nonstandard-definition-list",
            DiagnosticKind::AmbiguousListNesting => "ambiguous-list-nesting",
            DiagnosticKind::UnmappedStyleAttribute => "unmapped-style-attribute",
            DiagnosticKind::UnknownElement => "unknown-element",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single anomaly found while converting a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub note: NoteId,
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.note, self.detail)
    }
}

/// Collector for the diagnostics of one note.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    note: NoteId,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(note: NoteId) -> Self {
        Self {
            note,
            entries: Vec::new(),
        }
    }

    /// Record an anomaly. Also forwarded to the `log` facade at warn level.
    pub fn push(&mut self, kind: DiagnosticKind, detail: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            note: self.note.clone(),
            detail: detail.into(),
        };
        log::warn!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
