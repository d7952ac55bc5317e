// crates/schema-bridge-core/src/core/diagnostics.rs
// ============================================================================
// Module: Diagnostics
// Description: Non-fatal findings collected during derivation and conversion.
// Purpose: Surface ambiguities and dropped fields without aborting the caller.
// Dependencies: serde, tracing
// ============================================================================

//! ## Overview
//! Diagnostics are attribute-scoped notes returned next to a successful
//! result. Recording a diagnostic also emits a `tracing` event so operators
//! see it even when the caller discards the collection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use tracing::error;
use tracing::warn;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Operation continued; result may be incomplete.
    Warning,
    /// Operation continued but the outcome is known to be wrong for this field.
    Error,
}

/// Stable diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Create and update schemas disagree on a shared field.
    ClassificationAmbiguity,
    /// Nested create and read shapes diverge; create shape kept.
    ShapeDivergence,
    /// Field type could not be resolved and was dropped.
    SchemaResolution,
    /// Split halves disagree after an operation.
    CurrentDesiredMismatch,
    /// Two fields adapt to the same target name; the later one was dropped.
    NameCollision,
}

impl DiagnosticCode {
    /// Returns the stable label for the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClassificationAmbiguity => "classification_ambiguity",
            Self::ShapeDivergence => "shape_divergence",
            Self::SchemaResolution => "schema_resolution",
            Self::CurrentDesiredMismatch => "current_desired_mismatch",
            Self::NameCollision => "name_collision",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attribute-scoped finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Stable code.
    pub code: DiagnosticCode,
    /// One-line summary.
    pub summary: String,
    /// Longer explanation.
    pub detail: String,
    /// Attribute path the finding applies to.
    pub path: String,
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    /// Recorded entries in insertion order.
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records a warning.
    pub fn warning(
        &mut self,
        code: DiagnosticCode,
        path: impl Into<String>,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            code,
            summary: summary.into(),
            detail: detail.into(),
            path: path.into(),
        });
    }

    /// Records an error-level finding.
    pub fn error(
        &mut self,
        code: DiagnosticCode,
        path: impl Into<String>,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic {
            severity: Severity::Error,
            code,
            summary: summary.into(),
            detail: detail.into(),
            path: path.into(),
        });
    }

    /// Records a diagnostic and logs it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => warn!(
                code = %diagnostic.code,
                path = %diagnostic.path,
                detail = %diagnostic.detail,
                "{}",
                diagnostic.summary
            ),
            Severity::Error => error!(
                code = %diagnostic.code,
                path = %diagnostic.path,
                detail = %diagnostic.detail,
                "{}",
                diagnostic.summary
            ),
        }
        self.entries.push(diagnostic);
    }

    /// Appends every entry from another collection without re-logging.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Returns true when any entry has error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|entry| entry.severity == Severity::Error)
    }

    /// Returns entries with the given code.
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |entry| entry.code == code)
    }

    /// Iterates over entries.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
