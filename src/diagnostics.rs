use std::fmt;

/// Non-fatal conditions detected by a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A source file could not be read and was left out of the table.
    SkippedSource,
    /// Rows kept with a null timestamp or count.
    UnparseableRows,
    /// The selection matched no rows.
    NoData,
    /// Capacity is missing or zero, utilization reported as 0.
    ZeroCapacity,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::SkippedSource => "skipped_source",
            DiagnosticKind::UnparseableRows => "unparseable_rows",
            DiagnosticKind::NoData => "no_data",
            DiagnosticKind::ZeroCapacity => "zero_capacity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            kind,
            message: message.into(),
        };
        match kind {
            DiagnosticKind::NoData => log::info!("{diagnostic}"),
            _ => log::warn!("{diagnostic}"),
        }
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

/// Returns true if any diagnostic of `kind` is present.
pub fn has_kind(diagnostics: &[Diagnostic], kind: DiagnosticKind) -> bool {
    diagnostics.iter().any(|d| d.kind == kind)
}
