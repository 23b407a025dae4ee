use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// How bad an issue reported by the validator is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// Where in a document an issue was reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub uri: String,
    pub offset: usize,
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uri, self.line)
    }
}

/// Opaque identity of one diagnostic occurrence.
///
/// Two diagnostics may carry identical text but refer to different
/// occurrences, so claiming is tracked by identity rather than content. Ids
/// are allocated from a process-wide counter, which keeps them unique across
/// concurrently running test sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticId(u64);

impl DiagnosticId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        DiagnosticId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// One immutable issue reported by a validation run.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    #[serde(skip)]
    id: DiagnosticId,
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            id: DiagnosticId::fresh(),
            severity,
            code: None,
            message: message.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn id(&self) -> DiagnosticId {
        self.id
    }

    /// Renders the diagnostic for dump output and failure messages.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.severity.to_string();
        if let Some(code) = &self.code {
            out.push_str(&format!(" [{code}]"));
        }
        out.push_str(&format!(": {}", self.message));
        if let Some(location) = &self.location {
            out.push_str(&format!(" ({location})"));
        }
        out
    }
}

// Equality is identity of origin, not content.
impl PartialEq for Diagnostic {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality() {
        let a = Diagnostic::new(Severity::Error, "same text");
        let b = Diagnostic::new(Severity::Error, "same text");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_render_full() {
        let d = Diagnostic::new(Severity::Warning, "name should be capitalized")
            .with_code("INVALID_TYPE_NAME")
            .at(SourceLocation {
                uri: "model.dm".to_string(),
                offset: 7,
                line: 1,
            });
        assert_eq!(
            d.render(),
            "WARNING [INVALID_TYPE_NAME]: name should be capitalized (model.dm:1)"
        );
    }

    #[test]
    fn test_render_bare() {
        let d = Diagnostic::new(Severity::Info, "entity declares no properties");
        assert_eq!(d.render(), "INFO: entity declares no properties");
    }
}
