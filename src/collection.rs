//! The ordered diagnostic collection for one validation run, with the fluent
//! filter chain tests assert against.
//!
//! Sets are immutable views; every filter returns a new set and leaves the
//! original untouched. Claiming is tracked in the owning session's ledger,
//! never by mutating the set, so the same set can be filtered and
//! re-evaluated safely.

use crate::diagnostic::{Diagnostic, DiagnosticId, Severity};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct DiagnosticSet {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSet {
    #[must_use]
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        DiagnosticSet { diagnostics }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Identities of every diagnostic in this view.
    #[must_use]
    pub fn ids(&self) -> HashSet<DiagnosticId> {
        self.diagnostics.iter().map(Diagnostic::id).collect()
    }

    fn filtered(&self, predicate: impl Fn(&Diagnostic) -> bool) -> Self {
        DiagnosticSet {
            diagnostics: self
                .diagnostics
                .iter()
                .filter(|d| predicate(d))
                .cloned()
                .collect(),
        }
    }

    /// Diagnostics carrying exactly this stable code.
    #[must_use]
    pub fn with_code(&self, code: &str) -> Self {
        self.filtered(|d| d.code.as_deref() == Some(code))
    }

    #[must_use]
    pub fn with_severity(&self, severity: Severity) -> Self {
        self.filtered(|d| d.severity == severity)
    }

    #[must_use]
    pub fn errors_only(&self) -> Self {
        self.with_severity(Severity::Error)
    }

    #[must_use]
    pub fn warnings_only(&self) -> Self {
        self.with_severity(Severity::Warning)
    }

    /// Diagnostics whose message contains the given substring.
    #[must_use]
    pub fn containing(&self, substring: &str) -> Self {
        self.filtered(|d| d.message.contains(substring))
    }

    /// Diagnostics located on the given 1-based line.
    #[must_use]
    pub fn in_line(&self, line: usize) -> Self {
        self.filtered(|d| d.location.as_ref().is_some_and(|l| l.line == line))
    }

    /// Diagnostics whose identity is not in `claimed`.
    #[must_use]
    pub fn except(&self, claimed: &HashSet<DiagnosticId>) -> Self {
        self.filtered(|d| !claimed.contains(&d.id()))
    }

    /// Builds an evaluatable "exactly `n` elements" constraint over this
    /// view. Nothing is claimed until the constraint is evaluated.
    #[must_use]
    pub fn size_is(&self, expected: usize) -> SizeConstraint {
        SizeConstraint {
            expected,
            view: self.clone(),
        }
    }

    /// Enumerates the view's contents for dump output and failure messages.
    #[must_use]
    pub fn render(&self) -> String {
        if self.diagnostics.is_empty() {
            return "  (no diagnostics)".to_string();
        }
        self.diagnostics
            .iter()
            .map(|d| format!("  {}", d.render()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serializes the view as a pretty-printed JSON report.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.diagnostics)
    }

    /// Serializes the view as a YAML report.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.diagnostics)
    }
}

/// An evaluatable "the filtered view has exactly `expected` elements"
/// constraint, carrying the view it was built from.
#[derive(Debug, Clone)]
pub struct SizeConstraint {
    expected: usize,
    view: DiagnosticSet,
}

impl SizeConstraint {
    #[must_use]
    pub fn holds(&self) -> bool {
        self.view.len() == self.expected
    }

    /// The diagnostics touched by the filter chain leading to this
    /// constraint. The session claims these on evaluation.
    #[must_use]
    pub fn view(&self) -> &DiagnosticSet {
        &self.view
    }

    /// Human-readable failure message enumerating the view's contents.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "expected exactly {} diagnostic(s), found {}:\n{}",
            self.expected,
            self.view.len(),
            self.view.render()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::SourceLocation;

    fn sample_set() -> DiagnosticSet {
        DiagnosticSet::new(vec![
            Diagnostic::new(Severity::Error, "duplicate entity 'Person'")
                .with_code("DUPLICATE_ENTITY")
                .at(SourceLocation {
                    uri: "model.dm".to_string(),
                    offset: 40,
                    line: 3,
                }),
            Diagnostic::new(Severity::Warning, "entity name 'person' should be capitalized")
                .with_code("INVALID_TYPE_NAME"),
            Diagnostic::new(Severity::Info, "entity 'Person' declares no properties"),
        ])
    }

    #[test]
    fn test_filters_are_pure() {
        let set = sample_set();
        let errors = set.errors_only();
        assert_eq!(errors.len(), 1);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_with_code() {
        let set = sample_set();
        assert_eq!(set.with_code("INVALID_TYPE_NAME").len(), 1);
        assert_eq!(set.with_code("NO_SUCH_CODE").len(), 0);
    }

    #[test]
    fn test_chained_filters() {
        let set = sample_set();
        assert_eq!(set.errors_only().in_line(3).len(), 1);
        assert_eq!(set.warnings_only().containing("capitalized").len(), 1);
        assert_eq!(set.errors_only().containing("capitalized").len(), 0);
    }

    #[test]
    fn test_except() {
        let set = sample_set();
        let claimed = set.errors_only().ids();
        assert_eq!(set.except(&claimed).len(), 2);
    }

    #[test]
    fn test_size_constraint_message() {
        let set = sample_set();
        let constraint = set.errors_only().size_is(0);
        assert!(!constraint.holds());
        let message = constraint.message();
        assert!(message.contains("expected exactly 0"));
        assert!(message.contains("duplicate entity 'Person'"));
    }

    #[test]
    fn test_size_constraint_holds() {
        let set = sample_set();
        assert!(set.size_is(3).holds());
        assert!(set.warnings_only().size_is(1).holds());
    }

    #[test]
    fn test_json_report() {
        let json = sample_set().to_json().unwrap();
        assert!(json.contains("DUPLICATE_ENTITY"));
        assert!(json.contains("capitalized"));
    }

    #[test]
    fn test_yaml_report() {
        let yaml = sample_set().to_yaml().unwrap();
        assert!(yaml.contains("code: DUPLICATE_ENTITY"));
        assert!(yaml.contains("severity: Error"));
        assert!(yaml.contains("line: 3"));
    }
}
