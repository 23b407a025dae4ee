//! The load → validate → serialize → diff orchestration for one primary
//! document.

use crate::collection::DiagnosticSet;
use crate::document::DocumentRegistry;
use crate::error::{HarnessError, LoadError};
use crate::loader::DocumentLoader;
use crate::pipeline::{CheckMode, Pipeline};

/// Verifies round-trip fidelity of one document.
///
/// The verifier deliberately asserts nothing about diagnostic severities:
/// structural fidelity and diagnostic content are independent concerns, and a
/// test may expect some diagnostics while still requiring exact serialization
/// fidelity. The returned [`DiagnosticSet`] is the caller's to assert
/// against.
pub struct RoundTripVerifier<'a> {
    pipeline: &'a Pipeline,
    registry: &'a mut DocumentRegistry,
}

impl<'a> RoundTripVerifier<'a> {
    pub fn new(pipeline: &'a Pipeline, registry: &'a mut DocumentRegistry) -> Self {
        RoundTripVerifier { pipeline, registry }
    }

    /// Loads the document graph (supporting documents first, reference
    /// resolution deferred until everything is in the registry), collects
    /// all diagnostics for the primary document (exhaustive mode),
    /// serializes it, and compares against the raw original text with
    /// trailing-whitespace normalization on both sides.
    pub fn verify(
        &mut self,
        uri: &str,
        supporting: &[&str],
    ) -> Result<(String, DiagnosticSet), HarnessError> {
        let mut loader = DocumentLoader::new(self.pipeline, &mut *self.registry);
        let document = loader.load(uri, supporting)?;

        let diagnostics = DiagnosticSet::new(
            self.pipeline
                .validator
                .validate(document, CheckMode::Exhaustive),
        );
        let serialized = self.pipeline.serializer.serialize(document);

        let expected = self
            .pipeline
            .resources
            .read_raw_text(uri)
            .map_err(|source| LoadError::ResourceUnavailable {
                uri: uri.to_string(),
                source,
            })?;

        if normalize_trailing_whitespace(&expected) != normalize_trailing_whitespace(&serialized) {
            return Err(HarnessError::RoundTripMismatch {
                uri: uri.to_string(),
                diff: render_diff(&expected, &serialized),
                expected,
                actual: serialized,
            });
        }

        Ok((serialized, diagnostics))
    }
}

/// Strips trailing whitespace from every line and drops trailing blank
/// lines. Only this narrow tolerance is applied; leading and internal
/// whitespace differences remain mismatches.
pub(crate) fn normalize_trailing_whitespace(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    while lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join("\n")
}

/// Renders a line-by-line expected/actual diff for the mismatch report.
fn render_diff(expected: &str, actual: &str) -> String {
    let expected_lines: Vec<&str> = expected.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();
    let mut out = String::new();
    let count = expected_lines.len().max(actual_lines.len());
    for i in 0..count {
        let e = expected_lines.get(i).copied().unwrap_or("<missing>");
        let a = actual_lines.get(i).copied().unwrap_or("<missing>");
        if e.trim_end() == a.trim_end() {
            out.push_str(&format!("  {e}\n"));
        } else {
            out.push_str(&format!("- {e}\n+ {a}\n"));
        }
    }
    out
}
