use crate::pipeline::SyntaxError;
use miette::Diagnostic;
use thiserror::Error;

/// Top-level failure of one harness operation. Each failure is local to a
/// single test invocation; nothing is retried.
#[derive(Error, Debug, Diagnostic)]
pub enum HarnessError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Probe(#[from] ProbeError),

    #[error("serialized text for '{uri}' does not match the original source\n{diff}")]
    #[diagnostic(
        code(harness::round_trip_mismatch),
        help("Trailing whitespace differences are tolerated; everything else must serialize back byte-for-byte.")
    )]
    RoundTripMismatch {
        uri: String,
        expected: String,
        actual: String,
        diff: String,
    },

    #[error("{count} diagnostic(s) were produced but never examined\n{rendered}")]
    #[diagnostic(
        code(harness::unclaimed_diagnostics),
        help("Every diagnostic a validation run produces must be either asserted against or absent.")
    )]
    UnclaimedDiagnostics { count: usize, rendered: String },

    #[error("constraint failed{}: {message}", constraint_id_suffix(.constraint_id))]
    #[diagnostic(code(harness::constraint_failure))]
    ConstraintFailure {
        constraint_id: Option<String>,
        message: String,
    },
}

fn constraint_id_suffix(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(" ({id})"),
        None => String::new(),
    }
}

/// Hard failure while materializing a document graph. Loading unwinds
/// immediately; no validation or serialization is attempted afterwards.
#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    #[error("parsing '{uri}' reported {} structural error(s)\n{rendered}", .errors.len())]
    #[diagnostic(code(load::parse_failure))]
    ParseFailure {
        uri: String,
        errors: Vec<SyntaxError>,
        rendered: String,
    },

    #[error("reference at '{uri}#{path}' to '{locator}' did not resolve")]
    #[diagnostic(
        code(load::unresolved_reference),
        help("An unresolved reference means the loaded graph cannot be safely serialized or compared.")
    )]
    UnresolvedReference {
        uri: String,
        path: String,
        locator: String,
    },

    #[error("could not read raw text for '{uri}'")]
    #[diagnostic(code(load::resource_unavailable))]
    ResourceUnavailable {
        uri: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of an isolated tokenizer or parser-rule probe.
#[derive(Error, Debug, Diagnostic)]
pub enum ProbeError {
    #[error("no rule named '{name}' exists in the grammar")]
    #[diagnostic(code(probe::missing_rule))]
    MissingRule { name: String },

    #[error("parsing '{text}' for rule '{rule}' failed with errors:\n{rendered}")]
    #[diagnostic(code(probe::unexpected_syntax_errors))]
    UnexpectedSyntaxErrors {
        rule: String,
        text: String,
        rendered: String,
    },

    #[error("parsing '{text}' for rule '{rule}' was expected to have syntax errors")]
    #[diagnostic(code(probe::expected_syntax_errors))]
    ExpectedSyntaxErrors { rule: String, text: String },

    #[error("rule '{rule}' reported {actual} error(s), expected {expected}\n{rendered}")]
    #[diagnostic(
        code(probe::error_count_mismatch),
        help("The number of reported errors must equal the number of expected substrings exactly.")
    )]
    ErrorCountMismatch {
        rule: String,
        expected: usize,
        actual: usize,
        rendered: String,
    },

    #[error("unexpected error message for rule '{rule}': {message}")]
    #[diagnostic(code(probe::unmatched_error))]
    UnmatchedError { rule: String, message: String },

    #[error("'{text}' tokenized as [{actual}], expected [{expected}]")]
    #[diagnostic(code(probe::token_mismatch))]
    TokenMismatch {
        text: String,
        expected: String,
        actual: String,
    },

    #[error("'{text}' tokenized into {count} token(s), expected exactly one")]
    #[diagnostic(code(probe::not_single_token))]
    NotSingleToken { text: String, count: usize },
}
