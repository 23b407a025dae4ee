//! `pipecheck` verifies that a language-processing pipeline is *faithful*:
//! given a source document it drives the front end (lexer/parser), the
//! semantic stage (cross-reference resolution and validation), and the back
//! end (serializer), then checks that the document parses without error,
//! every reference resolves, only expected diagnostics are reported, and the
//! serialized form reproduces the original text after a round trip through
//! the in-memory model.
//!
//! The pipeline under test is supplied as a [`pipeline::Pipeline`] bundle of
//! trait objects; the harness itself contains no grammar engine. A small
//! reference implementation lives in [`sample`] so the harness can be
//! exercised without an external language.

pub mod collection;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod probe;
pub mod sample;
pub mod session;
pub mod utils;
pub mod verifier;

pub use collection::{DiagnosticSet, SizeConstraint};
pub use diagnostic::{Diagnostic, DiagnosticId, Severity, SourceLocation};
pub use error::{HarnessError, LoadError, ProbeError};
pub use session::TestSession;
