//! Collaborator contracts implemented by the language toolchain under test.
//!
//! The harness never looks these up through a framework registry; a
//! [`Pipeline`] bundle is built per test suite and handed to the
//! [`TestSession`](crate::session::TestSession) by constructor injection.

use crate::diagnostic::Diagnostic;
use crate::document::{Document, Node};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// One token produced by the lexer.
///
/// `kind` is the name of the defining terminal rule (`ID`, `INT`, ...);
/// literal/keyword tokens are classified by their literal text wrapped in
/// single quotes (`'.'`, `'entity'`), so a dot is distinguishable from an
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: String,
    pub text: String,
}

impl Token {
    /// True when the token was classified by the quoted-literal convention.
    #[must_use]
    pub fn is_keyword(&self) -> bool {
        self.kind.starts_with('\'')
    }
}

/// One structural error reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

/// What the parser hands back for one invocation.
///
/// `root` is present on a successful document parse; rule probes only care
/// about `errors`.
#[derive(Debug)]
pub struct ParseOutcome {
    pub root: Option<Node>,
    pub errors: Vec<SyntaxError>,
}

/// Validation depth requested from the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Collect every diagnostic the validator can produce.
    Exhaustive,
    /// Stop after the first error.
    FailFast,
}

/// Lexer and parser of the language under test.
pub trait Frontend {
    /// Parses a full document under the grammar's default entry rule.
    fn parse_document(&self, uri: &str, text: &str) -> ParseOutcome;

    /// Parses `text` strictly under the named rule.
    fn parse_rule(&self, rule: &str, text: &str) -> ParseOutcome;

    /// Runs the lexer only, with hidden tokens (whitespace, comments)
    /// filtered out.
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Rule lookup in the grammar definition.
pub trait GrammarRegistry {
    fn find_rule(&self, name: &str) -> Option<RuleHandle>;
}

/// Handle to a named grammar rule, as resolved by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHandle(pub String);

pub trait Validator {
    fn validate(&self, document: &Document, mode: CheckMode) -> Vec<Diagnostic>;
}

pub trait Serializer {
    fn serialize(&self, document: &Document) -> String;
}

/// Raw text access, used both to load documents and to fetch the expected
/// comparison text for round trips. URIs are opaque locator strings.
pub trait ResourceAccess {
    fn read_raw_text(&self, uri: &str) -> io::Result<String>;
}

/// The capability set supplied per test suite.
pub struct Pipeline {
    pub frontend: Box<dyn Frontend>,
    pub grammar: Box<dyn GrammarRegistry>,
    pub validator: Box<dyn Validator>,
    pub serializer: Box<dyn Serializer>,
    pub resources: Box<dyn ResourceAccess>,
}

impl Pipeline {
    pub fn new(
        frontend: Box<dyn Frontend>,
        grammar: Box<dyn GrammarRegistry>,
        validator: Box<dyn Validator>,
        serializer: Box<dyn Serializer>,
        resources: Box<dyn ResourceAccess>,
    ) -> Self {
        Pipeline {
            frontend,
            grammar,
            validator,
            serializer,
            resources,
        }
    }
}

/// In-memory resource map, for tests that do not want to touch the
/// filesystem.
#[derive(Debug, Default)]
pub struct MemoryResources {
    texts: HashMap<String, String>,
}

impl MemoryResources {
    #[must_use]
    pub fn new() -> Self {
        MemoryResources::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.texts.insert(uri.into(), text.into());
        self
    }
}

impl ResourceAccess for MemoryResources {
    fn read_raw_text(&self, uri: &str) -> io::Result<String> {
        self.texts.get(uri).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no resource '{uri}'"))
        })
    }
}

/// Resolves URIs as paths below a fixed root directory.
#[derive(Debug)]
pub struct FsResources {
    root: PathBuf,
}

impl FsResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsResources { root: root.into() }
    }
}

impl ResourceAccess for FsResources {
    fn read_raw_text(&self, uri: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classification() {
        let dot = Token {
            kind: "'.'".to_string(),
            text: ".".to_string(),
        };
        let id = Token {
            kind: "ID".to_string(),
            text: "foo".to_string(),
        };
        assert!(dot.is_keyword());
        assert!(!id.is_keyword());
    }

    #[test]
    fn test_memory_resources_missing_uri() {
        let resources = MemoryResources::new();
        let err = resources.read_raw_text("nope.dm").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
