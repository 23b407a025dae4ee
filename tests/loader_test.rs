// Document loading and cross-reference resolution, including a stub
// pipeline that emits explicit `uri#/fragment` locators to show the loader
// is agnostic to how the language under test spells its references.

mod common;

use common::{session_with, EMPLOYEE_DM, PERSON_DM};
use pipecheck::diagnostic::Diagnostic;
use pipecheck::document::{Document, DocumentRegistry, Node, Reference};
use pipecheck::loader::DocumentLoader;
use pipecheck::sample;
use pipecheck::pipeline::{
    CheckMode, Frontend, GrammarRegistry, MemoryResources, ParseOutcome, Pipeline, RuleHandle,
    Serializer, SyntaxError, Token, Validator,
};
use pipecheck::{LoadError, TestSession};

#[test]
fn test_parse_failure_surfaces_raw_errors() {
    let mut session = session_with(&[("broken.dm", "entity Person {\n")]);
    let err = session.load("broken.dm", &[]).unwrap_err();
    match err {
        LoadError::ParseFailure { uri, errors, .. } => {
            assert_eq!(uri, "broken.dm");
            assert!(!errors.is_empty());
        }
        other => panic!("expected ParseFailure, got {other:?}"),
    }
    session.finish().unwrap();
}

#[test]
fn test_missing_resource() {
    let mut session = session_with(&[]);
    let err = session.load("missing.dm", &[]).unwrap_err();
    assert!(matches!(err, LoadError::ResourceUnavailable { .. }));
    session.finish().unwrap();
}

#[test]
fn test_supporting_documents_load_in_listed_order() {
    let mut session = session_with(&[("person.dm", PERSON_DM), ("employee.dm", EMPLOYEE_DM)]);
    session.load("employee.dm", &["person.dm"]).unwrap();

    let uris: Vec<&str> = session.registry().iter().map(|d| d.uri.as_str()).collect();
    assert_eq!(uris, vec!["person.dm", "employee.dm"]);
    session.finish().unwrap();
}

#[test]
fn test_load_returns_primary_even_when_listed_as_supporting() {
    let mut resources = MemoryResources::new();
    resources.insert("person.dm", PERSON_DM);
    let pipeline = sample::pipeline(resources);
    let mut registry = DocumentRegistry::new();
    let mut loader = DocumentLoader::new(&pipeline, &mut registry);

    let document = loader.load("person.dm", &["person.dm"]).unwrap();
    assert_eq!(document.uri, "person.dm");
    assert_eq!(document.root.children[0].name, "Person");
}

#[test]
fn test_resolution_replaces_placeholders_with_handles() {
    let mut session = session_with(&[("person.dm", PERSON_DM), ("employee.dm", EMPLOYEE_DM)]);
    session.load("employee.dm", &["person.dm"]).unwrap();

    let employee = session.object_at("employee.dm#/Employee").unwrap();
    match &employee.references[0] {
        Reference::Resolved { target } => {
            assert_eq!(target.uri, "person.dm");
            assert_eq!(target.fragment, "/Person");
        }
        Reference::Unresolved { locator } => panic!("'{locator}' left unresolved"),
    }
    assert_eq!(employee.unresolved_count(), 0);
    session.finish().unwrap();
}

#[test]
fn test_unresolved_reference_is_a_hard_failure() {
    let mut session = session_with(&[("employee.dm", EMPLOYEE_DM)]);
    let err = session.load("employee.dm", &[]).unwrap_err();
    match err {
        LoadError::UnresolvedReference { uri, path, locator } => {
            assert_eq!(uri, "employee.dm");
            assert_eq!(path, "/Employee");
            assert_eq!(locator, "Person");
        }
        other => panic!("expected UnresolvedReference, got {other:?}"),
    }
    session.finish().unwrap();
}

// == Stub pipeline with explicit uri#/fragment locators ==

struct StubLanguage;

impl Frontend for StubLanguage {
    fn parse_document(&self, uri: &str, _text: &str) -> ParseOutcome {
        let mut root = Node::new("Unit", "", 0, 1);
        let mut item = Node::new("Item", "Item", 0, 1);
        match uri {
            "main.stub" => {
                // One explicit cross-document locator, one bare local one.
                item.references.push(Reference::Unresolved {
                    locator: "lib.stub#/Shared".to_string(),
                });
                item.references.push(Reference::Unresolved {
                    locator: "Local".to_string(),
                });
                root.children.push(item);
                root.children.push(Node::new("Item", "Local", 0, 1));
            }
            _ => {
                root.children.push(Node::new("Item", "Shared", 0, 1));
                // The referencing document's own node wins over this one.
                root.children.push(Node::new("Item", "Local", 0, 1));
            }
        }
        ParseOutcome {
            root: Some(root),
            errors: Vec::new(),
        }
    }

    fn parse_rule(&self, _rule: &str, _text: &str) -> ParseOutcome {
        ParseOutcome {
            root: None,
            errors: vec![SyntaxError {
                offset: 0,
                message: "rule probes are not supported".to_string(),
            }],
        }
    }

    fn tokenize(&self, _text: &str) -> Vec<Token> {
        Vec::new()
    }
}

impl GrammarRegistry for StubLanguage {
    fn find_rule(&self, _name: &str) -> Option<RuleHandle> {
        None
    }
}

impl Validator for StubLanguage {
    fn validate(&self, _document: &Document, _mode: CheckMode) -> Vec<Diagnostic> {
        Vec::new()
    }
}

impl Serializer for StubLanguage {
    fn serialize(&self, _document: &Document) -> String {
        String::new()
    }
}

fn stub_session() -> TestSession {
    let mut resources = MemoryResources::new();
    resources.insert("main.stub", "irrelevant");
    resources.insert("lib.stub", "irrelevant");
    TestSession::new(Pipeline::new(
        Box::new(StubLanguage),
        Box::new(StubLanguage),
        Box::new(StubLanguage),
        Box::new(StubLanguage),
        Box::new(resources),
    ))
}

#[test]
fn test_explicit_uri_locator_resolves_in_named_document() {
    let mut session = stub_session();
    session.load("main.stub", &["lib.stub"]).unwrap();

    let item = session.object_at("main.stub#/Item").unwrap();
    match &item.references[0] {
        Reference::Resolved { target } => {
            assert_eq!(target.uri, "lib.stub");
            assert_eq!(target.fragment, "/Shared");
        }
        Reference::Unresolved { locator } => panic!("'{locator}' left unresolved"),
    }
    session.finish().unwrap();
}

#[test]
fn test_bare_locator_prefers_the_referencing_document() {
    let mut session = stub_session();
    session.load("main.stub", &["lib.stub"]).unwrap();

    let item = session.object_at("main.stub#/Item").unwrap();
    match &item.references[1] {
        Reference::Resolved { target } => {
            assert_eq!(target.uri, "main.stub");
            assert_eq!(target.fragment, "/Local");
        }
        Reference::Unresolved { locator } => panic!("'{locator}' left unresolved"),
    }
    session.finish().unwrap();
}

#[test]
fn test_explicit_uri_locator_misses_other_documents() {
    // "lib.stub#/Shared" must not fall back to a global search when the
    // named document is absent.
    let mut session = stub_session();
    let err = session.load("main.stub", &[]).unwrap_err();
    match err {
        LoadError::UnresolvedReference { locator, .. } => {
            assert_eq!(locator, "lib.stub#/Shared");
        }
        other => panic!("expected UnresolvedReference, got {other:?}"),
    }
    session.finish().unwrap();
}
