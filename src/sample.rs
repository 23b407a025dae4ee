//! A miniature entity-declaration language implementing every pipeline
//! trait, so the harness can be exercised, benchmarked, and demonstrated
//! without an external language implementation.
//!
//! The grammar:
//!
//! ```text
//! Model                     ::= Entity*
//! Entity                    ::= 'entity' QualifiedName ('extends' QualifiedName)? '{' Property* '}'
//! Property                  ::= 'prop' ID ';'
//! QualifiedName             ::= ID ('.' ID)*
//! QualifiedNameWithWildcard ::= QualifiedName ('.' '*')?
//! ```
//!
//! `extends` produces an unresolved reference by entity name, resolved by
//! the loader against the shared document registry. The validator warns
//! (code `INVALID_TYPE_NAME`) on lower-case entity names, errors (code
//! `DUPLICATE_ENTITY`) on duplicates, and reports an uncoded info for an
//! entity without properties.

use crate::diagnostic::{Diagnostic, Severity, SourceLocation};
use crate::document::{Document, Node, Reference};
use crate::pipeline::{
    CheckMode, Frontend, GrammarRegistry, ParseOutcome, Pipeline, ResourceAccess, RuleHandle,
    Serializer, SyntaxError, Token, Validator,
};
use crate::utils::line_of_offset;
use std::collections::HashSet;

pub const INVALID_TYPE_NAME: &str = "INVALID_TYPE_NAME";
pub const DUPLICATE_ENTITY: &str = "DUPLICATE_ENTITY";

const RULES: &[&str] = &[
    "Model",
    "Entity",
    "Property",
    "QualifiedName",
    "QualifiedNameWithWildcard",
];

/// The sample language toolchain. One value implements the whole capability
/// set; [`pipeline`] boxes it into a [`Pipeline`] bundle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleLanguage;

/// Builds a ready-to-use pipeline over the sample language and the given
/// resource access.
pub fn pipeline(resources: impl ResourceAccess + 'static) -> Pipeline {
    Pipeline::new(
        Box::new(SampleLanguage),
        Box::new(SampleLanguage),
        Box::new(SampleLanguage),
        Box::new(SampleLanguage),
        Box::new(resources),
    )
}

// == Lexer ==

#[derive(Debug, Clone)]
struct RawToken {
    kind: String,
    text: String,
    offset: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn scan(input: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if is_ident_start(c) {
            let mut text = String::new();
            text.push(c);
            while let Some((_, next)) = chars.peek() {
                if is_ident_continue(*next) {
                    text.push(*next);
                    chars.next();
                } else {
                    break;
                }
            }
            let kind = match text.as_str() {
                // Keywords are classified by the quoted-literal convention.
                "entity" | "extends" | "prop" => format!("'{text}'"),
                _ => "ID".to_string(),
            };
            tokens.push(RawToken { kind, text, offset });
            continue;
        }
        if c.is_ascii_digit() {
            let mut text = String::new();
            text.push(c);
            while let Some((_, next)) = chars.peek() {
                if next.is_ascii_digit() {
                    text.push(*next);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(RawToken {
                kind: "INT".to_string(),
                text,
                offset,
            });
            continue;
        }
        let kind = match c {
            '.' | '*' | '{' | '}' | ';' => format!("'{c}'"),
            _ => "UNKNOWN".to_string(),
        };
        tokens.push(RawToken {
            kind,
            text: c.to_string(),
            offset,
        });
    }
    tokens
}

// == Parser ==

/// Recursive descent over the token vec, with single-token recovery so a
/// stray leading token yields one "extraneous input" error instead of a
/// cascade.
struct RuleParser<'a> {
    text: &'a str,
    tokens: Vec<RawToken>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> RuleParser<'a> {
    fn new(text: &'a str) -> Self {
        RuleParser {
            text,
            tokens: scan(text),
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&RawToken> {
        self.tokens.get(self.pos)
    }

    fn peek_next(&self) -> Option<&RawToken> {
        self.tokens.get(self.pos + 1)
    }

    fn bump(&mut self) -> Option<RawToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_kind(&self, kind: &str) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn error(&mut self, offset: usize, message: String) {
        self.errors.push(SyntaxError { offset, message });
    }

    fn eof_offset(&self) -> usize {
        self.text.len()
    }

    /// Consumes the given literal, or records a "missing" error and leaves
    /// the position unchanged.
    fn expect_literal(&mut self, literal: &str) -> bool {
        let quoted = format!("'{literal}'");
        if self.at_kind(&quoted) {
            self.bump();
            return true;
        }
        match self.peek() {
            Some(token) => {
                let (offset, text) = (token.offset, token.text.clone());
                self.error(offset, format!("missing '{literal}' at '{text}'"));
            }
            None => {
                let offset = self.eof_offset();
                self.error(offset, format!("unexpected end of input, expecting '{literal}'"));
            }
        }
        false
    }

    /// Consumes an ID, recovering from one extraneous leading token.
    fn expect_id(&mut self) -> Option<RawToken> {
        if self.at_kind("ID") {
            return self.bump();
        }
        if self.peek_next().is_some_and(|t| t.kind == "ID") {
            if let Some(bad) = self.bump() {
                self.error(
                    bad.offset,
                    format!("extraneous input '{}' expecting ID", bad.text),
                );
            }
            return self.bump();
        }
        match self.peek() {
            Some(token) => {
                let (offset, text) = (token.offset, token.text.clone());
                self.error(offset, format!("mismatched input '{text}' expecting ID"));
            }
            None => {
                let offset = self.eof_offset();
                self.error(offset, "unexpected end of input, expecting ID".to_string());
            }
        }
        None
    }

    /// QualifiedName ::= ID ('.' ID)*. The dot is consumed only when an ID
    /// follows, so a trailing `.*` is left for the wildcard rule.
    fn parse_qualified_name(&mut self) -> Option<(String, usize)> {
        let first = self.expect_id()?;
        let mut name = first.text;
        let offset = first.offset;
        while self.at_kind("'.'") && self.peek_next().is_some_and(|t| t.kind == "ID") {
            self.bump();
            if let Some(segment) = self.bump() {
                name.push('.');
                name.push_str(&segment.text);
            }
        }
        Some((name, offset))
    }

    fn parse_qualified_name_with_wildcard(&mut self) {
        if self.parse_qualified_name().is_none() {
            return;
        }
        if self.at_kind("'.'") {
            self.bump();
            self.expect_literal("*");
        }
    }

    /// Property ::= 'prop' ID ';'
    fn parse_property(&mut self) -> Option<Node> {
        self.expect_literal("prop");
        let id = self.expect_id()?;
        let line = line_of_offset(self.text, id.offset);
        let node = Node::new("Property", id.text, id.offset, line);
        self.expect_literal(";");
        Some(node)
    }

    /// Entity ::= 'entity' QualifiedName ('extends' QualifiedName)? '{' Property* '}'
    fn parse_entity(&mut self) -> Option<Node> {
        self.expect_literal("entity");
        let (name, offset) = self.parse_qualified_name()?;
        let line = line_of_offset(self.text, offset);
        let mut node = Node::new("Entity", name, offset, line);

        if self.at_kind("'extends'") {
            self.bump();
            if let Some((target, _)) = self.parse_qualified_name() {
                node.references.push(Reference::Unresolved { locator: target });
            }
        }

        self.expect_literal("{");
        while self.at_kind("'prop'") {
            if let Some(property) = self.parse_property() {
                node.children.push(property);
            }
        }
        self.expect_literal("}");
        Some(node)
    }

    /// Model ::= Entity*
    fn parse_model(&mut self) -> Node {
        let mut root = Node::new("Model", "", 0, 1);
        while let Some(token) = self.peek() {
            if token.kind == "'entity'" {
                if let Some(entity) = self.parse_entity() {
                    root.children.push(entity);
                }
            } else {
                let (offset, text) = (token.offset, token.text.clone());
                self.error(
                    offset,
                    format!("extraneous input '{text}' expecting 'entity'"),
                );
                self.bump();
            }
        }
        root
    }

    fn expect_eof(&mut self) {
        if let Some(token) = self.peek() {
            let (offset, text) = (token.offset, token.text.clone());
            self.error(offset, format!("extraneous input '{text}' expecting <EOF>"));
        }
    }
}

impl Frontend for SampleLanguage {
    fn parse_document(&self, _uri: &str, text: &str) -> ParseOutcome {
        let mut parser = RuleParser::new(text);
        let root = parser.parse_model();
        ParseOutcome {
            root: Some(root),
            errors: parser.errors,
        }
    }

    fn parse_rule(&self, rule: &str, text: &str) -> ParseOutcome {
        let mut parser = RuleParser::new(text);
        let root = match rule {
            "Model" => Some(parser.parse_model()),
            "Entity" => {
                let entity = parser.parse_entity();
                parser.expect_eof();
                entity
            }
            "Property" => {
                let property = parser.parse_property();
                parser.expect_eof();
                property
            }
            "QualifiedName" => {
                parser.parse_qualified_name();
                parser.expect_eof();
                None
            }
            "QualifiedNameWithWildcard" => {
                parser.parse_qualified_name_with_wildcard();
                parser.expect_eof();
                None
            }
            _ => {
                parser.error(0, format!("no rule named '{rule}'"));
                None
            }
        };
        ParseOutcome {
            root,
            errors: parser.errors,
        }
    }

    fn tokenize(&self, text: &str) -> Vec<Token> {
        scan(text)
            .into_iter()
            .map(|t| Token {
                kind: t.kind,
                text: t.text,
            })
            .collect()
    }
}

impl GrammarRegistry for SampleLanguage {
    fn find_rule(&self, name: &str) -> Option<RuleHandle> {
        RULES
            .iter()
            .find(|r| **r == name)
            .map(|r| RuleHandle((*r).to_string()))
    }
}

// == Validator ==

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

impl Validator for SampleLanguage {
    fn validate(&self, document: &Document, mode: CheckMode) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for entity in &document.root.children {
            let location = SourceLocation {
                uri: document.uri.clone(),
                offset: entity.offset,
                line: entity.line,
            };
            if simple_name(&entity.name)
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_lowercase())
            {
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        format!(
                            "entity name '{}' should start with a capital letter",
                            entity.name
                        ),
                    )
                    .with_code(INVALID_TYPE_NAME)
                    .at(location.clone()),
                );
            }
            if !seen.insert(&entity.name) {
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Error,
                        format!("duplicate entity '{}'", entity.name),
                    )
                    .with_code(DUPLICATE_ENTITY)
                    .at(location.clone()),
                );
                if mode == CheckMode::FailFast {
                    break;
                }
            }
            if entity.children.is_empty() {
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Info,
                        format!("entity '{}' declares no properties", entity.name),
                    )
                    .at(location),
                );
            }
        }
        diagnostics
    }
}

// == Serializer ==

impl Serializer for SampleLanguage {
    fn serialize(&self, document: &Document) -> String {
        let mut out = String::new();
        for (i, entity) in document.root.children.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str("entity ");
            out.push_str(&entity.name);
            if let Some(reference) = entity.references.first() {
                out.push_str(" extends ");
                match reference {
                    Reference::Resolved { target } => {
                        out.push_str(target.fragment.trim_start_matches('/'));
                    }
                    Reference::Unresolved { locator } => out.push_str(locator),
                }
            }
            out.push_str(" {\n");
            for property in &entity.children {
                out.push_str("    prop ");
                out.push_str(&property.name);
                out.push_str(";\n");
            }
            out.push_str("}\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<String> {
        SampleLanguage
            .tokenize(input)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_identifier_tokens() {
        assert_eq!(kinds("bar"), vec!["ID"]);
        assert_eq!(kinds("bar3"), vec!["ID"]);
        assert_eq!(kinds("_bar_"), vec!["ID"]);
        assert_eq!(kinds("$bar$"), vec!["ID"]);
    }

    #[test]
    fn test_keyword_tokens() {
        assert_eq!(kinds("entity extends prop"), vec!["'entity'", "'extends'", "'prop'"]);
    }

    #[test]
    fn test_dotted_name_tokens() {
        assert_eq!(kinds("foo.bar"), vec!["ID", "'.'", "ID"]);
        assert_eq!(kinds("foo.*"), vec!["ID", "'.'", "'*'"]);
    }

    #[test]
    fn test_int_and_unknown_tokens() {
        assert_eq!(kinds("3bar"), vec!["INT", "ID"]);
        assert_eq!(kinds("#"), vec!["UNKNOWN"]);
    }

    #[test]
    fn test_parse_model_builds_tree() {
        let text = "entity Person {\n    prop name;\n}\n";
        let outcome = SampleLanguage.parse_document("model.dm", text);
        assert!(outcome.errors.is_empty());
        let root = outcome.root.unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "Person");
        assert_eq!(root.children[0].children[0].name, "name");
    }

    #[test]
    fn test_parse_extends_emits_unresolved_reference() {
        let text = "entity Employee extends Person {\n}\n";
        let outcome = SampleLanguage.parse_document("model.dm", text);
        assert!(outcome.errors.is_empty());
        let root = outcome.root.unwrap();
        assert_eq!(
            root.children[0].references,
            vec![Reference::Unresolved {
                locator: "Person".to_string()
            }]
        );
    }

    #[test]
    fn test_qualified_name_recovery() {
        let outcome = SampleLanguage.parse_rule("QualifiedName", "3foo.bar");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("extraneous input '3'"));
    }

    #[test]
    fn test_missing_brace_reported() {
        let outcome = SampleLanguage.parse_document("model.dm", "entity Person\n");
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors[0]
            .message
            .contains("unexpected end of input, expecting '{'"));
    }

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let text = "entity Person {\n    prop a;\n}\n\nentity Person {\n    prop b;\n}\n\nentity lower {\n}\n";
        let outcome = SampleLanguage.parse_document("model.dm", text);
        assert!(outcome.errors.is_empty());
        let document = Document {
            uri: "model.dm".to_string(),
            root: outcome.root.unwrap(),
        };

        // Exhaustive keeps going past the duplicate: error, then the warning
        // and info for 'lower'.
        let exhaustive = SampleLanguage.validate(&document, CheckMode::Exhaustive);
        assert_eq!(exhaustive.len(), 3);

        let fail_fast = SampleLanguage.validate(&document, CheckMode::FailFast);
        assert_eq!(fail_fast.len(), 1);
        assert_eq!(fail_fast[0].severity, Severity::Error);
        assert_eq!(fail_fast[0].code.as_deref(), Some(DUPLICATE_ENTITY));
    }

    #[test]
    fn test_serializer_canonical_form() {
        let text = "entity Person {\n    prop name;\n}\n\nentity Employee extends Person {\n}\n";
        let outcome = SampleLanguage.parse_document("model.dm", text);
        assert!(outcome.errors.is_empty());
        let document = Document {
            uri: "model.dm".to_string(),
            root: outcome.root.unwrap(),
        };
        assert_eq!(SampleLanguage.serialize(&document), text);
    }
}
