//! Isolated tokenizer and parser-rule probes, independent of document
//! loading.

use crate::error::ProbeError;
use crate::pipeline::{Pipeline, SyntaxError, Token};

/// Tokenizes or parses a text fragment against a single named grammar rule
/// and reports token classifications or syntax errors.
pub struct RuleProbe<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> RuleProbe<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        RuleProbe { pipeline }
    }

    /// The ordered token stream the lexer produces for `input`, with hidden
    /// tokens filtered out.
    #[must_use]
    pub fn tokens(&self, input: &str) -> Vec<Token> {
        self.pipeline.frontend.tokenize(input)
    }

    /// Checks that `input` is chopped into exactly the expected ordered
    /// classification sequence.
    pub fn expect_token_kinds(&self, input: &str, expected: &[&str]) -> Result<(), ProbeError> {
        let tokens = self.tokens(input);
        let actual: Vec<&str> = tokens.iter().map(|t| t.kind.as_str()).collect();
        if actual != expected {
            return Err(ProbeError::TokenMismatch {
                text: input.to_string(),
                expected: expected.join(", "),
                actual: actual.join(", "),
            });
        }
        Ok(())
    }

    /// Checks that `input` is a single token and is *not* classified by the
    /// given terminal rule.
    pub fn expect_not_token_kind(&self, input: &str, unexpected: &str) -> Result<(), ProbeError> {
        let token = self.single_token(input)?;
        if token.kind == unexpected {
            return Err(ProbeError::TokenMismatch {
                text: input.to_string(),
                expected: format!("anything but {unexpected}"),
                actual: token.kind,
            });
        }
        Ok(())
    }

    /// Checks that `input` is treated as a keyword by the grammar. The
    /// classification for a keyword is the literal enclosed in single quotes.
    pub fn expect_keyword(&self, input: &str) -> Result<(), ProbeError> {
        let quoted = format!("'{input}'");
        self.expect_token_kinds(input, &[quoted.as_str()])
    }

    /// Checks that `input` is *not* treated as a keyword by the grammar.
    pub fn expect_not_keyword(&self, input: &str) -> Result<(), ProbeError> {
        let token = self.single_token(input)?;
        if token.is_keyword() {
            return Err(ProbeError::TokenMismatch {
                text: input.to_string(),
                expected: "a named terminal".to_string(),
                actual: token.kind,
            });
        }
        Ok(())
    }

    fn single_token(&self, input: &str) -> Result<Token, ProbeError> {
        let mut tokens = self.tokens(input);
        if tokens.len() != 1 {
            return Err(ProbeError::NotSingleToken {
                text: input.to_string(),
                count: tokens.len(),
            });
        }
        Ok(tokens.remove(0))
    }

    /// Parses `input` strictly under the named rule and returns the ordered
    /// syntax-error list. Fails when the grammar has no such rule.
    pub fn parse_rule(&self, rule: &str, input: &str) -> Result<Vec<SyntaxError>, ProbeError> {
        let handle = self
            .pipeline
            .grammar
            .find_rule(rule)
            .ok_or_else(|| ProbeError::MissingRule {
                name: rule.to_string(),
            })?;
        let outcome = self.pipeline.frontend.parse_rule(&handle.0, input);
        Ok(outcome.errors)
    }

    /// Asserts a successful parse: zero syntax errors.
    pub fn expect_rule_ok(&self, rule: &str, input: &str) -> Result<(), ProbeError> {
        let errors = self.parse_rule(rule, input)?;
        if !errors.is_empty() {
            let rendered = errors
                .iter()
                .map(|e| format!("  {}: {}", e.offset, e.message))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ProbeError::UnexpectedSyntaxErrors {
                rule: rule.to_string(),
                text: input.to_string(),
                rendered,
            });
        }
        Ok(())
    }

    /// Asserts a failing parse where each expected substring is contained in
    /// at least one reported error message and the error count equals the
    /// number of expected substrings exactly. An unexpected extra error is a
    /// failure even if all expected substrings matched.
    pub fn expect_rule_errors(
        &self,
        rule: &str,
        input: &str,
        expected: &[&str],
    ) -> Result<(), ProbeError> {
        let errors = self.parse_rule(rule, input)?;
        if errors.is_empty() {
            return Err(ProbeError::ExpectedSyntaxErrors {
                rule: rule.to_string(),
                text: input.to_string(),
            });
        }
        if errors.len() != expected.len() {
            let rendered = errors
                .iter()
                .map(|e| format!("  {}: {}", e.offset, e.message))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ProbeError::ErrorCountMismatch {
                rule: rule.to_string(),
                expected: expected.len(),
                actual: errors.len(),
                rendered,
            });
        }
        for error in &errors {
            if !expected.iter().any(|e| error.message.contains(e)) {
                return Err(ProbeError::UnmatchedError {
                    rule: rule.to_string(),
                    message: error.message.clone(),
                });
            }
        }
        Ok(())
    }
}
