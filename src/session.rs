//! Per-test lifecycle state: the document registry, the claimed-diagnostic
//! ledger, and the teardown check that no diagnostic goes unexamined.

use crate::collection::{DiagnosticSet, SizeConstraint};
use crate::diagnostic::DiagnosticId;
use crate::document::{split_locator, DocumentRegistry, Node};
use crate::error::HarnessError;
use crate::loader::DocumentLoader;
use crate::pipeline::Pipeline;
use crate::probe::RuleProbe;
use crate::verifier::RoundTripVerifier;
use std::collections::HashSet;

/// State scoped to one test case.
///
/// A session owns its own document registry and claim ledger and shares no
/// mutable state with other sessions, so independent test cases may run in
/// parallel provided the pipeline callbacks are reentrant.
///
/// End every test with [`TestSession::finish`]: if any diagnostic in the
/// last-produced [`DiagnosticSet`] was never claimed by an evaluated
/// constraint, the session fails the test and dumps the unclaimed
/// diagnostics. A `Drop` backstop panics when a session with unclaimed
/// diagnostics is discarded without the teardown check.
pub struct TestSession {
    pipeline: Pipeline,
    registry: DocumentRegistry,
    issues: Option<DiagnosticSet>,
    serialized: Option<String>,
    claimed: HashSet<DiagnosticId>,
    finished: bool,
}

impl TestSession {
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        TestSession {
            pipeline,
            registry: DocumentRegistry::new(),
            issues: None,
            serialized: None,
            claimed: HashSet::new(),
            finished: false,
        }
    }

    /// A tokenizer/parser-rule probe over the session's pipeline. Probes
    /// operate directly on text fragments and never touch the registry.
    #[must_use]
    pub fn probe(&self) -> RuleProbe<'_> {
        RuleProbe::new(&self.pipeline)
    }

    /// Loads a document graph into the session registry without running the
    /// round-trip comparison or validation.
    pub fn load(
        &mut self,
        primary: &str,
        supporting: &[&str],
    ) -> Result<(), crate::error::LoadError> {
        let mut loader = DocumentLoader::new(&self.pipeline, &mut self.registry);
        loader.load(primary, supporting)?;
        Ok(())
    }

    /// Loads supporting documents, round-trip verifies the primary one, and
    /// records the produced diagnostics as the session's current issues.
    pub fn test_file(
        &mut self,
        uri: &str,
        supporting: &[&str],
    ) -> Result<DiagnosticSet, HarnessError> {
        log::info!("testing {uri}");
        let mut verifier = RoundTripVerifier::new(&self.pipeline, &mut self.registry);
        let (serialized, issues) = verifier.verify(uri, supporting)?;
        self.serialized = Some(serialized);
        self.issues = Some(issues.clone());
        Ok(issues)
    }

    /// Diagnostics from the most recent validation run.
    #[must_use]
    pub fn issues(&self) -> DiagnosticSet {
        self.issues.clone().unwrap_or_default()
    }

    /// Serialized text from the most recent round trip.
    #[must_use]
    pub fn serialized(&self) -> Option<&str> {
        self.serialized.as_deref()
    }

    /// Fragment-path lookup of a loaded node, accepting `uri#/path` or a
    /// bare locator searched across the registry.
    #[must_use]
    pub fn object_at(&self, locator: &str) -> Option<&Node> {
        let (uri, fragment) = split_locator(locator);
        match uri {
            Some(uri) => self.registry.node_at(uri, fragment),
            None => self.registry.iter().find_map(|d| d.node_at(fragment)),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Evaluates a constraint. Every diagnostic in the constraint's view is
    /// added to the claim ledger whether or not the constraint holds;
    /// building but never evaluating a constraint claims nothing.
    pub fn assert_constraints(&mut self, constraint: SizeConstraint) -> Result<(), HarnessError> {
        self.evaluate(None, constraint)
    }

    /// Like [`assert_constraints`](Self::assert_constraints), with a
    /// constraint id leading the failure message.
    pub fn assert_constraints_named(
        &mut self,
        constraint_id: &str,
        constraint: SizeConstraint,
    ) -> Result<(), HarnessError> {
        self.evaluate(Some(constraint_id.to_string()), constraint)
    }

    fn evaluate(
        &mut self,
        constraint_id: Option<String>,
        constraint: SizeConstraint,
    ) -> Result<(), HarnessError> {
        for diagnostic in constraint.view().iter() {
            self.claimed.insert(diagnostic.id());
        }
        if constraint.holds() {
            Ok(())
        } else {
            Err(HarnessError::ConstraintFailure {
                constraint_id,
                message: constraint.message(),
            })
        }
    }

    /// Asserts the current issues contain no errors, claiming the errors
    /// view. Warnings and infos remain unclaimed.
    pub fn assert_no_errors(&mut self) -> Result<(), HarnessError> {
        let constraint = self.issues().errors_only().size_is(0);
        self.assert_constraints(constraint)
    }

    /// Asserts the current issues are empty, claiming the whole set.
    pub fn assert_no_issues(&mut self) -> Result<(), HarnessError> {
        let constraint = self.issues().size_is(0);
        self.assert_constraints(constraint)
    }

    fn unclaimed(&self) -> DiagnosticSet {
        match &self.issues {
            Some(issues) => issues.except(&self.claimed),
            None => DiagnosticSet::default(),
        }
    }

    /// Teardown check. Fails when any diagnostic from the last validation
    /// run was never claimed, dumping each one for diagnosability.
    pub fn finish(mut self) -> Result<(), HarnessError> {
        self.finished = true;
        let unclaimed = self.unclaimed();
        if unclaimed.is_empty() {
            return Ok(());
        }
        log::warn!("---- unclaimed diagnostics ----");
        for diagnostic in unclaimed.iter() {
            log::warn!("{}", diagnostic.render());
        }
        Err(HarnessError::UnclaimedDiagnostics {
            count: unclaimed.len(),
            rendered: unclaimed.render(),
        })
    }
}

impl Drop for TestSession {
    fn drop(&mut self) {
        if self.finished || std::thread::panicking() {
            return;
        }
        let unclaimed = self.unclaimed();
        if !unclaimed.is_empty() {
            panic!(
                "test session dropped with {} unclaimed diagnostic(s); call finish()\n{}",
                unclaimed.len(),
                unclaimed.render()
            );
        }
    }
}
