//! Materializes documents into the session's registry and resolves every
//! cross-reference in the loaded graph.

use crate::document::{
    canonical_fragment, split_locator, Document, DocumentRegistry, NodeHandle, Node, Reference,
};
use crate::error::LoadError;
use crate::pipeline::Pipeline;

/// Loads a primary document and its declared supporting documents into a
/// shared document graph.
///
/// Supporting documents load first, in listed order, into the same namespace
/// so the primary document's references can resolve against them. They are
/// parsed and reference-resolved but not validated here.
pub struct DocumentLoader<'a> {
    pipeline: &'a Pipeline,
    registry: &'a mut DocumentRegistry,
}

impl<'a> DocumentLoader<'a> {
    pub fn new(pipeline: &'a Pipeline, registry: &'a mut DocumentRegistry) -> Self {
        DocumentLoader { pipeline, registry }
    }

    /// Loads `primary` (after `supporting`, in order), then runs a full-graph
    /// resolution pass. Any reference still unresolved afterwards is a hard
    /// failure, not a diagnostic: an unresolved reference means the graph
    /// cannot be safely serialized or compared.
    pub fn load(&mut self, primary: &str, supporting: &[&str]) -> Result<&Document, LoadError> {
        for uri in supporting {
            self.load_one(uri)?;
        }
        let index = self.load_one(primary)?;
        self.resolve_graph()?;
        Ok(self.registry.document_at(index))
    }

    fn load_one(&mut self, uri: &str) -> Result<usize, LoadError> {
        if let Some(index) = self.registry.index_of(uri) {
            return Ok(index);
        }
        let text = self
            .pipeline
            .resources
            .read_raw_text(uri)
            .map_err(|source| LoadError::ResourceUnavailable {
                uri: uri.to_string(),
                source,
            })?;
        let outcome = self.pipeline.frontend.parse_document(uri, &text);
        if !outcome.errors.is_empty() {
            let rendered = outcome
                .errors
                .iter()
                .map(|e| format!("  {}: {}", e.offset, e.message))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(LoadError::ParseFailure {
                uri: uri.to_string(),
                errors: outcome.errors,
                rendered,
            });
        }
        let root = outcome.root.unwrap_or_else(|| Node::new("", "", 0, 1));
        Ok(self.registry.insert(Document {
            uri: uri.to_string(),
            root,
        }))
    }

    /// Replaces every `Unresolved` reference reachable from any loaded root
    /// with a `Resolved` handle. Re-running the pass is idempotent; already
    /// resolved references are skipped.
    fn resolve_graph(&mut self) -> Result<(), LoadError> {
        let mut fixes: Vec<Fix> = Vec::new();
        let mut failures: Vec<(String, String, String)> = Vec::new();

        for (doc_index, document) in self.registry.iter().enumerate() {
            scan_node(
                self.registry,
                document,
                &document.root,
                doc_index,
                &mut Vec::new(),
                "",
                &mut fixes,
                &mut failures,
            );
        }

        if let Some((uri, path, locator)) = failures.first() {
            for (uri, path, locator) in &failures {
                log::error!("reference at '{uri}#{path}' to '{locator}' not resolved");
            }
            return Err(LoadError::UnresolvedReference {
                uri: uri.clone(),
                path: path.clone(),
                locator: locator.clone(),
            });
        }

        for fix in fixes {
            if let Some(document) = self.registry.document_mut(fix.doc_index) {
                let mut node = &mut document.root;
                for child_index in &fix.node_path {
                    node = &mut node.children[*child_index];
                }
                node.references[fix.reference_index] = Reference::Resolved { target: fix.target };
            }
        }
        Ok(())
    }
}

struct Fix {
    doc_index: usize,
    node_path: Vec<usize>,
    reference_index: usize,
    target: NodeHandle,
}

#[allow(clippy::too_many_arguments)]
fn scan_node(
    registry: &DocumentRegistry,
    document: &Document,
    node: &Node,
    doc_index: usize,
    node_path: &mut Vec<usize>,
    fragment: &str,
    fixes: &mut Vec<Fix>,
    failures: &mut Vec<(String, String, String)>,
) {
    for (reference_index, reference) in node.references.iter().enumerate() {
        if let Reference::Unresolved { locator } = reference {
            match resolve_locator(registry, &document.uri, locator) {
                Some(target) => fixes.push(Fix {
                    doc_index,
                    node_path: node_path.clone(),
                    reference_index,
                    target,
                }),
                None => failures.push((
                    document.uri.clone(),
                    fragment.to_string(),
                    locator.clone(),
                )),
            }
        }
    }
    for (child_index, child) in node.children.iter().enumerate() {
        node_path.push(child_index);
        let child_fragment = format!("{fragment}/{}", child.name);
        scan_node(
            registry,
            document,
            child,
            doc_index,
            node_path,
            &child_fragment,
            fixes,
            failures,
        );
        node_path.pop();
    }
}

/// Looks a locator up in the shared namespace: the named document when the
/// locator carries one, otherwise the referencing document first, then every
/// registered document in insertion order.
fn resolve_locator(
    registry: &DocumentRegistry,
    current_uri: &str,
    locator: &str,
) -> Option<NodeHandle> {
    let (target_uri, fragment) = split_locator(locator);
    let fragment = canonical_fragment(fragment);

    if let Some(uri) = target_uri {
        return registry.node_at(uri, &fragment).map(|_| NodeHandle {
            uri: uri.to_string(),
            fragment,
        });
    }
    if registry.node_at(current_uri, &fragment).is_some() {
        return Some(NodeHandle {
            uri: current_uri.to_string(),
            fragment,
        });
    }
    registry
        .iter()
        .find(|d| d.node_at(&fragment).is_some())
        .map(|d| NodeHandle {
            uri: d.uri.clone(),
            fragment,
        })
}
