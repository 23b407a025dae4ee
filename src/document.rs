//! The in-memory document graph the harness loads, resolves, and serializes.

/// Direct structural link to a node that was verified to exist in the
/// registry at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    pub uri: String,
    /// Fragment path of the target, always with a leading `/`.
    pub fragment: String,
}

/// A cross-reference held by a node.
///
/// Parsers emit `Unresolved` placeholders; the loader's resolution pass
/// replaces every placeholder reachable from the root with `Resolved`,
/// failing loudly if any remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Unresolved { locator: String },
    Resolved { target: NodeHandle },
}

/// One node of a parsed document tree.
///
/// `name` is the node's fragment-path segment; `kind` is the language's name
/// for the node type. `offset`/`line` point at the defining occurrence in the
/// source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: String,
    pub name: String,
    pub offset: usize,
    pub line: usize,
    pub children: Vec<Node>,
    pub references: Vec<Reference>,
}

impl Node {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, offset: usize, line: usize) -> Self {
        Node {
            kind: kind.into(),
            name: name.into(),
            offset,
            line,
            children: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Walks the subtree by a chain of child names.
    fn descend(&self, segments: &[&str]) -> Option<&Node> {
        match segments.split_first() {
            None => Some(self),
            Some((first, rest)) => self
                .children
                .iter()
                .find(|c| c.name == *first)
                .and_then(|c| c.descend(rest)),
        }
    }

    /// Counts `Unresolved` references reachable from this node.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        let own = self
            .references
            .iter()
            .filter(|r| matches!(r, Reference::Unresolved { .. }))
            .count();
        own + self
            .children
            .iter()
            .map(Node::unresolved_count)
            .sum::<usize>()
    }
}

/// One parsed source unit and its node tree, identified by a URI-like string.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: String,
    pub root: Node,
}

impl Document {
    /// Looks up a node by fragment path (`/a/b`, leading `/` optional; the
    /// empty fragment names the root).
    #[must_use]
    pub fn node_at(&self, fragment: &str) -> Option<&Node> {
        let trimmed = fragment.trim_start_matches('/');
        if trimmed.is_empty() {
            return Some(&self.root);
        }
        let segments: Vec<&str> = trimmed.split('/').collect();
        self.root.descend(&segments)
    }
}

/// Session-scoped registry of loaded documents, keyed by URI.
///
/// Insertion order is preserved: supporting documents load before the primary
/// one, and locators without an explicit target document resolve against the
/// registry in that order.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: Vec<Document>,
}

impl DocumentRegistry {
    #[must_use]
    pub fn new() -> Self {
        DocumentRegistry::default()
    }

    /// Inserts a document, replacing any earlier load of the same URI, and
    /// returns its registry index. Indexes are stable: documents are never
    /// removed from a live registry.
    pub fn insert(&mut self, document: Document) -> usize {
        match self.index_of(&document.uri) {
            Some(index) => {
                self.documents[index] = document;
                index
            }
            None => {
                self.documents.push(document);
                self.documents.len() - 1
            }
        }
    }

    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.uri == uri)
    }

    #[must_use]
    pub fn index_of(&self, uri: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.uri == uri)
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.index_of(uri).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub(crate) fn document_mut(&mut self, index: usize) -> Option<&mut Document> {
        self.documents.get_mut(index)
    }

    // Valid for any index returned by `insert` on this registry.
    pub(crate) fn document_at(&self, index: usize) -> &Document {
        &self.documents[index]
    }

    #[must_use]
    pub fn node_at(&self, uri: &str, fragment: &str) -> Option<&Node> {
        self.get(uri).and_then(|d| d.node_at(fragment))
    }

    /// Dereferences a handle produced by the resolution pass.
    #[must_use]
    pub fn resolve_handle(&self, handle: &NodeHandle) -> Option<&Node> {
        self.node_at(&handle.uri, &handle.fragment)
    }
}

/// Splits a locator into its optional target-document URI and fragment path.
///
/// `doc.dm#/Person` names a document explicitly; `#/Person` and a bare
/// `Person` leave the document open for the resolution pass to search.
#[must_use]
pub fn split_locator(locator: &str) -> (Option<&str>, &str) {
    match locator.split_once('#') {
        Some((uri, fragment)) if !uri.is_empty() => (Some(uri), fragment),
        Some((_, fragment)) => (None, fragment),
        None => (None, locator),
    }
}

/// Normalizes a fragment path to the canonical leading-`/` form stored in
/// [`NodeHandle`]s.
#[must_use]
pub fn canonical_fragment(fragment: &str) -> String {
    format!("/{}", fragment.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        let mut root = Node::new("Model", "", 0, 1);
        let mut person = Node::new("Entity", "Person", 0, 1);
        person.children.push(Node::new("Property", "name", 16, 2));
        root.children.push(person);
        Document {
            uri: "model.dm".to_string(),
            root,
        }
    }

    #[test]
    fn test_fragment_lookup() {
        let doc = sample_document();
        assert_eq!(doc.node_at("").unwrap().kind, "Model");
        assert_eq!(doc.node_at("/Person").unwrap().kind, "Entity");
        assert_eq!(doc.node_at("Person/name").unwrap().kind, "Property");
        assert!(doc.node_at("/Stranger").is_none());
    }

    #[test]
    fn test_registry_replaces_same_uri() {
        let mut registry = DocumentRegistry::new();
        registry.insert(sample_document());
        registry.insert(sample_document());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_split_locator() {
        assert_eq!(split_locator("doc.dm#/Person"), (Some("doc.dm"), "/Person"));
        assert_eq!(split_locator("#/Person"), (None, "/Person"));
        assert_eq!(split_locator("Person"), (None, "Person"));
    }

    #[test]
    fn test_unresolved_count() {
        let mut doc = sample_document();
        doc.root.children[0].references.push(Reference::Unresolved {
            locator: "Base".to_string(),
        });
        assert_eq!(doc.root.unresolved_count(), 1);
    }
}
