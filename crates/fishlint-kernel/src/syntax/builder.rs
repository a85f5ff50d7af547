//! Start/finish tree builder.
//!
//! The parser (or a test) describes the tree as a sequence of `start_node`,
//! `token` and `finish_node` calls. Parent, sibling and named-sibling links
//! are computed once, in [`TreeBuilder::finish`].

use fishlint_types::{AnalysisError, Span};

use super::{Field, NodeData, NodeId, NodeKind, SyntaxTree};

/// Builds a [`SyntaxTree`] bottom-up.
pub struct TreeBuilder {
    source: String,
    nodes: Vec<NodeData>,
    /// Open nodes, innermost last.
    open: Vec<NodeId>,
    /// Nodes completed outside any open node.
    top: Vec<NodeId>,
    /// End of the last token, used to place empty nodes.
    cursor: usize,
    error: Option<AnalysisError>,
}

impl TreeBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            nodes: Vec::new(),
            open: Vec::new(),
            top: Vec::new(),
            cursor: 0,
            error: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Open a new node as the last child of the current one.
    pub fn start_node(&mut self, kind: NodeKind, field: Option<Field>) -> NodeId {
        let id = self.alloc(kind, field, Span::empty(self.cursor));
        self.attach(id);
        self.open.push(id);
        id
    }

    /// Add a leaf node covering `span`.
    pub fn token(&mut self, kind: NodeKind, field: Option<Field>, span: Span) -> NodeId {
        let id = self.alloc(kind, field, span);
        self.attach(id);
        self.cursor = self.cursor.max(span.end);
        id
    }

    /// Close the innermost open node. Its span covers its children.
    pub fn finish_node(&mut self) {
        let Some(id) = self.open.pop() else {
            self.error.get_or_insert(AnalysisError::NoOpenNode);
            return;
        };

        let children = &self.nodes[id.0].children;
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => self.nodes[first.0]
                .span
                .cover(self.nodes[last.0].span),
            _ => Span::empty(self.cursor),
        };
        self.nodes[id.0].span = span;
    }

    /// Link everything up and hand over the tree.
    ///
    /// The root is the first node completed at the top level.
    pub fn finish(mut self) -> Result<SyntaxTree, AnalysisError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.open.is_empty() {
            return Err(AnalysisError::UnclosedNodes(self.open.len()));
        }

        for parent in 0..self.nodes.len() {
            let children = self.nodes[parent].children.clone();
            let named: Vec<NodeId> = children
                .iter()
                .copied()
                .filter(|c| self.nodes[c.0].kind.is_named())
                .collect();

            for (i, &child) in children.iter().enumerate() {
                let data = &mut self.nodes[child.0];
                data.parent = Some(NodeId(parent));
                data.prev_sibling = i.checked_sub(1).map(|p| children[p]);
                data.next_sibling = children.get(i + 1).copied();
            }
            for (i, &child) in named.iter().enumerate() {
                let data = &mut self.nodes[child.0];
                data.prev_named_sibling = i.checked_sub(1).map(|p| named[p]);
                data.next_named_sibling = named.get(i + 1).copied();
            }

            self.nodes[parent].named_children = named;
        }

        let root = self.top.first().copied();
        Ok(SyntaxTree::from_parts(self.source, self.nodes, root))
    }

    fn alloc(&mut self, kind: NodeKind, field: Option<Field>, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(kind, field, span));
        id
    }

    fn attach(&mut self, id: NodeId) {
        self.siblings_mut().push(id);
    }

    fn siblings_mut(&mut self) -> &mut Vec<NodeId> {
        match self.open.last() {
            Some(parent) => &mut self.nodes[parent.0].children,
            None => &mut self.top,
        }
    }
}
