//! Immutable syntax tree for fish source.
//!
//! Nodes live in an arena owned by [`SyntaxTree`] and refer to each other by
//! [`NodeId`]. Parent and sibling links are plain handles computed once when
//! the tree is built, so there is no shared ownership and nothing to mutate.
//!
//! [`Node`] is a cheap `Copy` cursor (tree reference + handle) with the
//! navigation methods the rules need.

mod builder;
pub mod sexpr;

pub use builder::TreeBuilder;

use std::fmt;

use fishlint_types::{AnalysisError, Span};

/// Closed set of node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Whole document.
    Program,
    /// `name arg...`
    Command,
    /// `a | b | c`
    Pipeline,
    /// `&& cmd`, `|| cmd`, `and cmd`, `or cmd`
    ConditionalExecution,
    /// `function name [options]; body; end`
    FunctionDefinition,
    /// `if cond; body; [else if ...] [else ...] end`
    IfStatement,
    /// `else if cond; body`
    ElseIfClause,
    /// `else; body`
    ElseClause,
    /// `switch value; case ...; end`
    SwitchStatement,
    /// `case pattern...; body`
    CaseClause,
    /// `for var in items; body; end`
    ForStatement,
    /// `while cond; body; end`
    WhileStatement,
    /// `begin; body; end`
    BeginStatement,
    /// `return [status]`
    ReturnStatement,
    /// Plain word argument.
    Word,
    /// Word starting with `-`.
    Option,
    /// Variable name being assigned by `set`.
    VariableDefinition,
    /// Reserved word (`function`, `if`, `end`, ...).
    Keyword,
    /// `|`, `&&`, `||`
    Operator,
    /// `;`, newline, or `&`
    Terminator,
    /// `# ...`
    Comment,
    /// Source the parser could not make sense of.
    Error,
}

impl NodeKind {
    /// Named nodes carry meaning; anonymous ones are punctuation.
    pub fn is_named(&self) -> bool {
        !matches!(
            self,
            NodeKind::Keyword | NodeKind::Operator | NodeKind::Terminator | NodeKind::Comment
        )
    }

    /// Node types whose named children form a list of statements.
    pub fn holds_statements(&self) -> bool {
        match self {
            NodeKind::Program
            | NodeKind::FunctionDefinition
            | NodeKind::IfStatement
            | NodeKind::ElseIfClause
            | NodeKind::ElseClause
            | NodeKind::SwitchStatement
            | NodeKind::CaseClause
            | NodeKind::ForStatement
            | NodeKind::WhileStatement
            | NodeKind::BeginStatement
            | NodeKind::Error => true,

            NodeKind::Command
            | NodeKind::Pipeline
            | NodeKind::ConditionalExecution
            | NodeKind::ReturnStatement
            | NodeKind::Word
            | NodeKind::Option
            | NodeKind::VariableDefinition
            | NodeKind::Keyword
            | NodeKind::Operator
            | NodeKind::Terminator
            | NodeKind::Comment => false,
        }
    }

    /// Lowercase name used in S-expression dumps.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Program => "program",
            NodeKind::Command => "command",
            NodeKind::Pipeline => "pipeline",
            NodeKind::ConditionalExecution => "conditional_execution",
            NodeKind::FunctionDefinition => "function_definition",
            NodeKind::IfStatement => "if_statement",
            NodeKind::ElseIfClause => "else_if_clause",
            NodeKind::ElseClause => "else_clause",
            NodeKind::SwitchStatement => "switch_statement",
            NodeKind::CaseClause => "case_clause",
            NodeKind::ForStatement => "for_statement",
            NodeKind::WhileStatement => "while_statement",
            NodeKind::BeginStatement => "begin_statement",
            NodeKind::ReturnStatement => "return",
            NodeKind::Word => "word",
            NodeKind::Option => "option",
            NodeKind::VariableDefinition => "variable_definition",
            NodeKind::Keyword => "keyword",
            NodeKind::Operator => "operator",
            NodeKind::Terminator => "terminator",
            NodeKind::Comment => "comment",
            NodeKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role a child plays in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Command name, function name, loop variable.
    Name,
    /// Command argument, switch value, case pattern.
    Argument,
    /// `function` options (`-a x`, `--description ...`).
    Option,
    /// Condition of `if`, `else if`, `while`.
    Condition,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Argument => "argument",
            Field::Option => "option",
            Field::Condition => "condition",
        }
    }
}

/// Handle to a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Arena slot. Links are filled in by the builder at `finish`.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) field: Option<Field>,
    pub(crate) span: Span,
    pub(crate) children: Vec<NodeId>,
    pub(crate) named_children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) prev_named_sibling: Option<NodeId>,
    pub(crate) next_named_sibling: Option<NodeId>,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind, field: Option<Field>, span: Span) -> Self {
        Self {
            kind,
            field,
            span,
            children: Vec::new(),
            named_children: Vec::new(),
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            prev_named_sibling: None,
            next_named_sibling: None,
        }
    }
}

/// A parsed document. Read-only once built.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub(crate) fn from_parts(source: String, nodes: Vec<NodeData>, root: Option<NodeId>) -> Self {
        Self {
            source,
            nodes,
            root,
        }
    }

    /// The source text the tree was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node, if the tree has one.
    pub fn root(&self) -> Option<Node<'_>> {
        self.root.map(|id| Node { tree: self, id })
    }

    /// Root node, or [`AnalysisError::EmptyTree`].
    pub fn require_root(&self) -> Result<Node<'_>, AnalysisError> {
        self.root().ok_or(AnalysisError::EmptyTree)
    }

    /// Look up a node by handle.
    pub fn get(&self, id: NodeId) -> Result<Node<'_>, AnalysisError> {
        if id.0 < self.nodes.len() {
            Ok(Node { tree: self, id })
        } else {
            Err(AnalysisError::UnknownNode(id.0))
        }
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }
}

/// Cursor over one node of a tree.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn field(&self) -> Option<Field> {
        self.data().field
    }

    pub fn span(&self) -> Span {
        self.data().span
    }

    /// Raw source text of the node.
    pub fn text(&self) -> &'t str {
        self.span().slice(self.tree.source()).unwrap_or("")
    }

    pub fn is_named(&self) -> bool {
        self.kind().is_named()
    }

    pub fn is_error(&self) -> bool {
        self.kind() == NodeKind::Error
    }

    /// Keyword node with exactly this text.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind() == NodeKind::Keyword && self.text() == word
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.wrap(self.data().parent)
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        self.wrap(self.data().next_sibling)
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        self.wrap(self.data().prev_sibling)
    }

    pub fn next_named_sibling(&self) -> Option<Node<'t>> {
        self.wrap(self.data().next_named_sibling)
    }

    pub fn prev_named_sibling(&self) -> Option<Node<'t>> {
        self.wrap(self.data().prev_named_sibling)
    }

    /// All children, named and anonymous, in source order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    /// Named children in source order.
    pub fn named_children(&self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id)
            .named_children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn first_child(&self) -> Option<Node<'t>> {
        self.children().next()
    }

    pub fn last_child(&self) -> Option<Node<'t>> {
        self.children().next_back()
    }

    pub fn last_named_child(&self) -> Option<Node<'t>> {
        self.named_children().next_back()
    }

    /// First child carrying `field`.
    pub fn child_by_field(&self, field: Field) -> Option<Node<'t>> {
        self.named_children().find(|c| c.field() == Some(field))
    }

    /// Named children that are statements of this node's body: no field
    /// label, and not a clause of the enclosing construct.
    pub fn body_statements(&self) -> impl Iterator<Item = Node<'t>> + 't {
        let holds = self.kind().holds_statements();
        self.named_children().filter(move |c| {
            holds
                && c.field().is_none()
                && !matches!(
                    c.kind(),
                    NodeKind::ElseIfClause | NodeKind::ElseClause | NodeKind::CaseClause
                )
        })
    }

    /// Pre-order walk of this subtree, driven by an explicit stack.
    pub fn preorder(&self) -> Preorder<'t> {
        Preorder {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    fn data(&self) -> &'t NodeData {
        self.tree.data(self.id)
    }

    fn wrap(&self, id: Option<NodeId>) -> Option<Node<'t>> {
        id.map(|id| Node {
            tree: self.tree,
            id,
        })
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}..{} {:?}",
            self.kind(),
            self.span().start,
            self.span().end,
            self.text()
        )
    }
}

/// Pre-order iterator. Same order as a recursive walk, no recursion.
pub struct Preorder<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.data(id).children.iter().rev().copied());
        Some(Node {
            tree: self.tree,
            id,
        })
    }
}
