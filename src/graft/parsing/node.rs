//! The parsed node tree.
//!
//! Nodes live in a flat arena owned by [Tree]; every cross-reference (parent,
//! enclosing namespace, enclosing function) is a [NodeId] index into that
//! arena, so the tree has no reference-counted cycles and no lifetimes to
//! thread through patchers.
//!
//! Every node owns the exact bytes it was parsed from: `text` holds a leaf's
//! whole text or a container's head (through its opening delimiter), `close`
//! holds a container's closing delimiter. Unparsing is depth-first
//! concatenation of `text`, children, and `close`; for an unmutated tree that
//! reproduces the original input exactly. Patchers are allowed to rewrite
//! `text`/`close` but must keep the brace structure well formed.

use std::collections::BTreeMap;

use serde::Serialize;

/// Index of a node in its [Tree]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

/// Inclusive 1-based line span of a node's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    pub start: u32,
    pub stop: u32,
}

/// Which literal form a string leaf was lexed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StringForm {
    Single,
    Double,
    Backtick,
    Heredoc,
    Nowdoc,
}

/// Alias → fully-qualified-name tables for one namespace scope.
///
/// Type, function, and constant imports live in separate tables because the
/// host language resolves them separately; a `use function strlen;` must not
/// shadow a class alias `strlen`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportTable {
    pub types: BTreeMap<String, String>,
    pub functions: BTreeMap<String, String>,
    pub constants: BTreeMap<String, String>,
}

impl ImportTable {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.functions.is_empty() && self.constants.is_empty()
    }
}

/// Payload of the file root: the import table of the unnamespaced scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileScope {
    pub imports: ImportTable,
}

/// Payload of a `namespace` declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamespaceDecl {
    pub name: String,
    /// Braced form (`namespace Foo { … }`) closes at its `}`; the statement
    /// form closes at the next namespace declaration or end of input.
    pub braced: bool,
    pub imports: ImportTable,
}

/// Payload of a class, interface, or trait declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeDecl {
    pub name: String,
    /// Extended parent, empty when the declaration has none.
    pub extends: String,
    /// Implemented interfaces, in declaration order; empty when absent.
    pub implements: Vec<String>,
    /// Traits pulled in by `use` statements in the body, in order.
    pub trait_uses: Vec<String>,
}

/// One declared parameter of a function.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Param {
    /// Name without the `$` sigil.
    pub name: String,
    /// Type hint text, empty when absent.
    pub hint: String,
    pub by_ref: bool,
    pub variadic: bool,
    /// Default literal text, verbatim.
    pub default: Option<String>,
}

/// Modifier flags collected from the tokens preceding a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub public: bool,
    pub protected: bool,
    pub private: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
}

/// Payload of a `function` declaration, method, or closure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionDecl {
    /// Empty for closures.
    pub name: String,
    pub is_closure: bool,
    pub is_method: bool,
    /// Set when the body contains a top-level `yield`.
    pub is_generator: bool,
    pub visibility: Visibility,
    pub params: Vec<Param>,
}

impl FunctionDecl {
    /// Parameter-name → default-literal view over [params](Self::params).
    pub fn defaults(&self) -> BTreeMap<&str, &str> {
        self.params
            .iter()
            .filter_map(|param| {
                param
                    .default
                    .as_deref()
                    .map(|default| (param.name.as_str(), default))
            })
            .collect()
    }
}

/// The closed set of node kinds, with per-kind payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    File(FileScope),
    Namespace(NamespaceDecl),
    Class(TypeDecl),
    Interface(TypeDecl),
    Trait(TypeDecl),
    Function(FunctionDecl),
    /// Executable text inside a code region, or an anonymous `{ … }` block.
    Code,
    /// Literal template text outside any code region.
    Plain,
    Str(StringForm),
    Comment,
    Attribute,
    /// An import statement (`use …;` at file or namespace level).
    Use,
}

impl NodeKind {
    /// Stable lower-case name, used by the debug renderer.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::File(_) => "file",
            NodeKind::Namespace(_) => "namespace",
            NodeKind::Class(_) => "class",
            NodeKind::Interface(_) => "interface",
            NodeKind::Trait(_) => "trait",
            NodeKind::Function(_) => "function",
            NodeKind::Code => "code",
            NodeKind::Plain => "plain",
            NodeKind::Str(_) => "string",
            NodeKind::Comment => "comment",
            NodeKind::Attribute => "attribute",
            NodeKind::Use => "use",
        }
    }

    /// Kinds that may hold children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::File(_)
                | NodeKind::Namespace(_)
                | NodeKind::Class(_)
                | NodeKind::Interface(_)
                | NodeKind::Trait(_)
                | NodeKind::Function(_)
                | NodeKind::Code
        )
    }

    /// Class-like declarations (class, interface, trait).
    pub fn is_type_decl(&self) -> bool {
        matches!(
            self,
            NodeKind::Class(_) | NodeKind::Interface(_) | NodeKind::Trait(_)
        )
    }
}

/// One element of the parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Exact original text: everything for a leaf, the head through the
    /// opening delimiter for a container. Mutated only by patchers.
    pub text: String,
    /// Closing delimiter text of a braced container, empty otherwise.
    pub close: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    namespace: Option<NodeId>,
    function: Option<NodeId>,
    in_source: bool,
    lines: Option<LineRange>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, in_source: bool) -> Self {
        Node {
            kind,
            text: String::new(),
            close: String::new(),
            children: Vec::new(),
            parent: None,
            namespace: None,
            function: None,
            in_source,
            lines: None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The enclosing namespace declaration, if any.
    pub fn namespace(&self) -> Option<NodeId> {
        self.namespace
    }

    /// The innermost enclosing function, if any.
    pub fn function(&self) -> Option<NodeId> {
        self.function
    }

    /// Whether the node was parsed inside a code region (as opposed to
    /// literal template text).
    pub fn in_source(&self) -> bool {
        self.in_source
    }

    pub fn lines(&self) -> Option<LineRange> {
        self.lines
    }

    pub(crate) fn set_lines(&mut self, lines: LineRange) {
        self.lines = Some(lines);
    }
}

/// The parsed structure of one source text.
///
/// Built fresh per [parse](super::parser::parse) call and discarded after
/// re-serialization; a tree never outlives one load operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    line_index: BTreeMap<u32, Vec<NodeId>>,
}

impl Tree {
    pub(crate) fn new(root_kind: NodeKind, in_source: bool) -> Self {
        Tree {
            nodes: vec![Node::new(root_kind, in_source)],
            root: NodeId(0),
            line_index: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when parsing produced nothing: a childless root with no text.
    pub fn is_blank(&self) -> bool {
        let root = self.get(self.root);
        root.children.is_empty() && root.text.is_empty() && root.close.is_empty()
    }

    /// Attach a new node under `parent`, inheriting enclosing namespace and
    /// function references from it.
    pub(crate) fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let parent_node = self.get(parent);
        node.parent = Some(parent);
        node.namespace = match parent_node.kind {
            NodeKind::Namespace(_) => Some(parent),
            _ => parent_node.namespace,
        };
        node.function = match parent_node.kind {
            NodeKind::Function(_) => Some(parent),
            _ => parent_node.function,
        };
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    /// All node ids in depth-first preorder.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            for &child in self.get(id).children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Reproduce the source text: depth-first concatenation of every node's
    /// `text`, children, and `close`. The exact inverse of parsing for an
    /// unmutated tree.
    pub fn unparse(&self) -> String {
        let mut out = String::new();
        self.unparse_node(self.root, &mut out);
        out
    }

    fn unparse_node(&self, id: NodeId, out: &mut String) {
        let node = self.get(id);
        out.push_str(&node.text);
        for &child in &node.children {
            self.unparse_node(child, out);
        }
        out.push_str(&node.close);
    }

    /// The import table in scope at `id`: the enclosing namespace's, falling
    /// back to the file scope.
    pub fn imports_at(&self, id: NodeId) -> &ImportTable {
        let node = self.get(id);
        let scope = match node.kind {
            NodeKind::Namespace(_) => Some(id),
            _ => node.namespace,
        };
        match scope {
            Some(ns) => match &self.get(ns).kind {
                NodeKind::Namespace(decl) => &decl.imports,
                _ => unreachable!("namespace back-reference points at a namespace node"),
            },
            None => match &self.get(self.root).kind {
                NodeKind::File(scope) => &scope.imports,
                _ => unreachable!("root of a parsed tree is a file node"),
            },
        }
    }

    /// Nodes whose line span intersects `line` (1-based), in creation order.
    /// Empty unless the tree was parsed with line tracking.
    pub fn nodes_at_line(&self, line: u32) -> &[NodeId] {
        self.line_index
            .get(&line)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Highest line present in the line index, when line tracking was on.
    pub fn last_line(&self) -> Option<u32> {
        self.line_index.keys().next_back().copied()
    }

    pub(crate) fn index_lines(&mut self, id: NodeId, range: LineRange) {
        for line in range.start..=range.stop {
            let slot = self.line_index.entry(line).or_default();
            if !slot.contains(&id) {
                slot.push(id);
            }
        }
    }
}
