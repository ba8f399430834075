//! Structural parsing for PHP source text.
//!
//! This module provides the complete path from source text to an exactly
//! reconstructible node tree and back:
//!
//! 1. **Parsing**: [parser::parse] walks the token stream once and builds a
//!    [Tree](node::Tree) of nodes: file, namespace, class/interface/trait,
//!    function/closure, code, string, comment, attribute, import, plain
//!    template text.
//! 2. **Unparsing**: [parser::unparse] concatenates node text depth-first;
//!    for an unmutated tree it is the exact inverse of parsing.
//! 3. **Debugging**: [debug::debug] renders a per-line view of the tree for
//!    golden-file regression tests only.
//!
//! Deliberate scope limits: alternate/colon-terminated control structures,
//! anonymous classes, arrow closures, and named arguments stay opaque
//! `plain`/`code` text. They round-trip exactly, but only declarations,
//! functions, namespaces, and imports carry structured metadata.

pub mod debug;
pub mod node;
pub mod parser;

pub use debug::debug;
pub use node::{
    FileScope, FunctionDecl, ImportTable, LineRange, NamespaceDecl, Node, NodeId, NodeKind, Param,
    StringForm, Tree, TypeDecl, Visibility,
};
pub use parser::{parse, unparse, ParseOptions};
