//! Line-level rendering of a parsed tree, for golden-file regression tests.
//!
//! For every source line, the renderer lists the nodes whose span intersects
//! that line (an abbreviation of the node kind plus the node's line span),
//! in node-creation order. The output is deterministic and carries no
//! behavior; nothing on the runtime path consumes it.

use crate::graft::parsing::node::{LineRange, NodeKind, Tree};
use crate::graft::parsing::parser::{parse, ParseOptions};

fn abbrev(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::File(_) => "file",
        NodeKind::Namespace(_) => "ns",
        NodeKind::Class(_) => "cls",
        NodeKind::Interface(_) => "ifc",
        NodeKind::Trait(_) => "trt",
        NodeKind::Function(_) => "fn",
        NodeKind::Code => "code",
        NodeKind::Plain => "pln",
        NodeKind::Str(_) => "str",
        NodeKind::Comment => "com",
        NodeKind::Attribute => "attr",
        NodeKind::Use => "use",
    }
}

/// Parse `source` with line tracking and render one line per source line.
pub fn debug(source: &str) -> String {
    let options = ParseOptions {
        track_lines: true,
        ..ParseOptions::default()
    };
    render(&parse(source, &options))
}

/// Render a tree that was parsed with line tracking.
pub fn render(tree: &Tree) -> String {
    let last = tree.last_line().unwrap_or(1);
    let mut out = String::new();
    for line in 1..=last {
        let mut ids = tree.nodes_at_line(line).to_vec();
        ids.sort();
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&line.to_string());
        out.push_str(" |");
        for id in ids {
            let node = tree.get(id);
            let span = node.lines().unwrap_or(LineRange { start: line, stop: line });
            out.push(' ');
            out.push_str(abbrev(&node.kind));
            out.push('[');
            out.push_str(&span.start.to_string());
            out.push('-');
            out.push_str(&span.stop.to_string());
            out.push(']');
        }
    }
    out
}
