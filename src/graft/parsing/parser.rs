//! Single-pass structural parser.
//!
//! The parser walks the token stream once, left to right, maintaining the
//! current node, an accumulating text buffer, the stack of open braced
//! containers, and an "inside code region" flag. Structural keywords flush
//! the buffer into a `plain`/`code` leaf and open a declaration container;
//! a bare `{` opens an anonymous `code` container so every later `}` closes
//! the right thing; string and comment tokens become dedicated leaf nodes.
//!
//! The invariant that shapes every branch: each consumed token's text is
//! appended to exactly one sink (the buffer, a leaf's text, or a container's
//! head), so unparsing an unmutated tree reproduces the input byte for byte.
//! Malformed input is never an error; dangling structures close at end of
//! input with whatever text they gathered.

use std::path::{Path, PathBuf};

use crate::graft::lexing::{Token, TokenKind, TokenStream};
use crate::graft::parsing::node::{
    FileScope, FunctionDecl, LineRange, NamespaceDecl, Node, NodeId, NodeKind, Param, StringForm,
    Tree, TypeDecl, Visibility,
};

/// Options for [parse].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Populate per-node line ranges and the root line→node index.
    pub track_lines: bool,
    /// Treat the whole input as code: no literal-template detection, the
    /// region flag starts on.
    pub code_only: bool,
    /// Rewrite `__FILE__`/`__DIR__` magic literals into quoted string
    /// literals for this path, preserving their surface form. Used when the
    /// rewritten text will execute from a cache location.
    pub rebase_path: Option<PathBuf>,
}

impl ParseOptions {
    /// Options for pure code fragments (no `<?php` tag expected).
    pub fn code() -> Self {
        ParseOptions {
            code_only: true,
            ..ParseOptions::default()
        }
    }
}

/// Parse source text into a [Tree]. Never fails: malformed input degrades to
/// best-effort structure with full text fidelity.
pub fn parse(source: &str, options: &ParseOptions) -> Tree {
    Parser::new(source, options).run()
}

/// Reproduce source text from a tree; the exact inverse of [parse] for
/// unmutated trees.
pub fn unparse(tree: &Tree) -> String {
    tree.unparse()
}

fn count_lines(text: &str) -> u32 {
    text.bytes().filter(|&b| b == b'\n').count() as u32
}

/// Stop line of `text` starting at `start`: the line holding its last byte.
fn stop_line(start: u32, text: &str) -> u32 {
    let newlines = count_lines(text);
    if newlines > 0 && text.ends_with('\n') {
        start + newlines - 1
    } else {
        start + newlines
    }
}

/// Single-quoted PHP string literal for a filesystem path.
fn quote_path(path: &Path) -> String {
    let mut quoted = String::from("'");
    for ch in path.to_string_lossy().chars() {
        if ch == '\'' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

fn string_form(kind: TokenKind) -> StringForm {
    match kind {
        TokenKind::SingleQuoted => StringForm::Single,
        TokenKind::DoubleQuoted => StringForm::Double,
        TokenKind::Backtick => StringForm::Backtick,
        TokenKind::Heredoc => StringForm::Heredoc,
        TokenKind::Nowdoc => StringForm::Nowdoc,
        _ => unreachable!("not a string kind"),
    }
}

struct Rebase {
    file_literal: String,
    dir_literal: String,
}

struct Parser<'src> {
    stream: TokenStream<'src>,
    tree: Tree,
    current: NodeId,
    buffer: String,
    buffer_line: u32,
    buffer_in_source: bool,
    in_source: bool,
    /// 1-based line of the next unconsumed byte.
    line: u32,
    /// Highest line seen holding at least one byte.
    max_stop: u32,
    /// Kind of the last consumed non-trivia token, for lookbehind guards.
    last_code: Option<TokenKind>,
    pending: Visibility,
    track_lines: bool,
    rebase: Option<Rebase>,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, options: &ParseOptions) -> Self {
        let rebase = options.rebase_path.as_ref().map(|path| Rebase {
            file_literal: quote_path(path),
            dir_literal: quote_path(path.parent().unwrap_or_else(|| Path::new(""))),
        });
        let mut tree = Tree::new(NodeKind::File(FileScope::default()), options.code_only);
        if options.track_lines {
            let root = tree.root();
            tree.get_mut(root).set_lines(LineRange { start: 1, stop: 1 });
        }
        Parser {
            stream: TokenStream::new(source),
            current: tree.root(),
            tree,
            buffer: String::new(),
            buffer_line: 1,
            buffer_in_source: options.code_only,
            in_source: options.code_only,
            line: 1,
            max_stop: 1,
            last_code: None,
            pending: Visibility::default(),
            track_lines: options.track_lines,
            rebase,
        }
    }

    // ---- text plumbing ------------------------------------------------

    fn advance_line(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let stop = stop_line(self.line, text);
        self.max_stop = self.max_stop.max(stop);
        self.line += count_lines(text);
    }

    fn buffer_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.buffer.is_empty() {
            self.buffer_line = self.line;
            self.buffer_in_source = self.in_source;
        }
        self.buffer.push_str(text);
        self.advance_line(text);
    }

    /// Consume the current token into the buffer.
    fn take_current(&mut self) {
        if let Some(token) = self.stream.advance() {
            self.buffer_text(token.text);
            if !token.kind.is_trivia() {
                self.last_code = Some(token.kind);
            }
        }
    }

    /// Flush the buffer into a `code`/`plain` leaf under the current node.
    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buffer);
        let kind = if self.buffer_in_source {
            NodeKind::Code
        } else {
            NodeKind::Plain
        };
        let start = self.buffer_line;
        let stop = stop_line(start, &text);
        let mut node = Node::new(kind, self.buffer_in_source);
        node.text = text;
        let id = self.tree.add_child(self.current, node);
        if self.track_lines {
            let range = LineRange { start, stop };
            self.tree.get_mut(id).set_lines(range);
            self.tree.index_lines(id, range);
        }
    }

    /// Attach a leaf whose text has not been line-counted yet (scanned
    /// directly off the stream rather than through the buffer).
    fn attach_leaf(&mut self, kind: NodeKind, text: String) -> NodeId {
        let start = self.line;
        let stop = stop_line(start, &text);
        self.advance_line(&text);
        let mut node = Node::new(kind, self.in_source);
        node.text = text;
        let id = self.tree.add_child(self.current, node);
        if self.track_lines {
            let range = LineRange { start, stop };
            self.tree.get_mut(id).set_lines(range);
            self.tree.index_lines(id, range);
        }
        id
    }

    /// Open a container with the given head text and make it current.
    fn open_container(&mut self, kind: NodeKind, head: String) {
        let start = self.line;
        let head_stop = stop_line(start, &head);
        self.advance_line(&head);
        let mut node = Node::new(kind, self.in_source);
        node.text = head;
        let id = self.tree.add_child(self.current, node);
        if self.track_lines {
            self.tree.get_mut(id).set_lines(LineRange {
                start,
                stop: head_stop,
            });
        }
        self.current = id;
    }

    /// Close the current container, recording `close_text` (empty at end of
    /// input) and updating stop lines on the node and its parent.
    fn close_current(&mut self, close_text: &str) {
        let id = self.current;
        let stop = if close_text.is_empty() {
            let start = self.tree.get(id).lines().map(|l| l.start).unwrap_or(1);
            self.max_stop.max(start)
        } else {
            self.line
        };
        self.advance_line(close_text);
        self.tree.get_mut(id).close.push_str(close_text);
        if self.track_lines {
            let start = self.tree.get(id).lines().map(|l| l.start).unwrap_or(stop);
            let range = LineRange { start, stop };
            self.tree.get_mut(id).set_lines(range);
            self.tree.index_lines(id, range);
            if let Some(parent) = self.tree.get(id).parent() {
                if let Some(parent_lines) = self.tree.get(parent).lines() {
                    self.tree.get_mut(parent).set_lines(LineRange {
                        start: parent_lines.start,
                        stop: parent_lines.stop.max(stop),
                    });
                }
            }
        }
        self.current = self
            .tree
            .get(id)
            .parent()
            .unwrap_or_else(|| self.tree.root());
    }

    fn current_is_braced(&self) -> bool {
        match &self.tree.get(self.current).kind {
            NodeKind::File(_) => false,
            NodeKind::Namespace(decl) => decl.braced,
            kind => kind.is_container(),
        }
    }

    // ---- lookbehind guards --------------------------------------------

    fn after_member_access(&self) -> bool {
        matches!(
            self.last_code,
            Some(TokenKind::DoubleColon) | Some(TokenKind::Arrow)
        )
    }

    fn at_type_decl(&self) -> bool {
        !self.after_member_access() && self.last_code != Some(TokenKind::New)
    }

    /// `namespace` opens a declaration unless it is the relative-name
    /// operator (`namespace\Sub\Thing`) or a member access.
    fn at_namespace_decl(&self) -> bool {
        if self.after_member_access() || self.last_code == Some(TokenKind::NsSep) {
            return false;
        }
        let mut ahead = 1;
        while let Some(token) = self.stream.peek(ahead) {
            if token.kind.is_trivia() {
                ahead += 1;
                continue;
            }
            return token.kind != TokenKind::NsSep;
        }
        true
    }

    // ---- main loop ----------------------------------------------------

    fn run(mut self) -> Tree {
        while let Some(token) = self.stream.current() {
            if !self.in_source {
                if token.kind == TokenKind::OpenTag {
                    self.flush();
                    self.in_source = true;
                    self.last_code = None;
                }
                self.take_current();
                continue;
            }
            match token.kind {
                TokenKind::CloseTag => {
                    self.take_current();
                    self.flush();
                    self.in_source = false;
                    self.last_code = None;
                }
                TokenKind::LineComment | TokenKind::BlockComment => {
                    self.flush();
                    let text = token.text.to_string();
                    self.stream.advance();
                    self.attach_leaf(NodeKind::Comment, text);
                }
                kind if kind.is_string() => {
                    self.flush();
                    let text = token.text.to_string();
                    self.stream.advance();
                    self.attach_leaf(NodeKind::Str(string_form(kind)), text);
                }
                TokenKind::AttributeOpen => {
                    self.flush();
                    self.attribute();
                }
                TokenKind::OpenBrace => {
                    self.flush();
                    self.stream.advance();
                    self.open_container(NodeKind::Code, "{".to_string());
                    self.last_code = Some(TokenKind::OpenBrace);
                    self.pending = Visibility::default();
                }
                TokenKind::CloseBrace => {
                    self.flush();
                    if self.current_is_braced() {
                        self.stream.advance();
                        self.close_current("}");
                        self.last_code = Some(TokenKind::CloseBrace);
                    } else {
                        self.take_current();
                    }
                    self.pending = Visibility::default();
                }
                TokenKind::Namespace if self.at_namespace_decl() => self.namespace_decl(),
                TokenKind::Use if !self.after_member_access() => self.handle_use(),
                TokenKind::Class | TokenKind::Interface | TokenKind::Trait
                    if self.at_type_decl() =>
                {
                    self.type_decl(token.kind)
                }
                TokenKind::Function if !self.after_member_access() => self.function_decl(),
                TokenKind::Yield if !self.after_member_access() => {
                    self.mark_generator();
                    self.take_current();
                }
                TokenKind::Abstract => {
                    self.pending.is_abstract = true;
                    self.take_current();
                }
                TokenKind::Final => {
                    self.pending.is_final = true;
                    self.take_current();
                }
                TokenKind::Static => {
                    self.pending.is_static = true;
                    self.take_current();
                }
                TokenKind::Public => {
                    self.pending.public = true;
                    self.take_current();
                }
                TokenKind::Protected => {
                    self.pending.protected = true;
                    self.take_current();
                }
                TokenKind::Private => {
                    self.pending.private = true;
                    self.take_current();
                }
                TokenKind::Semicolon => {
                    self.pending = Visibility::default();
                    self.take_current();
                }
                TokenKind::MagicFile | TokenKind::MagicDir => self.magic(token),
                _ => self.take_current(),
            }
        }
        self.finish()
    }

    fn finish(mut self) -> Tree {
        self.flush();
        while self.current != self.tree.root() {
            self.close_current("");
        }
        if self.track_lines {
            let root = self.tree.root();
            let range = LineRange {
                start: 1,
                stop: self.max_stop.max(1),
            };
            self.tree.get_mut(root).set_lines(range);
            self.tree.index_lines(root, range);
        }
        self.tree
    }

    // ---- structural handlers ------------------------------------------

    fn magic(&mut self, token: Token<'src>) {
        self.stream.advance();
        let replacement = match (&self.rebase, token.kind) {
            (Some(rebase), TokenKind::MagicFile) => Some(rebase.file_literal.clone()),
            (Some(rebase), TokenKind::MagicDir) => Some(rebase.dir_literal.clone()),
            _ => None,
        };
        match replacement {
            Some(literal) => self.buffer_text(&literal),
            None => self.buffer_text(token.text),
        }
        self.last_code = Some(token.kind);
    }

    fn attribute(&mut self) {
        let mut text = String::new();
        let mut depth = 0usize;
        while let Some(token) = self.stream.advance() {
            text.push_str(token.text);
            match token.kind {
                TokenKind::AttributeOpen | TokenKind::OpenBracket => depth += 1,
                TokenKind::CloseBracket => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        self.attach_leaf(NodeKind::Attribute, text);
        self.last_code = Some(TokenKind::CloseBracket);
    }

    fn mark_generator(&mut self) {
        let target = match self.tree.get(self.current).kind {
            NodeKind::Function(_) => Some(self.current),
            _ => self.tree.get(self.current).function(),
        };
        if let Some(id) = target {
            if let NodeKind::Function(decl) = &mut self.tree.get_mut(id).kind {
                decl.is_generator = true;
            }
        }
    }

    fn namespace_decl(&mut self) {
        self.flush();
        if matches!(&self.tree.get(self.current).kind, NodeKind::Namespace(decl) if !decl.braced) {
            self.close_current("");
        }
        self.pending = Visibility::default();
        let Some(keyword) = self.stream.advance() else {
            return;
        };
        let mut head = keyword.text.to_string();
        let mut name = String::new();
        let mut braced = false;
        while let Some(token) = self.stream.current() {
            match token.kind {
                TokenKind::Semicolon => {
                    head.push_str(token.text);
                    self.stream.advance();
                    break;
                }
                TokenKind::OpenBrace => {
                    head.push_str(token.text);
                    self.stream.advance();
                    braced = true;
                    break;
                }
                TokenKind::CloseTag => break,
                kind if kind.is_word() || kind == TokenKind::NsSep => {
                    name.push_str(token.text);
                    head.push_str(token.text);
                    self.stream.advance();
                }
                _ => {
                    head.push_str(token.text);
                    self.stream.advance();
                }
            }
        }
        self.open_container(
            NodeKind::Namespace(NamespaceDecl {
                name,
                braced,
                imports: Default::default(),
            }),
            head,
        );
        self.last_code = Some(if braced {
            TokenKind::OpenBrace
        } else {
            TokenKind::Semicolon
        });
    }

    fn handle_use(&mut self) {
        if self.tree.get(self.current).kind.is_type_decl() {
            self.trait_use();
        } else if matches!(
            self.tree.get(self.current).kind,
            NodeKind::File(_) | NodeKind::Namespace(_)
        ) {
            self.import();
        } else {
            // Closure captures are consumed by the signature scan; any other
            // `use` in executable position is opaque text.
            self.take_current();
        }
    }

    /// An import statement: `use A;`, `use B as C;`, `use D\{E, F as G};`,
    /// optionally `use function …` / `use const …`.
    fn import(&mut self) {
        self.flush();
        let Some(keyword) = self.stream.advance() else {
            return;
        };
        let mut text = keyword.text.to_string();

        #[derive(PartialEq)]
        enum Bucket {
            Types,
            Functions,
            Constants,
        }
        let mut bucket = Bucket::Types;
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut name = String::new();
        let mut group_prefix: Option<String> = None;
        let mut alias: Option<String> = None;
        let mut expecting_alias = false;
        let mut saw_word = false;

        fn commit(
            entries: &mut Vec<(String, String)>,
            group_prefix: &Option<String>,
            name: &mut String,
            alias: &mut Option<String>,
        ) {
            let local = std::mem::take(name);
            let taken_alias = alias.take();
            if local.is_empty() {
                return;
            }
            let qualified = match group_prefix {
                Some(prefix) => format!("{prefix}{local}"),
                None => local,
            };
            let qualified = qualified.trim_start_matches('\\').to_string();
            let key = match taken_alias {
                Some(key) => key,
                None => match qualified.rsplit('\\').next() {
                    Some(segment) if !segment.is_empty() => segment.to_string(),
                    _ => return,
                },
            };
            entries.push((key, qualified));
        }

        while let Some(token) = self.stream.current() {
            match token.kind {
                TokenKind::Semicolon => {
                    text.push_str(token.text);
                    self.stream.advance();
                    commit(&mut entries, &group_prefix, &mut name, &mut alias);
                    break;
                }
                TokenKind::CloseTag => {
                    commit(&mut entries, &group_prefix, &mut name, &mut alias);
                    break;
                }
                TokenKind::Comma => {
                    text.push_str(token.text);
                    self.stream.advance();
                    commit(&mut entries, &group_prefix, &mut name, &mut alias);
                }
                TokenKind::OpenBrace => {
                    text.push_str(token.text);
                    self.stream.advance();
                    group_prefix = Some(std::mem::take(&mut name));
                }
                TokenKind::CloseBrace => {
                    text.push_str(token.text);
                    self.stream.advance();
                    commit(&mut entries, &group_prefix, &mut name, &mut alias);
                    group_prefix = None;
                }
                TokenKind::As => {
                    text.push_str(token.text);
                    self.stream.advance();
                    expecting_alias = true;
                }
                TokenKind::Function if !saw_word && bucket == Bucket::Types => {
                    text.push_str(token.text);
                    self.stream.advance();
                    bucket = Bucket::Functions;
                }
                TokenKind::Const if !saw_word && bucket == Bucket::Types => {
                    text.push_str(token.text);
                    self.stream.advance();
                    bucket = Bucket::Constants;
                }
                TokenKind::NsSep => {
                    name.push('\\');
                    text.push_str(token.text);
                    self.stream.advance();
                }
                kind if kind.is_word() => {
                    if expecting_alias {
                        alias = Some(token.text.to_string());
                        expecting_alias = false;
                    } else {
                        name.push_str(token.text);
                    }
                    saw_word = true;
                    text.push_str(token.text);
                    self.stream.advance();
                }
                _ => {
                    text.push_str(token.text);
                    self.stream.advance();
                }
            }
        }
        if self.stream.is_exhausted() {
            commit(&mut entries, &group_prefix, &mut name, &mut alias);
        }

        self.attach_leaf(NodeKind::Use, text);
        self.last_code = Some(TokenKind::Semicolon);

        let table = match &mut self.tree.get_mut(self.current).kind {
            NodeKind::Namespace(decl) => &mut decl.imports,
            NodeKind::File(scope) => &mut scope.imports,
            _ => return,
        };
        let target = match bucket {
            Bucket::Types => &mut table.types,
            Bucket::Functions => &mut table.functions,
            Bucket::Constants => &mut table.constants,
        };
        for (key, qualified) in entries {
            target.insert(key, qualified);
        }
    }

    /// `use TraitName;` inside a class-like body. The statement text stays in
    /// the buffer; only the trait names are lifted onto the declaration. An
    /// adaptation block (`use A { … }`) leaves its `{` for the main loop, so
    /// it nests as an anonymous code block and brace depth stays correct.
    fn trait_use(&mut self) {
        let mut names: Vec<String> = Vec::new();
        let mut name = String::new();
        self.take_current();
        while let Some(token) = self.stream.current() {
            match token.kind {
                TokenKind::Semicolon => {
                    if !name.is_empty() {
                        names.push(std::mem::take(&mut name));
                    }
                    self.take_current();
                    break;
                }
                TokenKind::OpenBrace | TokenKind::CloseTag => {
                    if !name.is_empty() {
                        names.push(std::mem::take(&mut name));
                    }
                    break;
                }
                TokenKind::Comma => {
                    if !name.is_empty() {
                        names.push(std::mem::take(&mut name));
                    }
                    self.take_current();
                }
                kind if kind.is_word() || kind == TokenKind::NsSep => {
                    name.push_str(token.text);
                    self.take_current();
                }
                _ => self.take_current(),
            }
        }
        if !name.is_empty() {
            names.push(name);
        }
        if let NodeKind::Class(decl) | NodeKind::Interface(decl) | NodeKind::Trait(decl) =
            &mut self.tree.get_mut(self.current).kind
        {
            decl.trait_uses
                .extend(names.into_iter().map(|n| n.trim_start_matches('\\').to_string()));
        }
    }

    fn type_decl(&mut self, keyword_kind: TokenKind) {
        self.flush();
        self.pending = Visibility::default();
        let Some(keyword) = self.stream.advance() else {
            return;
        };
        let mut head = keyword.text.to_string();

        #[derive(Clone, Copy)]
        enum Section {
            Name,
            Extends,
            Implements,
        }
        let mut section = Section::Name;
        let mut current_name = String::new();
        let mut decl = TypeDecl::default();

        fn commit(decl: &mut TypeDecl, section: Section, current_name: &mut String) {
            let value = std::mem::take(current_name);
            if value.is_empty() {
                return;
            }
            match section {
                Section::Name => {
                    if decl.name.is_empty() {
                        decl.name = value;
                    }
                }
                Section::Extends => {
                    if decl.extends.is_empty() {
                        decl.extends = value;
                    }
                }
                Section::Implements => decl.implements.push(value),
            }
        }

        let mut terminator: Option<TokenKind> = None;
        while let Some(token) = self.stream.current() {
            match token.kind {
                TokenKind::OpenBrace | TokenKind::Semicolon => {
                    head.push_str(token.text);
                    self.stream.advance();
                    terminator = Some(token.kind);
                    break;
                }
                TokenKind::CloseTag => break,
                TokenKind::Extends => {
                    commit(&mut decl, section, &mut current_name);
                    section = Section::Extends;
                    head.push_str(token.text);
                    self.stream.advance();
                }
                TokenKind::Implements => {
                    commit(&mut decl, section, &mut current_name);
                    section = Section::Implements;
                    head.push_str(token.text);
                    self.stream.advance();
                }
                TokenKind::Comma => {
                    commit(&mut decl, section, &mut current_name);
                    head.push_str(token.text);
                    self.stream.advance();
                }
                kind if kind.is_word() || kind == TokenKind::NsSep => {
                    current_name.push_str(token.text);
                    head.push_str(token.text);
                    self.stream.advance();
                }
                _ => {
                    head.push_str(token.text);
                    self.stream.advance();
                }
            }
        }
        commit(&mut decl, section, &mut current_name);

        let kind = match keyword_kind {
            TokenKind::Class => NodeKind::Class(decl),
            TokenKind::Interface => NodeKind::Interface(decl),
            _ => NodeKind::Trait(decl),
        };
        match terminator {
            Some(TokenKind::OpenBrace) => {
                self.open_container(kind, head);
                self.last_code = Some(TokenKind::OpenBrace);
            }
            _ => {
                self.attach_leaf(kind, head);
                self.last_code = Some(TokenKind::Semicolon);
            }
        }
    }

    fn function_decl(&mut self) {
        self.flush();
        let visibility = std::mem::take(&mut self.pending);
        let Some(keyword) = self.stream.advance() else {
            return;
        };
        let mut head = keyword.text.to_string();
        let mut name = String::new();

        // Name (absent for closures), then the parameter list.
        let mut reached_params = false;
        let mut terminator: Option<TokenKind> = None;
        while let Some(token) = self.stream.current() {
            match token.kind {
                TokenKind::OpenParen => {
                    reached_params = true;
                    break;
                }
                TokenKind::OpenBrace | TokenKind::Semicolon => {
                    head.push_str(token.text);
                    self.stream.advance();
                    terminator = Some(token.kind);
                    break;
                }
                TokenKind::CloseTag => break,
                kind if kind.is_word() => {
                    if name.is_empty() {
                        name = token.text.to_string();
                    }
                    head.push_str(token.text);
                    self.stream.advance();
                }
                _ => {
                    head.push_str(token.text);
                    self.stream.advance();
                }
            }
        }

        let mut params: Vec<Param> = Vec::new();
        if reached_params {
            self.scan_params(&mut head, &mut params);
            // Captures, return type, or nothing, up to the body or `;`.
            let mut depth = 0usize;
            while let Some(token) = self.stream.current() {
                match token.kind {
                    TokenKind::OpenParen => {
                        depth += 1;
                        head.push_str(token.text);
                        self.stream.advance();
                    }
                    TokenKind::CloseParen => {
                        depth = depth.saturating_sub(1);
                        head.push_str(token.text);
                        self.stream.advance();
                    }
                    TokenKind::OpenBrace if depth == 0 => {
                        head.push_str(token.text);
                        self.stream.advance();
                        terminator = Some(TokenKind::OpenBrace);
                        break;
                    }
                    TokenKind::Semicolon if depth == 0 => {
                        head.push_str(token.text);
                        self.stream.advance();
                        terminator = Some(TokenKind::Semicolon);
                        break;
                    }
                    TokenKind::CloseTag => break,
                    _ => {
                        head.push_str(token.text);
                        self.stream.advance();
                    }
                }
            }
        }

        let decl = FunctionDecl {
            is_closure: name.is_empty(),
            is_method: !name.is_empty() && self.tree.get(self.current).kind.is_type_decl(),
            name,
            is_generator: false,
            visibility,
            params,
        };
        match terminator {
            Some(TokenKind::OpenBrace) => {
                self.open_container(NodeKind::Function(decl), head);
                self.last_code = Some(TokenKind::OpenBrace);
            }
            _ => {
                self.attach_leaf(NodeKind::Function(decl), head);
                self.last_code = Some(TokenKind::Semicolon);
            }
        }
    }

    /// Consume a balanced parameter list, appending its text to `head` and
    /// collecting parameter metadata. The cursor is on the opening paren.
    fn scan_params(&mut self, head: &mut String, params: &mut Vec<Param>) {
        let Some(open) = self.stream.advance() else {
            return;
        };
        head.push_str(open.text);
        let mut paren_depth = 1usize;
        let mut bracket_depth = 0usize;
        let mut brace_depth = 0usize;

        let mut param = Param::default();
        let mut default_text = String::new();
        let mut seen_eq = false;

        fn commit(params: &mut Vec<Param>, param: &mut Param, default_text: &mut String, seen_eq: &mut bool) {
            let mut done = std::mem::take(param);
            let default = std::mem::take(default_text);
            if *seen_eq {
                let trimmed = default.trim();
                if !trimmed.is_empty() {
                    done.default = Some(trimmed.to_string());
                }
            }
            *seen_eq = false;
            if !done.name.is_empty() || !done.hint.is_empty() || done.by_ref || done.variadic {
                params.push(done);
            }
        }

        while let Some(token) = self.stream.current() {
            let at_top = paren_depth == 1 && bracket_depth == 0 && brace_depth == 0;
            match token.kind {
                TokenKind::OpenParen => paren_depth += 1,
                TokenKind::CloseParen => {
                    paren_depth -= 1;
                    if paren_depth == 0 {
                        head.push_str(token.text);
                        self.stream.advance();
                        commit(params, &mut param, &mut default_text, &mut seen_eq);
                        return;
                    }
                }
                TokenKind::OpenBracket | TokenKind::AttributeOpen => bracket_depth += 1,
                TokenKind::CloseBracket => bracket_depth = bracket_depth.saturating_sub(1),
                TokenKind::OpenBrace => brace_depth += 1,
                TokenKind::CloseBrace => brace_depth = brace_depth.saturating_sub(1),
                _ => {}
            }
            match token.kind {
                TokenKind::Comma if at_top => {
                    commit(params, &mut param, &mut default_text, &mut seen_eq);
                }
                TokenKind::Equals if at_top && !seen_eq => seen_eq = true,
                _ if seen_eq => default_text.push_str(token.text),
                TokenKind::Variable => {
                    if param.name.is_empty() {
                        param.name = token.text.trim_start_matches('$').to_string();
                    }
                }
                TokenKind::Ampersand => {
                    if param.name.is_empty() {
                        param.by_ref = true;
                    }
                }
                TokenKind::Ellipsis => {
                    if param.name.is_empty() {
                        param.variadic = true;
                    }
                }
                TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Readonly => {}
                kind if kind.is_trivia() => {}
                TokenKind::Comma | TokenKind::Equals => {
                    // Nested separators belong to a default already captured
                    // above; nothing to record outside one.
                }
                kind if param.name.is_empty() => {
                    // Anything ahead of the variable is type-hint text.
                    if kind.is_word()
                        || matches!(
                            kind,
                            TokenKind::NsSep | TokenKind::Question | TokenKind::Op
                        )
                    {
                        param.hint.push_str(token.text);
                    }
                }
                _ => {}
            }
            head.push_str(token.text);
            self.stream.advance();
        }
        // End of input inside the list: keep whatever was gathered.
        commit(params, &mut param, &mut default_text, &mut seen_eq);
    }
}
