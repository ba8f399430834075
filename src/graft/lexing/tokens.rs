//! Token kinds for the PHP surface syntax.
//!
//!     The lexer errs on the side of byte fidelity over grammatical precision:
//!     every byte of the input must land in exactly one token, so anything the
//!     grammar does not claim falls through to a one-character `Raw` token.
//!     Operator runs are deliberately coarse (`Op`), because the structural
//!     parser only dispatches on region delimiters, braces, declaration
//!     keywords, and the handful of punctuation kinds that shape declarations.
//!
//! String forms
//!
//!     Single-quoted, double-quoted (interpolating), backtick (interpolating),
//!     heredoc, and nowdoc literals are distinct kinds. The multi-line forms
//!     are scanned by callback because their terminator is the opener's label
//!     on a line of its own, possibly indented; an unterminated literal
//!     swallows the rest of the input rather than failing.
//!
//! Comments
//!
//!     `//` and `#` comments stop before a closing `?>` tag, matching the host
//!     language. `#[` is an attribute opener, never a comment. Block comments
//!     without a terminator run to end of input.

use logos::{Lexer, Logos};
use serde::Serialize;

/// Atomic lexical unit kinds produced by [tokenize](super::tokenize::tokenize).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    #[regex(r"[ \t\r\n\x0b\x0c]+")]
    Whitespace,

    /// `<?php`, `<?=` or the short `<?` form.
    #[regex(r"<\?(php|=)?")]
    OpenTag,

    /// `?>`, returning the surrounding text to literal-template mode.
    #[token("?>")]
    CloseTag,

    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    /// Namespace separator `\`.
    #[token("\\")]
    NsSep,
    #[token("&")]
    Ampersand,
    #[token("=")]
    Equals,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token("->")]
    Arrow,
    #[token("...")]
    Ellipsis,
    #[token("/")]
    Slash,
    #[token("$")]
    Dollar,

    /// `#[`, the attribute annotation opener.
    #[token("#[")]
    AttributeOpen,

    #[token("//", lex_line_comment)]
    #[token("#", lex_line_comment)]
    LineComment,
    #[token("/*", lex_block_comment)]
    BlockComment,

    #[regex(r"'([^'\\]|\\[\x00-\x{10FFFF}])*'")]
    SingleQuoted,
    #[regex(r#""([^"\\]|\\[\x00-\x{10FFFF}])*""#)]
    DoubleQuoted,
    #[regex(r"`([^`\\]|\\[\x00-\x{10FFFF}])*`")]
    Backtick,
    #[regex(r"<<<[ \t]*[A-Za-z_][A-Za-z0-9_]*\r?\n", lex_heredoc)]
    #[regex(r#"<<<[ \t]*"[A-Za-z_][A-Za-z0-9_]*"\r?\n"#, lex_heredoc)]
    Heredoc,
    #[regex(r"<<<[ \t]*'[A-Za-z_][A-Za-z0-9_]*'\r?\n", lex_heredoc)]
    Nowdoc,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*")]
    Variable,
    #[regex(r"[0-9][0-9_]*(\.[0-9_]+)?([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+")]
    Number,

    #[token("namespace", ignore(ascii_case))]
    Namespace,
    #[token("use", ignore(ascii_case))]
    Use,
    #[token("class", ignore(ascii_case))]
    Class,
    #[token("interface", ignore(ascii_case))]
    Interface,
    #[token("trait", ignore(ascii_case))]
    Trait,
    #[token("function", ignore(ascii_case))]
    Function,
    #[token("extends", ignore(ascii_case))]
    Extends,
    #[token("implements", ignore(ascii_case))]
    Implements,
    #[token("as", ignore(ascii_case))]
    As,
    #[token("const", ignore(ascii_case))]
    Const,
    #[token("new", ignore(ascii_case))]
    New,
    #[token("yield", ignore(ascii_case))]
    Yield,
    #[token("abstract", ignore(ascii_case))]
    Abstract,
    #[token("final", ignore(ascii_case))]
    Final,
    #[token("static", ignore(ascii_case))]
    Static,
    #[token("public", ignore(ascii_case))]
    Public,
    #[token("protected", ignore(ascii_case))]
    Protected,
    #[token("private", ignore(ascii_case))]
    Private,
    #[token("readonly", ignore(ascii_case))]
    Readonly,

    #[token("__FILE__", ignore(ascii_case))]
    MagicFile,
    #[token("__DIR__", ignore(ascii_case))]
    MagicDir,

    #[regex(r"[A-Za-z_\x80-\x{10FFFF}][A-Za-z0-9_\x80-\x{10FFFF}]*")]
    Identifier,

    /// A run of operator characters the parser has no structural interest in.
    #[regex(r"[-+*%!<>.|^~@]+")]
    Op,

    /// Catch-all: one character nothing else claimed.
    #[regex(r"[\x00-\x{10FFFF}]", priority = 0)]
    Raw,
}

impl TokenKind {
    /// Kinds that can serve as a bare word (declaration names may collide
    /// with keywords: `function list()` is legal).
    pub fn is_word(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::Namespace
                | TokenKind::Use
                | TokenKind::Class
                | TokenKind::Interface
                | TokenKind::Trait
                | TokenKind::Function
                | TokenKind::Extends
                | TokenKind::Implements
                | TokenKind::As
                | TokenKind::Const
                | TokenKind::New
                | TokenKind::Yield
                | TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Static
                | TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Readonly
                | TokenKind::MagicFile
                | TokenKind::MagicDir
        )
    }

    /// True for kinds that never influence structure: whitespace and comments.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    /// True for all string literal forms.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            TokenKind::SingleQuoted
                | TokenKind::DoubleQuoted
                | TokenKind::Backtick
                | TokenKind::Heredoc
                | TokenKind::Nowdoc
        )
    }
}

/// Extend a `//` or `#` match to the end of the line, stopping before a
/// closing `?>` tag just like the host language does.
fn lex_line_comment(lex: &mut Lexer<TokenKind>) {
    let bytes = lex.remainder().as_bytes();
    let mut len = 0;
    while len < bytes.len() {
        if bytes[len] == b'\n' {
            break;
        }
        if bytes[len] == b'?' && bytes.get(len + 1) == Some(&b'>') {
            break;
        }
        len += 1;
    }
    lex.bump(len);
}

/// Extend a `/*` match through the closing `*/`, or to end of input when the
/// comment is unterminated.
fn lex_block_comment(lex: &mut Lexer<TokenKind>) {
    let rem = lex.remainder();
    match rem.find("*/") {
        Some(end) => lex.bump(end + 2),
        None => lex.bump(rem.len()),
    }
}

/// Extend a heredoc/nowdoc opener through its terminator line.
///
/// The terminator is the opener's label, optionally indented, followed by a
/// non-identifier character (or end of input). The label itself is included in
/// the token; whatever follows it is not. An unterminated literal swallows the
/// remaining input.
fn lex_heredoc(lex: &mut Lexer<TokenKind>) {
    let opener = lex.slice();
    let label = opener[3..]
        .trim_matches(|c| c == ' ' || c == '\t' || c == '\r' || c == '\n')
        .trim_matches(|c| c == '\'' || c == '"');
    let rem = lex.remainder();
    let bytes = rem.as_bytes();

    let mut line_start = 0;
    loop {
        let mut at = line_start;
        while at < bytes.len() && (bytes[at] == b' ' || bytes[at] == b'\t') {
            at += 1;
        }
        if rem[at..].starts_with(label) {
            let after = at + label.len();
            let terminated = match bytes.get(after) {
                Some(&b) => !(b == b'_' || b.is_ascii_alphanumeric()),
                None => true,
            };
            if terminated {
                lex.bump(after);
                return;
            }
        }
        match bytes[line_start..].iter().position(|&b| b == b'\n') {
            Some(offset) => line_start += offset + 1,
            None => {
                lex.bump(bytes.len());
                return;
            }
        }
    }
}
