//! Base tokenization for PHP source text.
//!
//! This module provides the raw tokenization using the logos lexer library.
//! This is the entry point where source strings become token streams.
//!
//! The guarantee that matters here is losslessness: concatenating the slices
//! of the returned spans reproduces the input byte for byte. The grammar has a
//! catch-all pattern, and anything logos still rejects is mapped to
//! [TokenKind::Raw] over the rejected span, so no input can make this function
//! drop bytes or fail.

use logos::Logos;

use crate::graft::lexing::tokens::TokenKind;

/// Tokenize source text with location information.
///
/// Returns `(kind, span)` pairs covering the whole input, in order and without
/// gaps. Callers that need the text slice the source with the span; the
/// [TokenStream](super::stream::TokenStream) does this once up front.
pub fn tokenize(source: &str) -> Vec<(TokenKind, logos::Span)> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(kind) => tokens.push((kind, lexer.span())),
            Err(()) => tokens.push((TokenKind::Raw, lexer.span())),
        }
    }

    tokens
}
