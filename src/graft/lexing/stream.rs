//! Cursor over the base token vector.
//!
//! The stream is the parser's only view of the source. Tokens borrow their
//! text from the original string, so walking the stream allocates nothing;
//! the parser copies text out only when it commits bytes to a node.
//!
//! The cursor never fails: at end of input `current()` is `None` and the
//! consuming operations return what they could gather. Malformed source is
//! the caller's problem to degrade on, not the stream's to reject.

use crate::graft::lexing::tokenize::tokenize;
use crate::graft::lexing::tokens::TokenKind;

/// One lexical unit: kind, exact text, byte offset of the text in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub offset: usize,
}

/// A rewindable cursor over the tokens of one source text.
#[derive(Debug, Clone)]
pub struct TokenStream<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
}

impl<'src> TokenStream<'src> {
    /// Tokenize `source` and position the cursor at the first token.
    pub fn new(source: &'src str) -> Self {
        let tokens = tokenize(source)
            .into_iter()
            .map(|(kind, span)| Token {
                kind,
                text: &source[span.clone()],
                offset: span.start,
            })
            .collect();
        TokenStream { tokens, pos: 0 }
    }

    /// The token under the cursor, or `None` at end of input.
    pub fn current(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).copied()
    }

    /// The token `n` positions ahead of the cursor without consuming anything.
    pub fn peek(&self, n: usize) -> Option<Token<'src>> {
        self.tokens.get(self.pos + n).copied()
    }

    /// The next token that is not whitespace or a comment, looking ahead
    /// without consuming anything.
    pub fn peek_significant(&self) -> Option<Token<'src>> {
        self.tokens[self.pos..]
            .iter()
            .find(|token| !token.kind.is_trivia())
            .copied()
    }

    /// Consume and return the token under the cursor.
    pub fn advance(&mut self) -> Option<Token<'src>> {
        let token = self.current();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume tokens through the first one whose kind is in `stop`,
    /// returning the concatenated text (stop token included). With an empty
    /// stop set, or when no stop kind occurs, everything left is consumed.
    ///
    /// Returns the consumed text and the stop kind actually hit, `None` when
    /// the stream ran out first.
    pub fn next_until(&mut self, stop: &[TokenKind]) -> (String, Option<TokenKind>) {
        let mut text = String::new();
        while let Some(token) = self.advance() {
            text.push_str(token.text);
            if stop.contains(&token.kind) {
                return (text, Some(token.kind));
            }
        }
        (text, None)
    }

    /// Consume a run of whitespace tokens, returning their text so the caller
    /// can keep byte fidelity.
    pub fn skip_whitespace(&mut self) -> String {
        let mut text = String::new();
        while let Some(token) = self.current() {
            if token.kind != TokenKind::Whitespace {
                break;
            }
            text.push_str(token.text);
            self.pos += 1;
        }
        text
    }

    /// Current cursor position, for use with [rewind](Self::rewind).
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor back (or forward) to a previously observed position.
    pub fn rewind(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    /// True once every token has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_and_advance() {
        let mut stream = TokenStream::new("a b");
        assert_eq!(stream.current().unwrap().text, "a");
        assert_eq!(stream.advance().unwrap().text, "a");
        assert_eq!(stream.current().unwrap().kind, TokenKind::Whitespace);
    }

    #[test]
    fn test_next_until_concatenates_through_stop() {
        let mut stream = TokenStream::new("namespace Foo\\Bar; rest");
        stream.advance();
        let (text, hit) = stream.next_until(&[TokenKind::Semicolon, TokenKind::OpenBrace]);
        assert_eq!(text, " Foo\\Bar;");
        assert_eq!(hit, Some(TokenKind::Semicolon));
        assert_eq!(stream.current().unwrap().kind, TokenKind::Whitespace);
    }

    #[test]
    fn test_next_until_exhaustion_returns_remainder() {
        let mut stream = TokenStream::new("a b c");
        let (text, hit) = stream.next_until(&[TokenKind::Semicolon]);
        assert_eq!(text, "a b c");
        assert_eq!(hit, None);
        assert!(stream.is_exhausted());
    }

    #[test]
    fn test_skip_whitespace_returns_skipped_text() {
        let mut stream = TokenStream::new("  \n\tx");
        assert_eq!(stream.skip_whitespace(), "  \n\t");
        assert_eq!(stream.current().unwrap().text, "x");
        assert_eq!(stream.skip_whitespace(), "");
    }

    #[test]
    fn test_rewind() {
        let mut stream = TokenStream::new("a b c");
        let mark = stream.position();
        stream.next_until(&[]);
        assert!(stream.is_exhausted());
        stream.rewind(mark);
        assert_eq!(stream.current().unwrap().text, "a");
    }

    #[test]
    fn test_peek_significant_skips_trivia() {
        let mut stream = TokenStream::new("namespace /* c */ \\Foo");
        stream.advance();
        assert_eq!(
            stream.peek_significant().unwrap().kind,
            TokenKind::NsSep
        );
        assert_eq!(stream.current().unwrap().kind, TokenKind::Whitespace);
    }

    #[test]
    fn test_offsets_match_source() {
        let source = "<?php $x;";
        let stream = TokenStream::new(source);
        let mut offset = 0;
        let mut probe = stream.clone();
        while let Some(token) = probe.advance() {
            assert_eq!(token.offset, offset);
            offset += token.text.len();
        }
        assert_eq!(offset, source.len());
    }
}
