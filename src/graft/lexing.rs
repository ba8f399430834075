//! Lossless lexing for PHP source text.
//!
//! Three layers, mirroring how the rest of the crate consumes them:
//!
//! 1. [tokens]: the [TokenKind](tokens::TokenKind) grammar. Coarse where
//!    structure doesn't care (operator runs), precise where it does (region
//!    delimiters, string forms, declaration keywords).
//! 2. [tokenize]: the raw logos pass producing `(kind, span)` pairs that
//!    cover the input without gaps.
//! 3. [stream]: the [TokenStream](stream::TokenStream) cursor the structural
//!    parser walks, with lookahead, consume-until, and rewind.

pub mod stream;
pub mod tokenize;
pub mod tokens;

pub use stream::{Token, TokenStream};
pub use tokenize::tokenize;
pub use tokens::TokenKind;
