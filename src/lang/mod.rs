/*!
# Language Module

Lexical analysis of the BASIC language: tokens, the on-demand lexer,
line-number handling, keyword normalization, and the error type shared
by the whole crate.

*/

#[macro_use]
mod error;
mod ident;
mod lex;
mod line;
mod token;

pub use error::Error;
pub use error::ErrorKind;
pub use ident::Ident;
pub use lex::Lexer;
pub use line::normalize;
pub use line::split_line_number;

pub mod tokens {
    pub use super::token::{Literal, Operator, Token, Word};
}

/// Program line numbers. Line zero is reserved and never stored.
pub type LineNumber = u16;
