//! Our default `Display` output for each `TokenKind` is less ambiguous
//! than the format required by `--lextest` and therefore improves error
//! messages.
use lexer::TokenKind::{self, *};
use std::fmt;

/// Printed after the last token.
pub const EOF: &str = "EOF";

pub struct Output<'token, 'f> {
    token: &'token TokenKind<'f>,
}

impl<'token, 'f> Output<'token, 'f> {
    pub fn new(token: &'token TokenKind<'f>) -> Self {
        Self { token }
    }
}

impl fmt::Display for Output<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token {
            Keyword(keyword) => write!(f, "{}", keyword),
            Operator(operator) => write!(f, "{}", operator),
            Identifier(name) => write!(f, "identifier {}", name),
            IntegerLiteral(literal) => write!(f, "integer literal {}", literal),
            Comment(body) => write!(f, "/*{}*/", body),
            Whitespace => Ok(()),
        }
    }
}
