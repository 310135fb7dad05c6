//! Represents an input file that may only contain ASCII characters. The
//! abstractions `Position` and `Span` are index-less wrappers around a single
//! character, respectively a range of characters, with positional
//! information attached.
pub mod file;
pub mod iter;
pub mod maybe_spanned;
pub mod position;
pub mod span;
pub mod spanned;

pub use self::{
    file::{AsciiFile, EncodingError, LineTruncation},
    iter::PositionIterator,
    maybe_spanned::MaybeSpanned,
    position::Position,
    span::Span,
    spanned::Spanned,
};
