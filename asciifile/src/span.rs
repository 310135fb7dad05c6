//! # Input File Ranges
//!
//! A `Span` is a slice of the input file annotated with line and column of
//! its start and end.
//!
//! The range is inclusive on both sides, so `as_str()` contains the
//! character at the start position and the character at the end position.
//! This also means that you cannot create an empty `Span`.
use crate::Position;
use std::{
    cmp::{max, min},
    fmt,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Span<'f> {
    /// position of the first char in the span.
    start: Position<'f>,
    /// position of the last char in the span.
    end: Position<'f>,
}

impl<'f> Span<'f> {
    pub fn new(a: Position<'f>, b: Position<'f>) -> Self {
        Self {
            start: min(a, b),
            end: max(a, b),
        }
    }

    /// Creates a span containing only the given position
    ///
    /// ```
    /// use asciifile::{AsciiFile, Span};
    ///
    /// let file = AsciiFile::new(b"ABCD").unwrap();
    /// let position = file.iter().nth(2).unwrap();
    /// let span = Span::from_single_position(position);
    /// assert_eq!("C", span.as_str());
    /// ```
    pub fn from_single_position(position: Position<'f>) -> Self {
        Span {
            start: position,
            end: position,
        }
    }

    pub fn as_str(&self) -> &'f str {
        &self.start.file().as_str()[self.start.byte_offset()..=self.end.byte_offset()]
    }

    pub fn start_position(&self) -> Position<'f> {
        self.start
    }

    pub fn end_position(&self) -> Position<'f> {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end.byte_offset() - self.start.byte_offset() + 1
    }

    pub fn is_single_char(&self) -> bool {
        self.start == self.end
    }

    pub fn is_multiline(&self) -> bool {
        self.start.row() != self.end.row()
    }

    /// extends the span to include the given position
    pub fn extend_to_position(self, position: &Position<'f>) -> Span<'f> {
        Span::combine(&position.to_single_char_span(), &self)
    }

    pub fn combine(a: &Span<'f>, b: &Span<'f>) -> Span<'f> {
        Span {
            start: min(a.start, b.start),
            end: max(a.end, b.end),
        }
    }
}

impl fmt::Display for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_char() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
