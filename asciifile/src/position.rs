//! Abstraction over a character and its position within a file.
//!
//! There is no end of file character. The end of file is modeled using
//! the `None` case of `Option`.
use super::{AsciiFile, PositionIterator, Span};
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display},
};

#[derive(Copy, Clone)]
pub struct Position<'t> {
    byte_offset: usize,
    file: &'t AsciiFile<'t>,
}

impl<'t> Position<'t> {
    /// Create a new Position pointing at the first character
    /// of a file. Returns `None` for empty files.
    pub fn at_file_start(file: &'t AsciiFile<'t>) -> Option<Self> {
        if file.is_empty() {
            None
        } else {
            Some(Self {
                byte_offset: 0,
                file,
            })
        }
    }

    pub fn to_single_char_span(self) -> Span<'t> {
        Span::from_single_position(self)
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn file(&self) -> &'t AsciiFile<'t> {
        self.file
    }

    pub fn chr(&self) -> char {
        self.byte() as char
    }

    pub fn byte(&self) -> u8 {
        self.file.as_bytes()[self.byte_offset]
    }

    /// Zero based row of the character. Newlines belong to the line they
    /// terminate.
    pub fn row(&self) -> usize {
        self.file.as_bytes()[..self.byte_offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
    }

    pub fn line_number(&self) -> usize {
        self.row() + 1
    }

    /// Zero based column of the character within its line.
    pub fn column(&self) -> usize {
        self.byte_offset - self.line_start_offset()
    }

    fn line_start_offset(&self) -> usize {
        self.file.as_bytes()[..self.byte_offset]
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|idx| idx + 1)
            .unwrap_or(0)
    }

    /// The source line containing this position, without the trailing
    /// newline character.
    pub fn line_str(&self) -> &'t str {
        let bytes = self.file.as_bytes();
        let start = self.line_start_offset();
        let end = bytes[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|idx| idx + start)
            .unwrap_or_else(|| bytes.len());
        &self.file.as_str()[start..end]
    }

    /// Get the position immediately following this position or `None` if
    /// this is the last position in the file.
    pub fn next(&self) -> Option<Position<'t>> {
        if self.byte_offset + 1 < self.file.len() {
            Some(Position {
                byte_offset: self.byte_offset + 1,
                file: self.file,
            })
        } else {
            None
        }
    }

    pub fn iter(&self) -> PositionIterator<'t> {
        PositionIterator::new(Some(*self))
    }
}

impl PartialOrd for Position<'_> {
    fn partial_cmp(&self, other: &Position<'_>) -> Option<Ordering> {
        if !std::ptr::eq(self.file, other.file) {
            return None;
        }
        Some(self.byte_offset.cmp(&other.byte_offset))
    }
}

impl Ord for Position<'_> {
    fn cmp(&self, other: &Position<'_>) -> Ordering {
        debug_assert!(std::ptr::eq(self.file, other.file));
        self.byte_offset.cmp(&other.byte_offset)
    }
}

impl PartialEq for Position<'_> {
    fn eq(&self, rhs: &Position<'_>) -> bool {
        self.byte_offset == rhs.byte_offset && std::ptr::eq(self.file, rhs.file)
    }
}

impl Eq for Position<'_> {}

impl Display for Position<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}:{}", self.line_number(), self.column())
    }
}

impl Debug for Position<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "Position{{row: {:?}, col: {:?}, byte_offset: {:?}}}",
            self.row(),
            self.column(),
            self.byte_offset,
        )
    }
}
