//! All state shared by the lexer, parser and semantic analysis phases.
use asciifile::AsciiFile;
use diagnostics::Diagnostics;
use termcolor::WriteColor;

pub struct Context<'m> {
    pub file: &'m AsciiFile<'m>,
    pub diagnostics: Diagnostics,
}

impl<'m> Context<'m> {
    pub fn new(file: &'m AsciiFile<'m>, writer: Box<dyn WriteColor>) -> Self {
        Self {
            file,
            diagnostics: Diagnostics::new(writer),
        }
    }

    /// A context whose diagnostics go nowhere observable.
    pub fn dummy(file: &'m AsciiFile<'m>) -> Self {
        Self::new(file, Box::new(dummy_writer()))
    }
}

/// dummy_writer returns a WriteColor meant for use in tests.
pub fn dummy_writer() -> impl WriteColor {
    termcolor::Buffer::no_color()
}
