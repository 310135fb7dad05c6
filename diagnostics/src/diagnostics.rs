//! The diagnostics object controls the output of warnings and errors generated
//! by the compiler during the lexing, parsing and semantic analysis phases.
//! It also tracks the number of warnings and errors generated for flow control.
//!
//! This implementation is NOT thread-safe.
use asciifile::{MaybeSpanned, Span, Spanned};
use std::{ascii::escape_default, cell::RefCell, collections::HashMap, fmt::Display};
use termcolor::{Color, ColorSpec, WriteColor};

/// Instead of writing errors and warnings generated in the different
/// compiler stages directly to stdout, they are collected in this object.
///
/// This has several advantages:
/// - the output level can be adapted by users.
/// - we have a single source responsible for formatting compiler messages.
pub struct Diagnostics {
    message_count: RefCell<HashMap<MessageLevel, usize>>,
    writer: RefCell<Box<dyn WriteColor>>,
}

/// Anything that can be reported, with or without a location in the source.
pub trait Printable<'a, 'b> {
    fn as_maybe_spanned(&'b self) -> MaybeSpanned<'a, &'b dyn Display>;
}

impl<'a, 'b, T: Display + 'b> Printable<'a, 'b> for Spanned<'a, T> {
    fn as_maybe_spanned(&'b self) -> MaybeSpanned<'a, &'b dyn Display> {
        MaybeSpanned::WithSpan(Spanned {
            span: self.span,
            data: &self.data,
        })
    }
}

impl<'a, 'b, T: Display + 'b> Printable<'a, 'b> for MaybeSpanned<'a, T> {
    fn as_maybe_spanned(&'b self) -> MaybeSpanned<'a, &'b dyn Display> {
        match self {
            MaybeSpanned::WithSpan(spanned) => spanned.as_maybe_spanned(),
            MaybeSpanned::WithoutSpan(data) => MaybeSpanned::WithoutSpan(data),
        }
    }
}

impl Diagnostics {
    pub fn new(writer: Box<dyn WriteColor>) -> Self {
        Self {
            writer: RefCell::new(writer),
            message_count: RefCell::new(HashMap::new()),
        }
    }

    /// True when an error message was emitted, false
    /// if only warnings were emitted.
    pub fn errored(&self) -> bool {
        self.count(MessageLevel::Error) > 0
    }

    pub fn count(&self, level: MessageLevel) -> usize {
        self.message_count
            .borrow()
            .get(&level)
            .cloned()
            .unwrap_or(0)
    }

    pub fn write_statistics(&self) {
        let mut writer = self.writer.borrow_mut();
        let mut output = ColorOutput::new(&mut **writer);

        output.set_bold(true);

        if self.errored() {
            output.set_color(MessageLevel::Error.color());
            writeln!(
                output.writer(),
                "Compilation aborted due to {}",
                match self.count(MessageLevel::Error) {
                    1 => "an error".to_string(),
                    n => format!("{} errors", n),
                }
            )
            .ok();
        } else {
            output.set_color(Some(Color::Green));
            writeln!(
                output.writer(),
                "Compilation finished successfully {}",
                match self.count(MessageLevel::Warning) {
                    0 => "without warnings".to_string(),
                    1 => "with a warning".to_string(),
                    n => format!("with {} warnings", n),
                }
            )
            .ok();
        }
    }

    /// Generate an error or a warning that is printed to the
    /// writer given in the `new` constructor. Most of the time
    /// this will be stderr.
    pub fn emit(&self, level: MessageLevel, kind: MaybeSpanned<'_, &dyn Display>) {
        self.increment_level_count(level);
        let mut writer = self.writer.borrow_mut();

        match kind {
            MaybeSpanned::WithoutSpan(message) => {
                Message { level, message }.write_colored(&mut **writer)
            }
            MaybeSpanned::WithSpan(spanned) => Message {
                level,
                message: spanned.data,
            }
            .write_colored_with_code(&mut **writer, &spanned.span),
        }
    }

    pub fn warning<'a, 'b, P: Printable<'a, 'b> + ?Sized>(&self, kind: &'b P) {
        self.emit(MessageLevel::Warning, kind.as_maybe_spanned())
    }

    pub fn error<'a, 'b, P: Printable<'a, 'b> + ?Sized>(&self, kind: &'b P) {
        self.emit(MessageLevel::Error, kind.as_maybe_spanned())
    }

    fn increment_level_count(&self, level: MessageLevel) {
        let mut message_count = self.message_count.borrow_mut();
        *message_count.entry(level).or_insert(0) += 1;
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MessageLevel {
    Error,
    Warning,
}

impl MessageLevel {
    fn color(self) -> Option<Color> {
        // `None` means default color
        match self {
            MessageLevel::Error => Some(Color::Red),
            MessageLevel::Warning => Some(Color::Yellow),
        }
    }

    fn name(self) -> &'static str {
        match self {
            MessageLevel::Error => "error",
            MessageLevel::Warning => "warning",
        }
    }
}

struct Message<'m> {
    level: MessageLevel,
    message: &'m dyn Display,
}

/// Calls to functions should pass the raw writer, each function should
/// create its own ColorOutput object that is dropped on return. This
/// guarantees correct coloring in nested calls.
struct ColorOutput<'a> {
    writer: &'a mut dyn WriteColor,
    spec: ColorSpec,
}

impl<'a> ColorOutput<'a> {
    fn new(writer: &'a mut dyn WriteColor) -> Self {
        writer.reset().ok();

        Self {
            writer,
            spec: ColorSpec::new(),
        }
    }

    fn set_color(&mut self, color: Option<Color>) {
        // coloring failures are ignored
        self.spec.set_fg(color);
        self.writer.set_color(&self.spec).ok();
    }

    fn set_bold(&mut self, yes: bool) {
        self.spec.set_bold(yes);
        self.writer.set_color(&self.spec).ok();
    }

    fn writer(&mut self) -> &mut dyn WriteColor {
        self.writer
    }
}

/// Reset to no color, otherwise code that is not color aware
/// will print everything in the color last used.
impl<'a> Drop for ColorOutput<'a> {
    fn drop(&mut self) {
        self.writer.reset().ok();
    }
}

const MAX_CONTEXT_LENGTH: usize = 80;
const TAB_WIDTH: usize = 4;
const HIGHLIGHT: Option<Color> = Some(Color::Cyan);

impl Message<'_> {
    fn write_colored(&self, writer: &mut dyn WriteColor) {
        self.write_colored_header(writer);
        writeln!(writer).ok();
    }

    fn write_colored_header(&self, writer: &mut dyn WriteColor) {
        let mut output = ColorOutput::new(writer);
        output.set_color(self.level.color());
        output.set_bold(true);
        write!(output.writer(), "{}: ", self.level.name()).ok();

        output.set_color(None);
        writeln!(output.writer(), "{}", self.message).ok();
    }

    /// Print the first line of `span` with markers below the characters the
    /// span covers. Multiline spans are marked until the end of their
    /// first line.
    fn write_colored_with_code(&self, writer: &mut dyn WriteColor, span: &Span<'_>) {
        self.write_colored_header(writer);

        let mut output = ColorOutput::new(writer);

        let start = span.start_position();
        let line_number = start.line_number().to_string();
        let empty_line_marker = format!(" {} | ", " ".repeat(line_number.len()));

        output.set_color(HIGHLIGHT);
        output.set_bold(true);
        writeln!(output.writer(), "{}", empty_line_marker).ok();
        write!(output.writer(), " {} | ", line_number).ok();

        let line = start.line_str();
        let truncated = line.len() > MAX_CONTEXT_LENGTH.max(start.column() + 1);
        let shown = if truncated {
            &line[..MAX_CONTEXT_LENGTH.max(start.column() + 1)]
        } else {
            line
        };

        output.set_color(None);
        output.set_bold(false);
        let formatter = LineFormatter::new(shown);
        formatter.render(output.writer());

        if truncated {
            output.set_color(HIGHLIGHT);
            output.set_bold(true);
            write!(output.writer(), "...").ok();
        }
        writeln!(output.writer()).ok();

        let marker_end = if span.is_multiline() {
            shown.len()
        } else {
            (span.end_position().column() + 1).min(shown.len())
        };

        output.set_color(HIGHLIGHT);
        output.set_bold(true);
        write!(output.writer(), "{}", empty_line_marker).ok();

        let start_col = formatter.actual_column(start.column().min(shown.len()));
        let markers = formatter
            .actual_column(marker_end)
            .saturating_sub(start_col)
            .max(1);

        output.set_color(self.level.color());
        writeln!(
            output.writer(),
            "{}{}",
            " ".repeat(start_col),
            "^".repeat(markers)
        )
        .ok();
        writeln!(output.writer()).ok();
    }
}

pub fn u8_to_printable_representation(byte: u8) -> String {
    escape_default(byte).map(|b| b as char).collect()
}

struct LineFormatter<'a> {
    line: &'a str,
}

impl<'a> LineFormatter<'a> {
    fn new(line: &'a str) -> Self {
        Self { line }
    }

    fn render(&self, writer: &mut dyn WriteColor) {
        let mut output = ColorOutput::new(writer);

        for chr in self.line.chars() {
            let (text, color) = Self::render_char(chr);
            output.set_color(color);
            write!(output.writer(), "{}", text).ok();
        }
    }

    /// Tabs and control characters do not take up a single monospace grid
    /// cell. Returns the number of cells rendered before `col`.
    fn actual_column(&self, col: usize) -> usize {
        self.line[0..col.min(self.line.len())]
            .chars()
            .map(|chr| Self::render_char(chr).0.len())
            .sum()
    }

    fn render_char(chr: char) -> (String, Option<Color>) {
        match chr {
            '\t' => (" ".repeat(TAB_WIDTH), None),
            '\r' => ("".to_string(), None),
            chr if chr.is_control() => (
                format!("{{{}}}", u8_to_printable_representation(chr as u8)),
                HIGHLIGHT,
            ),
            _ => (chr.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use std::{
        io::{self, Write},
        rc::Rc,
    };
    use termcolor::{ColorSpec, WriteColor};

    /// Collects everything written into a buffer shared with the test.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl WriteColor for SharedBuffer {
        fn supports_color(&self) -> bool {
            false
        }

        fn set_color(&mut self, _spec: &ColorSpec) -> io::Result<()> {
            Ok(())
        }

        fn reset(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    #[test]
    fn counts_messages_per_level() {
        let buffer = SharedBuffer::default();
        let diagnostics = Diagnostics::new(Box::new(buffer.clone()));

        diagnostics.warning(&MaybeSpanned::WithoutSpan("careful"));
        assert!(!diagnostics.errored());
        diagnostics.error(&MaybeSpanned::WithoutSpan("broken"));
        diagnostics.error(&MaybeSpanned::WithoutSpan("broken again"));

        assert!(diagnostics.errored());
        assert_eq!(1, diagnostics.count(MessageLevel::Warning));
        assert_eq!(2, diagnostics.count(MessageLevel::Error));

        diagnostics.write_statistics();
        let output = buffer.contents();
        assert!(output.contains("warning: careful"));
        assert!(output.contains("error: broken again"));
        assert!(output.contains("Compilation aborted due to 2 errors"));
    }

    #[test]
    fn marks_span_in_source_line() {
        let file = AsciiFile::new(b"class A {\n\tint x\n}").unwrap();
        let start = file.iter().nth(15).unwrap();
        let span = start.to_single_char_span();
        assert_eq!("x", span.as_str());

        let buffer = SharedBuffer::default();
        let diagnostics = Diagnostics::new(Box::new(buffer.clone()));
        diagnostics.error(&Spanned::new(span, "expected `;`"));

        let expected = "error: expected `;`\n   | \n 2 |     int x\n   |         ^\n\n";
        assert_eq!(expected, buffer.contents());
    }

    #[test]
    fn successful_statistics() {
        let buffer = SharedBuffer::default();
        let diagnostics = Diagnostics::new(Box::new(buffer.clone()));
        diagnostics.write_statistics();
        assert_eq!(
            "Compilation finished successfully without warnings\n",
            buffer.contents()
        );
    }

    #[test]
    fn printable_representation() {
        assert_eq!("\\n", u8_to_printable_representation(b'\n'));
        assert_eq!("a", u8_to_printable_representation(b'a'));
    }
}
