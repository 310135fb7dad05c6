use crate::{Position, Span};

#[derive(Copy, Clone, Debug)]
pub struct PositionIterator<'t> {
    /// Always points to the next position to emit
    position_to_emit: Option<Position<'t>>,
}

impl<'t> Iterator for PositionIterator<'t> {
    type Item = Position<'t>;
    fn next(&mut self) -> Option<Position<'t>> {
        let position = self.position_to_emit?;
        self.position_to_emit = position.next();
        Some(position)
    }
}

impl<'t> PositionIterator<'t> {
    pub fn new(position: Option<Position<'t>>) -> Self {
        Self {
            position_to_emit: position,
        }
    }

    /// Look at the next `n` characters without advancing the iterator.
    /// If there are less than `n` characters, return `None`.
    pub fn peek_exactly(&self, n: usize) -> Option<Span<'t>> {
        self.peek_at_most(n).filter(|span| span.len() == n)
    }

    /// Look at the next `n` characters without advancing the iterator.
    ///
    /// The returned span is shortened if less than `n` characters are left.
    /// There is no span at all if the input is exhausted.
    pub fn peek_at_most(&self, n: usize) -> Option<Span<'t>> {
        debug_assert!(n >= 1);
        let span_start = self.position_to_emit?;
        let span_end = self.take(n).last()?;
        Some(Span::new(span_start, span_end))
    }

    pub fn matches(&self, wanted: &str) -> bool {
        match self.peek_exactly(wanted.len()) {
            None => wanted.is_empty(),
            Some(span) => span.as_str() == wanted,
        }
    }

    pub fn peek(&self) -> Option<Position<'t>> {
        self.position_to_emit
    }
}

#[cfg(test)]
mod tests {
    use crate::AsciiFile;

    #[test]
    fn peeking_does_not_advance() {
        let file = AsciiFile::new(b"abc").unwrap();
        let mut iter = file.iter();
        let peeked_once = iter.peek();
        let peeked_twice = iter.peek();
        assert_eq!(peeked_once, peeked_twice);
        assert_eq!(peeked_once, iter.next());
    }

    #[test]
    fn peek_multiple_chars() {
        let input = "one\ntwo";
        let file = AsciiFile::new(input.as_bytes()).unwrap();
        let iter = file.iter();

        assert_eq!(input, iter.peek_exactly(input.len()).unwrap().as_str());
        assert!(iter.peek_exactly(input.len() + 1).is_none());
        assert_eq!(input, iter.peek_at_most(100).unwrap().as_str());
        assert!(iter.matches("one"));
        assert!(!iter.matches("two"));
    }
}
