use crate::{MaybeSpanned, Span};
use std::{fmt, ops::Deref};

/// A value together with the range of the input it was created from.
#[derive(Debug, Clone, Copy)]
pub struct Spanned<'f, T> {
    pub span: Span<'f>,
    pub data: T,
}

impl<T> PartialEq for Spanned<'_, T>
where
    T: PartialEq,
{
    /// Only the data is compared, two spanned values are equal even if
    /// they point to different spans of the source file.
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<'f, T> Deref for Spanned<'f, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> fmt::Display for Spanned<'_, T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.data, self.span)
    }
}

impl<'f, T> Spanned<'f, T> {
    pub fn new(span: Span<'f>, data: T) -> Self {
        Spanned { span, data }
    }
}

impl<'f, T> From<Spanned<'f, T>> for MaybeSpanned<'f, T> {
    fn from(spanned: Spanned<'f, T>) -> Self {
        MaybeSpanned::WithSpan(spanned)
    }
}
