use crate::{Span, Spanned};
use std::{fmt, ops::Deref};

/// Errors found at the end of the input have no span to point at.
#[derive(Debug, Clone)]
pub enum MaybeSpanned<'a, T> {
    WithoutSpan(T),
    WithSpan(Spanned<'a, T>),
}

impl<'a, T> MaybeSpanned<'a, T> {
    pub fn span(&self) -> Option<Span<'a>> {
        match self {
            MaybeSpanned::WithoutSpan(_) => None,
            MaybeSpanned::WithSpan(spanned) => Some(spanned.span),
        }
    }

    pub fn into_data(self) -> T {
        match self {
            MaybeSpanned::WithoutSpan(data) => data,
            MaybeSpanned::WithSpan(spanned) => spanned.data,
        }
    }
}

impl<'a, T> Deref for MaybeSpanned<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            MaybeSpanned::WithoutSpan(data) => data,
            MaybeSpanned::WithSpan(spanned) => &spanned.data,
        }
    }
}

impl<T> fmt::Display for MaybeSpanned<'_, T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeSpanned::WithoutSpan(data) => write!(f, "{}", data),
            MaybeSpanned::WithSpan(spanned) => write!(f, "{}", spanned),
        }
    }
}
