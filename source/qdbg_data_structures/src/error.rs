// Source-span-aware error wrapping: errors carry a byte span into the
// original program text so a frontend can underline them.

use crate::span::Span;
use miette::{Diagnostic, LabeledSpan, SourceCode};
use std::sync::Arc;

/// Wraps an inner error with the source text and a span to label, so that
/// `miette`'s pretty-printer can point at the offending snippet.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{error}")]
pub struct WithSource<E: std::error::Error> {
    source_code: Arc<str>,
    span: Span,
    error: E,
}

impl<E: std::error::Error> WithSource<E> {
    pub fn new(source_code: impl Into<Arc<str>>, error: E, span: Span) -> Self {
        Self {
            source_code: source_code.into(),
            span,
            error,
        }
    }

    #[must_use]
    pub fn error(&self) -> &E {
        &self.error
    }
}

impl<E: std::error::Error + 'static> Diagnostic for WithSource<E> {
    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source_code)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let len = usize::try_from(self.span.len()).unwrap_or(0);
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(self.error.to_string()),
            self.span.lo as usize,
            len,
        ))))
    }
}
