use crate::ast::Span;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Error while applying removal ranges
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// Range end precedes range start
    #[error("Inverted range {start}..{end}")]
    InvertedRange { start: usize, end: usize },

    /// Range extends past the end of the source
    #[error("Range {start}..{end} out of bounds: source length is {source_len}")]
    OutOfBounds {
        start: usize,
        end: usize,
        source_len: usize,
    },

    /// Range boundary falls inside a multi-byte character
    #[error("Range {start}..{end} does not fall on character boundaries")]
    NotCharBoundary { start: usize, end: usize },
}

/// Removal-only text rewriter.
///
/// Collects an unordered stream of byte ranges to excise, possibly
/// overlapping or duplicated, and applies them all in one consolidation
/// step: overlapping requests are coalesced, every requested byte is absent
/// from the output, and all other bytes are preserved verbatim. Request
/// order never affects the result.
#[derive(Debug, Clone)]
pub struct SmartRewriter {
    source: String,
    ranges: Vec<Span>,
}

impl SmartRewriter {
    /// Create a rewriter for the given source
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ranges: Vec::new(),
        }
    }

    /// Request removal of a byte range
    pub fn remove_range(&mut self, span: Span) {
        if !span.is_empty() {
            self.ranges.push(span);
        }
    }

    /// Request removal of `start..end`
    pub fn remove(&mut self, start: usize, end: usize) {
        self.remove_range(Span::new(start, end));
    }

    /// Request removal of several ranges at once
    pub fn remove_all(&mut self, ranges: impl IntoIterator<Item = Span>) {
        for span in ranges {
            self.remove_range(span);
        }
    }

    /// Number of pending removal requests (before consolidation)
    pub fn request_count(&self) -> usize {
        self.ranges.len()
    }

    /// Check whether a range lies entirely inside some requested removal
    pub fn is_range_removed(&self, span: &Span) -> bool {
        self.coalesced().iter().any(|r| r.contains(span))
    }

    /// Consolidate the pending requests into disjoint, sorted ranges
    fn coalesced(&self) -> Vec<Span> {
        let mut sorted = self.ranges.clone();
        sorted.sort_by_key(|span| (span.start, span.end));

        let mut merged: Vec<Span> = Vec::with_capacity(sorted.len());
        for span in sorted {
            match merged.last_mut() {
                Some(last) if span.start <= last.end => {
                    last.end = last.end.max(span.end);
                }
                _ => merged.push(span),
            }
        }
        merged
    }

    /// Validate pending requests without applying them
    pub fn validate(&self) -> Result<(), RewriteError> {
        for span in &self.ranges {
            if span.start > span.end {
                return Err(RewriteError::InvertedRange {
                    start: span.start,
                    end: span.end,
                });
            }
            if span.end > self.source.len() {
                return Err(RewriteError::OutOfBounds {
                    start: span.start,
                    end: span.end,
                    source_len: self.source.len(),
                });
            }
            if !self.source.is_char_boundary(span.start) || !self.source.is_char_boundary(span.end)
            {
                return Err(RewriteError::NotCharBoundary {
                    start: span.start,
                    end: span.end,
                });
            }
        }
        Ok(())
    }

    /// Apply all removal requests and return the resulting source
    pub fn apply(self) -> Result<String, RewriteError> {
        self.validate()?;

        let merged = self.coalesced();
        debug!(
            "Applying {} removal requests ({} after coalescing)",
            self.ranges.len(),
            merged.len()
        );

        let mut result = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for span in merged {
            result.push_str(&self.source[cursor..span.start]);
            cursor = span.end;
        }
        result.push_str(&self.source[cursor..]);

        Ok(result)
    }
}

/// Apply removal ranges to a file in place
pub fn rewrite_file(path: &Path, ranges: impl IntoIterator<Item = Span>) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;

    let mut rewriter = SmartRewriter::new(contents);
    rewriter.remove_all(ranges);
    let rewritten = rewriter.apply().into_diagnostic()?;

    std::fs::write(path, rewritten)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
