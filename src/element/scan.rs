use std::iter::FusedIterator;

use super::matching::Matcher;
use super::Element;
use crate::{GrammarContext, Match, TokenStream};

/// Lazy sequence of matches of one element over one stream.
///
/// Single pass: the iterator owns a cursor into the stream and cannot be
/// restarted. Calling [`Element::scan`] again rescans from the beginning and
/// yields the same matches, since grammars carry no mutable state.
/// Zero-width matches are never yielded.
pub struct Scan<'a> {
    element: &'a Element,
    stream: &'a TokenStream,
    context: &'a GrammarContext,
    position: usize,
    overlapping: bool,
}

impl<'a> Scan<'a> {
    pub(super) fn new(
        element: &'a Element,
        stream: &'a TokenStream,
        context: &'a GrammarContext,
        overlapping: bool,
    ) -> Self {
        Scan {
            element,
            stream,
            context,
            position: 0,
            overlapping,
        }
    }
}

impl<'a> Iterator for Scan<'a> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        while self.position < self.stream.len() {
            let start = self.position;
            let matcher = Matcher::new(self.stream, self.context);
            let found = matcher.first(self.element, start);
            if matcher.exhausted() {
                tracing::warn!(start, grammar = ?self.element, "match budget exhausted");
            }
            match found {
                Some((end, nodes)) if end > start => {
                    self.position = if self.overlapping { start + 1 } else { end };
                    return Some(Match { nodes, start, end });
                }
                _ => {
                    tracing::trace!(start, "no match");
                    self.position = start + 1;
                }
            }
        }
        None
    }
}

impl<'a> FusedIterator for Scan<'a> {}
