//! Backtracking matcher.
//!
//! Each element reports its candidate matches, in preference order, to a
//! continuation that decides whether the rest of the grammar can follow. The
//! first candidate the continuation accepts wins. Sequences backtrack
//! fully. Repetitions are collected iteratively, each iteration settling on
//! its first candidate, and the repetition gives back one iteration at a
//! time when the rest of the grammar fails. Ordered choice commits to the
//! first alternative that matches on its own.
//!
//! Continuations nest on the call stack, so the nesting depth is bounded by
//! [`MatchLimits::max_depth`] and never by the length of the input.

use std::cell::Cell;

use super::{default_leaf_tag, Element, Kind, Node};
use crate::{GrammarContext, MatchLimits, ResultNode, Token, TokenStream};

/// End position and produced nodes of an accepted match.
pub(super) type Found = (usize, Vec<ResultNode>);

type Cont<'k> = dyn FnMut(usize, Vec<ResultNode>) -> Option<Found> + 'k;

pub(super) struct Matcher<'a> {
    stream: &'a TokenStream,
    context: &'a GrammarContext,
    limits: MatchLimits,
    steps: Cell<usize>,
    depth: Cell<usize>,
    exhausted: Cell<bool>,
}

impl<'a> Matcher<'a> {
    pub(super) fn new(stream: &'a TokenStream, context: &'a GrammarContext) -> Self {
        Matcher {
            stream,
            context,
            limits: context.limits(),
            steps: Cell::new(0),
            depth: Cell::new(0),
            exhausted: Cell::new(false),
        }
    }

    /// Whether the step or depth budget ran out during the last attempt.
    pub(super) fn exhausted(&self) -> bool {
        self.exhausted.get()
    }

    pub(super) fn first(&self, element: &Element, position: usize) -> Option<Found> {
        self.run(element, position, &mut |end, nodes| Some((end, nodes)))
    }

    pub(super) fn full(&self, element: &Element) -> Option<Found> {
        let len = self.stream.len();
        self.run(element, 0, &mut |end, nodes| {
            if end == len {
                Some((end, nodes))
            } else {
                None
            }
        })
    }

    fn tick(&self) -> bool {
        let steps = self.steps.get() + 1;
        self.steps.set(steps);
        if steps > self.limits.max_steps {
            self.exhausted.set(true);
            return false;
        }
        true
    }

    fn token(&self, position: usize) -> Option<&'a Token> {
        self.stream.get(position)
    }

    fn end_of(&self, element: &Element, position: usize) -> Option<usize> {
        self.first(element, position).map(|(end, _)| end)
    }

    fn run(&self, element: &Element, position: usize, k: &mut Cont<'_>) -> Option<Found> {
        if !self.tick() {
            return None;
        }
        let depth = self.depth.get();
        if depth >= self.limits.max_depth {
            self.exhausted.set(true);
            return None;
        }
        self.depth.set(depth + 1);
        let found = self.run_node(element, position, k);
        self.depth.set(depth);
        found
    }

    fn run_node(&self, element: &Element, position: usize, k: &mut Cont<'_>) -> Option<Found> {
        let node = &*element.node;
        if node.is_plain() {
            return self.run_kind(node, position, k);
        }
        self.run_kind(node, position, &mut |end, nodes| {
            let nodes = node.finish(self.stream, position, end, nodes)?;
            k(end, nodes)
        })
    }

    fn leaf(&self, node: &Node, position: usize, text: &str) -> Vec<ResultNode> {
        vec![ResultNode::leaf(
            node.leaf_tag(self.stream, position),
            text,
            position,
            position + 1,
        )]
    }

    fn run_kind(&self, node: &Node, position: usize, k: &mut Cont<'_>) -> Option<Found> {
        match &node.kind {
            Kind::Word(word) => {
                let token = self.token(position).filter(|token| token.text() == word.as_str())?;
                k(position + 1, self.leaf(node, position, token.text()))
            }
            Kind::CaselessWord(word) => {
                let token = self
                    .token(position)
                    .filter(|token| token.text().to_lowercase() == *word)?;
                k(position + 1, self.leaf(node, position, token.text()))
            }
            Kind::Regex { regex, group, .. } => {
                let token = self.token(position)?;
                let captures = regex.captures(token.text())?;
                let text = match group {
                    Some(group) => captures.get(*group)?.as_str(),
                    None => token.text(),
                };
                k(position + 1, self.leaf(node, position, text))
            }
            Kind::Tag { tag_type, tag } => {
                let token = self
                    .token(position)
                    .filter(|token| token.tag(tag_type) == Some(tag.as_str()))?;
                k(position + 1, self.leaf(node, position, token.text()))
            }
            Kind::Any => {
                let token = self.token(position)?;
                k(position + 1, self.leaf(node, position, token.text()))
            }
            Kind::NoMatch => None,
            Kind::Start => {
                if position == 0 {
                    k(position, Vec::new())
                } else {
                    None
                }
            }
            Kind::End => {
                if position == self.stream.len() {
                    k(position, Vec::new())
                } else {
                    None
                }
            }
            Kind::And(exprs) => self.run_sequence(exprs, position, Vec::new(), k),
            Kind::Or(exprs) => self.run_choice(exprs.iter(), position, k),
            Kind::Extensible { key, base } => {
                let alternatives = std::iter::once(base).chain(self.context.alternatives(key));
                self.run_choice(alternatives, position, k)
            }
            Kind::Every(exprs) => self.run_every(exprs, position, k),
            Kind::Repeat { expr, min } => self.run_repeat(expr, *min, position, k),
            Kind::Optional(expr) => {
                let found = self.run(expr, position, &mut *k);
                if found.is_some() {
                    return found;
                }
                k(position, Vec::new())
            }
            Kind::Not(expr) => {
                if self.end_of(expr, position).is_some() {
                    None
                } else {
                    k(position, Vec::new())
                }
            }
            Kind::FollowedBy(expr) => {
                self.end_of(expr, position)?;
                k(position, Vec::new())
            }
            Kind::Group(expr) => self.run(expr, position, k),
            Kind::SkipTo(expr) => {
                let target = (position..=self.stream.len()).find(|&target| self.end_of(expr, target).is_some())?;
                let skipped = (position..target)
                    .map(|idx| {
                        ResultNode::leaf(
                            default_leaf_tag(self.stream, idx),
                            self.stream[idx].text(),
                            idx,
                            idx + 1,
                        )
                    })
                    .collect();
                k(target, skipped)
            }
        }
    }

    fn run_sequence(
        &self,
        exprs: &[Element],
        position: usize,
        acc: Vec<ResultNode>,
        k: &mut Cont<'_>,
    ) -> Option<Found> {
        match exprs.split_first() {
            None => k(position, acc),
            Some((head, rest)) => self.run(head, position, &mut |end, nodes| {
                let mut next = acc.clone();
                next.extend(nodes);
                self.run_sequence(rest, end, next, &mut *k)
            }),
        }
    }

    /// Commit to the first alternative that produces any candidate, even if
    /// the continuation then rejects all of its candidates.
    fn run_choice<'e>(
        &self,
        alternatives: impl Iterator<Item = &'e Element>,
        position: usize,
        k: &mut Cont<'_>,
    ) -> Option<Found> {
        for alternative in alternatives {
            let mut matched = false;
            let found = self.run(alternative, position, &mut |end, nodes| {
                matched = true;
                k(end, nodes)
            });
            if matched {
                return found;
            }
        }
        None
    }

    fn run_every(&self, exprs: &[Element], position: usize, k: &mut Cont<'_>) -> Option<Found> {
        let mut defining = None;
        for expr in exprs {
            let end = self.end_of(expr, position)?;
            if end > position && defining.is_none() {
                defining = Some(expr);
            }
        }
        match defining {
            Some(expr) => self.run(expr, position, k),
            None => k(position, Vec::new()),
        }
    }

    /// Take iterations greedily, then offer the continuation every count
    /// from the longest down to `min`.
    fn run_repeat(&self, expr: &Element, min: usize, position: usize, k: &mut Cont<'_>) -> Option<Found> {
        let mut ends = vec![position];
        let mut iterations: Vec<Vec<ResultNode>> = Vec::new();
        let mut end = position;
        while iterations.len() < self.limits.max_repetitions {
            let (next, nodes) = match self.first(expr, end) {
                Some(found) => found,
                None => break,
            };
            iterations.push(nodes);
            ends.push(next);
            if next == end {
                // a zero-width iteration ends the repetition
                break;
            }
            end = next;
        }

        for count in (min..=iterations.len()).rev() {
            let nodes = iterations[..count].iter().flatten().cloned().collect();
            if let Some(found) = k(ends[count], nodes) {
                return Some(found);
            }
        }
        None
    }
}
