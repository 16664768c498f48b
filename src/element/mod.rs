//! Parser elements: immutable, shareable grammar nodes.
//!
//! An [`Element`] is a cheap handle (`Arc`) onto a node of a combinator
//! expression. Combining elements never mutates them, so one element can be
//! reused in many larger grammars. Naming, hiding, actions and conditions
//! return a modified copy of the node that shares its children.
//!
//! ```
//! use layered_extract::{create_stream_from_string, i, optional, w, actions, GrammarContext};
//!
//! let specifier = (optional(w("internal")) + (i("photoluminescence") | w("PL")) + i("quantum") + i("yield"))
//!     .with_action(actions::join)
//!     .named("specifier");
//!
//! let stream = create_stream_from_string("The PL quantum yield was high");
//! let context = GrammarContext::new();
//! let found: Vec<_> = specifier.scan(&stream, &context).collect();
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].to_xml(), "<specifier>PL quantum yield</specifier>");
//! ```

mod matching;
mod scan;

use std::fmt;
use std::ops::{Add, BitOr};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{GrammarContext, GrammarError, GrammarResult, Match, ResultNode, TokenStream, POS_TAG};

pub use scan::Scan;

use matching::Matcher;

/// Post-processes the nodes produced by a successful match.
pub type Action = Arc<dyn Fn(&TokenStream, usize, Vec<ResultNode>) -> Vec<ResultNode> + Send + Sync>;

/// Accepts or rejects the (already post-processed) nodes of a match.
pub type Condition = Arc<dyn Fn(&[ResultNode]) -> bool + Send + Sync>;

static EMPTY_CONTEXT: Lazy<GrammarContext> = Lazy::new(GrammarContext::default);

/// A node in a grammar expression.
#[derive(Clone)]
pub struct Element {
    node: Arc<Node>,
}

#[derive(Clone)]
struct Node {
    kind: Kind,
    name: Option<String>,
    actions: Vec<Action>,
    conditions: Vec<Condition>,
    hidden: bool,
}

#[derive(Clone)]
enum Kind {
    Word(String),
    CaselessWord(String),
    Regex {
        pattern: String,
        regex: Regex,
        group: Option<usize>,
    },
    Tag {
        tag_type: String,
        tag: String,
    },
    Any,
    NoMatch,
    Start,
    End,
    And(Vec<Element>),
    Or(Vec<Element>),
    Every(Vec<Element>),
    Repeat {
        expr: Element,
        min: usize,
    },
    Optional(Element),
    Not(Element),
    FollowedBy(Element),
    Group(Element),
    SkipTo(Element),
    Extensible {
        key: String,
        base: Element,
    },
}

impl Kind {
    /// Terminals produce one leaf per token, tagged with the element name.
    fn is_terminal(&self) -> bool {
        matches!(
            self,
            Kind::Word(_) | Kind::CaselessWord(_) | Kind::Regex { .. } | Kind::Tag { .. } | Kind::Any
        )
    }
}

impl Node {
    fn new(kind: Kind) -> Self {
        Node {
            kind,
            name: None,
            actions: Vec::new(),
            conditions: Vec::new(),
            hidden: false,
        }
    }

    /// No name, actions, conditions or hiding: the raw kind result is final.
    fn is_plain(&self) -> bool {
        self.name.is_none() && self.actions.is_empty() && self.conditions.is_empty() && !self.hidden
    }

    fn leaf_tag<'a>(&'a self, stream: &'a TokenStream, idx: usize) -> &'a str {
        match &self.name {
            Some(name) => name,
            None => default_leaf_tag(stream, idx),
        }
    }

    /// Apply naming, actions, conditions and hiding, in that order.
    fn finish(
        &self,
        stream: &TokenStream,
        start: usize,
        end: usize,
        mut results: Vec<ResultNode>,
    ) -> Option<Vec<ResultNode>> {
        if let Some(name) = &self.name {
            if !self.kind.is_terminal() {
                results = vec![ResultNode::branch(name.as_str(), results, start, end)];
            }
        }
        for action in &self.actions {
            results = action(stream, start, results);
        }
        if !self.conditions.iter().all(|condition| condition(&results)) {
            return None;
        }
        if self.hidden {
            results.clear();
        }
        Some(results)
    }
}

pub(crate) fn default_leaf_tag(stream: &TokenStream, idx: usize) -> &str {
    stream
        .get(idx)
        .and_then(|token| token.tag(POS_TAG))
        .unwrap_or(crate::result::DEFAULT_LEAF_TAG)
}

impl Element {
    fn from_kind(kind: Kind) -> Self {
        Element {
            node: Arc::new(Node::new(kind)),
        }
    }

    fn modified(&self, f: impl FnOnce(&mut Node)) -> Self {
        let mut node = (*self.node).clone();
        f(&mut node);
        Element {
            node: Arc::new(node),
        }
    }

    /// A token whose text matches `pattern` from its first character.
    ///
    /// The match is anchored at the start of the token only, so patterns that
    /// must cover the whole token end with `$`.
    pub fn regex(pattern: &str) -> GrammarResult<Self> {
        Self::build_regex(pattern, None)
    }

    /// Like [`regex`](Self::regex), but the produced leaf carries the text of
    /// capture group `group` instead of the whole token.
    pub fn regex_group(pattern: &str, group: usize) -> GrammarResult<Self> {
        Self::build_regex(pattern, Some(group))
    }

    fn build_regex(pattern: &str, group: Option<usize>) -> GrammarResult<Self> {
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|err| GrammarError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        if let Some(group) = group {
            if group >= regex.captures_len() {
                return Err(GrammarError::InvalidConfiguration(format!(
                    "pattern `{}` has no capture group {}",
                    pattern, group
                )));
            }
        }
        Ok(Self::from_kind(Kind::Regex {
            pattern: pattern.to_string(),
            regex,
            group,
        }))
    }

    /// An updatable node: matches `base`, or else any alternative registered
    /// under `key` in the [`GrammarContext`] supplied at match time.
    pub fn extensible(key: impl Into<String>, base: Element) -> Self {
        Self::from_kind(Kind::Extensible { key: key.into(), base })
    }

    /// Key of an [`extensible`](Self::extensible) node.
    pub fn extension_key(&self) -> Option<&str> {
        match &self.node.kind {
            Kind::Extensible { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.node.name.as_deref()
    }

    /// Copy of this element whose results are tagged (or wrapped) as `name`.
    pub fn named(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.modified(|node| node.name = Some(name))
    }

    /// Wrap the results of this element into a node named `name`, keeping any
    /// name the element already has on the inner nodes.
    pub fn group(&self, name: impl Into<String>) -> Self {
        Self::from_kind(Kind::Group(self.clone())).named(name)
    }

    /// Copy of this element that matches as usual but produces no nodes.
    pub fn hide(&self) -> Self {
        self.modified(|node| node.hidden = true)
    }

    pub fn with_action<F>(&self, action: F) -> Self
    where
        F: Fn(&TokenStream, usize, Vec<ResultNode>) -> Vec<ResultNode> + Send + Sync + 'static,
    {
        let action: Action = Arc::new(action);
        self.modified(|node| node.actions.push(action))
    }

    pub fn with_condition<F>(&self, condition: F) -> Self
    where
        F: Fn(&[ResultNode]) -> bool + Send + Sync + 'static,
    {
        let condition: Condition = Arc::new(condition);
        self.modified(|node| node.conditions.push(condition))
    }

    /// Attempt a match at `position` without document extensions.
    pub fn match_at(&self, stream: &TokenStream, position: usize) -> Option<Match> {
        self.match_at_with(stream, position, &EMPTY_CONTEXT)
    }

    /// Attempt a match at `position`. `None` means no match, which is
    /// distinct from a successful zero-width match.
    pub fn match_at_with(&self, stream: &TokenStream, position: usize, context: &GrammarContext) -> Option<Match> {
        if position > stream.len() {
            return None;
        }
        let matcher = Matcher::new(stream, context);
        let (end, nodes) = matcher.first(self, position)?;
        Some(Match {
            nodes,
            start: position,
            end,
        })
    }

    /// Match from the first token, requiring the whole stream to be consumed.
    pub fn match_full(&self, stream: &TokenStream, context: &GrammarContext) -> Option<Match> {
        let matcher = Matcher::new(stream, context);
        let (end, nodes) = matcher.full(self)?;
        Some(Match { nodes, start: 0, end })
    }

    /// Whether this element matches anywhere in the stream.
    pub fn occurs_in(&self, stream: &TokenStream, context: &GrammarContext) -> bool {
        self.scan(stream, context).next().is_some()
    }

    /// Non-overlapping, leftmost-first matches over the whole stream.
    pub fn scan<'a>(&'a self, stream: &'a TokenStream, context: &'a GrammarContext) -> Scan<'a> {
        Scan::new(self, stream, context, false)
    }

    /// Like [`scan`](Self::scan), but restarts one token after each match start.
    pub fn scan_overlapping<'a>(&'a self, stream: &'a TokenStream, context: &'a GrammarContext) -> Scan<'a> {
        Scan::new(self, stream, context, true)
    }
}

/// Exact token text.
pub fn w(text: impl Into<String>) -> Element {
    Element::from_kind(Kind::Word(text.into()))
}

/// Token text, ignoring case.
pub fn i(text: impl Into<String>) -> Element {
    Element::from_kind(Kind::CaselessWord(text.into().to_lowercase()))
}

/// Regex over a token's text, for patterns written in source code.
///
/// # Panics
///
/// Panics on an invalid pattern. Use [`Element::regex`] for patterns that
/// are not literals.
pub fn r(pattern: &str) -> Element {
    Element::regex(pattern).expect("Invalid grammar regex")
}

/// Part-of-speech tag equality.
pub fn t(tag: impl Into<String>) -> Element {
    t_typed(POS_TAG, tag)
}

/// Tag equality for an arbitrary tag type, e.g. `ner_tag`.
pub fn t_typed(tag_type: impl Into<String>, tag: impl Into<String>) -> Element {
    Element::from_kind(Kind::Tag {
        tag_type: tag_type.into(),
        tag: tag.into(),
    })
}

/// Any single token.
pub fn any() -> Element {
    Element::from_kind(Kind::Any)
}

/// Never matches.
pub fn no_match() -> Element {
    Element::from_kind(Kind::NoMatch)
}

/// Zero-width: matches only at the first position.
pub fn start() -> Element {
    Element::from_kind(Kind::Start)
}

/// Zero-width: matches only after the last token.
pub fn end() -> Element {
    Element::from_kind(Kind::End)
}

pub fn and(exprs: Vec<Element>) -> Element {
    Element::from_kind(Kind::And(exprs))
}

/// Ordered choice: the first alternative that matches is committed to.
pub fn first(exprs: Vec<Element>) -> Element {
    Element::from_kind(Kind::Or(exprs))
}

/// Every child must match at the same position. The span and nodes are those
/// of the first child that consumes tokens, so zero-width children such as
/// [`not`] act as filters.
pub fn every(exprs: Vec<Element>) -> Element {
    Element::from_kind(Kind::Every(exprs))
}

pub fn optional(expr: Element) -> Element {
    Element::from_kind(Kind::Optional(expr))
}

pub fn zero_or_more(expr: Element) -> Element {
    Element::from_kind(Kind::Repeat { expr, min: 0 })
}

pub fn one_or_more(expr: Element) -> Element {
    Element::from_kind(Kind::Repeat { expr, min: 1 })
}

/// Negative lookahead, zero-width.
pub fn not(expr: Element) -> Element {
    Element::from_kind(Kind::Not(expr))
}

/// Positive lookahead, zero-width.
pub fn followed_by(expr: Element) -> Element {
    Element::from_kind(Kind::FollowedBy(expr))
}

/// Consume tokens up to, not including, the next position where `expr` matches.
pub fn skip_to(expr: Element) -> Element {
    Element::from_kind(Kind::SkipTo(expr))
}

impl Add for Element {
    type Output = Element;

    fn add(self, rhs: Element) -> Element {
        if self.node.is_plain() {
            if let Kind::And(exprs) = &self.node.kind {
                let mut exprs = exprs.clone();
                exprs.push(rhs);
                return and(exprs);
            }
        }
        and(vec![self, rhs])
    }
}

impl BitOr for Element {
    type Output = Element;

    fn bitor(self, rhs: Element) -> Element {
        if self.node.is_plain() {
            if let Kind::Or(exprs) = &self.node.kind {
                let mut exprs = exprs.clone();
                exprs.push(rhs);
                return first(exprs);
            }
        }
        first(vec![self, rhs])
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, label: &str, exprs: &[Element]) -> fmt::Result {
            write!(f, "{}(", label)?;
            for (idx, expr) in exprs.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{:?}", expr)?;
            }
            f.write_str(")")
        }

        match &self.node.kind {
            Kind::Word(text) => write!(f, "W({:?})", text)?,
            Kind::CaselessWord(text) => write!(f, "I({:?})", text)?,
            Kind::Regex { pattern, .. } => write!(f, "R({:?})", pattern)?,
            Kind::Tag { tag_type, tag } => write!(f, "T({}={:?})", tag_type, tag)?,
            Kind::Any => f.write_str("Any")?,
            Kind::NoMatch => f.write_str("NoMatch")?,
            Kind::Start => f.write_str("Start")?,
            Kind::End => f.write_str("End")?,
            Kind::And(exprs) => list(f, "And", exprs)?,
            Kind::Or(exprs) => list(f, "Or", exprs)?,
            Kind::Every(exprs) => list(f, "Every", exprs)?,
            Kind::Repeat { expr, min: 0 } => write!(f, "ZeroOrMore({:?})", expr)?,
            Kind::Repeat { expr, .. } => write!(f, "OneOrMore({:?})", expr)?,
            Kind::Optional(expr) => write!(f, "Optional({:?})", expr)?,
            Kind::Not(expr) => write!(f, "Not({:?})", expr)?,
            Kind::FollowedBy(expr) => write!(f, "FollowedBy({:?})", expr)?,
            Kind::Group(expr) => write!(f, "Group({:?})", expr)?,
            Kind::SkipTo(expr) => write!(f, "SkipTo({:?})", expr)?,
            Kind::Extensible { key, base } => write!(f, "Extensible({:?}, {:?})", key, base)?,
        }
        if let Some(name) = &self.node.name {
            write!(f, "({:?})", name)?;
        }
        if self.node.hidden {
            f.write_str(".hide()")?;
        }
        Ok(())
    }
}
