//! Document-scoped grammar state.
//!
//! Grammars are immutable once built. The only part of a grammar that may
//! grow while a document is processed is an [`Element::extensible`] node,
//! whose extra alternatives live here, keyed by name, and are supplied to
//! every match through a shared reference. Updates need `&mut`, so they can
//! only happen between scanning passes.

use std::collections::BTreeMap;

use crate::Element;

/// Bounds applied to a single match attempt at one start position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchLimits {
    /// Maximum number of element invocations before the attempt is abandoned.
    pub max_steps: usize,
    /// Maximum number of iterations a single repetition node may take.
    pub max_repetitions: usize,
    /// Maximum nesting of element invocations, continuations included.
    pub max_depth: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        MatchLimits {
            max_steps: 200_000,
            max_repetitions: 512,
            max_depth: 256,
        }
    }
}

/// Per-document extensions to the grammar plus matching limits.
#[derive(Debug, Clone, Default)]
pub struct GrammarContext {
    extensions: BTreeMap<String, Vec<Element>>,
    limits: MatchLimits,
}

impl GrammarContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: MatchLimits) -> Self {
        GrammarContext {
            extensions: BTreeMap::new(),
            limits,
        }
    }

    pub fn limits(&self) -> MatchLimits {
        self.limits
    }

    /// Alternatives registered for `key`, in registration order.
    pub fn alternatives(&self, key: &str) -> &[Element] {
        self.extensions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append an alternative to the extensible node named `key`.
    pub fn extend(&mut self, key: impl Into<String>, alternative: Element) {
        let key = key.into();
        tracing::debug!(%key, "extending grammar context");
        self.extensions.entry(key).or_default().push(alternative);
    }

    /// Replace all alternatives of `key`, e.g. to re-order them.
    pub fn set_alternatives(&mut self, key: impl Into<String>, alternatives: Vec<Element>) {
        self.extensions.insert(key.into(), alternatives);
    }

    /// Forget every alternative registered for `key`.
    pub fn reset(&mut self, key: &str) {
        self.extensions.remove(key);
    }

    /// Forget every extension, keeping the limits.
    pub fn clear(&mut self) {
        self.extensions.clear();
    }
}
