//! Structural distances between pieces of a document.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

/// A distance measured in document structure.
///
/// Components are compared from the largest unit down, so any distance that
/// crosses a section boundary is larger than any distance within a section.
/// Within a single document every real distance has `documents == 0`, which
/// makes [`ContextualRange::document`] the "anywhere in this document" range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextualRange {
    pub documents: f64,
    pub sections: f64,
    pub paragraphs: f64,
    pub sentences: f64,
}

impl ContextualRange {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn sentences(count: f64) -> Self {
        ContextualRange {
            sentences: count,
            ..Self::default()
        }
    }

    pub fn paragraphs(count: f64) -> Self {
        ContextualRange {
            paragraphs: count,
            ..Self::default()
        }
    }

    pub fn sections(count: f64) -> Self {
        ContextualRange {
            sections: count,
            ..Self::default()
        }
    }

    /// One sentence: the distance between two things in the same sentence.
    pub fn sentence() -> Self {
        Self::sentences(1.0)
    }

    pub fn paragraph() -> Self {
        Self::paragraphs(1.0)
    }

    pub fn section() -> Self {
        Self::sections(1.0)
    }

    /// The whole document.
    pub fn document() -> Self {
        ContextualRange {
            documents: 1.0,
            ..Self::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    pub fn scaled(self, factor: f64) -> Self {
        self * factor
    }

    fn components(&self) -> [f64; 4] {
        [self.documents, self.sections, self.paragraphs, self.sentences]
    }
}

impl PartialOrd for ContextualRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        for (lhs, rhs) in self.components().iter().zip(other.components().iter()) {
            match lhs.partial_cmp(rhs)? {
                Ordering::Equal => continue,
                ordering => return Some(ordering),
            }
        }
        Some(Ordering::Equal)
    }
}

impl Mul<f64> for ContextualRange {
    type Output = ContextualRange;

    fn mul(self, factor: f64) -> ContextualRange {
        ContextualRange {
            documents: self.documents * factor,
            sections: self.sections * factor,
            paragraphs: self.paragraphs * factor,
            sentences: self.sentences * factor,
        }
    }
}

impl Add for ContextualRange {
    type Output = ContextualRange;

    fn add(self, other: ContextualRange) -> ContextualRange {
        ContextualRange {
            documents: self.documents + other.documents,
            sections: self.sections + other.sections,
            paragraphs: self.paragraphs + other.paragraphs,
            sentences: self.sentences + other.sentences,
        }
    }
}

impl fmt::Display for ContextualRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.documents, "document"),
            (self.sections, "section"),
            (self.paragraphs, "paragraph"),
            (self.sentences, "sentence"),
        ]
        .iter()
        .filter(|(count, _)| *count != 0.0)
        .map(|(count, unit)| format!("{}×{}", count, unit))
        .collect();
        if parts.is_empty() {
            f.write_str("0")
        } else {
            f.write_str(&parts.join(" + "))
        }
    }
}
