//! Where in a document a record was found.

use layered_extract_model::ContextualRange;

/// Position of a sentence, heading or table row within a document.
///
/// `paragraph` counts blocks across the whole document, so two positions in
/// different sections still have distinct paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub section: usize,
    pub paragraph: usize,
    pub sentence: usize,
}

impl Position {
    pub fn new(section: usize, paragraph: usize, sentence: usize) -> Self {
        Self {
            section,
            paragraph,
            sentence,
        }
    }

    /// Structural distance to `other`, measured in the largest unit that
    /// differs. Within one sentence the distance is one sentence, so it is
    /// never zero.
    pub fn distance(&self, other: &Position) -> ContextualRange {
        if self.section != other.section {
            ContextualRange::sections(self.section.abs_diff(other.section) as f64)
        } else if self.paragraph != other.paragraph {
            ContextualRange::paragraphs(self.paragraph.abs_diff(other.paragraph) as f64)
        } else {
            ContextualRange::sentences((self.sentence.abs_diff(other.sentence) + 1) as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn largest_differing_unit_wins() {
        let here = Position::new(1, 4, 2);
        assert_eq!(here.distance(&here), ContextualRange::sentence());
        assert_eq!(here.distance(&Position::new(1, 4, 0)), ContextualRange::sentences(3.0));
        assert_eq!(here.distance(&Position::new(1, 6, 0)), ContextualRange::paragraphs(2.0));
        assert_eq!(here.distance(&Position::new(0, 1, 0)), ContextualRange::section());
        assert!(here.distance(&Position::new(1, 5, 9)) > here.distance(&Position::new(1, 4, 9)));
    }
}
