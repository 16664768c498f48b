use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

use crate::{Match, ResultNode, TokenStream};

struct IncludedSpan {
    /// Token range, end exclusive.
    range: (usize, usize),
    label: String,
}

/// Renders a token stream with selected match spans underlined.
///
/// ```text
/// PL  quantum  yield  of  24.1  %  .
/// ╰────────────────╯specifier("PL quantum yield")
///                         ╰──╯raw_value("24.1")
///                               ╰raw_units("%")
/// ```
pub struct MatchDisplay<'a> {
    stream: &'a TokenStream,
    include_spans: Vec<IncludedSpan>,
}

impl<'a> MatchDisplay<'a> {
    pub fn new(stream: &'a TokenStream) -> Self {
        MatchDisplay {
            stream,
            include_spans: Vec::new(),
        }
    }

    pub fn include_node(&mut self, node: &ResultNode) {
        if node.end() <= node.start() {
            return;
        }
        let label = match node.text() {
            Some(text) => format!("{}({:?})", node.tag(), text),
            None => node.tag().to_string(),
        };
        self.include_spans.push(IncludedSpan {
            range: (node.start(), node.end()),
            label,
        });
    }

    /// Include every node named `name` anywhere in the match.
    pub fn include_named(&mut self, found: &Match, name: &str) {
        for root in &found.nodes {
            for node in root.iter().filter(|node| node.tag() == name) {
                self.include_node(node);
            }
        }
    }

    /// Takes self
    pub fn with_named(mut self, found: &Match, name: &str) -> Self {
        self.include_named(found, name);
        self
    }

    /// Takes self, includes a whole match under `label`
    pub fn with_match(mut self, found: &Match, label: &str) -> Self {
        if found.end > found.start {
            self.include_spans.push(IncludedSpan {
                range: (found.start, found.end),
                label: label.to_string(),
            });
        }
        self
    }
}

impl<'a> std::fmt::Display for MatchDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const SPACE_PADDING: usize = 2;
        let mut token_idx_to_start_display_char_idx = Vec::new();
        let mut token_idx_to_end_display_char_idx = Vec::new();
        let mut opening_line = String::new();
        for (idx, token) in self.stream.iter().enumerate() {
            if idx > 0 {
                opening_line.extend(std::iter::repeat(' ').take(SPACE_PADDING));
            }
            token_idx_to_start_display_char_idx.push(UnicodeWidthStr::width(&*opening_line));
            opening_line.push_str(token.text());
            token_idx_to_end_display_char_idx.push(UnicodeWidthStr::width(&*opening_line));
        }

        f.write_str(&opening_line)?;

        for span in self.include_spans.iter() {
            let (start, end) = span.range;
            if end > self.stream.len() {
                continue;
            }
            f.write_char('\n')?;

            let start_char_idx = token_idx_to_start_display_char_idx[start];
            for _ in 0..start_char_idx {
                f.write_char(' ')?;
            }

            f.write_char('╰')?;

            let end_char_idx = token_idx_to_end_display_char_idx[end - 1];
            let char_len = end_char_idx - start_char_idx;
            for _ in (start_char_idx + 1)..end_char_idx.saturating_sub(1) {
                f.write_char('─')?;
            }

            if char_len > 1 {
                f.write_char('╯')?;
            }

            f.write_str(&span.label)?;
        }

        Ok(())
    }
}
