use std::collections::BTreeMap;
use std::ops::Index;

use unicode_segmentation::UnicodeSegmentation;

/// Tag type under which part-of-speech tags are stored.
pub const POS_TAG: &str = "pos_tag";
/// Tag type under which named-entity tags are stored.
pub const NER_TAG: &str = "ner_tag";

/// A single tagged token.
///
/// Tokens are produced by an external tokenizer/tagger; the grammar engine
/// only reads `text` and whatever tags were attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    tags: BTreeMap<String, String>,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Token {
            text: text.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, tag_type: impl Into<String>, tag: impl Into<String>) -> Self {
        self.tags.insert(tag_type.into(), tag.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tag(&self, tag_type: &str) -> Option<&str> {
        self.tags.get(tag_type).map(String::as_str)
    }

    pub fn pos_tag(&self) -> Option<&str> {
        self.tag(POS_TAG)
    }

    pub fn ner_tag(&self) -> Option<&str> {
        self.tag(NER_TAG)
    }

    pub fn set_tag(&mut self, tag_type: impl Into<String>, tag: impl Into<String>) {
        self.tags.insert(tag_type.into(), tag.into());
    }
}

/// An ordered, indexed sequence of tagged tokens: one sentence or table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenStream { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Token> {
        self.tokens.get(idx)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Text of the tokens in `[start, end)`, space separated.
    pub fn text_between(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        let start = start.min(end);
        self.tokens[start..end]
            .iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Concatenate two streams, e.g. a table header with one of its cells.
    pub fn concat(&self, other: &TokenStream) -> TokenStream {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        TokenStream { tokens }
    }

    /// Attach the tags produced by `tagger` to every token.
    pub fn apply_tagger(&mut self, tagger: &dyn Tagger) {
        let tags = tagger.tag(&self.tokens);
        for (token, tag) in self.tokens.iter_mut().zip(tags) {
            if let Some(tag) = tag {
                token.set_tag(tagger.tag_type(), tag);
            }
        }
    }
}

impl Index<usize> for TokenStream {
    type Output = Token;

    fn index(&self, idx: usize) -> &Token {
        &self.tokens[idx]
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        TokenStream::new(tokens)
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Produces one optional tag per token. Statistical and dictionary taggers
/// live outside this crate and plug in through this trait.
pub trait Tagger {
    /// The tag type written by this tagger, e.g. [`POS_TAG`].
    fn tag_type(&self) -> &str;
    fn tag(&self, tokens: &[Token]) -> Vec<Option<String>>;
}

/// Tags tokens by exact lookup of their text.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    tag_type: String,
    lexicon: BTreeMap<String, String>,
}

impl LexiconTagger {
    pub fn new(tag_type: impl Into<String>) -> Self {
        LexiconTagger {
            tag_type: tag_type.into(),
            lexicon: BTreeMap::new(),
        }
    }

    pub fn entry(mut self, text: impl Into<String>, tag: impl Into<String>) -> Self {
        self.lexicon.insert(text.into(), tag.into());
        self
    }
}

impl Tagger for LexiconTagger {
    fn tag_type(&self) -> &str {
        &self.tag_type
    }

    fn tag(&self, tokens: &[Token]) -> Vec<Option<String>> {
        tokens
            .iter()
            .map(|token| self.lexicon.get(token.text()).cloned())
            .collect()
    }
}

/// Split text on Unicode word boundaries, dropping whitespace.
///
/// `"τp/τd [ns]"` becomes `τp`, `/`, `τd`, `[`, `ns`, `]`, while decimal
/// numbers such as `24.1` stay in one piece.
pub fn create_stream_from_string(text: &str) -> TokenStream {
    text.split_word_bounds()
        .filter(|word| !word.trim().is_empty())
        .map(Token::new)
        .collect::<Vec<_>>()
        .into()
}
