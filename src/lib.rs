#![doc(html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg")]
//! Token-level grammar combinators for extracting structured records.
//!
//! Grammars are built from [`Element`]s: primitive matchers over tagged
//! tokens ([`w`], [`i`], [`r`], [`t`]) combined with `+` (sequence), `|`
//! (ordered choice) and the combinator functions. Matching a grammar against
//! a [`TokenStream`] produces a [`Match`] whose [`ResultNode`] tree names the
//! pieces that were recognized.

pub mod actions;
mod context;
mod display;
mod element;
mod error;
mod result;
mod token;

pub use context::{GrammarContext, MatchLimits};
pub use display::MatchDisplay;
pub use element::{
    and, any, end, every, first, followed_by, i, no_match, not, one_or_more, optional, r, skip_to, start, t,
    t_typed, w, zero_or_more, Action, Condition, Element, Scan,
};
pub use error::{GrammarError, GrammarResult};
pub use result::{Match, ResultNode, DEFAULT_LEAF_TAG};
pub use token::{create_stream_from_string, LexiconTagger, Tagger, Token, TokenStream, NER_TAG, POS_TAG};
