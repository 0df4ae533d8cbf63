use std::collections::HashMap;

use rephrase_lexicon::Lexicon;
use rephrase_protocol::{Pos, Sentence, Token, TokenId};
use tracing::debug;

use crate::error::SourceError;

/// The external dependency parser, seen from the decomposer.
///
/// Implementations return an empty [`Sentence`] for empty text; any other
/// failure to produce a parse is an error.
pub trait DependencySource {
    fn parse(&self, text: &str) -> Result<Sentence, SourceError>;
}

/// Parser-agnostic token record, before lexical flags are attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawToken {
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: String,
    pub feats: String,
    /// 0-based head index, `None` for the root.
    pub head: Option<usize>,
    pub deprel: String,
    /// Byte offset when the parser reports one.
    pub start: Option<usize>,
    pub space_after: bool,
}

/// Builds a [`Sentence`] from raw tokens.
///
/// Offsets come from the tokens when present, otherwise from locating each
/// form in `text`, otherwise from re-joining forms using `space_after`.
pub fn assemble(text: Option<&str>, raw: Vec<RawToken>, lexicon: &Lexicon) -> Sentence {
    let mut tokens = Vec::with_capacity(raw.len());
    let mut rebuilt = String::new();
    let mut cursor = 0usize;

    for (index, raw_token) in raw.into_iter().enumerate() {
        let start = match (raw_token.start, text) {
            (Some(start), _) => start,
            (None, Some(text)) => match text.get(cursor..).and_then(|rest| rest.find(raw_token.form.as_str())) {
                Some(found) => cursor + found,
                None => {
                    debug!(form = %raw_token.form, "token not found in sentence text");
                    cursor
                }
            },
            (None, None) => rebuilt.len(),
        };
        cursor = start + raw_token.form.len();

        if text.is_none() {
            rebuilt.push_str(&raw_token.form);
            if raw_token.space_after {
                rebuilt.push(' ');
            }
        }

        let pos = Pos::parse(&raw_token.upos);
        let flags = lexicon.flags_for(&raw_token.form, &raw_token.lemma, pos, &raw_token.xpos, &raw_token.feats);

        tokens.push(Token {
            id: TokenId::from(index),
            text: raw_token.form,
            lemma: raw_token.lemma,
            pos,
            tag: raw_token.xpos,
            deprel: raw_token.deprel,
            head: raw_token.head.map(TokenId::from),
            start,
            flags,
        });
    }

    let text = match text {
        Some(text) => text.to_string(),
        None => rebuilt.trim_end().to_string(),
    };
    Sentence::new(text, tokens)
}

/// Sentences parsed ahead of time, looked up by their text.
#[derive(Debug, Clone, Default)]
pub struct Pretagged {
    parses: HashMap<String, Sentence>,
}

impl Pretagged {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sentence: Sentence) {
        self.parses.insert(normalize_key(&sentence.text), sentence);
    }

    pub fn len(&self) -> usize {
        self.parses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parses.is_empty()
    }
}

impl FromIterator<Sentence> for Pretagged {
    fn from_iter<I: IntoIterator<Item = Sentence>>(iter: I) -> Self {
        let mut source = Pretagged::new();
        for sentence in iter {
            source.insert(sentence);
        }
        source
    }
}

impl DependencySource for Pretagged {
    fn parse(&self, text: &str) -> Result<Sentence, SourceError> {
        let key = normalize_key(text);
        if key.is_empty() {
            return Ok(Sentence::default());
        }
        self.parses
            .get(&key)
            .cloned()
            .ok_or_else(|| SourceError::NotParsed(text.to_string()))
    }
}

fn normalize_key(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
