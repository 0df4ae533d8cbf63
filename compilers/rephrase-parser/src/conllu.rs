//! CoNLL-U reader for Stanza / UDPipe output.
//!
//! Multiword-token ranges (`3-4`) and empty nodes (`5.1`) are skipped; the
//! decomposer works on syntactic words only.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, value},
    multi::separated_list1,
    sequence::{preceded, separated_pair},
    IResult,
};
use rephrase_lexicon::Lexicon;
use rephrase_protocol::Sentence;

use crate::error::SourceError;
use crate::source::{assemble, DependencySource, Pretagged, RawToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineId {
    Word(usize),
    Range,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Head {
    Root,
    Token(usize),
    Unspecified,
}

fn number(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse)(input)
}

fn line_id(input: &str) -> IResult<&str, LineId> {
    alt((
        value(LineId::Range, separated_pair(number, char('-'), number)),
        value(LineId::Empty, separated_pair(number, char('.'), number)),
        map(number, LineId::Word),
    ))(input)
}

fn head(input: &str) -> IResult<&str, Head> {
    alt((
        value(Head::Unspecified, tag("_")),
        map(number, |h| if h == 0 { Head::Root } else { Head::Token(h - 1) }),
    ))(input)
}

fn fields(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char('\t'), take_till(|c| c == '\t'))(input)
}

fn text_comment(input: &str) -> IResult<&str, &str> {
    preceded(tag("# text = "), take_till(|c| c == '\n'))(input)
}

fn column(value: &str) -> String {
    if value == "_" {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_token_line(line: &str, line_no: usize) -> Result<Option<RawToken>, SourceError> {
    let error = |message: String| SourceError::Conllu { line: line_no, message };

    let (_, cols) = fields(line).map_err(|e| error(format!("unreadable token line: {:?}", e)))?;
    if cols.len() != 10 {
        return Err(error(format!("expected 10 columns, found {}", cols.len())));
    }

    let (_, id) = all_consuming(line_id)(cols[0]).map_err(|_| error(format!("bad token id {:?}", cols[0])))?;
    if !matches!(id, LineId::Word(_)) {
        return Ok(None);
    }

    let (_, head) = all_consuming(head)(cols[6]).map_err(|_| error(format!("bad head {:?}", cols[6])))?;
    let head = match head {
        Head::Root => None,
        Head::Token(index) => Some(index),
        Head::Unspecified => return Err(error("word line without a head".to_string())),
    };

    Ok(Some(RawToken {
        form: cols[1].to_string(),
        lemma: column(cols[2]),
        upos: column(cols[3]),
        xpos: column(cols[4]),
        feats: column(cols[5]),
        head,
        deprel: column(cols[7]),
        start: None,
        space_after: !cols[9].split('|').any(|m| m == "SpaceAfter=No"),
    }))
}

/// Parses every sentence block of a CoNLL-U document.
pub fn parse_document(input: &str, lexicon: &Lexicon) -> Result<Vec<Sentence>, SourceError> {
    let mut sentences = Vec::new();
    let mut text: Option<String> = None;
    let mut tokens: Vec<RawToken> = Vec::new();

    let mut flush = |text: &mut Option<String>, tokens: &mut Vec<RawToken>| {
        if !tokens.is_empty() {
            sentences.push(assemble(text.as_deref(), std::mem::take(tokens), lexicon));
        }
        *text = None;
    };

    for (index, line) in input.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            flush(&mut text, &mut tokens);
            continue;
        }
        if line.starts_with('#') {
            if let Ok((_, comment)) = text_comment(line) {
                text = Some(comment.trim().to_string());
            }
            continue;
        }
        if let Some(token) = parse_token_line(line, index + 1)? {
            tokens.push(token);
        }
    }
    flush(&mut text, &mut tokens);

    Ok(sentences)
}

/// Parses a document expected to hold exactly one sentence; an empty
/// document yields an empty sentence.
pub fn parse_sentence(input: &str, lexicon: &Lexicon) -> Result<Sentence, SourceError> {
    let mut sentences = parse_document(input, lexicon)?;
    match sentences.len() {
        0 => Ok(Sentence::default()),
        1 => Ok(sentences.remove(0)),
        n => Err(SourceError::Conllu {
            line: 0,
            message: format!("expected one sentence, found {}", n),
        }),
    }
}

/// A CoNLL-U corpus served as a [`DependencySource`].
#[derive(Debug, Clone, Default)]
pub struct ConlluCorpus {
    sentences: Pretagged,
}

impl ConlluCorpus {
    pub fn from_document(input: &str, lexicon: &Lexicon) -> Result<Self, SourceError> {
        Ok(Self {
            sentences: parse_document(input, lexicon)?.into_iter().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

impl DependencySource for ConlluCorpus {
    fn parse(&self, text: &str) -> Result<Sentence, SourceError> {
        self.sentences.parse(text)
    }
}
