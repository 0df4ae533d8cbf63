//! spaCy `Doc` export: `{"text": ..., "tokens": [{"text", "lemma", "pos",
//! "tag", "dep", "head", "idx"}]}` with absolute head indices and the root
//! pointing at itself.

use rephrase_lexicon::Lexicon;
use rephrase_protocol::Sentence;
use serde::Deserialize;

use crate::error::SourceError;
use crate::source::{assemble, RawToken};

#[derive(Debug, Deserialize)]
struct SpacyDoc {
    #[serde(default)]
    text: Option<String>,
    tokens: Vec<SpacyToken>,
}

#[derive(Debug, Deserialize)]
struct SpacyToken {
    text: String,
    #[serde(default)]
    lemma: String,
    #[serde(default)]
    pos: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    morph: String,
    dep: String,
    head: usize,
    #[serde(default)]
    idx: Option<usize>,
    #[serde(default = "default_whitespace")]
    whitespace: String,
}

fn default_whitespace() -> String {
    " ".to_string()
}

/// spaCy's `idx` counts characters; token offsets here are bytes.
fn byte_offset(text: &str, chars: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(chars)
}

fn convert(doc: SpacyDoc, lexicon: &Lexicon) -> Sentence {
    let SpacyDoc { text, tokens } = doc;
    let raw = tokens
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let is_root = t.head == i || t.dep.eq_ignore_ascii_case("ROOT");
            RawToken {
                form: t.text,
                lemma: t.lemma,
                upos: t.pos,
                xpos: t.tag,
                feats: t.morph,
                head: if is_root { None } else { Some(t.head) },
                deprel: if is_root { "root".to_string() } else { t.dep },
                // Without the document text a character offset cannot be mapped.
                start: t.idx.and_then(|idx| text.as_deref().and_then(|text| byte_offset(text, idx))),
                space_after: !t.whitespace.is_empty(),
            }
        })
        .collect();
    assemble(text.as_deref(), raw, lexicon)
}

/// Reads one spaCy document.
pub fn parse_doc(json: &str, lexicon: &Lexicon) -> Result<Sentence, SourceError> {
    let doc: SpacyDoc = serde_json::from_str(json)?;
    Ok(convert(doc, lexicon))
}

/// Reads a JSON array of spaCy documents.
pub fn parse_docs(json: &str, lexicon: &Lexicon) -> Result<Vec<Sentence>, SourceError> {
    let docs: Vec<SpacyDoc> = serde_json::from_str(json)?;
    Ok(docs.into_iter().map(|doc| convert(doc, lexicon)).collect())
}
