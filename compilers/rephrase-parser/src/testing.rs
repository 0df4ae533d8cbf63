//! Fixture helpers shared by the unit tests.

use rephrase_lexicon::Lexicon;
use rephrase_protocol::Sentence;

use crate::source::{assemble, RawToken};

/// `(form, lemma, upos, xpos, head, deprel)` rows with CoNLL-U style heads:
/// 1-based, `0` for the root.
pub type Row<'a> = (&'a str, &'a str, &'a str, &'a str, usize, &'a str);

pub fn sentence(rows: &[Row<'_>]) -> Sentence {
    let raw = rows
        .iter()
        .enumerate()
        .map(|(i, (form, lemma, upos, xpos, head, deprel))| RawToken {
            form: form.to_string(),
            lemma: lemma.to_string(),
            upos: upos.to_string(),
            xpos: xpos.to_string(),
            feats: String::new(),
            head: if *head == 0 { None } else { Some(head - 1) },
            deprel: deprel.to_string(),
            start: None,
            space_after: rows.get(i + 1).map_or(false, |next| next.2 != "PUNCT"),
        })
        .collect();
    assemble(None, raw, &Lexicon::english())
}
