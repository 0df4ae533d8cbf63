#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};

use rephrase_protocol::{Pos, TokenFlags};

use core::fmt;

/// Closed word classes the decomposer needs beyond what the parser labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WordClass {
    Modal,
    Wh,
    Relative,
    Copula,
    Subordinator,
    Negation,
}

impl WordClass {
    pub const ALL: [WordClass; 6] = [
        WordClass::Modal,
        WordClass::Wh,
        WordClass::Relative,
        WordClass::Copula,
        WordClass::Subordinator,
        WordClass::Negation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WordClass::Modal => "modal",
            WordClass::Wh => "wh",
            WordClass::Relative => "relative",
            WordClass::Copula => "copula",
            WordClass::Subordinator => "subordinator",
            WordClass::Negation => "negation",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, LexiconError> {
        WordClass::ALL
            .iter()
            .copied()
            .find(|class| class.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| LexiconError::UnknownClass(name.to_string()))
    }
}

#[derive(Debug)]
pub enum LexiconError {
    UnknownClass(String),
    EmptyWord(WordClass),
}

impl fmt::Display for LexiconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexiconError::UnknownClass(name) => write!(f, "unknown word class '{}'", name),
            LexiconError::EmptyWord(class) => write!(f, "empty word for class '{}'", class.name()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LexiconError {}

const MODALS: &[&str] = &[
    "can", "could", "may", "might", "must", "shall", "should", "will", "would", "ought",
];
const WH_WORDS: &[&str] = &[
    "what", "which", "who", "whom", "whose", "where", "when", "why", "how",
];
const RELATIVES: &[&str] = &["who", "whom", "whose", "which", "that", "where", "when", "why"];
const COPULAS: &[&str] = &["be"];
const SUBORDINATORS: &[&str] = &[
    "after", "although", "as", "because", "before", "if", "once", "since", "so", "though",
    "till", "unless", "until", "when", "whenever", "whereas", "whether", "while",
];
const NEGATIONS: &[&str] = &["not", "n't", "never"];

const FINITE_TAGS: &[&str] = &["VBD", "VBP", "VBZ", "MD"];
const PARTICIPLE_TAGS: &[&str] = &["VBG", "VBN"];

/// Word lists keyed by class, all stored lower-case.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    modal: BTreeSet<String>,
    wh: BTreeSet<String>,
    relative: BTreeSet<String>,
    copula: BTreeSet<String>,
    subordinator: BTreeSet<String>,
    negation: BTreeSet<String>,
}

impl Lexicon {
    /// Empty lexicon; only tag- and feature-based facts will fire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed-class English word lists.
    pub fn english() -> Self {
        let mut lexicon = Self::new();
        for (class, words) in [
            (WordClass::Modal, MODALS),
            (WordClass::Wh, WH_WORDS),
            (WordClass::Relative, RELATIVES),
            (WordClass::Copula, COPULAS),
            (WordClass::Subordinator, SUBORDINATORS),
            (WordClass::Negation, NEGATIONS),
        ] {
            for word in words {
                lexicon.set_mut(class).insert(word.to_string());
            }
        }
        lexicon
    }

    fn set(&self, class: WordClass) -> &BTreeSet<String> {
        match class {
            WordClass::Modal => &self.modal,
            WordClass::Wh => &self.wh,
            WordClass::Relative => &self.relative,
            WordClass::Copula => &self.copula,
            WordClass::Subordinator => &self.subordinator,
            WordClass::Negation => &self.negation,
        }
    }

    fn set_mut(&mut self, class: WordClass) -> &mut BTreeSet<String> {
        match class {
            WordClass::Modal => &mut self.modal,
            WordClass::Wh => &mut self.wh,
            WordClass::Relative => &mut self.relative,
            WordClass::Copula => &mut self.copula,
            WordClass::Subordinator => &mut self.subordinator,
            WordClass::Negation => &mut self.negation,
        }
    }

    pub fn add(&mut self, class: WordClass, word: &str) -> Result<(), LexiconError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(LexiconError::EmptyWord(class));
        }
        self.set_mut(class).insert(word.to_lowercase());
        Ok(())
    }

    /// Adds `(class name, word)` pairs, e.g. from a configuration file.
    pub fn extend<'a, I>(&mut self, entries: I) -> Result<(), LexiconError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (class, word) in entries {
            self.add(WordClass::from_name(class)?, word)?;
        }
        Ok(())
    }

    pub fn contains(&self, class: WordClass, word: &str) -> bool {
        let set = self.set(class);
        set.contains(word) || set.contains(word.to_lowercase().as_str())
    }

    /// Derives the lexical flags of a token from its form, lemma, tags and
    /// (optional) UD feature string.
    pub fn flags_for(&self, text: &str, lemma: &str, pos: Pos, tag: &str, feats: &str) -> TokenFlags {
        let mut flags = TokenFlags::empty();
        let lemma = if lemma.is_empty() || lemma == "_" { text } else { lemma };
        let feature = |pair: &str| feats.split('|').any(|f| f == pair);

        if FINITE_TAGS.contains(&tag) || feature("VerbForm=Fin") {
            flags |= TokenFlags::FINITE;
        }
        if PARTICIPLE_TAGS.contains(&tag) || feature("VerbForm=Part") || feature("VerbForm=Ger") {
            flags |= TokenFlags::PARTICIPLE;
        }
        if tag == "MD" || (pos.is_verbal() && self.contains(WordClass::Modal, lemma)) {
            flags |= TokenFlags::MODAL | TokenFlags::FINITE;
        }
        if pos.is_verbal() && self.contains(WordClass::Copula, lemma) {
            flags |= TokenFlags::COPULA;
        }

        let wh_tag = tag.starts_with('W');
        let word_like = wh_tag || tag.is_empty() || matches!(pos, Pos::Pron | Pos::Adv | Pos::Det);
        if word_like && self.contains(WordClass::Wh, text) {
            flags |= TokenFlags::WH;
        }
        if (wh_tag || pos == Pos::Pron || feature("PronType=Rel")) && self.contains(WordClass::Relative, text) {
            flags |= TokenFlags::RELATIVE;
        }

        if text.eq_ignore_ascii_case("to") && (tag == "TO" || pos == Pos::Part) {
            flags |= TokenFlags::INFINITIVE_MARKER;
        }
        if self.contains(WordClass::Negation, lemma) || self.contains(WordClass::Negation, text) {
            flags |= TokenFlags::NEGATION;
        }
        if pos == Pos::Sconj || (tag == "IN" && self.contains(WordClass::Subordinator, text)) {
            flags |= TokenFlags::SUBORDINATOR;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_modal_is_finite() {
        let lexicon = Lexicon::english();
        let flags = lexicon.flags_for("can", "can", Pos::Aux, "MD", "");
        assert!(flags.contains(TokenFlags::MODAL | TokenFlags::FINITE));

        let flags = lexicon.flags_for("swim", "swim", Pos::Verb, "VB", "VerbForm=Inf");
        assert!(!flags.intersects(TokenFlags::MODAL | TokenFlags::FINITE));
    }

    #[test]
    fn test_that_is_relative_only_as_pronoun() {
        let lexicon = Lexicon::english();
        let relative = lexicon.flags_for("that", "that", Pos::Pron, "WDT", "PronType=Rel");
        assert!(relative.contains(TokenFlags::RELATIVE));

        let determiner = lexicon.flags_for("that", "that", Pos::Det, "DT", "");
        assert!(!determiner.contains(TokenFlags::RELATIVE));
    }

    #[test]
    fn test_infinitive_marker_and_preposition() {
        let lexicon = Lexicon::english();
        assert!(lexicon
            .flags_for("to", "to", Pos::Part, "TO", "")
            .contains(TokenFlags::INFINITIVE_MARKER));
        assert!(!lexicon
            .flags_for("to", "to", Pos::Adp, "IN", "")
            .contains(TokenFlags::INFINITIVE_MARKER));
    }

    #[test]
    fn test_extend_rejects_unknown_class() {
        let mut lexicon = Lexicon::new();
        lexicon.extend([("modal", "dare"), ("Copula", "become")]).unwrap();
        assert!(lexicon.contains(WordClass::Modal, "dare"));
        assert!(lexicon.contains(WordClass::Copula, "BECOME"));

        let err = lexicon.extend([("adverbial", "very")]).unwrap_err();
        assert_eq!(format!("{}", err), "unknown word class 'adverbial'");
        assert!(matches!(lexicon.add(WordClass::Wh, "  "), Err(LexiconError::EmptyWord(WordClass::Wh))));
    }

    proptest! {
        #[test]
        fn test_modal_lookup_ignores_case(index in 0usize..MODALS.len(), mask in any::<u16>()) {
            let lexicon = Lexicon::english();
            let word: String = MODALS[index]
                .chars()
                .enumerate()
                .map(|(i, c)| if mask & (1 << (i % 16)) != 0 { c.to_ascii_uppercase() } else { c })
                .collect();

            let flags = lexicon.flags_for(&word, &word, Pos::Aux, "", "");
            prop_assert!(flags.contains(TokenFlags::MODAL));
        }

        #[test]
        fn test_unknown_words_carry_no_class_flags(word in "[qxz]{3,8}") {
            let lexicon = Lexicon::english();
            let flags = lexicon.flags_for(&word, &word, Pos::Noun, "NN", "");
            prop_assert!(flags.is_empty());
        }
    }
}
