#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use bitflags::bitflags;
use core::fmt;
use core::str::FromStr;

/// Universal Dependencies coarse part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[repr(u8)]
pub enum Pos {
    Adj = 0,
    Adp = 1,
    Adv = 2,
    Aux = 3,
    Cconj = 4,
    Det = 5,
    Intj = 6,
    Noun = 7,
    Num = 8,
    Part = 9,
    Pron = 10,
    Propn = 11,
    Punct = 12,
    Sconj = 13,
    Sym = 14,
    Verb = 15,
    X = 16,
}

impl Pos {
    /// Lenient parse: anything unrecognised becomes `X`.
    pub fn parse(tag: &str) -> Self {
        tag.parse().unwrap_or(Pos::X)
    }

    pub fn is_verbal(self) -> bool {
        matches!(self, Pos::Verb | Pos::Aux)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pos::Adj => "ADJ",
            Pos::Adp => "ADP",
            Pos::Adv => "ADV",
            Pos::Aux => "AUX",
            Pos::Cconj => "CCONJ",
            Pos::Det => "DET",
            Pos::Intj => "INTJ",
            Pos::Noun => "NOUN",
            Pos::Num => "NUM",
            Pos::Part => "PART",
            Pos::Pron => "PRON",
            Pos::Propn => "PROPN",
            Pos::Punct => "PUNCT",
            Pos::Sconj => "SCONJ",
            Pos::Sym => "SYM",
            Pos::Verb => "VERB",
            Pos::X => "X",
        }
    }
}

impl FromStr for Pos {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [Pos; 17] = [
            Pos::Adj,
            Pos::Adp,
            Pos::Adv,
            Pos::Aux,
            Pos::Cconj,
            Pos::Det,
            Pos::Intj,
            Pos::Noun,
            Pos::Num,
            Pos::Part,
            Pos::Pron,
            Pos::Propn,
            Pos::Punct,
            Pos::Sconj,
            Pos::Sym,
            Pos::Verb,
            Pos::X,
        ];
        // spaCy v1 models still emit CONJ for coordinators.
        if s.eq_ignore_ascii_case("CONJ") {
            return Ok(Pos::Cconj);
        }
        ALL.iter()
            .copied()
            .find(|pos| pos.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ten Rephrase slots, declared in their conventional listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[repr(u8)]
pub enum SlotName {
    S = 0,
    Aux = 1,
    M1 = 2,
    V = 3,
    C1 = 4,
    O1 = 5,
    O2 = 6,
    C2 = 7,
    M2 = 8,
    M3 = 9,
}

impl SlotName {
    pub const ALL: [SlotName; 10] = [
        SlotName::S,
        SlotName::Aux,
        SlotName::M1,
        SlotName::V,
        SlotName::C1,
        SlotName::O1,
        SlotName::O2,
        SlotName::C2,
        SlotName::M2,
        SlotName::M3,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlotName::S => "S",
            SlotName::Aux => "Aux",
            SlotName::M1 => "M1",
            SlotName::V => "V",
            SlotName::C1 => "C1",
            SlotName::O1 => "O1",
            SlotName::O2 => "O2",
            SlotName::C2 => "C2",
            SlotName::M2 => "M2",
            SlotName::M3 => "M3",
        }
    }

    /// Label used when the slot appears nested under another slot.
    pub fn sub_label(self) -> &'static str {
        match self {
            SlotName::S => "sub-s",
            SlotName::Aux => "sub-aux",
            SlotName::M1 => "sub-m1",
            SlotName::V => "sub-v",
            SlotName::C1 => "sub-c1",
            SlotName::O1 => "sub-o1",
            SlotName::O2 => "sub-o2",
            SlotName::C2 => "sub-c2",
            SlotName::M2 => "sub-m2",
            SlotName::M3 => "sub-m3",
        }
    }
}

impl FromStr for SlotName {
    type Err = ();

    /// Accepts both `O1` and `sub-o1` spellings, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s
            .strip_prefix("sub-")
            .or_else(|| s.strip_prefix("SUB-"))
            .unwrap_or(s);
        SlotName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str().eq_ignore_ascii_case(bare))
            .ok_or(())
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PhraseType {
    /// A single token or a tight lexical unit ("pick up", "to swim").
    Word,
    /// Several tokens without their own subject and finite verb.
    Phrase,
    /// Clause-like span; the only type that may carry sub-slots.
    Clause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ClauseKind {
    Main,
    Relative,
    Subordinate,
    Complement,
    Participial,
}

bitflags! {
    /// Lexical facts about a token, derived once when a sentence is built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
    pub struct TokenFlags: u32 {
        /// Tensed verb form (VBD/VBP/VBZ/MD or VerbForm=Fin).
        const FINITE = 1;
        const MODAL = 2;
        /// Interrogative word: what, who, where, how ...
        const WH = 4;
        /// Word able to introduce a relative clause: who, which, that, where ...
        const RELATIVE = 8;
        /// Lemma of a linking verb ("be").
        const COPULA = 16;
        /// The infinitival "to".
        const INFINITIVE_MARKER = 32;
        const NEGATION = 64;
        /// Subordinating conjunction: because, although, if ...
        const SUBORDINATOR = 128;
        /// Non-finite -ing / -ed verb form.
        const PARTICIPLE = 256;
    }
}
