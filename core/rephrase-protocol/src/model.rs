use rkyv::{Archive, Deserialize, Serialize};
use crate::ids::TokenId;
use crate::tags::{PhraseType, Pos, SlotName, TokenFlags};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// One token as produced by the external dependency parser.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Token {
    pub id: TokenId,
    pub text: String,
    pub lemma: String,
    pub pos: Pos,
    /// Fine-grained tag (Penn Treebank for English models), may be empty.
    pub tag: String,
    /// Dependency relation to the head, e.g. `nsubj` or `acl:relcl`.
    pub deprel: String,
    /// `None` for the sentence root.
    pub head: Option<TokenId>,
    /// Byte offset of the token in the sentence text.
    pub start: usize,
    pub flags: TokenFlags,
}

impl Token {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Relation without its subtype: `acl:relcl` -> `acl`.
    pub fn base_deprel(&self) -> &str {
        self.deprel.split(':').next().unwrap_or("")
    }

    pub fn has(&self, flags: TokenFlags) -> bool {
        self.flags.contains(flags)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Sentence {
    pub text: String,
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(text: String, tokens: Vec<Token>) -> Self {
        Self { text, tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.index())
    }

    /// Renders a set of tokens in source order, keeping the original
    /// spacing between adjacent tokens and a single space across gaps.
    pub fn render(&self, ids: &[TokenId]) -> String {
        let mut sorted: Vec<TokenId> = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut out = String::new();
        let mut previous: Option<&Token> = None;
        for id in sorted {
            let Some(token) = self.token(id) else { continue };
            if let Some(prev) = previous {
                let adjacent = prev.id.index() + 1 == token.id.index();
                if !(adjacent && prev.end() == token.start) {
                    out.push(' ');
                }
            }
            out.push_str(&token.text);
            previous = Some(token);
        }
        out
    }
}

/// A filled slot. Nested slots are keyed by the same names and rendered with
/// the `sub-` prefix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(SerdeSerialize))]
pub struct Slot {
    pub name: SlotName,
    pub text: String,
    /// Sorted, de-duplicated token ids covered by the slot.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub tokens: Vec<TokenId>,
    pub phrase_type: PhraseType,
    pub display_order: u32,
    /// A wh-word slot moved in front of the predicate ("What did he say?").
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "core::ops::Not::not"))]
    pub fronted_wh: bool,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "serialize_sub_slots", skip_serializing_if = "BTreeMap::is_empty")
    )]
    pub sub_slots: BTreeMap<SlotName, Slot>,
}

impl Slot {
    pub fn new(name: SlotName, text: String, tokens: Vec<TokenId>, phrase_type: PhraseType) -> Self {
        Self {
            name,
            text,
            tokens,
            phrase_type,
            display_order: 0,
            fronted_wh: false,
            sub_slots: BTreeMap::new(),
        }
    }

    pub fn first_token(&self) -> Option<TokenId> {
        self.tokens.first().copied()
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.tokens.binary_search(&id).is_ok()
    }

    pub fn sub_slot(&self, name: SlotName) -> Option<&Slot> {
        self.sub_slots.get(&name)
    }
}

#[cfg(feature = "serde")]
fn serialize_sub_slots<S>(map: &BTreeMap<SlotName, Slot>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;

    let mut out = serializer.serialize_map(Some(map.len()))?;
    for (name, slot) in map {
        out.serialize_entry(name.sub_label(), slot)?;
    }
    out.end()
}

/// Learned or hand-authored display positions for one verb group.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct OrderMapping {
    pub group: String,
    /// Hash of the training set the mapping was built from.
    pub version: u64,
    /// Element name -> 1-based rank.
    pub positions: Vec<(String, u32)>,
}

impl OrderMapping {
    pub fn position(&self, element: &str) -> Option<u32> {
        self.positions
            .iter()
            .find(|(name, _)| name == element)
            .map(|(_, rank)| *rank)
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.positions.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
