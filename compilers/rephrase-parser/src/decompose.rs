//! Clause-by-clause slot decomposition.
//!
//! The main clause and every embedded clause go through the same routine:
//! classify the predicate's dependents, expand them into spans, settle slot
//! conflicts, then recurse into the clauses found inside those spans.

use std::collections::BTreeMap;
use std::sync::Arc;

use rephrase_protocol::{ClauseId, ClauseKind, PhraseType, Sentence, Slot, SlotName, TokenFlags, TokenId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::SlotClassifier;
use crate::clause::{Clause, ClauseDetector};
use crate::error::{SourceError, TreeError};
use crate::normalize::{Candidate, Claim, SlotNormalizer};
use crate::rules::{label_matches, DecomposerConfig, ModalPolicy, RuleFamily, RuleSet, SlotTarget};
use crate::source::DependencySource;
use crate::span::SpanExpander;
use crate::tree::DependencyTree;

/// Slot map of one sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    #[serde(rename = "text", serialize_with = "sentence_text")]
    pub sentence: Sentence,
    pub slots: BTreeMap<SlotName, Slot>,
}

fn sentence_text<S>(sentence: &Sentence, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&sentence.text)
}

impl Decomposition {
    pub fn empty(sentence: Sentence) -> Self {
        Self {
            sentence,
            slots: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, name: SlotName) -> Option<&Slot> {
        self.slots.get(&name)
    }

    /// Tokens claimed by no top-level slot that are not explained by an
    /// excluded relation on themselves or an ancestor. Empty for a
    /// well-formed tree.
    pub fn uncovered(&self, rules: &RuleSet) -> Vec<TokenId> {
        let tokens = &self.sentence.tokens;
        let covered = |id: TokenId| self.slots.values().any(|slot| slot.contains(id));
        let explained = |id: TokenId| {
            let mut current = Some(id);
            for _ in 0..=tokens.len() {
                let Some(token) = current.and_then(|c| self.sentence.token(c)) else {
                    return false;
                };
                if rules.is_predicate_excluded(token) {
                    return true;
                }
                current = token.head;
            }
            false
        };
        tokens
            .iter()
            .map(|t| t.id)
            .filter(|&id| !covered(id) && !explained(id))
            .collect()
    }
}

/// Immutable after construction; one instance serves any number of
/// sentences and threads.
#[derive(Debug, Clone)]
pub struct Decomposer {
    config: DecomposerConfig,
    rules: Arc<RuleSet>,
    classifier: SlotClassifier,
    expander: SpanExpander,
    detector: ClauseDetector,
    normalizer: SlotNormalizer,
}

impl Default for Decomposer {
    fn default() -> Self {
        Decomposer::new(DecomposerConfig::default())
    }
}

impl Decomposer {
    pub fn new(config: DecomposerConfig) -> Self {
        let rules = Arc::new(config.rule_set());
        Self {
            classifier: SlotClassifier::new(rules.clone()),
            expander: SpanExpander::new(rules.clone()),
            detector: ClauseDetector::new(rules.clone()),
            normalizer: SlotNormalizer::new(rules.clone()),
            rules,
            config,
        }
    }

    pub fn config(&self) -> &DecomposerConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Parses `text` through `source`, then decomposes it.
    pub fn decompose_text<D>(&self, source: &D, text: &str) -> Result<Decomposition, SourceError>
    where
        D: DependencySource + ?Sized,
    {
        let sentence = source.parse(text)?;
        Ok(self.decompose(&sentence)?)
    }

    pub fn decompose(&self, sentence: &Sentence) -> Result<Decomposition, TreeError> {
        if sentence.is_empty() {
            return Ok(Decomposition::empty(sentence.clone()));
        }
        let tree = DependencyTree::build(sentence)?;

        let unreachable = tree.unreachable();
        if !unreachable.is_empty() {
            warn!(count = unreachable.len(), text = %sentence.text, "tokens unreachable from the root");
        }

        let Some(main) = self.detector.main_clause(&tree) else {
            return Ok(Decomposition::empty(sentence.clone()));
        };
        let mut next_id = 1;
        let slots = self.decompose_clause(&main, &tree, &mut next_id);
        Ok(Decomposition {
            sentence: sentence.clone(),
            slots,
        })
    }

    fn decompose_clause(&self, clause: &Clause, tree: &DependencyTree<'_>, next_id: &mut u32) -> BTreeMap<SlotName, Slot> {
        let claims = self.claim_slots(clause, tree);
        let mut slots: BTreeMap<SlotName, (TokenId, Slot)> = claims
            .into_iter()
            .map(|(name, claim)| {
                let text = tree.sentence().render(&claim.tokens);
                (name, (claim.anchor, Slot::new(name, text, claim.tokens, PhraseType::Phrase)))
            })
            .collect();

        for mut embedded in self.detector.find_embedded_clauses(clause, tree) {
            embedded.id = ClauseId(*next_id);
            *next_id += 1;

            let Some(name) = slots
                .iter()
                .find(|(_, (_, slot))| slot.contains(embedded.head))
                .map(|(name, _)| *name)
            else {
                debug!(head = embedded.head.0, "embedded clause outside every slot");
                continue;
            };
            if embedded.depth > self.config.max_depth {
                warn!(depth = embedded.depth, max = self.config.max_depth, "clause nesting too deep, kept as a phrase");
                continue;
            }
            embedded.parent_slot = Some(name);

            let nested = self.decompose_clause(&embedded, tree, next_id);
            if nested.len() < 2 {
                continue;
            }
            if let Some((_, parent)) = slots.get_mut(&name) {
                for (key, sub) in nested {
                    match parent.sub_slots.get_mut(&key) {
                        Some(existing) => merge_into(existing, sub, tree),
                        None => {
                            parent.sub_slots.insert(key, sub);
                        }
                    }
                }
            }
        }

        let predicate = clause.head;
        let clause_start = clause.tokens.first().copied().unwrap_or(predicate);
        for (anchor, slot) in slots.values_mut() {
            slot.phrase_type = self
                .expander
                .phrase_type(&slot.tokens, Some(*anchor), tree, !slot.sub_slots.is_empty());
            if clause.kind == ClauseKind::Main && slot.phrase_type != PhraseType::Clause {
                if let Some(first) = slot.first_token() {
                    slot.fronted_wh = tree.token(first).has(TokenFlags::WH)
                        && (first < predicate || first == clause_start);
                }
            }
        }

        let mut slots: BTreeMap<SlotName, Slot> = slots.into_iter().map(|(name, (_, slot))| (name, slot)).collect();
        assign_display_order(&mut slots);
        debug!(clause = clause.id.0, kind = ?clause.kind, slots = slots.len(), "clause decomposed");
        slots
    }

    /// Classifies and expands the predicate's dependents, then settles them
    /// into one claim per slot name.
    fn claim_slots(&self, clause: &Clause, tree: &DependencyTree<'_>) -> BTreeMap<SlotName, Claim> {
        let predicate = clause.head;
        let children = tree.children(predicate);
        let cop = children.iter().copied().find(|&c| label_matches("cop", tree.token(c)));

        let mut predicate_tokens = self.expander.verb_unit(predicate, tree);
        let mut candidates = Vec::new();
        let mut modifiers = Vec::new();
        let mut modal = false;

        for &child in children {
            let token = tree.token(child);
            if self.rules.is_excluded(token) || predicate_tokens.contains(&child) {
                continue;
            }
            if label_matches("aux", token) && token.has(TokenFlags::MODAL) {
                modal = true;
            }
            match self.classifier.classify(token, tree) {
                Some(classification) => {
                    let tokens = self.expander.expand(child, tree).tokens;
                    match classification.target {
                        SlotTarget::Modifier => modifiers.push((child, tokens, classification.rule)),
                        SlotTarget::Slots(slots) => candidates.push(Candidate {
                            anchor: child,
                            tokens,
                            slots,
                            family: classification.family,
                            rule: classification.rule,
                            predicate: false,
                        }),
                    }
                }
                None if self.rules.is_predicate_excluded(token) => {}
                None => predicate_tokens.extend(self.expander.expand(child, tree).tokens),
            }
        }

        // "is very happy": degree words between the copula and its
        // complement belong to the complement.
        if let Some(cop) = cop {
            modifiers.retain(|(anchor, tokens, _)| {
                let inside = cop < *anchor && *anchor < predicate && !tree.token(*anchor).has(TokenFlags::NEGATION);
                if inside {
                    predicate_tokens.extend(tokens.iter().copied());
                }
                !inside
            });
        }

        let subject = candidates
            .iter()
            .filter(|c| c.slots.contains(&SlotName::S))
            .map(|c| c.anchor)
            .min()
            .unwrap_or(predicate);
        for (anchor, tokens, rule) in modifiers {
            let slots = if anchor < subject {
                vec![SlotName::M1]
            } else {
                vec![SlotName::M2, SlotName::M3]
            };
            candidates.push(Candidate {
                anchor,
                tokens,
                slots,
                family: RuleFamily::Modifier,
                rule,
                predicate: false,
            });
        }

        predicate_tokens.sort_unstable();
        predicate_tokens.dedup();
        let predicate_slots = if cop.is_some() {
            vec![SlotName::C1, SlotName::C2]
        } else if modal && self.config.modal_policy == ModalPolicy::Verb {
            vec![SlotName::Aux]
        } else {
            vec![SlotName::V]
        };
        candidates.push(Candidate {
            anchor: predicate,
            tokens: predicate_tokens,
            slots: predicate_slots,
            family: RuleFamily::Core,
            rule: 0,
            predicate: true,
        });

        let mut claims = self.normalizer.normalize(candidates);
        if let Some(antecedent) = clause.antecedent {
            self.attach_antecedent(clause, antecedent, tree, &mut claims);
        }
        claims
    }

    /// The relative word's slot is prefixed with the antecedent noun
    /// phrase; a clause with no subject of its own borrows it as `sub-s`.
    fn attach_antecedent(
        &self,
        clause: &Clause,
        antecedent: TokenId,
        tree: &DependencyTree<'_>,
        claims: &mut BTreeMap<SlotName, Claim>,
    ) {
        let core = self.expander.expand(antecedent, tree).core;

        if clause.kind == ClauseKind::Relative {
            // Relative words of clauses nested deeper belong to their own antecedents.
            let relative = clause
                .tokens
                .iter()
                .copied()
                .find(|&id| tree.token(id).has(TokenFlags::RELATIVE) && self.detector.owns(clause, id, tree));
            let claim = relative.and_then(|id| claims.values_mut().find(|claim| claim.tokens.contains(&id)));
            if let Some(claim) = claim {
                claim.tokens.extend(core.iter().copied());
                claim.tokens.sort_unstable();
                claim.tokens.dedup();
            }
        }

        if matches!(clause.kind, ClauseKind::Relative | ClauseKind::Participial) && !claims.contains_key(&SlotName::S) {
            claims.insert(
                SlotName::S,
                Claim {
                    anchor: antecedent,
                    tokens: core,
                },
            );
        }
    }
}

fn merge_into(existing: &mut Slot, incoming: Slot, tree: &DependencyTree<'_>) {
    existing.tokens.extend(incoming.tokens);
    existing.tokens.sort_unstable();
    existing.tokens.dedup();
    existing.text = tree.sentence().render(&existing.tokens);
    existing.sub_slots.extend(incoming.sub_slots);
    existing.phrase_type = if existing.sub_slots.is_empty() {
        PhraseType::Phrase
    } else {
        PhraseType::Clause
    };
}

/// Source-position order among siblings, starting at 1.
fn assign_display_order(slots: &mut BTreeMap<SlotName, Slot>) {
    let mut order: Vec<(Option<TokenId>, SlotName)> = slots.values().map(|s| (s.first_token(), s.name)).collect();
    order.sort();
    for (position, (_, name)) in order.into_iter().enumerate() {
        if let Some(slot) = slots.get_mut(&name) {
            slot.display_order = position as u32 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sentence, Row};
    use proptest::prelude::*;
    use SlotName::*;

    const BOOK: &[Row<'static>] = &[
        ("The", "the", "DET", "DT", 2, "det"),
        ("book", "book", "NOUN", "NN", 7, "nsubj"),
        ("that", "that", "PRON", "WDT", 5, "obj"),
        ("she", "she", "PRON", "PRP", 5, "nsubj"),
        ("bought", "buy", "VERB", "VBD", 2, "acl:relcl"),
        ("was", "be", "AUX", "VBD", 7, "cop"),
        ("expensive", "expensive", "ADJ", "JJ", 0, "root"),
        (".", ".", "PUNCT", ".", 7, "punct"),
    ];

    const CAN_SWIM: &[Row<'static>] = &[
        ("I", "I", "PRON", "PRP", 3, "nsubj"),
        ("can", "can", "AUX", "MD", 3, "aux"),
        ("swim", "swim", "VERB", "VB", 0, "root"),
        (".", ".", "PUNCT", ".", 3, "punct"),
    ];

    fn text(decomposition: &Decomposition, name: SlotName) -> &str {
        decomposition.slot(name).map_or("", |slot| slot.text.as_str())
    }

    #[test]
    fn test_simple_intransitive() {
        let s = sentence(&[
            ("She", "she", "PRON", "PRP", 2, "nsubj"),
            ("sings", "sing", "VERB", "VBZ", 0, "root"),
            ("beautifully", "beautifully", "ADV", "RB", 2, "advmod"),
            (".", ".", "PUNCT", ".", 2, "punct"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();

        assert_eq!(d.slots.len(), 3);
        assert_eq!(text(&d, S), "She");
        assert_eq!(text(&d, V), "sings");
        assert_eq!(text(&d, M2), "beautifully");
        assert!(d.slots.values().all(|slot| slot.phrase_type == PhraseType::Word));
        assert_eq!(d.slot(S).unwrap().display_order, 1);
        assert_eq!(d.slot(M2).unwrap().display_order, 3);
    }

    #[test]
    fn test_relative_clause_subject() {
        let s = sentence(BOOK);
        let d = Decomposer::default().decompose(&s).unwrap();

        let subject = d.slot(S).unwrap();
        assert_eq!(subject.text, "The book that she bought");
        assert_eq!(subject.phrase_type, PhraseType::Clause);
        assert_eq!(text(&d, V), "was");
        assert_eq!(text(&d, C1), "expensive");
        assert_eq!(d.slot(C1).unwrap().phrase_type, PhraseType::Word);

        let sub = &subject.sub_slots;
        assert_eq!(sub.len(), 3);
        assert_eq!(sub[&O1].text, "The book that");
        assert_eq!(sub[&S].text, "she");
        assert_eq!(sub[&V].text, "bought");
        assert_eq!(sub[&O1].display_order, 1);
        assert_eq!(sub[&V].display_order, 3);
    }

    #[test]
    fn test_modal_policies() {
        let s = sentence(CAN_SWIM);

        let d = Decomposer::default().decompose(&s).unwrap();
        assert_eq!((text(&d, S), text(&d, Aux), text(&d, V)), ("I", "can", "swim"));

        let verb = Decomposer::new(DecomposerConfig::default().with_modal_policy(ModalPolicy::Verb));
        let d = verb.decompose(&s).unwrap();
        assert_eq!((text(&d, S), text(&d, V), text(&d, Aux)), ("I", "can", "swim"));
    }

    #[test]
    fn test_empty_sentence() {
        let d = Decomposer::default().decompose(&Sentence::default()).unwrap();
        assert!(d.is_empty());
        assert!(d.uncovered(&RuleSet::default()).is_empty());
    }

    #[test]
    fn test_missing_root_propagates() {
        let mut s = sentence(CAN_SWIM);
        s.tokens[2].head = Some(TokenId(0));
        assert_eq!(Decomposer::default().decompose(&s).unwrap_err(), TreeError::MissingRoot);
    }

    #[test]
    fn test_indirect_object_takes_o1() {
        let s = sentence(&[
            ("He", "he", "PRON", "PRP", 2, "nsubj"),
            ("gave", "give", "VERB", "VBD", 0, "root"),
            ("me", "I", "PRON", "PRP", 2, "iobj"),
            ("a", "a", "DET", "DT", 5, "det"),
            ("book", "book", "NOUN", "NN", 2, "obj"),
            ("yesterday", "yesterday", "NOUN", "NN", 2, "obl:tmod"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        assert_eq!(text(&d, O1), "me");
        assert_eq!(text(&d, O2), "a book");
        assert_eq!(text(&d, M2), "yesterday");
        assert_eq!(d.slot(O2).unwrap().phrase_type, PhraseType::Phrase);
    }

    #[test]
    fn test_fronted_wh_and_m1() {
        // Where did you tell me a story ?
        let s = sentence(&[
            ("Where", "where", "ADV", "WRB", 4, "advmod"),
            ("did", "do", "AUX", "VBD", 4, "aux"),
            ("you", "you", "PRON", "PRP", 4, "nsubj"),
            ("tell", "tell", "VERB", "VB", 0, "root"),
            ("me", "I", "PRON", "PRP", 4, "iobj"),
            ("a", "a", "DET", "DT", 7, "det"),
            ("story", "story", "NOUN", "NN", 4, "obj"),
            ("?", "?", "PUNCT", ".", 4, "punct"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        let wh = d.slot(M1).unwrap();
        assert_eq!(wh.text, "Where");
        assert!(wh.fronted_wh);
        assert!(!d.slot(S).unwrap().fronted_wh);
        assert_eq!(text(&d, Aux), "did");
        assert_eq!(text(&d, O1), "me");
        assert_eq!(text(&d, O2), "a story");
    }

    #[test]
    fn test_subordinate_clause_is_not_wh() {
        // When I arrived , she left .
        let s = sentence(&[
            ("When", "when", "ADV", "WRB", 3, "advmod"),
            ("I", "I", "PRON", "PRP", 3, "nsubj"),
            ("arrived", "arrive", "VERB", "VBD", 6, "advcl"),
            (",", ",", "PUNCT", ",", 6, "punct"),
            ("she", "she", "PRON", "PRP", 6, "nsubj"),
            ("left", "leave", "VERB", "VBD", 0, "root"),
            (".", ".", "PUNCT", ".", 6, "punct"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        let m1 = d.slot(M1).unwrap();
        assert_eq!(m1.text, "When I arrived");
        assert_eq!(m1.phrase_type, PhraseType::Clause);
        assert!(!m1.fronted_wh);
        assert_eq!(m1.sub_slots[&M1].text, "When");
        assert_eq!(m1.sub_slots[&S].text, "I");
        assert_eq!(m1.sub_slots[&V].text, "arrived");
    }

    #[test]
    fn test_copula_keeps_degree_adverb() {
        let s = sentence(&[
            ("She", "she", "PRON", "PRP", 4, "nsubj"),
            ("is", "be", "AUX", "VBZ", 4, "cop"),
            ("very", "very", "ADV", "RB", 4, "advmod"),
            ("happy", "happy", "ADJ", "JJ", 0, "root"),
            ("today", "today", "NOUN", "NN", 4, "obl:tmod"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        assert_eq!(text(&d, V), "is");
        assert_eq!(text(&d, C1), "very happy");
        assert_eq!(text(&d, M2), "today");
        assert!(d.slot(O1).is_none());
    }

    #[test]
    fn test_participial_clause_borrows_subject() {
        // I saw the man sitting there .
        let s = sentence(&[
            ("I", "I", "PRON", "PRP", 2, "nsubj"),
            ("saw", "see", "VERB", "VBD", 0, "root"),
            ("the", "the", "DET", "DT", 4, "det"),
            ("man", "man", "NOUN", "NN", 2, "obj"),
            ("sitting", "sit", "VERB", "VBG", 4, "acl"),
            ("there", "there", "ADV", "RB", 5, "advmod"),
            (".", ".", "PUNCT", ".", 2, "punct"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        let object = d.slot(O1).unwrap();
        assert_eq!(object.text, "the man sitting there");
        assert_eq!(object.sub_slots[&S].text, "the man");
        assert_eq!(object.sub_slots[&V].text, "sitting");
        assert_eq!(object.sub_slots[&M2].text, "there");
    }

    #[test]
    fn test_subject_relative_keeps_antecedent_with_pronoun() {
        // The manager who called left .
        let s = sentence(&[
            ("The", "the", "DET", "DT", 2, "det"),
            ("manager", "manager", "NOUN", "NN", 5, "nsubj"),
            ("who", "who", "PRON", "WP", 4, "nsubj"),
            ("called", "call", "VERB", "VBD", 2, "acl:relcl"),
            ("left", "leave", "VERB", "VBD", 0, "root"),
            (".", ".", "PUNCT", ".", 5, "punct"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        let subject = d.slot(S).unwrap();
        assert_eq!(subject.text, "The manager who called");
        assert_eq!(subject.sub_slots.len(), 2);
        assert_eq!(subject.sub_slots[&S].text, "The manager who");
        assert_eq!(subject.sub_slots[&V].text, "called");
        assert_eq!(text(&d, V), "left");
    }

    #[test]
    fn test_nested_relative_attaches_to_its_own_pronoun() {
        let s = sentence(&[
            ("The", "the", "DET", "DT", 2, "det"),
            ("book", "book", "NOUN", "NN", 10, "nsubj"),
            ("that", "that", "PRON", "WDT", 8, "obj"),
            ("the", "the", "DET", "DT", 5, "det"),
            ("man", "man", "NOUN", "NN", 8, "nsubj"),
            ("who", "who", "PRON", "WP", 7, "nsubj"),
            ("left", "leave", "VERB", "VBD", 5, "acl:relcl"),
            ("bought", "buy", "VERB", "VBD", 2, "acl:relcl"),
            ("was", "be", "AUX", "VBD", 10, "cop"),
            ("expensive", "expensive", "ADJ", "JJ", 0, "root"),
            (".", ".", "PUNCT", ".", 10, "punct"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        let subject = d.slot(S).unwrap();
        assert_eq!(subject.text, "The book that the man who left bought");

        let sub = &subject.sub_slots;
        assert_eq!(sub[&O1].text, "The book that");
        assert_eq!(sub[&S].text, "the man who left");
        assert_eq!(sub[&V].text, "bought");

        let inner = &sub[&S].sub_slots;
        assert_eq!(inner[&S].text, "the man who");
        assert_eq!(inner[&V].text, "left");
    }

    #[test]
    fn test_adverbial_participle_does_not_borrow_main_clause() {
        // Walking home , she saw a dog .
        let s = sentence(&[
            ("Walking", "walk", "VERB", "VBG", 5, "advcl"),
            ("home", "home", "ADV", "RB", 1, "advmod"),
            (",", ",", "PUNCT", ",", 5, "punct"),
            ("she", "she", "PRON", "PRP", 5, "nsubj"),
            ("saw", "see", "VERB", "VBD", 0, "root"),
            ("a", "a", "DET", "DT", 7, "det"),
            ("dog", "dog", "NOUN", "NN", 5, "obj"),
            (".", ".", "PUNCT", ".", 5, "punct"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        let m1 = d.slot(M1).unwrap();
        assert_eq!(m1.text, "Walking home");
        assert_eq!(m1.sub_slots[&V].text, "Walking");
        assert_eq!(m1.sub_slots[&M2].text, "home");
        assert!(m1.sub_slot(S).is_none());
        for sub in m1.sub_slots.values() {
            assert!(sub.tokens.iter().all(|id| m1.contains(*id)));
        }
        assert_eq!((text(&d, S), text(&d, V), text(&d, O1)), ("she", "saw", "a dog"));
    }

    #[test]
    fn test_open_complement_fills_c2() {
        // I want to swim .
        let s = sentence(&[
            ("I", "I", "PRON", "PRP", 2, "nsubj"),
            ("want", "want", "VERB", "VBP", 0, "root"),
            ("to", "to", "PART", "TO", 4, "mark"),
            ("swim", "swim", "VERB", "VB", 2, "xcomp"),
            (".", ".", "PUNCT", ".", 2, "punct"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        assert_eq!((text(&d, S), text(&d, V), text(&d, C2)), ("I", "want", "to swim"));
        assert!(d.slot(C2).unwrap().sub_slots.is_empty());
        assert!(d.slot(O1).is_none());
    }

    #[test]
    fn test_clausal_object_decomposed_under_o1() {
        // She said that he knew the answer .
        let s = sentence(&[
            ("She", "she", "PRON", "PRP", 2, "nsubj"),
            ("said", "say", "VERB", "VBD", 0, "root"),
            ("that", "that", "SCONJ", "IN", 5, "mark"),
            ("he", "he", "PRON", "PRP", 5, "nsubj"),
            ("knew", "know", "VERB", "VBD", 2, "ccomp"),
            ("the", "the", "DET", "DT", 7, "det"),
            ("answer", "answer", "NOUN", "NN", 5, "obj"),
            (".", ".", "PUNCT", ".", 2, "punct"),
        ]);
        let d = Decomposer::default().decompose(&s).unwrap();
        let object = d.slot(O1).unwrap();
        assert_eq!(object.text, "that he knew the answer");
        assert_eq!(object.phrase_type, PhraseType::Clause);

        let sub = &object.sub_slots;
        assert_eq!(sub[&M1].text, "that");
        assert_eq!(sub[&S].text, "he");
        assert_eq!(sub[&V].text, "knew");
        assert_eq!(sub[&O1].text, "the answer");
        assert_eq!(sub[&M1].display_order, 1);
    }

    #[test]
    fn test_depth_bound_keeps_clause_as_phrase() {
        let s = sentence(BOOK);
        let shallow = Decomposer::new(DecomposerConfig::default().with_max_depth(0));
        let d = shallow.decompose(&s).unwrap();
        let subject = d.slot(S).unwrap();
        assert!(subject.sub_slots.is_empty());
        assert_eq!(subject.text, "The book that she bought");
        // Still a subject plus a finite verb.
        assert_eq!(subject.phrase_type, PhraseType::Clause);
    }

    #[test]
    fn test_word_slots_are_stable_when_redecomposed() {
        let d = Decomposer::default().decompose(&sentence(BOOK)).unwrap();
        for slot in d.slots.values().filter(|s| s.phrase_type == PhraseType::Word) {
            let alone = sentence(&[(slot.text.as_str(), slot.text.as_str(), "ADJ", "JJ", 0, "root")]);
            let again = Decomposer::default().decompose(&alone).unwrap();
            assert_eq!(again.slots.len(), 1);
            let only = again.slots.values().next().unwrap();
            assert_eq!(only.phrase_type, PhraseType::Word);
            assert!(only.sub_slots.is_empty());
        }
    }

    #[test]
    fn test_cyclic_heads_are_reported_uncovered() {
        let mut s = sentence(CAN_SWIM);
        s.tokens[0].head = Some(TokenId(1));
        s.tokens[1].head = Some(TokenId(0));
        let d = Decomposer::default().decompose(&s).unwrap();
        assert_eq!(d.uncovered(&RuleSet::default()), vec![TokenId(0), TokenId(1)]);
        assert_eq!(text(&d, V), "swim");
    }

    #[test]
    fn test_serialized_shape() {
        let d = Decomposer::default().decompose(&sentence(BOOK)).unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["text"], "The book that she bought was expensive.");
        assert_eq!(json["slots"]["S"]["phrase_type"], "clause");
        assert_eq!(json["slots"]["S"]["sub_slots"]["sub-o1"]["text"], "The book that");
        assert!(json["slots"]["V"].get("sub_slots").is_none());
    }

    /// Right-branching chains of `nmod`s, objects and relative clauses.
    fn arbitrary_sentence() -> impl Strategy<Value = Sentence> {
        let labels = prop::sample::select(vec!["nsubj", "obj", "iobj", "advmod", "det", "amod", "acl:relcl", "punct", "cc", "conj", "xcomp", "obl"]);
        prop::collection::vec((0usize..8, labels), 1..10).prop_map(|spec| {
            let rows: Vec<(String, usize, &str)> = spec
                .iter()
                .enumerate()
                .map(|(i, (head, label))| {
                    // Heads only point leftwards, so the tree is acyclic.
                    let head = if i == 0 { 0 } else { head % i + 1 };
                    (format!("w{}", i), head, *label)
                })
                .collect();
            let rows: Vec<Row<'_>> = rows
                .iter()
                .enumerate()
                .map(|(i, (form, head, label))| {
                    if i == 0 {
                        (form.as_str(), form.as_str(), "VERB", "VBD", 0, "root")
                    } else {
                        (form.as_str(), form.as_str(), "NOUN", "NN", *head, *label)
                    }
                })
                .collect();
            sentence(&rows)
        })
    }

    proptest! {
        #[test]
        fn prop_top_level_slots_cover_and_partition(s in arbitrary_sentence()) {
            let decomposer = Decomposer::default();
            let d = decomposer.decompose(&s).unwrap();
            prop_assert!(d.uncovered(decomposer.rules()).is_empty());

            let mut seen = std::collections::BTreeSet::new();
            for slot in d.slots.values() {
                for id in &slot.tokens {
                    prop_assert!(seen.insert(*id), "token {:?} in two slots", id);
                }
                if slot.phrase_type == PhraseType::Word {
                    prop_assert!(slot.sub_slots.is_empty());
                }
            }
        }
    }
}
