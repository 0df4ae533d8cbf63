//! Versioned rule configuration shared by every stage of the decomposer.
//!
//! A single [`RuleSet`] replaces per-handler label tables: the classifier,
//! the span expander and the clause detector all read from the same value.

use rephrase_protocol::{SlotName, Token, TokenFlags};
use serde::{Deserialize, Serialize};

pub const RULESET_VERSION: u32 = 1;

/// Rule families act as the "engines" whose claims the normalizer ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleFamily {
    #[default]
    Core,
    Copula,
    Modifier,
}

/// Extra check a rule makes beyond the dependency label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Always,
    /// The dependent is a modal verb.
    Modal,
    /// The dependent is not the infinitival "to".
    NotInfinitiveMarker,
    /// The governing token is a linking verb ("be").
    HeadIsCopula,
}

impl Condition {
    pub fn holds(self, token: &Token, head: Option<&Token>) -> bool {
        match self {
            Condition::Always => true,
            Condition::Modal => token.has(TokenFlags::MODAL),
            Condition::NotInfinitiveMarker => !token.has(TokenFlags::INFINITIVE_MARKER),
            Condition::HeadIsCopula => head.map_or(false, |h| h.has(TokenFlags::COPULA)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotTarget {
    /// Candidate slots tried left to right; when all are taken the claim
    /// merges into the last one.
    Slots(Vec<SlotName>),
    /// M1 / M2 / M3, chosen by position relative to the subject.
    Modifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub labels: Vec<String>,
    #[serde(default)]
    pub when: Condition,
    pub target: SlotTarget,
    #[serde(default)]
    pub family: RuleFamily,
}

impl Rule {
    fn new(labels: &[&str], when: Condition, target: SlotTarget, family: RuleFamily) -> Self {
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            when,
            target,
            family,
        }
    }

    pub fn matches_label(&self, token: &Token) -> bool {
        self.labels.iter().any(|label| label_matches(label, token))
    }
}

/// `obl` matches `obl` and `obl:tmod`; `acl:relcl` only matches itself.
pub fn label_matches(label: &str, token: &Token) -> bool {
    if label.contains(':') {
        token.deprel.eq_ignore_ascii_case(label)
    } else {
        token.base_deprel().eq_ignore_ascii_case(label)
    }
}

/// Which verb of "I can swim" is the V slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModalPolicy {
    /// Modal in Aux, lexical verb in V.
    #[default]
    Auxiliary,
    /// Modal in V, lexical verb in Aux.
    Verb,
}

impl ModalPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ModalPolicy::Auxiliary => "auxiliary",
            ModalPolicy::Verb => "verb",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub version: u32,
    /// Ranked; the first matching rule wins.
    pub rules: Vec<Rule>,
    /// Never mapped to a slot, and dropped from spans along with their subtree.
    pub excluded: Vec<String>,
    /// Not mapped when attached directly to a clause predicate.
    pub predicate_excluded: Vec<String>,
    /// Labels whose subtree is an embedded clause.
    pub clause_labels: Vec<String>,
    /// Labels that bind into the head word itself (phrasal verbs, fixed expressions).
    pub tight_labels: Vec<String>,
    /// Normalizer ranking, strongest first.
    pub family_priority: Vec<RuleFamily>,
}

impl RuleSet {
    pub fn english(policy: ModalPolicy) -> Self {
        use Condition::*;
        use RuleFamily::*;
        use SlotName::*;

        let slots = |names: &[SlotName]| SlotTarget::Slots(names.to_vec());

        let mut rules = vec![Rule::new(
            &["nsubj", "nsubj:pass", "nsubjpass", "csubj", "csubj:pass", "csubjpass", "expl"],
            Always,
            slots(&[S]),
            Core,
        )];
        if policy == ModalPolicy::Verb {
            rules.push(Rule::new(&["aux", "aux:pass", "auxpass"], Modal, slots(&[V]), Core));
        }
        rules.extend([
            Rule::new(&["aux", "aux:pass", "auxpass"], NotInfinitiveMarker, slots(&[Aux]), Core),
            Rule::new(&["cop"], Always, slots(&[V, Aux]), Copula),
            Rule::new(&["obj", "dobj"], HeadIsCopula, slots(&[C1, C2]), Copula),
            Rule::new(&["iobj", "dative"], Always, slots(&[O1, O2]), Core),
            Rule::new(&["obj", "dobj"], Always, slots(&[O1, O2]), Core),
            Rule::new(&["ccomp"], Always, slots(&[O1, O2]), Core),
            Rule::new(&["attr", "acomp"], Always, slots(&[C1, C2]), Copula),
            Rule::new(&["oprd", "xcomp"], Always, slots(&[C2]), Core),
            Rule::new(
                &[
                    "advmod", "npadvmod", "obl", "prep", "agent", "advcl", "mark", "neg", "nmod:tmod",
                    "nmod:npmod",
                ],
                NotInfinitiveMarker,
                SlotTarget::Modifier,
                Modifier,
            ),
        ]);

        Self {
            version: RULESET_VERSION,
            rules,
            excluded: strings(&[
                "punct",
                "discourse",
                "reparandum",
                "vocative",
                "dep",
                "list",
                "parataxis",
            ]),
            predicate_excluded: strings(&["cc", "conj", "dislocated", "preconj"]),
            clause_labels: strings(&[
                "acl:relcl",
                "relcl",
                "acl",
                "advcl",
                "ccomp",
                "xcomp",
                "csubj",
                "csubj:pass",
                "csubjpass",
            ]),
            tight_labels: strings(&["prt", "compound:prt", "fixed", "flat", "goeswith"]),
            family_priority: vec![Core, Copula, Modifier],
        }
    }

    pub fn is_excluded(&self, token: &Token) -> bool {
        self.excluded.iter().any(|label| label_matches(label, token))
    }

    pub fn is_predicate_excluded(&self, token: &Token) -> bool {
        self.is_excluded(token) || self.predicate_excluded.iter().any(|label| label_matches(label, token))
    }

    pub fn is_clause_label(&self, token: &Token) -> bool {
        self.clause_labels.iter().any(|label| label_matches(label, token))
    }

    pub fn is_tight(&self, token: &Token) -> bool {
        token.has(TokenFlags::INFINITIVE_MARKER) || self.tight_labels.iter().any(|label| label_matches(label, token))
    }

    /// Position of a family in the priority table; unknown families rank last.
    pub fn family_rank(&self, family: RuleFamily) -> usize {
        self.family_priority
            .iter()
            .position(|f| *f == family)
            .unwrap_or(self.family_priority.len())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::english(ModalPolicy::default())
    }
}

fn strings(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

/// Everything the decomposer needs besides the sentence itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposerConfig {
    pub modal_policy: ModalPolicy,
    /// Deepest clause nesting that is still decomposed into sub-slots.
    pub max_depth: usize,
    /// `None` builds the English table for `modal_policy`.
    pub rules: Option<RuleSet>,
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self {
            modal_policy: ModalPolicy::Auxiliary,
            max_depth: 8,
            rules: None,
        }
    }
}

impl DecomposerConfig {
    pub fn with_modal_policy(mut self, policy: ModalPolicy) -> Self {
        self.modal_policy = policy;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn rule_set(&self) -> RuleSet {
        self.rules
            .clone()
            .unwrap_or_else(|| RuleSet::english(self.modal_policy))
    }
}
