use std::sync::Arc;

use rephrase_protocol::{Token, TokenId};

use crate::rules::{RuleFamily, RuleSet, SlotTarget};
use crate::tree::DependencyTree;

/// Outcome of matching one dependent against the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub token: TokenId,
    /// Index of the winning rule; lower is stronger.
    pub rule: usize,
    pub family: RuleFamily,
    pub target: SlotTarget,
}

/// Maps a predicate's dependents to slot targets through the ranked rules.
#[derive(Debug, Clone)]
pub struct SlotClassifier {
    rules: Arc<RuleSet>,
}

impl SlotClassifier {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// First matching rule for `token`, or `None` when the relation is not
    /// a slot (excluded, or simply unmapped).
    pub fn classify(&self, token: &Token, tree: &DependencyTree<'_>) -> Option<Classification> {
        if self.rules.is_predicate_excluded(token) {
            return None;
        }
        let head = tree.head_of(token.id);
        self.rules
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches_label(token) && rule.when.holds(token, head))
            .map(|(index, rule)| Classification {
                token: token.id,
                rule: index,
                family: rule.family,
                target: rule.target.clone(),
            })
    }
}
