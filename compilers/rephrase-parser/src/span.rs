use std::sync::Arc;

use rephrase_protocol::{PhraseType, TokenFlags, TokenId};

use crate::clause::is_subject;
use crate::rules::RuleSet;
use crate::tree::DependencyTree;

/// Tokens gathered for one slot head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Everything the slot text covers, embedded clauses included.
    pub tokens: Vec<TokenId>,
    /// The head and its attachable modifiers, without embedded clauses.
    pub core: Vec<TokenId>,
}

#[derive(Debug, Clone)]
pub struct SpanExpander {
    rules: Arc<RuleSet>,
}

impl SpanExpander {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Expands a non-predicate head. Excluded relations are dropped with
    /// their subtree; clause-labelled children stop the walk but still count
    /// toward the slot text.
    pub fn expand(&self, head: TokenId, tree: &DependencyTree<'_>) -> Expansion {
        let mut expansion = Expansion::default();
        let mut visited = vec![false; tree.len()];
        let mut stack = vec![head];

        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;
            expansion.core.push(current);

            for &child in tree.children(current) {
                let token = tree.token(child);
                if self.rules.is_excluded(token) {
                    continue;
                }
                if self.rules.is_clause_label(token) {
                    expansion
                        .tokens
                        .extend(tree.subtree_where(child, |t| !self.rules.is_excluded(t)));
                } else {
                    stack.push(child);
                }
            }
        }

        expansion.core.sort_unstable();
        expansion.tokens.extend(expansion.core.iter().copied());
        expansion.tokens.sort_unstable();
        expansion.tokens.dedup();
        expansion
    }

    /// The verb itself plus particles, the infinitive marker and fixed
    /// parts: "pick up", "to swim".
    pub fn verb_unit(&self, head: TokenId, tree: &DependencyTree<'_>) -> Vec<TokenId> {
        let mut unit = vec![head];
        for &child in tree.children(head) {
            if self.rules.is_tight(tree.token(child)) {
                unit.extend(tree.subtree_where(child, |t| !self.rules.is_excluded(t)));
            }
        }
        unit.sort_unstable();
        unit.dedup();
        unit
    }

    /// Classifies a finished slot span. `anchor` is the token the slot was
    /// built from, if any.
    pub fn phrase_type(
        &self,
        tokens: &[TokenId],
        anchor: Option<TokenId>,
        tree: &DependencyTree<'_>,
        has_sub_slots: bool,
    ) -> PhraseType {
        if has_sub_slots {
            return PhraseType::Clause;
        }
        if tokens.len() <= 1 {
            return PhraseType::Word;
        }
        if let Some(anchor) = anchor {
            let tight = tokens.iter().all(|&id| {
                id == anchor || {
                    let token = tree.token(id);
                    token.head == Some(anchor) && self.rules.is_tight(token)
                }
            });
            if tight {
                return PhraseType::Word;
            }
        }
        if self.has_subject_and_finite_verb(tokens, tree) {
            PhraseType::Clause
        } else {
            PhraseType::Phrase
        }
    }

    fn has_subject_and_finite_verb(&self, tokens: &[TokenId], tree: &DependencyTree<'_>) -> bool {
        let inside = |id: &TokenId| tokens.binary_search(id).is_ok();
        tokens.iter().any(|&id| {
            let children = tree.children(id);
            let finite = tree.token(id).has(TokenFlags::FINITE)
                || children
                    .iter()
                    .any(|c| inside(c) && tree.token(*c).has(TokenFlags::FINITE));
            let subject = children.iter().any(|c| inside(c) && is_subject(tree.token(*c)));
            finite && subject
        })
    }
}
