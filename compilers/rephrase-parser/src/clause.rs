use std::sync::Arc;

use rephrase_protocol::{ClauseId, ClauseKind, SlotName, TokenFlags, TokenId};
use tracing::{debug, warn};

use crate::rules::{label_matches, RuleSet};
use crate::tree::DependencyTree;

/// A predicate and the subtree it governs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub id: ClauseId,
    /// The predicate token.
    pub head: TokenId,
    /// Full subtree of the head without excluded relations, sorted.
    pub tokens: Vec<TokenId>,
    pub kind: ClauseKind,
    /// Slot of the enclosing clause holding this clause's head; `None` for
    /// the main clause.
    pub parent_slot: Option<SlotName>,
    pub depth: usize,
    /// Noun modified by a relative or participial clause.
    pub antecedent: Option<TokenId>,
}

#[derive(Debug, Clone)]
pub struct ClauseDetector {
    rules: Arc<RuleSet>,
}

impl ClauseDetector {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn main_clause(&self, tree: &DependencyTree<'_>) -> Option<Clause> {
        let root = tree.root()?;
        Some(Clause {
            id: ClauseId(0),
            head: root,
            tokens: self.region(root, tree),
            kind: ClauseKind::Main,
            parent_slot: None,
            depth: 0,
            antecedent: None,
        })
    }

    /// Clauses directly embedded in `clause`. The walk covers the clause's
    /// own tokens and stops at every clause it finds, so deeper clauses come
    /// out when that clause is decomposed in turn. Clause-labelled subtrees
    /// without a predicate are folded back into the parent.
    pub fn find_embedded_clauses(&self, clause: &Clause, tree: &DependencyTree<'_>) -> Vec<Clause> {
        let mut found = Vec::new();
        let mut visited = vec![false; tree.len()];
        visited[clause.head.index()] = true;
        let mut stack: Vec<TokenId> = tree.children(clause.head).iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;

            let token = tree.token(current);
            if self.rules.is_excluded(token) {
                continue;
            }
            if self.rules.is_clause_label(token) {
                if self.has_predicate(current, tree) {
                    let kind = self.kind_of(current, tree);
                    debug!(head = %token.text, ?kind, depth = clause.depth + 1, "embedded clause");
                    found.push(Clause {
                        id: ClauseId(0),
                        head: current,
                        tokens: self.region(current, tree),
                        kind,
                        parent_slot: None,
                        depth: clause.depth + 1,
                        antecedent: match kind {
                            ClauseKind::Relative | ClauseKind::Participial if modifies_noun(token) => token.head,
                            _ => None,
                        },
                    });
                    continue;
                }
                warn!(head = %token.text, deprel = %token.deprel, "clause without a predicate folded into its parent");
            }
            stack.extend(tree.children(current).iter().rev());
        }

        found.sort_by_key(|c| c.head);
        found
    }

    /// A clause needs a verbal head, a copula or a subject of its own.
    pub fn has_predicate(&self, head: TokenId, tree: &DependencyTree<'_>) -> bool {
        if tree.token(head).pos.is_verbal() {
            return true;
        }
        tree.children(head).iter().any(|&child| {
            let token = tree.token(child);
            label_matches("cop", token) || is_subject(token)
        })
    }

    /// Finite `acl` is relative; `-ing`/`-ed` heads of `acl` and bare
    /// `advcl` are participial; an infinitival `acl` is a complement.
    pub fn kind_of(&self, head: TokenId, tree: &DependencyTree<'_>) -> ClauseKind {
        let token = tree.token(head);
        let finite = self.is_finite(head, tree);
        let participle = token.has(TokenFlags::PARTICIPLE);

        if label_matches("acl:relcl", token) || label_matches("relcl", token) {
            return ClauseKind::Relative;
        }
        if label_matches("acl", token) {
            return match (finite, participle) {
                (true, _) => ClauseKind::Relative,
                (false, true) => ClauseKind::Participial,
                (false, false) => ClauseKind::Complement,
            };
        }
        if label_matches("advcl", token) {
            let subordinated = tree
                .children(head)
                .iter()
                .any(|&c| tree.token(c).has(TokenFlags::SUBORDINATOR) || label_matches("mark", tree.token(c)));
            return if participle && !subordinated && !finite {
                ClauseKind::Participial
            } else {
                ClauseKind::Subordinate
            };
        }
        ClauseKind::Complement
    }

    /// Whether `id` belongs to `clause` itself rather than to a clause
    /// embedded somewhere inside it.
    pub fn owns(&self, clause: &Clause, id: TokenId, tree: &DependencyTree<'_>) -> bool {
        if clause.tokens.binary_search(&id).is_err() {
            return false;
        }
        !clause.tokens.iter().any(|&head| {
            head != clause.head
                && self.rules.is_clause_label(tree.token(head))
                && self.has_predicate(head, tree)
                && tree.dominates(head, id)
        })
    }

    fn is_finite(&self, head: TokenId, tree: &DependencyTree<'_>) -> bool {
        tree.token(head).has(TokenFlags::FINITE)
            || tree.children(head).iter().any(|&c| {
                let child = tree.token(c);
                child.has(TokenFlags::FINITE) && (label_matches("aux", child) || label_matches("cop", child))
            })
    }

    fn region(&self, head: TokenId, tree: &DependencyTree<'_>) -> Vec<TokenId> {
        tree.subtree_where(head, |t| !self.rules.is_excluded(t))
    }
}

/// Relative and participial clauses hang off the noun they describe.
fn modifies_noun(token: &rephrase_protocol::Token) -> bool {
    label_matches("acl", token) || label_matches("relcl", token)
}

pub(crate) fn is_subject(token: &rephrase_protocol::Token) -> bool {
    ["nsubj", "nsubjpass", "csubj", "csubjpass", "expl"]
        .iter()
        .any(|label| label_matches(label, token))
}
