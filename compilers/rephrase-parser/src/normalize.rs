use std::collections::BTreeMap;
use std::sync::Arc;

use rephrase_protocol::{SlotName, TokenId};
use tracing::debug;

use crate::rules::{RuleFamily, RuleSet};

/// A dependent's claim on one of its candidate slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub anchor: TokenId,
    pub tokens: Vec<TokenId>,
    /// Tried in order; the last one absorbs overflow.
    pub slots: Vec<SlotName>,
    pub family: RuleFamily,
    pub rule: usize,
    /// The clause predicate itself claims first.
    pub predicate: bool,
}

/// A settled slot: its first claimant's anchor and the union of all tokens
/// merged into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub anchor: TokenId,
    pub tokens: Vec<TokenId>,
}

/// Settles competing claims so that every slot name is used at most once.
#[derive(Debug, Clone)]
pub struct SlotNormalizer {
    rules: Arc<RuleSet>,
}

impl SlotNormalizer {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Claims are served predicate first, then by family priority, rule rank
    /// and source position. Each takes the first free slot in its list or
    /// merges into the last one.
    pub fn normalize(&self, mut candidates: Vec<Candidate>) -> BTreeMap<SlotName, Claim> {
        candidates.sort_by_key(|c| (!c.predicate, self.rules.family_rank(c.family), c.rule, c.anchor));

        let mut claims: BTreeMap<SlotName, Claim> = BTreeMap::new();
        for candidate in candidates {
            let Some(&last) = candidate.slots.last() else {
                continue;
            };
            let name = candidate
                .slots
                .iter()
                .copied()
                .find(|name| !claims.contains_key(name))
                .unwrap_or(last);

            match claims.get_mut(&name) {
                Some(claim) => {
                    debug!(slot = %name, anchor = candidate.anchor.0, "merged into occupied slot");
                    claim.tokens.extend(candidate.tokens);
                    claim.tokens.sort_unstable();
                    claim.tokens.dedup();
                }
                None => {
                    claims.insert(
                        name,
                        Claim {
                            anchor: candidate.anchor,
                            tokens: candidate.tokens,
                        },
                    );
                }
            }
        }
        claims
    }
}
