use rephrase_protocol::{Sentence, Token, TokenId};
use tracing::warn;

use crate::error::TreeError;

/// Index-addressed view of a parsed sentence: children lists and the root.
#[derive(Debug, Clone)]
pub struct DependencyTree<'s> {
    sentence: &'s Sentence,
    children: Vec<Vec<TokenId>>,
    root: Option<TokenId>,
}

impl<'s> DependencyTree<'s> {
    /// Validates numbering and head references. An empty sentence gives an
    /// empty tree; a non-empty one must have a root.
    pub fn build(sentence: &'s Sentence) -> Result<Self, TreeError> {
        let len = sentence.tokens.len();
        let mut children = vec![Vec::new(); len];
        let mut root = None;

        for (index, token) in sentence.tokens.iter().enumerate() {
            if token.id.index() != index {
                return Err(TreeError::Misnumbered { index, id: token.id.0 });
            }
            match token.head {
                None => {
                    if root.is_none() {
                        root = Some(token.id);
                    } else {
                        warn!(token = %token.text, "additional root ignored");
                    }
                }
                Some(head) if head.index() >= len => {
                    return Err(TreeError::HeadOutOfRange { token: token.id.0, head: head.0 });
                }
                Some(head) => children[head.index()].push(token.id),
            }
        }

        if len > 0 && root.is_none() {
            return Err(TreeError::MissingRoot);
        }

        Ok(Self { sentence, children, root })
    }

    pub fn sentence(&self) -> &'s Sentence {
        self.sentence
    }

    pub fn root(&self) -> Option<TokenId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.sentence.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentence.tokens.is_empty()
    }

    /// Ids handed out by this tree are always in range.
    pub fn token(&self, id: TokenId) -> &'s Token {
        &self.sentence.tokens[id.index()]
    }

    pub fn head_of(&self, id: TokenId) -> Option<&'s Token> {
        self.token(id).head.map(|head| self.token(head))
    }

    /// Children in source order.
    pub fn children(&self, id: TokenId) -> &[TokenId] {
        &self.children[id.index()]
    }

    /// Sorted subtree of `id` (inclusive) whose tokens satisfy `keep`;
    /// a rejected token prunes its own descendants too.
    pub fn subtree_where<F>(&self, id: TokenId, keep: F) -> Vec<TokenId>
    where
        F: Fn(&Token) -> bool,
    {
        let mut visited = vec![false; self.len()];
        let mut out = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;
            if current != id && !keep(self.token(current)) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }

        out.sort_unstable();
        out
    }

    pub fn subtree(&self, id: TokenId) -> Vec<TokenId> {
        self.subtree_where(id, |_| true)
    }

    /// Whether `ancestor` dominates `id`, walking at most `len` heads.
    pub fn dominates(&self, ancestor: TokenId, id: TokenId) -> bool {
        let mut current = Some(id);
        for _ in 0..=self.len() {
            match current {
                Some(c) if c == ancestor => return true,
                Some(c) => current = self.token(c).head,
                None => return false,
            }
        }
        false
    }

    /// Tokens the root cannot reach (cyclic heads or extra roots).
    pub fn unreachable(&self) -> Vec<TokenId> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let reachable = self.subtree(root);
        self.sentence
            .tokens
            .iter()
            .map(|t| t.id)
            .filter(|id| reachable.binary_search(id).is_err())
            .collect()
    }
}
