pub mod classify;
pub mod clause;
pub mod conllu;
pub mod decompose;
pub mod error;
pub mod normalize;
pub mod rules;
pub mod source;
pub mod spacy;
pub mod span;
pub mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{Classification, SlotClassifier};
pub use clause::{Clause, ClauseDetector};
pub use conllu::ConlluCorpus;
pub use decompose::{Decomposer, Decomposition};
pub use error::{SourceError, TreeError};
pub use normalize::{Candidate, Claim, SlotNormalizer};
pub use rules::{DecomposerConfig, ModalPolicy, RuleFamily, RuleSet, SlotTarget};
pub use source::{DependencySource, Pretagged};
pub use span::{Expansion, SpanExpander};
pub use tree::DependencyTree;
