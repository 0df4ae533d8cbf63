//! Learning an [`OrderMapping`] from decomposed example sentences.

use rephrase_parser::{DecomposerConfig, Decomposition};
use rephrase_protocol::OrderMapping;
use tracing::debug;

use crate::element::{observe, Observation};
use crate::graph::learn_order;

/// Version of a training set: the first eight bytes of a BLAKE3 digest over
/// the group, the settings the examples were decomposed with, and every
/// example's text, in order.
pub fn training_version(group: &str, config: &DecomposerConfig, examples: &[Decomposition]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(group.as_bytes());
    hasher.update(&[0]);
    hasher.update(&config.rule_set().version.to_le_bytes());
    hasher.update(config.modal_policy.as_str().as_bytes());
    hasher.update(&(config.max_depth as u64).to_le_bytes());
    for example in examples {
        hasher.update(&[0]);
        hasher.update(example.sentence.text.as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Top-level elements and sub-slot elements are learned from separate
/// graphs and numbered separately.
pub fn train(group: &str, config: &DecomposerConfig, examples: &[Decomposition]) -> OrderMapping {
    let observations: Vec<Observation> = examples.iter().map(|d| observe(&d.slots)).collect();

    let top = learn_order(observations.iter().map(|o| o.top.as_slice()));
    let nested = learn_order(
        observations
            .iter()
            .flat_map(|o| o.nested.iter().map(Vec::as_slice)),
    );
    debug!(group, examples = examples.len(), top = ?top, nested = ?nested, "order learned");

    let positions = top
        .into_iter()
        .enumerate()
        .chain(nested.into_iter().enumerate())
        .map(|(index, element)| (element, index as u32 + 1))
        .collect();

    OrderMapping {
        group: group.to_string(),
        version: training_version(group, config, examples),
        positions,
    }
}
