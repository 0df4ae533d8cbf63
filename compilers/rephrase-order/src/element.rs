//! Ordering elements: the units whose relative position is learned.

use std::collections::BTreeMap;

use rephrase_protocol::{Slot, SlotName};

/// Element name of a fronted wh-word slot in the main clause.
pub const WH: &str = "wh";

/// `wh` for a fronted wh slot, the slot name at the top level, the
/// `sub-*` label below it.
pub fn element_of(slot: &Slot, top_level: bool) -> String {
    if !top_level {
        slot.name.sub_label().to_string()
    } else if slot.fronted_wh {
        WH.to_string()
    } else {
        slot.name.as_str().to_string()
    }
}

/// Element sequences of one decomposed example, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub top: Vec<String>,
    /// One sequence per slot carrying sub-slots, at any depth.
    pub nested: Vec<Vec<String>>,
}

pub fn observe(slots: &BTreeMap<SlotName, Slot>) -> Observation {
    let mut observation = Observation {
        top: sequence(slots, true),
        nested: Vec::new(),
    };
    let mut stack: Vec<&Slot> = slots.values().collect();
    while let Some(slot) = stack.pop() {
        if slot.sub_slots.is_empty() {
            continue;
        }
        observation.nested.push(sequence(&slot.sub_slots, false));
        stack.extend(slot.sub_slots.values());
    }
    observation
}

fn sequence(slots: &BTreeMap<SlotName, Slot>, top_level: bool) -> Vec<String> {
    let mut placed: Vec<(_, String)> = slots
        .values()
        .map(|slot| (slot.first_token(), element_of(slot, top_level)))
        .collect();
    placed.sort();

    let mut elements: Vec<String> = Vec::with_capacity(placed.len());
    for (_, element) in placed {
        if !elements.contains(&element) {
            elements.push(element);
        }
    }
    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use rephrase_protocol::{PhraseType, TokenId};

    fn slot(name: SlotName, first: u32) -> Slot {
        Slot::new(name, String::new(), vec![TokenId(first)], PhraseType::Word)
    }

    #[test]
    fn test_sequence_follows_first_token() {
        let mut object = slot(SlotName::O2, 0);
        object.fronted_wh = true;
        let mut subject = slot(SlotName::S, 2);
        subject.sub_slots.insert(SlotName::V, slot(SlotName::V, 3));
        subject.sub_slots.insert(SlotName::O1, slot(SlotName::O1, 2));

        let slots: BTreeMap<_, _> = [
            (SlotName::O2, object),
            (SlotName::Aux, slot(SlotName::Aux, 1)),
            (SlotName::S, subject),
            (SlotName::V, slot(SlotName::V, 4)),
        ]
        .into_iter()
        .collect();

        let observation = observe(&slots);
        assert_eq!(observation.top, vec!["wh", "Aux", "S", "V"]);
        assert_eq!(observation.nested, vec![vec!["sub-o1".to_string(), "sub-v".to_string()]]);
    }
}
