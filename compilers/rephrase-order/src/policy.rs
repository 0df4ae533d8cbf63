use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rephrase_protocol::{Slot, SlotName};
use tracing::debug;

use crate::cache::OrderCache;
use crate::element::{element_of, WH};

/// The group every lookup falls back to.
pub const DEFAULT_GROUP: &str = "*";

/// Display positions for one slot map and, recursively, for the sub-slots
/// of each of its slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    pub positions: BTreeMap<SlotName, u32>,
    pub nested: BTreeMap<SlotName, Ranking>,
}

impl Ranking {
    pub fn position(&self, name: SlotName) -> Option<u32> {
        self.positions.get(&name).copied()
    }

    pub fn nested(&self, name: SlotName) -> Option<&Ranking> {
        self.nested.get(&name)
    }

    /// Slot names from first to last.
    pub fn ordered(&self) -> Vec<SlotName> {
        let mut names: Vec<(u32, SlotName)> = self.positions.iter().map(|(name, rank)| (*rank, *name)).collect();
        names.sort();
        names.into_iter().map(|(_, name)| name).collect()
    }
}

pub trait OrderPolicy {
    fn resolve_order(&self, slots: &BTreeMap<SlotName, Slot>, group: &str) -> Ranking;

    /// Resolves and writes the ranks into `display_order`.
    fn order(&self, slots: &mut BTreeMap<SlotName, Slot>, group: &str) {
        let ranking = self.resolve_order(slots, group);
        apply_ranking(slots, &ranking);
    }
}

pub fn apply_ranking(slots: &mut BTreeMap<SlotName, Slot>, ranking: &Ranking) {
    for (name, slot) in slots.iter_mut() {
        if let Some(rank) = ranking.position(*name) {
            slot.display_order = rank;
        }
        if let Some(nested) = ranking.nested(*name) {
            apply_ranking(&mut slot.sub_slots, nested);
        }
    }
}

/// Ranks the present elements by their canonical position, then appends
/// unseen elements in lexical order. Ranks are dense from 1.
pub(crate) fn rank_level(
    slots: &BTreeMap<SlotName, Slot>,
    top_level: bool,
    position: &dyn Fn(&str, bool) -> Option<u32>,
) -> Ranking {
    let mut present: Vec<(Option<u32>, String, SlotName)> = slots
        .iter()
        .map(|(name, slot)| {
            let element = element_of(slot, top_level);
            (position(&element, top_level), element, *name)
        })
        .collect();
    present.sort_by(|a, b| {
        let known = match (a.0, b.0) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        known.then_with(|| a.1.cmp(&b.1)).then_with(|| a.2.cmp(&b.2))
    });

    let mut ranking = Ranking::default();
    for (index, (_, _, name)) in present.into_iter().enumerate() {
        ranking.positions.insert(name, index as u32 + 1);
    }
    for (name, slot) in slots {
        if !slot.sub_slots.is_empty() {
            ranking.nested.insert(*name, rank_level(&slot.sub_slots, false, position));
        }
    }
    ranking
}

/// Hand-authored positions keyed by (group, element, wh-question).
#[derive(Debug, Clone, Default)]
pub struct FixedTemplate {
    table: HashMap<(String, String, bool), u32>,
}

impl FixedTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declarative and wh-question orders under the default group, plus the
    /// sub-slot order used inside embedded clauses.
    pub fn english() -> Self {
        let mut template = FixedTemplate::new();
        template.insert_sequence(DEFAULT_GROUP, false, &["M1", "S", "Aux", "M2", "V", "O1", "O2", "C1", "C2", "M3"]);
        template.insert_sequence(DEFAULT_GROUP, true, &[WH, "M1", "Aux", "S", "M2", "V", "O1", "O2", "C1", "C2", "M3"]);
        let sub: Vec<&str> = [SlotName::M1, SlotName::S, SlotName::Aux, SlotName::M2, SlotName::V]
            .into_iter()
            .chain([SlotName::O1, SlotName::O2, SlotName::C1, SlotName::C2, SlotName::M3])
            .map(SlotName::sub_label)
            .collect();
        template.insert_sequence(DEFAULT_GROUP, false, &sub);
        template
    }

    pub fn insert(&mut self, group: &str, element: &str, wh: bool, position: u32) {
        self.table.insert((group.to_string(), element.to_string(), wh), position);
    }

    /// Positions `elements` 1.. in the given order. Sub-slot elements keep a
    /// separate numbering from top-level ones.
    pub fn insert_sequence(&mut self, group: &str, wh: bool, elements: &[&str]) {
        for (index, element) in elements.iter().enumerate() {
            self.insert(group, element, wh, index as u32 + 1);
        }
    }

    pub fn position(&self, group: &str, element: &str, wh: bool) -> Option<u32> {
        let key = |g: &str| (g.to_string(), element.to_string(), wh);
        self.table
            .get(&key(group))
            .or_else(|| self.table.get(&key(DEFAULT_GROUP)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl OrderPolicy for FixedTemplate {
    fn resolve_order(&self, slots: &BTreeMap<SlotName, Slot>, group: &str) -> Ranking {
        let wh = slots.values().any(|slot| slot.fronted_wh);
        // Sub-slot elements are looked up in the declarative table.
        rank_level(slots, true, &|element: &str, top_level: bool| {
            self.position(group, element, wh && top_level)
        })
    }
}

/// Orders slots by the mapping learned for the group; groups with no
/// mapping fall back to a template.
#[derive(Debug, Clone)]
pub struct DataDriven {
    cache: Arc<OrderCache>,
    fallback: FixedTemplate,
}

impl DataDriven {
    pub fn new(cache: Arc<OrderCache>) -> Self {
        Self {
            cache,
            fallback: FixedTemplate::english(),
        }
    }

    pub fn with_fallback(mut self, fallback: FixedTemplate) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn cache(&self) -> &Arc<OrderCache> {
        &self.cache
    }
}

impl OrderPolicy for DataDriven {
    fn resolve_order(&self, slots: &BTreeMap<SlotName, Slot>, group: &str) -> Ranking {
        match self.cache.current(group) {
            Some(mapping) => rank_level(slots, true, &|element: &str, _: bool| mapping.position(element)),
            None => {
                debug!(group, "no learned order, using the template");
                self.fallback.resolve_order(slots, group)
            }
        }
    }
}
