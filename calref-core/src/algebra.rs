//! Id-keyed event sets and the set operations over them.
//!
//! Results keep a reproducible order: intersection follows the first set,
//! union follows the caller's set order with the first occurrence winning.

use std::collections::{HashMap, HashSet};

use crate::event::Event;

/// Events of one calendar keyed by event id, remembering fetch order.
#[derive(Debug, Clone, Default)]
pub struct EventSet {
    pub calendar_id: String,
    events: Vec<Event>,
    index: HashMap<String, usize>,
}

impl EventSet {
    /// Build the id map used for set algebra.
    ///
    /// Events the caller declined are left out entirely. A repeated id keeps
    /// its first occurrence.
    pub fn from_events(calendar_id: impl Into<String>, events: Vec<Event>) -> Self {
        let mut set = EventSet {
            calendar_id: calendar_id.into(),
            ..Default::default()
        };

        for event in events {
            if event.declined_by_self() || set.index.contains_key(&event.id) {
                continue;
            }
            set.index.insert(event.id.clone(), set.events.len());
            set.events.push(event);
        }

        set
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.index.get(id).map(|&i| &self.events[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

/// Events whose id is present in every set, in the first set's order.
pub fn intersection(sets: &[EventSet]) -> Vec<Event> {
    let Some((first, rest)) = sets.split_first() else {
        return Vec::new();
    };

    first
        .iter()
        .filter(|event| rest.iter().all(|set| set.contains(&event.id)))
        .cloned()
        .collect()
}

/// One event per distinct id, the first occurrence across `sets` winning.
pub fn union(sets: &[EventSet]) -> Vec<Event> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for set in sets {
        for event in set.iter() {
            if seen.insert(event.id.as_str()) {
                result.push(event.clone());
            }
        }
    }

    result
}

/// Stable sort on the rendered start string.
///
/// This is a string comparison, not a time comparison: an all-day
/// `2024-01-02` sorts before `2024-01-02T09:00:00+09:00` because it is a
/// prefix of it.
pub fn sort_by_start(events: &mut [Event]) {
    events.sort_by_cached_key(|e| e.start_key());
}
