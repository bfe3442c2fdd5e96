//! Read-only views derived from store scans. Every function here expects its
//! input in creation order, which is what `Storage::scan_food_entries` yields.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::models::FoodEntry;

pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Ascending `timestamp`. The sort is stable, so equal timestamps keep
/// creation order.
#[must_use]
pub fn sort_by_creation(mut entries: Vec<FoodEntry>) -> Vec<FoodEntry> {
    entries.sort_by_key(|e| e.timestamp);
    entries
}

/// One entry per `(name, serving)`, the most recently created of each group,
/// newest first and at most `limit` long.
#[must_use]
pub fn recent_unique(entries: Vec<FoodEntry>, limit: usize) -> Vec<FoodEntry> {
    // Phase 1: best (timestamp, creation position) per key.
    let mut best: HashMap<(String, Option<String>), (usize, FoodEntry)> = HashMap::new();
    for (pos, entry) in entries.into_iter().enumerate() {
        let key = (entry.name.clone(), entry.serving.clone());
        match best.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert((pos, entry));
            }
            Entry::Occupied(mut slot) => {
                let (held_pos, held) = slot.get();
                if (entry.timestamp, pos) > (held.timestamp, *held_pos) {
                    slot.insert((pos, entry));
                }
            }
        }
    }

    // Phase 2: newest first, later creation wins ties.
    let mut picked: Vec<(usize, FoodEntry)> = best.into_values().collect();
    picked.sort_by(|(a_pos, a), (b_pos, b)| (b.timestamp, *b_pos).cmp(&(a.timestamp, *a_pos)));
    picked.truncate(limit);
    picked.into_iter().map(|(_, entry)| entry).collect()
}

/// Parse a user-supplied limit. Anything that is not a non-negative integer
/// falls back to the default.
#[must_use]
pub fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_RECENT_LIMIT)
}
