//! Merge per-source collections into one deduplicated list.

use std::collections::hash_map::Entry as Slot;
use std::collections::HashMap;
use tracing::debug;

use crate::entry::{Entry, PriorityTable};

/// Combine collections, keeping one entry per command.
///
/// The entry from the best-ranked source wins wholesale; within the same
/// rank the first occurrence wins. Output is grouped by rank, and inside a
/// rank entries keep their input order (collection order, then record order).
pub fn merge_sources(collections: Vec<Vec<Entry>>, priority: &PriorityTable) -> Vec<Entry> {
    let entries: Vec<Entry> = collections.into_iter().flatten().collect();
    let total = entries.len();

    // command -> (rank, index of the winning entry)
    let mut winners: HashMap<&str, (u8, usize)> = HashMap::with_capacity(total);
    for (idx, entry) in entries.iter().enumerate() {
        let rank = priority.rank(entry.source);
        match winners.entry(entry.command.as_str()) {
            Slot::Occupied(mut slot) => {
                if rank < slot.get().0 {
                    slot.insert((rank, idx));
                }
            }
            Slot::Vacant(slot) => {
                slot.insert((rank, idx));
            }
        }
    }

    let mut order: Vec<(u8, usize)> = winners.into_values().collect();
    order.sort_unstable();

    let mut slots: Vec<Option<Entry>> = entries.into_iter().map(Some).collect();
    let merged: Vec<Entry> = order
        .into_iter()
        .filter_map(|(_, idx)| slots[idx].take())
        .collect();

    debug!(
        "Merged {} entries into {} ({} duplicates dropped)",
        total,
        merged.len(),
        total - merged.len()
    );
    merged
}
