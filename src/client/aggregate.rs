use std::collections::HashMap;

use serde::Serialize;

use crate::state::feed::Entry;

/// Colors used by the barrage display, indexed by `AggregatedItem::color_index`.
pub const PALETTE: [&str; 10] = [
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#14b8a6",
    "#3b82f6", "#6366f1", "#a855f7", "#ec4899", "#64748b",
];

/// One distinct message with its share of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedItem {
    pub content: String,
    pub count: usize,
    /// `round(count / total * 100)`
    pub percent: u32,
    pub color_index: usize,
}

/// Group `entries` by exact content and rank by count, highest first.
///
/// Equal counts keep the order in which each content first appears in
/// `entries`. An empty list aggregates to an empty result.
pub fn aggregate(entries: &[Entry]) -> Vec<AggregatedItem> {
    let total = entries.len();
    if total == 0 {
        return Vec::new();
    }

    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, usize)> = Vec::new();

    for entry in entries {
        let content = entry.content.as_str();
        match slots.get(content) {
            Some(&i) => groups[i].1 += 1,
            None => {
                slots.insert(content, groups.len());
                groups.push((content, 1));
            }
        }
    }

    let mut items: Vec<AggregatedItem> = groups
        .into_iter()
        .map(|(content, count)| AggregatedItem {
            content: content.to_string(),
            count,
            percent: ((count as f64 / total as f64) * 100.0).round() as u32,
            color_index: color_index(content),
        })
        .collect();

    // Stable sort: ties stay in first-appearance order.
    items.sort_by(|a, b| b.count.cmp(&a.count));
    items
}

/// 31-multiplier rolling hash over UTF-16 code units, wrapping at 32 bits.
pub fn stable_hash(content: &str) -> u32 {
    content
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
        .unsigned_abs()
}

pub fn color_index(content: &str) -> usize {
    stable_hash(content) as usize % PALETTE.len()
}
