//! Inventory indexing.
//!
//! Turns the raw inventory payload into per-class counts, the class id →
//! description lookup, and the ordered work list of distinct market hash
//! names for the price fetcher. The placeholder filler item is dropped
//! before anything is counted or queued.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::types::{Description, InventoryPayload};

/// Counts, names and work list derived from one inventory snapshot.
#[derive(Debug, Clone, Default)]
pub struct InventoryIndex {
    /// class id → number of assets carrying it.
    pub counts: HashMap<String, u32>,
    /// class id → description, in first-seen order, placeholder excluded.
    pub descriptions: IndexMap<String, Description>,
    /// Distinct market hash names in first-seen order.
    pub work_list: Vec<String>,
}

impl InventoryIndex {
    /// Index a payload, skipping descriptions whose display name equals
    /// `placeholder_name`.
    pub fn build(payload: &InventoryPayload, placeholder_name: &str) -> Self {
        let mut descriptions: IndexMap<String, Description> = IndexMap::new();
        for desc in &payload.descriptions {
            if desc.display_name == placeholder_name {
                continue;
            }
            descriptions
                .entry(desc.class_id.clone())
                .or_insert_with(|| desc.clone());
        }

        let mut counts: HashMap<String, u32> = HashMap::new();
        for asset in &payload.assets {
            if descriptions.contains_key(&asset.class_id) {
                *counts.entry(asset.class_id.clone()).or_insert(0) += 1;
            }
        }

        let work_list: Vec<String> = descriptions
            .values()
            .filter_map(|desc| desc.market_hash_name.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();

        let skipped = payload.descriptions.len() - descriptions.len();
        debug!(skipped, placeholder = placeholder_name, "Descriptions filtered");
        info!(
            assets = payload.assets.len(),
            item_types = descriptions.len(),
            distinct_names = work_list.len(),
            "Inventory indexed"
        );

        Self {
            counts,
            descriptions,
            work_list,
        }
    }

    /// Number of assets of the given class.
    pub fn count_of(&self, class_id: &str) -> u32 {
        self.counts.get(class_id).copied().unwrap_or(0)
    }

    /// Total count for a market hash name across every class id that
    /// carries it. `None` when no indexed description has that name.
    pub fn count_for_name(&self, market_hash_name: &str) -> Option<u32> {
        let mut matched = false;
        let mut total = 0;
        for (class_id, desc) in &self.descriptions {
            if desc.market_hash_name.as_deref() == Some(market_hash_name) {
                matched = true;
                total += self.count_of(class_id);
            }
        }
        matched.then_some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Asset;

    fn asset(class_id: &str) -> Asset {
        Asset {
            class_id: class_id.to_string(),
            assetid: None,
        }
    }

    fn desc(class_id: &str, name: &str, hash_name: Option<&str>) -> Description {
        Description {
            class_id: class_id.to_string(),
            display_name: name.to_string(),
            market_hash_name: hash_name.map(String::from),
        }
    }

    fn sample() -> InventoryPayload {
        InventoryPayload {
            assets: vec![
                asset("10"),
                asset("20"),
                asset("10"),
                asset("99"),
                asset("10"),
                asset("30"),
            ],
            descriptions: vec![
                desc("10", "Golden Banana", Some("Golden Banana")),
                desc("99", "Banana", Some("Banana")),
                desc("20", "Rotten Banana", Some("Rotten Banana")),
                desc("30", "Unlisted Hat", None),
            ],
        }
    }

    #[test]
    fn test_counts_exclude_placeholder() {
        let index = InventoryIndex::build(&sample(), "Banana");
        assert_eq!(index.count_of("10"), 3);
        assert_eq!(index.count_of("20"), 1);
        assert_eq!(index.count_of("99"), 0);
        assert!(!index.descriptions.contains_key("99"));
    }

    #[test]
    fn test_work_list_first_seen_order() {
        let index = InventoryIndex::build(&sample(), "Banana");
        assert_eq!(index.work_list, vec!["Golden Banana", "Rotten Banana"]);
    }

    #[test]
    fn test_item_without_hash_name_never_queued() {
        let index = InventoryIndex::build(&sample(), "Banana");
        assert_eq!(index.count_of("30"), 1);
        assert!(!index.work_list.iter().any(|n| n == "Unlisted Hat"));
    }

    #[test]
    fn test_duplicate_hash_names_collapse() {
        let mut payload = sample();
        payload.descriptions.push(desc("11", "Golden Banana", Some("Golden Banana")));
        payload.assets.push(asset("11"));

        let index = InventoryIndex::build(&payload, "Banana");

        assert_eq!(index.work_list.len(), 2);
        assert_eq!(index.count_for_name("Golden Banana"), Some(4));
    }

    #[test]
    fn test_interleaved_duplicates_keep_first_seen_order() {
        let names = ["A", "B", "A", "C", "B", "D", "C"];
        let payload = InventoryPayload {
            assets: Vec::new(),
            descriptions: names
                .iter()
                .enumerate()
                .map(|(i, n)| desc(&i.to_string(), n, Some(n)))
                .collect(),
        };

        let index = InventoryIndex::build(&payload, "Banana");

        assert_eq!(index.work_list, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_count_for_unknown_name() {
        let index = InventoryIndex::build(&sample(), "Banana");
        assert_eq!(index.count_for_name("Banana"), None);
        assert_eq!(index.count_for_name("Nope"), None);
    }

    #[test]
    fn test_empty_payload() {
        let index = InventoryIndex::build(&InventoryPayload::default(), "Banana");
        assert!(index.counts.is_empty());
        assert!(index.work_list.is_empty());
    }
}
