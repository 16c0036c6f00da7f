//! Board View
//!
//! Read-side snapshot: the pool followed by each collection section, all in
//! display order. Section membership is derived from the counters' foreign
//! keys every time the board is built.

use serde::{Deserialize, Serialize};

use crate::domain::{Collection, Container, Counter, DomainResult};
use super::ordering;
use super::service::OrderingEngine;

/// One collection with its members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub collection: Collection,
    pub counters: Vec<Counter>,
}

/// Everything the list screen shows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub pool: Vec<Counter>,
    pub sections: Vec<Section>,
}

impl Board {
    pub fn from_snapshot(counters: &[Counter], collections: &[Collection]) -> Self {
        let mut collections = collections.to_vec();
        ordering::sort_by_order(&mut collections);

        let sections = collections
            .into_iter()
            .map(|collection| Section {
                counters: ordering::container_members(counters, Container::Collection(collection.id)),
                collection,
            })
            .collect();

        Self {
            pool: ordering::container_members(counters, Container::Pool),
            sections,
        }
    }

    /// Narrow the board to counters whose name matches `query`.
    ///
    /// Sections without a matching counter are hidden unless the query is
    /// blank.
    pub fn filtered(&self, query: &str) -> Board {
        fn keep(counters: &[Counter], query: &str) -> Vec<Counter> {
            counters.iter().filter(|c| c.matches_search(query)).cloned().collect()
        }
        let blank = query.trim().is_empty();

        Board {
            pool: keep(&self.pool, query),
            sections: self
                .sections
                .iter()
                .map(|s| Section {
                    collection: s.collection.clone(),
                    counters: keep(&s.counters, query),
                })
                .filter(|s| blank || !s.counters.is_empty())
                .collect(),
        }
    }

    pub fn total_counters(&self) -> usize {
        self.pool.len() + self.sections.iter().map(|s| s.counters.len()).sum::<usize>()
    }
}

impl OrderingEngine {
    /// Fresh board snapshot from the store
    pub async fn board(&self) -> DomainResult<Board> {
        let counters = self.store.fetch_all_counters().await?;
        let collections = self.store.fetch_all_collections().await?;
        Ok(Board::from_snapshot(&counters, &collections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CollectionId, CounterId};

    fn counter(id: u32, name: &str, order: i32, collection: Option<u32>) -> Counter {
        let mut c = Counter::new(CounterId(id), name);
        c.order = order;
        c.collection = collection.map(CollectionId);
        c
    }

    fn collection(id: u32, name: &str, order: i32) -> Collection {
        let mut c = Collection::new(CollectionId(id), name);
        c.order = order;
        c
    }

    fn sample() -> Board {
        let counters = vec![
            counter(1, "Water", 1, None),
            counter(2, "Coffee", 0, None),
            counter(3, "Push-ups", 0, Some(20)),
            counter(4, "Squats", 0, Some(10)),
        ];
        let collections = vec![collection(10, "Legs", 1), collection(20, "Arms", 0)];
        Board::from_snapshot(&counters, &collections)
    }

    #[test]
    fn test_board_is_in_display_order() {
        let board = sample();
        assert_eq!(board.pool.iter().map(|c| c.id.0).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(board.sections[0].collection.name, "Arms");
        assert_eq!(board.sections[1].counters[0].name, "Squats");
        assert_eq!(board.total_counters(), 4);
    }

    #[test]
    fn test_filter_hides_sections_without_matches() {
        let board = sample().filtered("squat");
        assert!(board.pool.is_empty());
        assert_eq!(board.sections.len(), 1);
        assert_eq!(board.sections[0].collection.name, "Legs");
    }

    #[test]
    fn test_blank_filter_keeps_everything() {
        let board = sample();
        assert_eq!(board.filtered("   "), board);
    }
}
