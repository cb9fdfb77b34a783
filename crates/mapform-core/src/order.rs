//! Pure ordering primitives for reorderable collections.
//!
//! The reindexer is deliberately side-effect-free so the same function
//! serves both the optimistic client update and server-side verification of
//! a submitted ordering. Position values are derived from index only when an
//! ordering is persisted; in memory the sequence itself is the order.

use std::collections::HashSet;
use std::hash::Hash;

use crate::model::{Page, PageLayer, View};

/// An entity participating in a user-reorderable collection.
pub trait OrderedEntity {
    type Id: Copy + Eq + Hash;

    fn entity_id(&self) -> Self::Id;

    /// Persisted position within the parent collection.
    fn position(&self) -> i64;
}

impl OrderedEntity for Page {
    type Id = crate::model::PageId;

    fn entity_id(&self) -> Self::Id {
        self.id
    }

    fn position(&self) -> i64 {
        self.position
    }
}

impl OrderedEntity for View {
    type Id = crate::model::ViewId;

    fn entity_id(&self) -> Self::Id {
        self.id
    }

    fn position(&self) -> i64 {
        self.position
    }
}

impl OrderedEntity for PageLayer {
    type Id = crate::model::PageLayerId;

    fn entity_id(&self) -> Self::Id {
        self.id
    }

    fn position(&self) -> i64 {
        self.position
    }
}

/// Move the element at `from` to `to`, shifting everything between by one.
///
/// This is array-move, not swap: moving index 2 to index 5 shifts indices
/// 3, 4, 5 down by one. Out-of-range indices return the input unchanged.
#[must_use]
pub fn array_move<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    if from >= items.len() || to >= items.len() || from == to {
        return items.to_vec();
    }
    let mut out = items.to_vec();
    let moved = out.remove(from);
    out.insert(to, moved);
    out
}

/// Compute the new order for a completed drag: the element with `active_id`
/// is moved to the index currently held by `over_id`.
///
/// No-op guards (returns the input unchanged):
/// - `active_id == over_id` (drop target is the origin)
/// - either id is absent from `items` (stale intent from an interrupted drag)
#[must_use]
pub fn reindex<T>(items: &[T], active_id: T::Id, over_id: T::Id) -> Vec<T>
where
    T: OrderedEntity + Clone,
{
    if active_id == over_id {
        return items.to_vec();
    }
    let from = items.iter().position(|item| item.entity_id() == active_id);
    let to = items.iter().position(|item| item.entity_id() == over_id);
    match (from, to) {
        (Some(from), Some(to)) => array_move(items, from, to),
        _ => items.to_vec(),
    }
}

/// Arrange `items` to match the sequence of `ids`.
///
/// Items absent from `ids` keep their relative order and sink to the end;
/// ids that match no item are ignored. Used when an optimistic patch
/// replaces a whole ordered sub-collection.
#[must_use]
pub fn arrange_by_ids<T>(items: &[T], ids: &[T::Id]) -> Vec<T>
where
    T: OrderedEntity + Clone,
{
    let rank = |item: &T| {
        ids.iter()
            .position(|id| *id == item.entity_id())
            .unwrap_or(usize::MAX)
    };
    let mut out = items.to_vec();
    out.sort_by_key(rank);
    out
}

/// Ids of `items` in sequence order.
#[must_use]
pub fn ordered_ids<T: OrderedEntity>(items: &[T]) -> Vec<T::Id> {
    items.iter().map(OrderedEntity::entity_id).collect()
}

/// Next append position: `max(position) + 1`, or `0` for an empty
/// collection.
#[must_use]
pub fn next_position<T: OrderedEntity>(items: &[T]) -> i64 {
    items
        .iter()
        .map(OrderedEntity::position)
        .max()
        .map_or(0, |max| max + 1)
}

/// True when `ids` is exactly a permutation of `current` (ids are unique
/// within a collection, so set equality plus length suffices).
#[must_use]
pub fn is_permutation<I: Copy + Eq + Hash>(ids: &[I], current: &[I]) -> bool {
    if ids.len() != current.len() {
        return false;
    }
    let proposed: HashSet<I> = ids.iter().copied().collect();
    if proposed.len() != ids.len() {
        return false;
    }
    current.iter().all(|id| proposed.contains(id))
}

#[cfg(test)]
mod tests {
    use super::{array_move, arrange_by_ids, is_permutation, next_position, reindex};
    use crate::model::{Page, PageId, ProjectId};

    fn page(id: i64, position: i64) -> Page {
        Page {
            id: PageId(id),
            project_id: ProjectId(1),
            position,
            title: format!("P{id}"),
            center_lng: 0.0,
            center_lat: 0.0,
            zoom: 9.0,
            content: None,
            created_at_us: 0,
            updated_at_us: 0,
        }
    }

    fn pages(ids: &[i64]) -> Vec<Page> {
        ids.iter()
            .enumerate()
            .map(|(idx, id)| page(*id, idx as i64))
            .collect()
    }

    fn id_seq(items: &[Page]) -> Vec<i64> {
        items.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn array_move_shifts_not_swaps() {
        let items = vec!['a', 'b', 'c', 'd', 'e', 'f'];
        assert_eq!(array_move(&items, 2, 5), vec!['a', 'b', 'd', 'e', 'f', 'c']);
        assert_eq!(array_move(&items, 5, 2), vec!['a', 'b', 'f', 'c', 'd', 'e']);
    }

    #[test]
    fn array_move_out_of_range_is_noop() {
        let items = vec![1, 2, 3];
        assert_eq!(array_move(&items, 7, 1), items);
        assert_eq!(array_move(&items, 1, 7), items);
    }

    #[test]
    fn reindex_moves_backward() {
        // [a,b,c,d,e]: dragging c onto a yields [c,a,b,d,e]
        let items = pages(&[1, 2, 3, 4, 5]);
        let moved = reindex(&items, PageId(3), PageId(1));
        assert_eq!(id_seq(&moved), vec![3, 1, 2, 4, 5]);
    }

    #[test]
    fn reindex_moves_forward() {
        // [a,b,c,d,e]: dragging a onto d yields [b,c,d,a,e]
        let items = pages(&[1, 2, 3, 4, 5]);
        let moved = reindex(&items, PageId(1), PageId(4));
        assert_eq!(id_seq(&moved), vec![2, 3, 4, 1, 5]);
    }

    #[test]
    fn reindex_same_id_is_identity() {
        let items = pages(&[1, 2, 3]);
        assert_eq!(id_seq(&reindex(&items, PageId(2), PageId(2))), vec![1, 2, 3]);
    }

    #[test]
    fn reindex_unknown_id_is_identity() {
        let items = pages(&[1, 2, 3]);
        assert_eq!(id_seq(&reindex(&items, PageId(9), PageId(1))), vec![1, 2, 3]);
        assert_eq!(id_seq(&reindex(&items, PageId(1), PageId(9))), vec![1, 2, 3]);
    }

    #[test]
    fn arrange_by_ids_follows_sequence() {
        let items = pages(&[1, 2, 3]);
        let arranged = arrange_by_ids(&items, &[PageId(3), PageId(1), PageId(2)]);
        assert_eq!(id_seq(&arranged), vec![3, 1, 2]);
    }

    #[test]
    fn arrange_by_ids_sinks_unlisted_items() {
        let items = pages(&[1, 2, 3, 4]);
        let arranged = arrange_by_ids(&items, &[PageId(2), PageId(1)]);
        assert_eq!(id_seq(&arranged), vec![2, 1, 3, 4]);
    }

    #[test]
    fn next_position_appends_after_max() {
        assert_eq!(next_position::<Page>(&[]), 0);
        // positions need not be contiguous
        assert_eq!(next_position(&[page(1, 0), page(2, 7)]), 8);
    }

    #[test]
    fn permutation_check() {
        let current = [PageId(1), PageId(2), PageId(3)];
        assert!(is_permutation(&[PageId(3), PageId(1), PageId(2)], &current));
        assert!(!is_permutation(&[PageId(1), PageId(2)], &current));
        assert!(!is_permutation(
            &[PageId(1), PageId(2), PageId(9)],
            &current
        ));
        assert!(!is_permutation(
            &[PageId(1), PageId(1), PageId(2)],
            &current
        ));
    }
}
