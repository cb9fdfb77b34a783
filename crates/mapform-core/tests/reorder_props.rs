//! Property tests for the pure reindexer.

use proptest::prelude::*;

use mapform_core::model::{Page, PageId, ProjectId};
use mapform_core::order::{arrange_by_ids, array_move, ordered_ids, reindex};

fn page(id: i64, position: i64) -> Page {
    Page {
        id: PageId(id),
        project_id: ProjectId(1),
        position,
        title: format!("P{id}"),
        center_lng: 0.0,
        center_lat: 0.0,
        zoom: 2.0,
        content: None,
        created_at_us: 0,
        updated_at_us: 0,
    }
}

/// A collection of 1..=24 pages with unique ids.
fn pages_strategy() -> impl Strategy<Value = Vec<Page>> {
    proptest::collection::hash_set(1..1000i64, 1..24).prop_map(|ids| {
        ids.into_iter()
            .enumerate()
            .map(|(index, id)| page(id, index as i64))
            .collect()
    })
}

fn ids(pages: &[Page]) -> Vec<i64> {
    pages.iter().map(|p| p.id.as_i64()).collect()
}

proptest! {
    #[test]
    fn reindex_onto_self_is_identity(pages in pages_strategy(), selector in any::<prop::sample::Index>()) {
        let id = pages[selector.index(pages.len())].id;
        let out = reindex(&pages, id, id);
        prop_assert_eq!(ids(&out), ids(&pages));
    }

    #[test]
    fn reindex_with_unknown_ids_is_identity(pages in pages_strategy(), selector in any::<prop::sample::Index>()) {
        let known = pages[selector.index(pages.len())].id;
        let unknown = PageId(-1);
        prop_assert_eq!(ids(&reindex(&pages, unknown, known)), ids(&pages));
        prop_assert_eq!(ids(&reindex(&pages, known, unknown)), ids(&pages));
        prop_assert_eq!(ids(&reindex(&pages, unknown, unknown)), ids(&pages));
    }

    #[test]
    fn reindex_is_a_permutation(
        pages in pages_strategy(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let active = pages[a.index(pages.len())].id;
        let over = pages[b.index(pages.len())].id;
        let out = reindex(&pages, active, over);

        prop_assert_eq!(out.len(), pages.len());
        let mut before = ids(&pages);
        let mut after = ids(&out);
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn reindex_puts_active_at_overs_old_index(
        pages in pages_strategy(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let active = pages[a.index(pages.len())].id;
        let over = pages[b.index(pages.len())].id;
        let over_index = pages.iter().position(|p| p.id == over).unwrap();

        let out = reindex(&pages, active, over);
        prop_assert_eq!(out[over_index].id, active);
    }

    #[test]
    fn array_move_shifts_the_between_range(
        pages in pages_strategy(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let from = a.index(pages.len());
        let to = b.index(pages.len());
        let out = array_move(&pages, from, to);

        prop_assert_eq!(out.len(), pages.len());
        prop_assert_eq!(out[to].id, pages[from].id);
        // everything else preserves relative order
        let rest_before: Vec<i64> = pages
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != from)
            .map(|(_, p)| p.id.as_i64())
            .collect();
        let rest_after: Vec<i64> = out
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != to)
            .map(|(_, p)| p.id.as_i64())
            .collect();
        prop_assert_eq!(rest_before, rest_after);
    }

    #[test]
    fn arranging_by_the_reindexed_ids_reproduces_the_reindex(
        pages in pages_strategy(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let active = pages[a.index(pages.len())].id;
        let over = pages[b.index(pages.len())].id;

        // the optimistic patch (arrange_by_ids over the dispatched ordering)
        // must agree with the reindexer that produced that ordering
        let reindexed = reindex(&pages, active, over);
        let arranged = arrange_by_ids(&pages, &ordered_ids(&reindexed));
        prop_assert_eq!(ids(&arranged), ids(&reindexed));
    }
}
