//! Cascading selection driving list scope.

use domus_client::{ListFilter, ResourceKind};
use domus_query::{build_key, ResourceKey, SelectionController};
use domus_test_utils::assertions::assert_load_failed;
use domus_test_utils::generators::{arb_level, arb_selection_ops};
use domus_test_utils::{fixtures, HierarchyLevel, MockEntityLoader};
use proptest::prelude::*;
use serde_json::json;

fn chain_controller() -> SelectionController<MockEntityLoader> {
    SelectionController::new(MockEntityLoader::with_entities(fixtures::chain()))
}

#[tokio::test]
async fn full_chain_scopes_resident_list() {
    let mut selection = chain_controller();
    for (i, level) in HierarchyLevel::all().iter().enumerate() {
        selection
            .set_filter(*level, Some(i as i64 + 1))
            .await
            .unwrap();
    }

    let params = ListFilter::new().params(ResourceKind::ResidentList, &selection.scope_params());
    assert_eq!(params.get("mtk_id"), Some(&json!(1)));
    assert_eq!(params.get("property_id"), Some(&json!(5)));

    let params = ListFilter::new().params(ResourceKind::BlockList, &selection.scope_params());
    assert_eq!(params.get("building_id"), Some(&json!(3)));
    assert!(params.get("block_id").is_none());
}

#[tokio::test]
async fn reselecting_a_parent_drops_scoped_keys() {
    let loader = MockEntityLoader::with_entities(fixtures::tree(3));
    let mut selection = SelectionController::new(loader);
    let kind = ResourceKind::BuildingList;

    selection.set_filter(HierarchyLevel::Mtk, Some(1)).await.unwrap();
    selection
        .set_filter(HierarchyLevel::Complex, Some(2))
        .await
        .unwrap();
    let scoped = build_key(
        kind.as_str(),
        &ListFilter::new().params(kind, &selection.scope_params()),
    );

    selection.set_filter(HierarchyLevel::Mtk, Some(3)).await.unwrap();
    assert_eq!(selection.selected_id(HierarchyLevel::Complex), None);
    assert!(!selection.is_enabled(HierarchyLevel::Building));
    let rescoped = build_key(
        kind.as_str(),
        &ListFilter::new().params(kind, &selection.scope_params()),
    );
    assert_ne!(scoped, rescoped);
}

#[tokio::test]
async fn missing_entity_leaves_selection_untouched() {
    let loader = MockEntityLoader::with_entities(fixtures::chain());
    loader.remove(HierarchyLevel::Block, 4);
    let mut selection = SelectionController::new(loader);

    selection
        .restore(&[
            (HierarchyLevel::Mtk, 1),
            (HierarchyLevel::Complex, 2),
            (HierarchyLevel::Building, 3),
        ])
        .await
        .unwrap();
    let result = selection.set_filter(HierarchyLevel::Block, Some(4)).await;
    assert_load_failed(&result, HierarchyLevel::Block);
    assert_eq!(selection.selected_ids().len(), 3);
    assert_eq!(selection.loader().calls(), 4);
}

proptest! {
    #[test]
    fn clearing_a_level_clears_everything_below(
        ops in arb_selection_ops(24),
        cleared in arb_level(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let mut selection =
            SelectionController::new(MockEntityLoader::with_entities(fixtures::tree(3)));
        let before = rt.block_on(async {
            for (level, id) in ops {
                selection.set_filter(level, id).await.unwrap();
            }
            let before = selection.selected_ids();
            selection.set_filter(cleared, None).await.unwrap();
            before
        });

        let after = selection.selected_ids();
        let expected: Vec<_> = before
            .into_iter()
            .filter(|(level, _)| level.index() < cleared.index())
            .collect();
        prop_assert_eq!(&after, &expected);
        prop_assert_eq!(selection.scope_params().len(), after.len());
    }
}
