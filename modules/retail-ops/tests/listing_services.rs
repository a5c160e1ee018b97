#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{harness, status};
use opskit_db::crud::ErrorKind;
use opskit_security::Caller;
use retail_ops::seed::{NORTH_MANAGER, NORTH_PROJECT, SOUTH_PROJECT, seed_demo};
use uuid::Uuid;

#[tokio::test]
async fn manager_sees_only_own_project() {
    let h = harness().await;
    let page = h
        .services
        .products
        .list(&h.callers.north_manager, "")
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 10);
    assert!(page.records.iter().all(|r| r.model.project_id == NORTH_PROJECT));
}

#[tokio::test]
async fn super_admin_sees_every_project() {
    let h = harness().await;
    let page = h.services.products.list(&h.callers.admin, "").await.unwrap();
    assert_eq!(page.total, 6);

    let projects = h.services.projects.list(&h.callers.admin, "").await.unwrap();
    assert_eq!(projects.total, 2);
}

#[tokio::test]
async fn member_lists_only_their_project_row() {
    let h = harness().await;
    let page = h
        .services
        .projects
        .list(&h.callers.south_manager, "")
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.records[0].model.id, SOUTH_PROJECT);
}

#[tokio::test]
async fn default_order_is_newest_first() {
    let h = harness().await;
    let page = h
        .services
        .products
        .list(&h.callers.north_manager, "")
        .await
        .unwrap();
    let names: Vec<_> = page.records.iter().map(|r| r.model.name.as_str()).collect();
    assert_eq!(names, ["Sandal", "Hiking Boot", "Trail Runner"]);
}

#[tokio::test]
async fn explicit_sort_and_pagination() {
    let h = harness().await;
    let page = h
        .services
        .products
        .list(
            &h.callers.north_manager,
            "sortBy=price_cents&sortOrder=ASC&page=2&limit=2",
        )
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.page, 2);
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].model.name, "Hiking Boot");
}

#[tokio::test]
async fn page_past_end_keeps_total() {
    let h = harness().await;
    let page = h
        .services
        .products
        .list(&h.callers.north_manager, "page=5&limit=2")
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert!(page.records.is_empty());
}

#[tokio::test]
async fn oversized_limit_is_clamped() {
    let h = harness().await;
    let page = h
        .services
        .products
        .list(&h.callers.admin, "limit=500")
        .await
        .unwrap();
    assert_eq!(page.limit, 100);
    assert_eq!(page.records.len(), 6);
}

#[tokio::test]
async fn search_matches_root_and_relation_fields() {
    let h = harness().await;
    let products = &h.services.products;

    let boot = products
        .list(&h.callers.north_manager, "search=BOOT")
        .await
        .unwrap();
    assert_eq!(boot.total, 1);
    assert_eq!(boot.records[0].model.name, "Hiking Boot");

    // brand.name is searchable: "North Outfitters" matches every north product
    let by_brand = products
        .list(&h.callers.north_manager, "search=outfitters")
        .await
        .unwrap();
    assert_eq!(by_brand.total, 3);

    let other_tenant = products
        .list(&h.callers.north_manager, "search=south")
        .await
        .unwrap();
    assert_eq!(other_tenant.total, 0);
}

#[tokio::test]
async fn declared_filters_are_coerced() {
    let h = harness().await;
    let in_stock = h
        .services
        .products
        .list(&h.callers.north_manager, "filters[in_stock]=true")
        .await
        .unwrap();
    assert_eq!(in_stock.total, 2);

    let priced = h
        .services
        .products
        .list(&h.callers.north_manager, "filters[price_cents]=3500")
        .await
        .unwrap();
    assert_eq!(priced.total, 1);
    assert_eq!(priced.records[0].model.name, "Sandal");

    let err = h
        .services
        .products
        .list(&h.callers.north_manager, "filters[price_cents]=cheap")
        .await
        .unwrap_err();
    assert_eq!(status(err), 422);
}

#[tokio::test]
async fn filter_through_relation_and_eager_load() {
    let h = harness().await;
    let page = h
        .services
        .products
        .list(
            &h.callers.admin,
            "filters[brand][name]=South%20Outfitters&sortBy=brand.name",
        )
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    for record in &page.records {
        assert_eq!(record.model.project_id, SOUTH_PROJECT);
        let brand = record.relation("brand").unwrap();
        assert_eq!(brand["name"], "South Outfitters");
        assert_eq!(record.relation("category").unwrap()["name"], "Footwear");
    }
}

#[tokio::test]
async fn unknown_filter_or_sort_is_rejected() {
    let h = harness().await;
    let products = &h.services.products;

    let err = products
        .list(&h.callers.north_manager, "filters[colour]=red")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = products
        .list(&h.callers.north_manager, "sortBy=popularity")
        .await
        .unwrap_err();
    assert_eq!(status(err), 422);

    let err = products
        .list(&h.callers.north_manager, "sortOrder=sideways")
        .await
        .unwrap_err();
    assert_eq!(status(err), 422);
}

#[tokio::test]
async fn surveys_load_feedback_with_authors() {
    let h = harness().await;
    let page = h
        .services
        .surveys
        .list(&h.callers.north_manager, "")
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let feedbacks = page.records[0]
        .relation("feedbacks")
        .unwrap()
        .as_array()
        .unwrap();
    assert_eq!(feedbacks.len(), 2);
    for fb in feedbacks {
        assert_eq!(fb["user"]["name"], "Nora North");
    }
}

#[tokio::test]
async fn brands_fall_back_to_ownership() {
    let h = harness().await;
    // The north manager moved to the south project but still owns the north brand.
    let moved = Caller::new(NORTH_MANAGER, "manager").with_project(SOUTH_PROJECT);

    let brands = h.services.brands.list(&moved, "").await.unwrap();
    assert_eq!(brands.total, 2);
    let owned = brands
        .records
        .iter()
        .find(|r| r.model.project_id == NORTH_PROJECT)
        .unwrap();
    assert_eq!(owned.model.owner_id, NORTH_MANAGER);
    assert_eq!(owned.relation("owner").unwrap()["name"], "Nora North");

    // Products are project-only.
    let products = h.services.products.list(&moved, "").await.unwrap();
    assert!(products.records.iter().all(|r| r.model.project_id == SOUTH_PROJECT));
}

#[tokio::test]
async fn caller_without_project_is_forbidden() {
    let h = harness().await;
    let drifter = Caller::new(Uuid::new_v4(), "manager");
    let err = h.services.locations.list(&drifter, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(status(err), 403);
}

#[tokio::test]
async fn get_is_scoped() {
    let h = harness().await;
    let south = h
        .services
        .products
        .list(&h.callers.south_manager, "limit=1")
        .await
        .unwrap();
    let id = south.records[0].model.id;

    let found = h
        .services
        .products
        .get(&h.callers.south_manager, id)
        .await
        .unwrap();
    assert_eq!(found.model.id, id);
    assert!(found.relation("brand").is_some());

    let err = h
        .services
        .products
        .get(&h.callers.north_manager, id)
        .await
        .unwrap_err();
    assert_eq!(status(err), 404);
}

#[tokio::test]
async fn soft_delete_hides_the_row() {
    let h = harness().await;
    let products = &h.services.products;
    let caller = &h.callers.north_manager;
    let id = products.list(caller, "limit=1").await.unwrap().records[0]
        .model
        .id;

    products.delete(caller, id).await.unwrap();

    assert_eq!(products.get(caller, id).await.unwrap_err().kind(), ErrorKind::NotFound);
    let page = products.list(caller, "").await.unwrap();
    assert_eq!(page.total, 2);
    assert!(page.records.iter().all(|r| r.model.id != id));

    let err = products.delete(caller, id).await.unwrap_err();
    assert_eq!(status(err), 404);
}

#[tokio::test]
async fn delete_outside_scope_is_not_found() {
    let h = harness().await;
    let id = h
        .services
        .locations
        .list(&h.callers.south_manager, "")
        .await
        .unwrap()
        .records[0]
        .model
        .id;

    let err = h
        .services
        .locations
        .delete(&h.callers.north_manager, id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    h.services
        .locations
        .delete(&h.callers.south_manager, id)
        .await
        .unwrap();
    let left = h
        .services
        .locations
        .list(&h.callers.admin, "")
        .await
        .unwrap();
    assert_eq!(left.total, 1);
}

#[tokio::test]
async fn feedback_is_hard_deleted() {
    let h = harness().await;
    let caller = &h.callers.north_manager;
    let feedback = &h.services.feedback;
    let page = feedback.list(caller, "filters[rating]=3").await.unwrap();
    assert_eq!(page.total, 1);
    let id = page.records[0].model.id;

    feedback.delete(caller, id).await.unwrap();
    assert_eq!(feedback.list(caller, "").await.unwrap().total, 1);
}

#[tokio::test]
async fn repeated_listing_is_stable() {
    let h = harness().await;
    let query = "search=o&sortBy=name&sortOrder=ASC&limit=2&page=2";
    let first = h.services.products.list(&h.callers.admin, query).await.unwrap();
    let second = h.services.products.list(&h.callers.admin, query).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn serialized_page_is_flat() {
    let h = harness().await;
    let page = h
        .services
        .locations
        .list(&h.callers.north_manager, "")
        .await
        .unwrap();
    let json = serde_json::to_value(&page).unwrap();

    assert_eq!(json["total_records"], 1);
    assert_eq!(json["current_page"], 1);
    assert_eq!(json["per_page"], 10);
    let record = &json["records"][0];
    assert_eq!(record["name"], "North Flagship");
    assert_eq!(record["project"]["name"], "North");
}

#[tokio::test]
async fn seeding_twice_is_a_no_op() {
    let h = harness().await;
    assert!(!seed_demo(h.db.sea()).await.unwrap());
}
