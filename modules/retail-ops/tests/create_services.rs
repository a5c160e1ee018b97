#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{harness, status};
use opskit_db::crud::ErrorKind;
use opskit_security::Caller;
use retail_ops::domain::service::{
    NewBrand, NewCategory, NewFeedback, NewLocation, NewProduct, NewProject, NewSurvey,
};
use retail_ops::seed::{NORTH_MANAGER, NORTH_PROJECT};
use tracing_test::traced_test;
use uuid::Uuid;

fn brand(name: &str) -> NewBrand {
    NewBrand {
        name: name.to_owned(),
        description: None,
        is_active: true,
    }
}

fn product(name: &str, price_cents: i64) -> NewProduct {
    NewProduct {
        name: name.to_owned(),
        sku: "SKU-1".to_owned(),
        price_cents,
        brand_id: None,
        category_id: None,
        in_stock: true,
    }
}

#[tokio::test]
#[traced_test]
async fn created_brand_is_stamped_with_caller() {
    let h = harness().await;
    let caller = &h.callers.north_manager;

    let created = h
        .services
        .brands
        .create(caller, brand("  Summit  "))
        .await
        .unwrap();
    assert_eq!(created.name, "Summit");
    assert_eq!(created.owner_id, NORTH_MANAGER);
    assert_eq!(created.project_id, NORTH_PROJECT);
    assert!(logs_contain("brand created"));

    let page = h
        .services
        .brands
        .list(caller, "search=summit")
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.records[0].model.id, created.id);
}

#[tokio::test]
async fn blank_or_oversized_names_are_rejected() {
    let h = harness().await;
    let caller = &h.callers.north_manager;

    let err = h.services.brands.create(caller, brand("   ")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = h
        .services
        .brands
        .create(caller, brand(&"x".repeat(121)))
        .await
        .unwrap_err();
    assert_eq!(status(err), 422);

    let err = h
        .services
        .locations
        .create(
            caller,
            NewLocation {
                name: "Depot".to_owned(),
                address: String::new(),
                city: "North".to_owned(),
                is_active: true,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn product_checks_price_and_references() {
    let h = harness().await;
    let north = &h.callers.north_manager;
    let products = &h.services.products;

    let err = products.create(north, product("Gift card", -1)).await.unwrap_err();
    assert_eq!(status(err), 422);

    let south_brand = h
        .services
        .brands
        .list(&h.callers.south_manager, "")
        .await
        .unwrap()
        .records[0]
        .model
        .id;
    let mut foreign = product("Borrowed", 100);
    foreign.brand_id = Some(south_brand);
    let err = products.create(north, foreign).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let north_brand = h.services.brands.list(north, "").await.unwrap().records[0]
        .model
        .id;
    let mut own = product("Gift card", 0);
    own.brand_id = Some(north_brand);
    let created = products.create(north, own).await.unwrap();

    let loaded = products.get(north, created.id).await.unwrap();
    assert_eq!(loaded.relation("brand").unwrap()["id"], north_brand.to_string());
    assert!(loaded.relation("category").unwrap().is_null());
}

#[tokio::test]
async fn category_parent_must_be_visible() {
    let h = harness().await;
    let north = &h.callers.north_manager;
    let parent = h.services.categories.list(north, "").await.unwrap().records[0]
        .model
        .id;

    let child = h
        .services
        .categories
        .create(
            north,
            NewCategory {
                name: "Trail".to_owned(),
                parent_id: Some(parent),
                is_active: true,
            },
        )
        .await
        .unwrap();
    let loaded = h.services.categories.get(north, child.id).await.unwrap();
    assert_eq!(loaded.relation("parent").unwrap()["name"], "Footwear");

    let err = h
        .services
        .categories
        .create(
            north,
            NewCategory {
                name: "Orphan".to_owned(),
                parent_id: Some(Uuid::new_v4()),
                is_active: true,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn feedback_validates_rating_and_survey() {
    let h = harness().await;
    let north = &h.callers.north_manager;
    let survey = h.services.surveys.list(north, "").await.unwrap().records[0]
        .model
        .id;
    let foreign_survey = h
        .services
        .surveys
        .list(&h.callers.south_manager, "")
        .await
        .unwrap()
        .records[0]
        .model
        .id;

    let answer = |survey_id, rating| NewFeedback {
        survey_id,
        rating,
        comment: Some("ok".to_owned()),
    };

    let err = h
        .services
        .feedback
        .create(north, answer(survey, 6))
        .await
        .unwrap_err();
    assert_eq!(status(err), 422);

    let err = h
        .services
        .feedback
        .create(north, answer(foreign_survey, 4))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let created = h
        .services
        .feedback
        .create(north, answer(survey, 4))
        .await
        .unwrap();
    assert_eq!(created.user_id, Some(NORTH_MANAGER));

    let surveys = h.services.surveys.list(north, "").await.unwrap();
    let feedbacks = surveys.records[0].relation("feedbacks").unwrap();
    assert_eq!(feedbacks.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn only_super_admins_create_projects() {
    let h = harness().await;
    let new = || NewProject {
        name: "East".to_owned(),
        description: None,
        is_active: true,
    };

    let err = h
        .services
        .projects
        .create(&h.callers.north_manager, new())
        .await
        .unwrap_err();
    assert_eq!(status(err), 403);

    let created = h
        .services
        .projects
        .create(&h.callers.admin, new())
        .await
        .unwrap();
    let east = Caller::new(Uuid::new_v4(), "manager").with_project(created.id);
    let mine = h.services.projects.list(&east, "").await.unwrap();
    assert_eq!(mine.total, 1);
}

#[tokio::test]
async fn super_admin_without_project_cannot_create_records() {
    let h = harness().await;
    let err = h
        .services
        .surveys
        .create(
            &h.callers.admin,
            NewSurvey {
                title: "Pulse".to_owned(),
                description: None,
                is_published: false,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn new_records_deserialize_with_defaults() {
    let brand: NewBrand = serde_json::from_str(r#"{"name":"Acme"}"#).unwrap();
    assert!(brand.is_active);
    assert_eq!(brand.description, None);

    let survey: NewSurvey = serde_json::from_str(r#"{"title":"Pulse"}"#).unwrap();
    assert!(!survey.is_published);

    assert!(serde_json::from_str::<NewBrand>(r#"{"name":"Acme","colour":"red"}"#).is_err());
}
