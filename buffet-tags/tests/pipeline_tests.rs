//! End-to-end reconciliation tests
//!
//! Drives the reconciler the way a chat front end does: a name list, then one
//! text reply per step, against a catalog and template in a temp directory.

use std::sync::Arc;
use std::time::Duration;

use buffet_common::db::init_database;
use buffet_common::{Allergen, AllergenSet, Error, FoodItem};
use buffet_tags::document::{CellDocument, CellValue};
use buffet_tags::generator::{allergen_column, CALORIES_COLUMN, NAME_COLUMN};
use buffet_tags::service::{add_item, import_entries};
use buffet_tags::upload::{bulk_entries_from_upload, extract_names_from_upload};
use buffet_tags::xlsx::XlsxDocument;
use buffet_tags::{
    resolve, CatalogStore, Reconciler, Reply, Resolution, SessionStore, SqliteCatalog,
    TagGenerator, UserKey, ValidationError,
};
use tempfile::TempDir;

struct Env {
    dir: TempDir,
    catalog: Arc<SqliteCatalog>,
    reconciler: Reconciler<SqliteCatalog>,
}

/// Template with a header row and a protected column next to the tag block
fn write_template(path: &std::path::Path) {
    let mut doc = XlsxDocument::new();
    doc.set(1, NAME_COLUMN, CellValue::Text("Food".into()));
    doc.set(1, CALORIES_COLUMN, CellValue::Text("kcal".into()));
    doc.set(2, 38, CellValue::Text("keep me".into()));
    doc.save(path).unwrap();
}

async fn setup() -> Env {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("buffet.db")).await.unwrap();
    let catalog = Arc::new(SqliteCatalog::new(pool));

    let template = dir.path().join("Mastersheet.xlsx");
    write_template(&template);

    let reconciler = Reconciler::new(
        catalog.clone(),
        SessionStore::new(Duration::from_secs(1800)),
        TagGenerator::new(template, dir.path().join("output")),
    );

    Env {
        dir,
        catalog,
        reconciler,
    }
}

fn allergens(text: &str) -> AllergenSet {
    AllergenSet::parse_input(text).unwrap()
}

#[tokio::test]
async fn test_missing_item_collected_then_reviewed_and_generated() {
    let env = setup().await;
    let user = UserKey::new("chat-1001");
    add_item(env.catalog.as_ref(), "BANANA", 100, allergens("Milk"))
        .await
        .unwrap();

    let reply = env
        .reconciler
        .begin(&user, &["Apple", "BANANA ", "pear"])
        .await
        .unwrap();
    assert_eq!(
        reply,
        Reply::NeedCalories {
            name: "APPLE".into(),
            position: 1,
            total: 2
        }
    );

    // Apple
    assert_eq!(
        env.reconciler.step(&user, "50").await.unwrap(),
        Reply::NeedAllergens {
            name: "APPLE".into()
        }
    );
    let reply = env.reconciler.step(&user, "milk, Peanut").await.unwrap();
    assert!(matches!(
        reply,
        Reply::Rejected {
            error: ValidationError::InvalidAllergens { .. },
            ..
        }
    ));
    assert!(env.catalog.get("APPLE").await.unwrap().is_none());
    assert_eq!(
        env.reconciler.step(&user, "milk, NUTS").await.unwrap(),
        Reply::NeedCalories {
            name: "PEAR".into(),
            position: 2,
            total: 2
        }
    );

    // Pear
    env.reconciler.step(&user, "40").await.unwrap();
    let reply = env.reconciler.step(&user, "none").await.unwrap();
    let expected = vec![
        FoodItem::new("APPLE", 50, allergens("Milk, Nuts")),
        FoodItem::new("BANANA", 100, allergens("Milk")),
        FoodItem::new("PEAR", 40, AllergenSet::new()),
    ];
    assert_eq!(
        reply,
        Reply::Review {
            items: expected.clone()
        }
    );

    // Session-only edit
    let reply = env
        .reconciler
        .step(&user, "change 2 Soy, Gluten")
        .await
        .unwrap();
    assert_eq!(
        reply,
        Reply::Edited {
            position: 2,
            item: FoodItem::new("BANANA", 100, allergens("Gluten, Soy"))
        }
    );
    assert_eq!(
        env.catalog.get("BANANA").await.unwrap().unwrap().allergens,
        allergens("Milk")
    );

    let reply = env.reconciler.step(&user, "OK").await.unwrap();
    let Reply::Generated(document) = reply else {
        panic!("expected a generated document, got {reply:?}");
    };
    assert_eq!(document.rows_written, 3);
    assert!(document.missing.is_empty());
    assert!(document.path.starts_with(env.dir.path().join("output")));

    let sheet = XlsxDocument::open(&document.path).unwrap();
    assert_eq!(sheet.value(1, NAME_COLUMN).as_deref(), Some("Food"));
    assert_eq!(sheet.value(2, NAME_COLUMN).as_deref(), Some("APPLE"));
    assert_eq!(sheet.value(2, CALORIES_COLUMN).as_deref(), Some("50"));
    assert_eq!(sheet.value(2, 38).as_deref(), Some("keep me"));
    assert_eq!(
        sheet
            .value(3, allergen_column(Allergen::Soy).unwrap())
            .as_deref(),
        Some("yes")
    );
    assert_eq!(
        sheet.value(3, allergen_column(Allergen::Milk).unwrap()),
        None
    );
    assert_eq!(sheet.value(4, NAME_COLUMN).as_deref(), Some("PEAR"));

    // Session is gone after generation
    assert!(matches!(
        env.reconciler.step(&user, "ok").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_edit_on_repeated_name_reaches_only_its_row() {
    let env = setup().await;
    let user = UserKey::new("chat-2002");
    add_item(env.catalog.as_ref(), "PEAR", 40, AllergenSet::new())
        .await
        .unwrap();

    env.reconciler.begin(&user, &["pear", "pear"]).await.unwrap();
    assert_eq!(
        env.reconciler.step(&user, "change 1 Milk").await.unwrap(),
        Reply::Edited {
            position: 1,
            item: FoodItem::new("PEAR", 40, allergens("Milk"))
        }
    );

    let reply = env.reconciler.step(&user, "ok").await.unwrap();
    let Reply::Generated(document) = reply else {
        panic!("expected a generated document, got {reply:?}");
    };
    assert_eq!(document.rows_written, 2);

    let milk = allergen_column(Allergen::Milk).unwrap();
    let sheet = XlsxDocument::open(&document.path).unwrap();
    assert_eq!(sheet.value(2, NAME_COLUMN).as_deref(), Some("PEAR"));
    assert_eq!(sheet.value(2, milk).as_deref(), Some("yes"));
    assert_eq!(sheet.value(3, NAME_COLUMN).as_deref(), Some("PEAR"));
    assert_eq!(sheet.value(3, milk), None);
}

#[tokio::test]
async fn test_sessions_for_different_users_are_independent() {
    let env = setup().await;
    let alice = UserKey::new("alice");
    let bob = UserKey::new("bob");

    env.reconciler.begin(&alice, &["kiwi"]).await.unwrap();
    env.reconciler.begin(&bob, &["plum"]).await.unwrap();

    env.reconciler.step(&alice, "10").await.unwrap();
    assert_eq!(
        env.reconciler.step(&bob, "20").await.unwrap(),
        Reply::NeedAllergens {
            name: "PLUM".into()
        }
    );
    assert_eq!(
        env.reconciler.step(&alice, "Fish").await.unwrap(),
        Reply::Review {
            items: vec![FoodItem::new("KIWI", 10, allergens("Fish"))]
        }
    );
}

#[tokio::test]
async fn test_add_then_resolve_round_trip() {
    let env = setup().await;
    add_item(env.catalog.as_ref(), "apple", 50, allergens("Nuts, Milk"))
        .await
        .unwrap();

    let second = add_item(env.catalog.as_ref(), "APPLE", 99, AllergenSet::new()).await;
    assert!(matches!(second, Err(Error::Conflict(_))));

    let resolution = resolve(env.catalog.as_ref(), &[" Apple"]).await.unwrap();
    assert_eq!(
        resolution,
        Resolution::Resolved(vec![FoodItem::new("APPLE", 50, allergens("Milk, Nuts"))])
    );
}

#[tokio::test]
async fn test_bulk_import_from_upload() {
    let env = setup().await;
    add_item(env.catalog.as_ref(), "SOUP", 80, AllergenSet::new())
        .await
        .unwrap();

    let sheet_path = env.dir.path().join("catalog.xlsx");
    let mut sheet = XlsxDocument::new();
    for (col, header) in ["Food Name", "Calories", "Allergens"].iter().enumerate() {
        sheet.set(1, col as u32 + 1, CellValue::Text(header.to_string()));
    }
    sheet.set(2, 1, CellValue::Text("pear".into()));
    sheet.set(2, 3, CellValue::Text("Milk, Soy".into()));
    sheet.set(3, 1, CellValue::Text("soup".into()));
    sheet.set(3, 2, CellValue::Number(120.0));
    sheet.set(4, 1, CellValue::Text("bread".into()));
    sheet.set(4, 2, CellValue::Number(200.0));
    sheet.set(4, 3, CellValue::Text("Gluten, Sesamee".into()));
    sheet.save(&sheet_path).unwrap();

    let bytes = std::fs::read(&sheet_path).unwrap();
    let entries = bulk_entries_from_upload("catalog.xlsx", &bytes).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].name, "PEAR");
    assert_eq!(entries[0].calories, 0);
    assert_eq!(entries[0].allergens, vec!["Milk", "Soy"]);

    let report = import_entries(env.catalog.as_ref(), &entries).await.unwrap();
    assert_eq!(report.added, vec!["PEAR"]);
    assert_eq!(report.skipped, vec!["SOUP"]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(
        env.catalog.get("PEAR").await.unwrap().unwrap().allergens,
        allergens("Soy, Milk")
    );
}

#[tokio::test]
async fn test_extracted_names_feed_the_resolver() {
    let env = setup().await;
    let sheet_path = env.dir.path().join("last_week.xlsx");
    let mut sheet = XlsxDocument::new();
    sheet.set(1, 4, CellValue::Text("Food".into()));
    sheet.set(2, 4, CellValue::Text("Apple".into()));
    sheet.set(3, 4, CellValue::Text("nan".into()));
    sheet.set(4, 4, CellValue::Text("Kiwi".into()));
    sheet.save(&sheet_path).unwrap();

    let bytes = std::fs::read(&sheet_path).unwrap();
    let names = extract_names_from_upload("last_week.xlsx", &bytes).unwrap();
    assert_eq!(names, vec!["Apple", "Kiwi"]);

    let resolution = resolve(env.catalog.as_ref(), &names).await.unwrap();
    assert_eq!(
        resolution,
        Resolution::Missing(vec!["APPLE".into(), "KIWI".into()])
    );
}

#[tokio::test]
async fn test_wrong_upload_type_is_rejected() {
    let result = extract_names_from_upload("names.csv", b"Apple\nKiwi");
    match result {
        Err(Error::InvalidInput(message)) => {
            assert!(message.contains("names.csv"));
            assert!(message.contains(".xlsx"));
        }
        other => panic!("expected invalid input, got {other:?}"),
    }
}
