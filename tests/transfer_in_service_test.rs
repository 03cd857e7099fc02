use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectOptions, Database, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use stockroom_api::{
    db::{run_migrations, DbPool},
    entities::{inventory, inventory_movement, item, storage, supplier, transfer_in_doc, transfer_in_item},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        transfer_in::{TransferInInput, TransferInLineInput, TransferInService},
        Paging,
    },
};
use tokio::sync::mpsc;
use uuid::Uuid;

async fn setup_db() -> Arc<DbPool> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1);
    let db = Database::connect(opt)
        .await
        .expect("Failed to connect to sqlite");
    run_migrations(&db).await.expect("Failed to run migrations");
    Arc::new(db)
}

fn event_channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(100);
    (EventSender::new(tx), rx)
}

async fn create_test_storage(db: &DbPool, code: &str, name: &str) -> storage::Model {
    let now = Utc::now();
    let model = storage::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        address: Set(None),
        phone: Set(None),
        deleted: Set(false),
        created_by: Set("tester".to_string()),
        created_at: Set(now),
        updated_by: Set(None),
        updated_at: Set(now),
    };

    model.insert(db).await.expect("Failed to create storage")
}

async fn create_test_item(db: &DbPool, code: &str, name: &str) -> item::Model {
    let now = Utc::now();
    let model = item::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        uom: Set(Some("EA".to_string())),
        price: Set(None),
        deleted: Set(false),
        created_by: Set("tester".to_string()),
        created_at: Set(now),
        updated_by: Set(None),
        updated_at: Set(now),
    };

    model.insert(db).await.expect("Failed to create item")
}

async fn create_test_supplier(db: &DbPool, code: &str, name: &str) -> supplier::Model {
    let now = Utc::now();
    let model = supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        contact: Set(None),
        deleted: Set(false),
        created_by: Set("tester".to_string()),
        created_at: Set(now),
        updated_by: Set(None),
        updated_at: Set(now),
    };

    model.insert(db).await.expect("Failed to create supplier")
}

fn line(item_id: Uuid, quantity: i32) -> TransferInLineInput {
    TransferInLineInput {
        item_id: Some(item_id),
        quantity: Some(quantity),
        remark: None,
    }
}

fn doc_input(
    code: &str,
    source_id: Uuid,
    destination_id: Uuid,
    items: Vec<TransferInLineInput>,
) -> TransferInInput {
    TransferInInput {
        code: Some(code.to_string()),
        transfer_date: None,
        source_id: Some(source_id),
        destination_id: Some(destination_id),
        remark: None,
        items,
        actor: Some("receiver".to_string()),
    }
}

#[tokio::test]
async fn create_writes_one_in_movement_per_line() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = TransferInService::new(db.clone(), events);

    let store = create_test_storage(db.as_ref(), "STORE-01", "Downtown Store").await;
    let vendor = create_test_supplier(db.as_ref(), "SUP-01", "Garment Supplier").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;
    let pants = create_test_item(db.as_ref(), "PANT-001", "Cargo Pants").await;

    let doc_id = service
        .create(doc_input(
            "TRF-001",
            vendor.id,
            store.id,
            vec![line(shirt.id, 3), line(pants.id, 7)],
        ))
        .await
        .expect("Failed to create transfer-in document");

    // One header, two lines.
    let docs = transfer_in_doc::Entity::find()
        .all(db.as_ref())
        .await
        .expect("Failed to list documents");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, doc_id);
    assert_eq!(docs[0].code, "TRF-001");
    assert_eq!(docs[0].created_by, "receiver");

    let lines = transfer_in_item::Entity::find()
        .filter(transfer_in_item::Column::DocId.eq(doc_id))
        .all(db.as_ref())
        .await
        .expect("Failed to list lines");
    assert_eq!(lines.len(), 2);

    // Exactly one IN movement per line, referenced by the document code.
    let movements = inventory_movement::Entity::find()
        .filter(inventory_movement::Column::ReferenceNo.eq("TRF-001"))
        .all(db.as_ref())
        .await
        .expect("Failed to list movements");
    assert_eq!(movements.len(), 2);
    for movement in &movements {
        assert_eq!(movement.movement_type, "IN");
        assert_eq!(movement.storage_id, store.id);
        assert_eq!(
            movement.quantity_after,
            movement.quantity_before + movement.quantity
        );
    }

    // Destination inventory carries the received quantities.
    let shirt_row = inventory::Entity::find()
        .filter(inventory::Column::StorageId.eq(store.id))
        .filter(inventory::Column::ItemId.eq(shirt.id))
        .one(db.as_ref())
        .await
        .expect("Failed to query inventory")
        .expect("Shirt inventory missing");
    assert_eq!(shirt_row.quantity, 3);

    let pants_row = inventory::Entity::find()
        .filter(inventory::Column::StorageId.eq(store.id))
        .filter(inventory::Column::ItemId.eq(pants.id))
        .one(db.as_ref())
        .await
        .expect("Failed to query inventory")
        .expect("Pants inventory missing");
    assert_eq!(pants_row.quantity, 7);

    // Detail view returns the lines in order.
    let detail = service
        .get_single_by_id(doc_id)
        .await
        .expect("Failed to load document detail");
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.items[0].line_number, 1);
    assert_eq!(detail.items[0].item_id, shirt.id);
    assert_eq!(detail.items[1].line_number, 2);
}

#[tokio::test]
async fn duplicate_line_items_are_rejected_per_line() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = TransferInService::new(db.clone(), events);

    let store = create_test_storage(db.as_ref(), "STORE-01", "Downtown Store").await;
    let vendor = create_test_supplier(db.as_ref(), "SUP-01", "Garment Supplier").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;

    let err = service
        .create(doc_input(
            "TRF-002",
            vendor.id,
            store.id,
            vec![line(shirt.id, 1), line(shirt.id, 2)],
        ))
        .await
        .expect_err("Duplicate line items must fail validation");

    match err {
        ServiceError::ValidationFailed(errors) => {
            let lines = errors.items();
            assert_eq!(lines.len(), 2);
            assert_eq!(
                lines[0].field("item_id"),
                Some("item_id already exists on another line")
            );
            assert!(lines[1].is_empty());
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }

    // Nothing was written.
    let docs = transfer_in_doc::Entity::find()
        .all(db.as_ref())
        .await
        .expect("Failed to list documents");
    assert!(docs.is_empty());
    let movements = inventory_movement::Entity::find()
        .all(db.as_ref())
        .await
        .expect("Failed to list movements");
    assert!(movements.is_empty());
}

#[tokio::test]
async fn document_codes_are_unique_among_live_documents() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = TransferInService::new(db.clone(), events);

    let store = create_test_storage(db.as_ref(), "STORE-01", "Downtown Store").await;
    let vendor = create_test_supplier(db.as_ref(), "SUP-01", "Garment Supplier").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;

    service
        .create(doc_input(
            "TRF-003",
            vendor.id,
            store.id,
            vec![line(shirt.id, 1)],
        ))
        .await
        .expect("Failed to create first document");

    let err = service
        .create(doc_input(
            "TRF-003",
            vendor.id,
            store.id,
            vec![line(shirt.id, 1)],
        ))
        .await
        .expect_err("Reused code must fail validation");
    match err {
        ServiceError::ValidationFailed(errors) => {
            assert_eq!(errors.field("code"), Some("code already exists"));
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_input_reports_every_missing_field() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = TransferInService::new(db.clone(), events);

    let err = service
        .create(TransferInInput::default())
        .await
        .expect_err("Empty input must fail validation");
    match err {
        ServiceError::ValidationFailed(errors) => {
            assert_eq!(errors.field("code"), Some("code is required"));
            assert_eq!(errors.field("source_id"), Some("source_id is required"));
            assert_eq!(
                errors.field("destination_id"),
                Some("destination_id is required")
            );
            assert_eq!(errors.field("items"), Some("items is required"));
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn line_level_errors_cover_lookups_and_quantities() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = TransferInService::new(db.clone(), events);

    let store = create_test_storage(db.as_ref(), "STORE-01", "Downtown Store").await;
    let vendor = create_test_supplier(db.as_ref(), "SUP-01", "Garment Supplier").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;

    let err = service
        .create(doc_input(
            "TRF-004",
            vendor.id,
            store.id,
            vec![
                line(Uuid::new_v4(), 1),
                line(shirt.id, 0),
                TransferInLineInput {
                    item_id: None,
                    quantity: None,
                    remark: None,
                },
            ],
        ))
        .await
        .expect_err("Bad lines must fail validation");

    match err {
        ServiceError::ValidationFailed(errors) => {
            let lines = errors.items();
            assert_eq!(lines.len(), 3);
            assert_eq!(lines[0].field("item_id"), Some("item_id not found"));
            assert_eq!(
                lines[1].field("quantity"),
                Some("quantity must be greater than zero")
            );
            assert_eq!(lines[2].field("item_id"), Some("item_id is required"));
            assert_eq!(lines[2].field("quantity"), Some("quantity is required"));
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn update_replaces_lines_without_moving_stock() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = TransferInService::new(db.clone(), events);

    let store = create_test_storage(db.as_ref(), "STORE-01", "Downtown Store").await;
    let vendor = create_test_supplier(db.as_ref(), "SUP-01", "Garment Supplier").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;
    let pants = create_test_item(db.as_ref(), "PANT-001", "Cargo Pants").await;

    let doc_id = service
        .create(doc_input(
            "TRF-005",
            vendor.id,
            store.id,
            vec![line(shirt.id, 5)],
        ))
        .await
        .expect("Failed to create document");

    let mut update = doc_input("TRF-005", vendor.id, store.id, vec![line(pants.id, 2)]);
    update.remark = Some("corrected receiving".to_string());
    service
        .update(doc_id, update)
        .await
        .expect("Failed to update document");

    let detail = service
        .get_single_by_id(doc_id)
        .await
        .expect("Failed to load document detail");
    assert_eq!(detail.doc.remark.as_deref(), Some("corrected receiving"));
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].item_id, pants.id);
    assert_eq!(detail.items[0].quantity, 2);

    // Only creation moves stock: still the single movement from create.
    let movements = inventory_movement::Entity::find()
        .all(db.as_ref())
        .await
        .expect("Failed to list movements");
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].item_id, shirt.id);
}

#[tokio::test]
async fn delete_is_soft_and_hides_the_document() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = TransferInService::new(db.clone(), events);

    let store = create_test_storage(db.as_ref(), "STORE-01", "Downtown Store").await;
    let vendor = create_test_supplier(db.as_ref(), "SUP-01", "Garment Supplier").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;

    let doc_id = service
        .create(doc_input(
            "TRF-006",
            vendor.id,
            store.id,
            vec![line(shirt.id, 4)],
        ))
        .await
        .expect("Failed to create document");

    service
        .delete(doc_id, Some("supervisor".into()))
        .await
        .expect("Failed to delete document");

    let listed = service
        .read(&Paging::default())
        .await
        .expect("Failed to list documents");
    assert_eq!(listed.total, 0);
    assert!(matches!(
        service.get_single_by_id(doc_id).await,
        Err(ServiceError::NotFound(_))
    ));

    let raw = transfer_in_doc::Entity::find()
        .filter(transfer_in_doc::Column::Id.eq(doc_id))
        .one(db.as_ref())
        .await
        .expect("Failed to query document")
        .expect("Soft-deleted document must remain");
    assert!(raw.deleted);
    assert_eq!(raw.updated_by.as_deref(), Some("supervisor"));

    // The code becomes reusable once the old document is gone.
    service
        .create(doc_input(
            "TRF-006",
            vendor.id,
            store.id,
            vec![line(shirt.id, 1)],
        ))
        .await
        .expect("Failed to reuse code after soft delete");
}

#[tokio::test]
async fn keyword_search_matches_document_code() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = TransferInService::new(db.clone(), events);

    let store = create_test_storage(db.as_ref(), "STORE-01", "Downtown Store").await;
    let vendor = create_test_supplier(db.as_ref(), "SUP-01", "Garment Supplier").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;
    let pants = create_test_item(db.as_ref(), "PANT-001", "Cargo Pants").await;

    service
        .create(doc_input(
            "TRF-100",
            vendor.id,
            store.id,
            vec![line(shirt.id, 1)],
        ))
        .await
        .expect("Failed to create first document");
    service
        .create(doc_input(
            "RCV-200",
            vendor.id,
            store.id,
            vec![line(pants.id, 1)],
        ))
        .await
        .expect("Failed to create second document");

    let paging = Paging {
        keyword: Some("TRF".to_string()),
        ..Default::default()
    };
    let result = service.read(&paging).await.expect("Failed to search");
    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].code, "TRF-100");
}
