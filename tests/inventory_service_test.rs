use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectOptions, Database, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use stockroom_api::{
    db::{run_migrations, DbPool},
    entities::{inventory, inventory_movement, item, storage},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        inventory::{InventoryInput, InventoryService},
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

async fn get_movement(db: &DbPool, id: Uuid) -> inventory_movement::Model {
    inventory_movement::Entity::find()
        .filter(inventory_movement::Column::Id.eq(id))
        .one(db)
        .await
        .expect("Failed to query movement")
        .expect("Movement not found")
}

#[tokio::test]
async fn get_or_create_starts_at_zero_and_reuses_the_row() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = InventoryService::new(db.clone(), events);

    let warehouse = create_test_storage(db.as_ref(), "MAIN-WH", "Main Warehouse").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;

    let created = service
        .get_or_create_inventory(warehouse.id, shirt.id, None)
        .await
        .expect("Failed to resolve inventory");
    assert_eq!(created.quantity, 0);
    assert_eq!(created.storage_id, warehouse.id);
    assert_eq!(created.item_id, shirt.id);
    assert!(!created.deleted);

    let resolved = service
        .get_or_create_inventory(warehouse.id, shirt.id, None)
        .await
        .expect("Failed to resolve inventory again");
    assert_eq!(resolved.id, created.id);

    let rows = inventory::Entity::find()
        .all(db.as_ref())
        .await
        .expect("Failed to list inventories");
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn get_or_create_rejects_unknown_references() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = InventoryService::new(db.clone(), events);

    let warehouse = create_test_storage(db.as_ref(), "MAIN-WH", "Main Warehouse").await;

    let err = service
        .get_or_create_inventory(warehouse.id, Uuid::new_v4(), None)
        .await
        .expect_err("Unknown item must not create inventory");
    match err {
        ServiceError::ValidationFailed(errors) => {
            assert_eq!(errors.field("item_id"), Some("item_id not found"));
            assert_eq!(errors.field("storage_id"), None);
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn stock_out_always_records_a_negative_delta() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = InventoryService::new(db.clone(), events);

    let warehouse = create_test_storage(db.as_ref(), "MAIN-WH", "Main Warehouse").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;

    // A positive quantity still debits the inventory.
    let movement_id = service
        .stock_out(warehouse.id, "SALE-001", shirt.id, 5, None, None)
        .await
        .expect("Failed to move stock out");

    let movement = get_movement(db.as_ref(), movement_id).await;
    assert_eq!(movement.movement_type, "OUT");
    assert_eq!(movement.quantity, -5);
    assert_eq!(movement.quantity_before, 0);
    assert_eq!(movement.quantity_after, -5);
    assert_eq!(movement.reference_no, "SALE-001");

    let row = service
        .get_by_storage_and_item_or_default(warehouse.id, shirt.id)
        .await
        .expect("Failed to query inventory")
        .expect("Inventory row missing");
    assert_eq!(row.quantity, -5);
}

#[tokio::test]
async fn ledger_snapshots_chain_across_movements() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = InventoryService::new(db.clone(), events);

    let warehouse = create_test_storage(db.as_ref(), "MAIN-WH", "Main Warehouse").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;

    let first = service
        .stock_in(warehouse.id, "TRF-001", shirt.id, 10, None, None)
        .await
        .expect("Failed to move stock in");
    let second = service
        .stock_out(warehouse.id, "SALE-002", shirt.id, 4, Some("floor sale".into()), None)
        .await
        .expect("Failed to move stock out");

    let first = get_movement(db.as_ref(), first).await;
    assert_eq!(first.movement_type, "IN");
    assert_eq!(first.quantity_before, 0);
    assert_eq!(first.quantity, 10);
    assert_eq!(first.quantity_after, 10);

    let second = get_movement(db.as_ref(), second).await;
    assert_eq!(second.quantity_before, 10);
    assert_eq!(second.quantity, -4);
    assert_eq!(second.quantity_after, 6);
    assert_eq!(second.remark.as_deref(), Some("floor sale"));

    // after = before + quantity for every row written
    let movements = inventory_movement::Entity::find()
        .all(db.as_ref())
        .await
        .expect("Failed to list movements");
    assert_eq!(movements.len(), 2);
    for movement in &movements {
        assert_eq!(
            movement.quantity_after,
            movement.quantity_before + movement.quantity
        );
    }

    let row = service
        .get_by_storage_and_item_or_default(warehouse.id, shirt.id)
        .await
        .expect("Failed to query inventory")
        .expect("Inventory row missing");
    assert_eq!(row.quantity, 6);
}

#[tokio::test]
async fn create_aggregates_field_errors() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = InventoryService::new(db.clone(), events);

    let err = service
        .create(InventoryInput::default())
        .await
        .expect_err("Empty input must fail validation");
    match err {
        ServiceError::ValidationFailed(errors) => {
            assert_eq!(errors.field("storage_id"), Some("storage_id is required"));
            assert_eq!(errors.field("item_id"), Some("item_id is required"));
            assert_eq!(errors.field("quantity"), Some("quantity is required"));
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }

    let err = service
        .create(InventoryInput {
            storage_id: Some(Uuid::new_v4()),
            item_id: Some(Uuid::new_v4()),
            quantity: Some(-1),
            actor: None,
        })
        .await
        .expect_err("Unknown references must fail validation");
    match err {
        ServiceError::ValidationFailed(errors) => {
            assert_eq!(errors.field("storage_id"), Some("storage_id not found"));
            assert_eq!(errors.field("item_id"), Some("item_id not found"));
            assert_eq!(errors.field("quantity"), Some("quantity must not be negative"));
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn create_rejects_a_second_row_for_the_same_pair() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = InventoryService::new(db.clone(), events);

    let warehouse = create_test_storage(db.as_ref(), "MAIN-WH", "Main Warehouse").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;

    let input = InventoryInput {
        storage_id: Some(warehouse.id),
        item_id: Some(shirt.id),
        quantity: Some(3),
        actor: None,
    };
    service
        .create(input.clone())
        .await
        .expect("Failed to create inventory");

    let err = service
        .create(input)
        .await
        .expect_err("Second row for the pair must fail validation");
    match err {
        ServiceError::ValidationFailed(errors) => {
            assert_eq!(
                errors.field("item_id"),
                Some("inventory for this storage and item already exists")
            );
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn soft_delete_hides_the_row_and_get_or_create_revives_it() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = InventoryService::new(db.clone(), events);

    let warehouse = create_test_storage(db.as_ref(), "MAIN-WH", "Main Warehouse").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;

    let id = service
        .create(InventoryInput {
            storage_id: Some(warehouse.id),
            item_id: Some(shirt.id),
            quantity: Some(8),
            actor: Some("clerk".into()),
        })
        .await
        .expect("Failed to create inventory");

    service
        .delete(id, Some("clerk".into()))
        .await
        .expect("Failed to delete inventory");

    // Hidden from every read path, but the row is still there.
    let listed = service
        .read(&Paging::default())
        .await
        .expect("Failed to read inventories");
    assert_eq!(listed.total, 0);
    assert!(matches!(
        service.get_single_by_id(id).await,
        Err(ServiceError::NotFound(_))
    ));
    let raw = inventory::Entity::find()
        .filter(inventory::Column::Id.eq(id))
        .one(db.as_ref())
        .await
        .expect("Failed to query inventory")
        .expect("Soft-deleted row must remain");
    assert!(raw.deleted);

    // The pair resolves to the same row again, revived with its quantity.
    let revived = service
        .get_or_create_inventory(warehouse.id, shirt.id, None)
        .await
        .expect("Failed to revive inventory");
    assert_eq!(revived.id, id);
    assert!(!revived.deleted);
    assert_eq!(revived.quantity, 8);
}

#[tokio::test]
async fn keyword_search_matches_item_and_storage_fields() {
    let db = setup_db().await;
    let (events, _rx) = event_channel();
    let service = InventoryService::new(db.clone(), events);

    let warehouse = create_test_storage(db.as_ref(), "MAIN-WH", "Main Warehouse").await;
    let shirt = create_test_item(db.as_ref(), "SHIRT-001", "Plain Shirt").await;
    let pants = create_test_item(db.as_ref(), "PANT-001", "Cargo Pants").await;

    for item_id in [shirt.id, pants.id] {
        service
            .create(InventoryInput {
                storage_id: Some(warehouse.id),
                item_id: Some(item_id),
                quantity: Some(1),
                actor: None,
            })
            .await
            .expect("Failed to create inventory");
    }

    let paging = Paging {
        keyword: Some("SHIRT".to_string()),
        ..Default::default()
    };
    let result = service.read(&paging).await.expect("Failed to search");
    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].item_id, shirt.id);

    // Storage name matches every row in that storage.
    let paging = Paging {
        keyword: Some("Main".to_string()),
        ..Default::default()
    };
    let result = service.read(&paging).await.expect("Failed to search");
    assert_eq!(result.total, 2);

    let by_storage = service
        .read_by_storage_id(warehouse.id, &Paging::default())
        .await
        .expect("Failed to read by storage");
    assert_eq!(by_storage.total, 2);
}
