use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionError, TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::inventory::{self, Entity as Inventory};
use crate::entities::inventory_movement::{self, MovementType};
use crate::entities::item::{self, Entity as Item};
use crate::entities::storage::{self, Entity as Storage};
use crate::errors::{ServiceError, ValidationErrors};
use crate::events::{Event, EventSender};

use super::inventory_movements::InventoryMovementService;
use super::{actor_or_default, paginate, PagedResult, Paging};

/// Manager for inventory rows and the movement ledger over them.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
    events: EventSender,
    movements: InventoryMovementService,
}

/// Payload for creating or updating an inventory row directly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryInput {
    pub storage_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub quantity: Option<i32>,
    #[serde(default)]
    pub actor: Option<String>,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, events: EventSender) -> Self {
        Self {
            movements: InventoryMovementService::new(db.clone()),
            db,
            events,
        }
    }

    /// Paginated listing. The keyword matches item code, item name, or
    /// storage name.
    pub async fn read(
        &self,
        paging: &Paging,
    ) -> Result<PagedResult<inventory::Model>, ServiceError> {
        let mut query = Inventory::find().filter(inventory::Column::Deleted.eq(false));

        if let Some(keyword) = paging.keyword() {
            query = query
                .join(JoinType::InnerJoin, inventory::Relation::Item.def())
                .join(JoinType::InnerJoin, inventory::Relation::Storage.def())
                .filter(
                    Condition::any()
                        .add(item::Column::Code.contains(keyword))
                        .add(item::Column::Name.contains(keyword))
                        .add(storage::Column::Name.contains(keyword)),
                );
        }

        let query = query.order_by(Self::order_column(&paging.order), paging.sort_order());
        paginate(self.db.as_ref(), query, paging).await
    }

    /// Listing narrowed to one storage. The keyword matches item code or
    /// name.
    pub async fn read_by_storage_id(
        &self,
        storage_id: Uuid,
        paging: &Paging,
    ) -> Result<PagedResult<inventory::Model>, ServiceError> {
        let mut query = Inventory::find()
            .filter(inventory::Column::Deleted.eq(false))
            .filter(inventory::Column::StorageId.eq(storage_id));

        if let Some(keyword) = paging.keyword() {
            query = query
                .join(JoinType::InnerJoin, inventory::Relation::Item.def())
                .filter(
                    Condition::any()
                        .add(item::Column::Code.contains(keyword))
                        .add(item::Column::Name.contains(keyword)),
                );
        }

        let query = query.order_by(Self::order_column(&paging.order), paging.sort_order());
        paginate(self.db.as_ref(), query, paging).await
    }

    pub async fn get_single_by_id(&self, id: Uuid) -> Result<inventory::Model, ServiceError> {
        self.get_single_by_id_or_default(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("inventory {} not found", id)))
    }

    pub async fn get_single_by_id_or_default(
        &self,
        id: Uuid,
    ) -> Result<Option<inventory::Model>, ServiceError> {
        let inventory = Inventory::find()
            .filter(inventory::Column::Id.eq(id))
            .filter(inventory::Column::Deleted.eq(false))
            .one(self.db.as_ref())
            .await?;
        Ok(inventory)
    }

    pub async fn get_by_storage_and_item_or_default(
        &self,
        storage_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<inventory::Model>, ServiceError> {
        let inventory = Inventory::find()
            .filter(inventory::Column::StorageId.eq(storage_id))
            .filter(inventory::Column::ItemId.eq(item_id))
            .filter(inventory::Column::Deleted.eq(false))
            .one(self.db.as_ref())
            .await?;
        Ok(inventory)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: InventoryInput) -> Result<Uuid, ServiceError> {
        let (storage_id, item_id, quantity) = self.validate(None, &input).await?;
        let actor = actor_or_default(&input.actor);
        let now = Utc::now();

        // Validation only rejected a live duplicate; a soft-deleted row still
        // owns the unique (storage, item) slot. Revive it with the new
        // quantity instead of inserting a second row.
        let buried = Inventory::find()
            .filter(inventory::Column::StorageId.eq(storage_id))
            .filter(inventory::Column::ItemId.eq(item_id))
            .one(self.db.as_ref())
            .await?;
        if let Some(row) = buried {
            let id = row.id;
            let mut model: inventory::ActiveModel = row.into();
            model.deleted = Set(false);
            model.quantity = Set(quantity);
            model.updated_by = Set(Some(actor));
            model.updated_at = Set(now);
            model.update(self.db.as_ref()).await?;

            info!(%id, %storage_id, %item_id, quantity, "inventory re-created");
            self.events
                .send(Event::InventoryCreated(id))
                .await
                .map_err(ServiceError::EventError)?;
            return Ok(id);
        }

        let id = Uuid::new_v4();
        let model = inventory::ActiveModel {
            id: Set(id),
            storage_id: Set(storage_id),
            item_id: Set(item_id),
            quantity: Set(quantity),
            deleted: Set(false),
            created_by: Set(actor),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(now),
        };
        model.insert(self.db.as_ref()).await?;

        info!(%id, %storage_id, %item_id, quantity, "inventory created");
        self.events
            .send(Event::InventoryCreated(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: InventoryInput) -> Result<Uuid, ServiceError> {
        let (storage_id, item_id, quantity) = self.validate(Some(id), &input).await?;
        let existing = self.get_single_by_id(id).await?;
        let actor = actor_or_default(&input.actor);

        let mut model: inventory::ActiveModel = existing.into();
        model.storage_id = Set(storage_id);
        model.item_id = Set(item_id);
        model.quantity = Set(quantity);
        model.updated_by = Set(Some(actor));
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;

        self.events
            .send(Event::InventoryUpdated(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    /// Soft delete. The ledger rows referencing this inventory stay as they
    /// are.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, actor: Option<String>) -> Result<Uuid, ServiceError> {
        let existing = self.get_single_by_id(id).await?;

        let mut model: inventory::ActiveModel = existing.into();
        model.deleted = Set(true);
        model.updated_by = Set(Some(actor_or_default(&actor)));
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;

        info!(%id, "inventory deleted");
        self.events
            .send(Event::InventoryDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    /// Resolves the inventory row for a (storage, item) pair, creating a
    /// zero-quantity row when none exists yet.
    pub async fn get_or_create_inventory(
        &self,
        storage_id: Uuid,
        item_id: Uuid,
        actor: Option<String>,
    ) -> Result<inventory::Model, ServiceError> {
        let actor = actor_or_default(&actor);
        self.get_or_create_on(self.db.as_ref(), storage_id, item_id, &actor)
            .await
    }

    /// Records a positive (IN) movement. The quantity's sign is forced.
    pub async fn stock_in(
        &self,
        storage_id: Uuid,
        reference_no: &str,
        item_id: Uuid,
        quantity: i32,
        remark: Option<String>,
        actor: Option<String>,
    ) -> Result<Uuid, ServiceError> {
        self.move_stock(
            storage_id,
            reference_no,
            MovementType::In,
            item_id,
            quantity.saturating_abs(),
            remark,
            actor,
        )
        .await
    }

    /// Records a negative (OUT) movement. The quantity's sign is forced:
    /// passing a positive quantity still debits the inventory.
    pub async fn stock_out(
        &self,
        storage_id: Uuid,
        reference_no: &str,
        item_id: Uuid,
        quantity: i32,
        remark: Option<String>,
        actor: Option<String>,
    ) -> Result<Uuid, ServiceError> {
        self.move_stock(
            storage_id,
            reference_no,
            MovementType::Out,
            item_id,
            -quantity.saturating_abs(),
            remark,
            actor,
        )
        .await
    }

    /// Ledger routine: applies the signed quantity delta to the (storage,
    /// item) inventory and appends the movement row, both inside one
    /// transaction. Returns the movement id.
    #[instrument(skip(self, remark, actor))]
    pub async fn move_stock(
        &self,
        storage_id: Uuid,
        reference_no: &str,
        movement_type: MovementType,
        item_id: Uuid,
        quantity: i32,
        remark: Option<String>,
        actor: Option<String>,
    ) -> Result<Uuid, ServiceError> {
        let svc = self.clone();
        let reference_no = reference_no.to_string();
        let actor = actor_or_default(&actor);

        let movement = self
            .db
            .transaction::<_, inventory_movement::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    svc.apply_movement_on(
                        txn,
                        storage_id,
                        &reference_no,
                        movement_type,
                        item_id,
                        quantity,
                        remark,
                        &actor,
                    )
                    .await
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::Database(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            movement_id = %movement.id,
            movement_type = %movement.movement_type,
            %storage_id,
            %item_id,
            quantity = movement.quantity,
            quantity_after = movement.quantity_after,
            "stock moved"
        );
        self.events
            .send(Event::StockMoved {
                movement_id: movement.id,
                movement_type: movement.movement_type.clone(),
                storage_id,
                item_id,
                quantity: movement.quantity,
                quantity_after: movement.quantity_after,
                reference_no: movement.reference_no.clone(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(movement.id)
    }

    /// The ledger body, runnable on an outer transaction so document
    /// cascades commit atomically with their movements.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn apply_movement_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        storage_id: Uuid,
        reference_no: &str,
        movement_type: MovementType,
        item_id: Uuid,
        quantity: i32,
        remark: Option<String>,
        actor: &str,
    ) -> Result<inventory_movement::Model, ServiceError> {
        let inventory = self
            .get_or_create_on(conn, storage_id, item_id, actor)
            .await?;

        let quantity_before = inventory.quantity;
        let quantity_after = quantity_before + quantity;
        let now = Utc::now();

        let movement = inventory_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            inventory_id: Set(inventory.id),
            movement_date: Set(now),
            reference_no: Set(reference_no.to_string()),
            movement_type: Set(movement_type.as_str().to_string()),
            storage_id: Set(inventory.storage_id),
            item_id: Set(inventory.item_id),
            quantity_before: Set(quantity_before),
            quantity: Set(quantity),
            quantity_after: Set(quantity_after),
            remark: Set(remark),
            created_by: Set(actor.to_string()),
            created_at: Set(now),
        };
        let movement = self.movements.create_on(conn, movement).await?;

        let mut model: inventory::ActiveModel = inventory.into();
        model.quantity = Set(quantity_after);
        model.updated_by = Set(Some(actor.to_string()));
        model.updated_at = Set(now);
        model.update(conn).await?;

        Ok(movement)
    }

    /// Get-or-create against the unique (storage, item) index: a lost insert
    /// race converges on the winner's row via the conflict clause and
    /// re-read. A soft-deleted pair is revived instead of duplicated.
    async fn get_or_create_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        storage_id: Uuid,
        item_id: Uuid,
        actor: &str,
    ) -> Result<inventory::Model, ServiceError> {
        let live = Inventory::find()
            .filter(inventory::Column::StorageId.eq(storage_id))
            .filter(inventory::Column::ItemId.eq(item_id))
            .filter(inventory::Column::Deleted.eq(false))
            .one(conn)
            .await?;
        if let Some(row) = live {
            return Ok(row);
        }

        // No live row: cross-check the pair before creating it.
        let mut errors = ValidationErrors::new();
        let storage = Storage::find()
            .filter(storage::Column::Id.eq(storage_id))
            .filter(storage::Column::Deleted.eq(false))
            .one(conn)
            .await?;
        let item = Item::find()
            .filter(item::Column::Id.eq(item_id))
            .filter(item::Column::Deleted.eq(false))
            .one(conn)
            .await?;
        if storage.is_none() {
            errors.add("storage_id", "storage_id not found");
        }
        if item.is_none() {
            errors.add("item_id", "item_id not found");
        }
        errors.into_result()?;

        let now = Utc::now();
        let fresh = inventory::ActiveModel {
            id: Set(Uuid::new_v4()),
            storage_id: Set(storage_id),
            item_id: Set(item_id),
            quantity: Set(0),
            deleted: Set(false),
            created_by: Set(actor.to_string()),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(now),
        };
        Inventory::insert(fresh)
            .on_conflict(
                OnConflict::columns([inventory::Column::StorageId, inventory::Column::ItemId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        let row = Inventory::find()
            .filter(inventory::Column::StorageId.eq(storage_id))
            .filter(inventory::Column::ItemId.eq(item_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(format!(
                    "inventory row missing after upsert for storage {} item {}",
                    storage_id, item_id
                ))
            })?;

        if row.deleted {
            debug!(inventory_id = %row.id, "reviving soft-deleted inventory row");
            let mut model: inventory::ActiveModel = row.into();
            model.deleted = Set(false);
            model.updated_by = Set(Some(actor.to_string()));
            model.updated_at = Set(Utc::now());
            let revived = model.update(conn).await?;
            return Ok(revived);
        }

        Ok(row)
    }

    async fn validate(
        &self,
        exclude: Option<Uuid>,
        input: &InventoryInput,
    ) -> Result<(Uuid, Uuid, i32), ServiceError> {
        let mut errors = ValidationErrors::new();
        let db = self.db.as_ref();

        let (storage, item, pair) = tokio::try_join!(
            async {
                match input.storage_id {
                    Some(id) => {
                        Storage::find()
                            .filter(storage::Column::Id.eq(id))
                            .filter(storage::Column::Deleted.eq(false))
                            .one(db)
                            .await
                    }
                    None => Ok(None),
                }
            },
            async {
                match input.item_id {
                    Some(id) => {
                        Item::find()
                            .filter(item::Column::Id.eq(id))
                            .filter(item::Column::Deleted.eq(false))
                            .one(db)
                            .await
                    }
                    None => Ok(None),
                }
            },
            async {
                match (input.storage_id, input.item_id) {
                    (Some(storage_id), Some(item_id)) => {
                        let mut query = Inventory::find()
                            .filter(inventory::Column::StorageId.eq(storage_id))
                            .filter(inventory::Column::ItemId.eq(item_id))
                            .filter(inventory::Column::Deleted.eq(false));
                        if let Some(id) = exclude {
                            query = query.filter(inventory::Column::Id.ne(id));
                        }
                        query.one(db).await
                    }
                    _ => Ok(None),
                }
            },
        )?;

        if input.storage_id.is_none() {
            errors.add("storage_id", "storage_id is required");
        } else if storage.is_none() {
            errors.add("storage_id", "storage_id not found");
        }

        if input.item_id.is_none() {
            errors.add("item_id", "item_id is required");
        } else if item.is_none() {
            errors.add("item_id", "item_id not found");
        } else if pair.is_some() {
            errors.add("item_id", "inventory for this storage and item already exists");
        }

        match input.quantity {
            None => errors.add("quantity", "quantity is required"),
            Some(quantity) if quantity < 0 => {
                errors.add("quantity", "quantity must not be negative")
            }
            _ => {}
        }

        errors.into_result()?;

        if let (Some(storage_id), Some(item_id), Some(quantity)) =
            (input.storage_id, input.item_id, input.quantity)
        {
            Ok((storage_id, item_id, quantity))
        } else {
            Err(ServiceError::Internal(
                "validated inventory input missing required fields".to_string(),
            ))
        }
    }

    fn order_column(name: &str) -> inventory::Column {
        match name {
            "quantity" => inventory::Column::Quantity,
            "created_at" => inventory::Column::CreatedAt,
            "updated_at" => inventory::Column::UpdatedAt,
            _ => inventory::Column::Id,
        }
    }
}
