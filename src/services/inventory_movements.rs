use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::inventory_movement::{self, Entity as InventoryMovement};
use crate::errors::ServiceError;

use super::{paginate, PagedResult, Paging};

/// Read-side manager for the movement ledger. Movements are append-only:
/// they are written exclusively by the inventory ledger routine and never
/// updated or deleted.
#[derive(Clone)]
pub struct InventoryMovementService {
    db: Arc<DbPool>,
}

impl InventoryMovementService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn read(
        &self,
        paging: &Paging,
    ) -> Result<PagedResult<inventory_movement::Model>, ServiceError> {
        let mut query = InventoryMovement::find();

        if let Some(keyword) = paging.keyword() {
            query = query.filter(inventory_movement::Column::ReferenceNo.contains(keyword));
        }

        let query = query.order_by(Self::order_column(&paging.order), paging.sort_order());
        paginate(self.db.as_ref(), query, paging).await
    }

    pub async fn read_by_inventory_id(
        &self,
        inventory_id: Uuid,
        paging: &Paging,
    ) -> Result<PagedResult<inventory_movement::Model>, ServiceError> {
        let mut query =
            InventoryMovement::find().filter(inventory_movement::Column::InventoryId.eq(inventory_id));

        if let Some(keyword) = paging.keyword() {
            query = query.filter(inventory_movement::Column::ReferenceNo.contains(keyword));
        }

        let query = query.order_by(Self::order_column(&paging.order), paging.sort_order());
        paginate(self.db.as_ref(), query, paging).await
    }

    pub async fn get_single_by_id(
        &self,
        id: Uuid,
    ) -> Result<inventory_movement::Model, ServiceError> {
        InventoryMovement::find()
            .filter(inventory_movement::Column::Id.eq(id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("inventory movement {} not found", id)))
    }

    /// Appends a ledger row on the caller's connection, normally the ledger
    /// transaction.
    pub(crate) async fn create_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        movement: inventory_movement::ActiveModel,
    ) -> Result<inventory_movement::Model, ServiceError> {
        let model = movement.insert(conn).await?;
        debug!(
            movement_id = %model.id,
            inventory_id = %model.inventory_id,
            movement_type = %model.movement_type,
            quantity = model.quantity,
            "movement recorded"
        );
        Ok(model)
    }

    fn order_column(name: &str) -> inventory_movement::Column {
        match name {
            "movement_date" => inventory_movement::Column::MovementDate,
            "reference_no" => inventory_movement::Column::ReferenceNo,
            "created_at" => inventory_movement::Column::CreatedAt,
            _ => inventory_movement::Column::Id,
        }
    }
}
