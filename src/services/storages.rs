use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::storage::{self, Entity as Storage};
use crate::errors::{ServiceError, ValidationErrors};
use crate::events::{Event, EventSender};

use super::{actor_or_default, paginate, PagedResult, Paging};

/// Manager for storage locations (master data).
#[derive(Clone)]
pub struct StorageService {
    db: Arc<DbPool>,
    events: EventSender,
}

/// Payload for creating or updating a storage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageInput {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

impl StorageService {
    pub fn new(db: Arc<DbPool>, events: EventSender) -> Self {
        Self { db, events }
    }

    pub async fn read(&self, paging: &Paging) -> Result<PagedResult<storage::Model>, ServiceError> {
        let mut query = Storage::find().filter(storage::Column::Deleted.eq(false));

        if let Some(keyword) = paging.keyword() {
            query = query.filter(
                Condition::any()
                    .add(storage::Column::Code.contains(keyword))
                    .add(storage::Column::Name.contains(keyword)),
            );
        }

        let query = query.order_by(Self::order_column(&paging.order), paging.sort_order());
        paginate(self.db.as_ref(), query, paging).await
    }

    pub async fn get_single_by_id(&self, id: Uuid) -> Result<storage::Model, ServiceError> {
        self.get_single_by_id_or_default(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("storage {} not found", id)))
    }

    pub async fn get_single_by_id_or_default(
        &self,
        id: Uuid,
    ) -> Result<Option<storage::Model>, ServiceError> {
        let storage = Storage::find()
            .filter(storage::Column::Id.eq(id))
            .filter(storage::Column::Deleted.eq(false))
            .one(self.db.as_ref())
            .await?;
        Ok(storage)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: StorageInput) -> Result<Uuid, ServiceError> {
        let (code, name) = self.validate(None, &input).await?;
        let actor = actor_or_default(&input.actor);
        let id = Uuid::new_v4();
        let now = Utc::now();

        let model = storage::ActiveModel {
            id: Set(id),
            code: Set(code.clone()),
            name: Set(name),
            address: Set(input.address),
            phone: Set(input.phone),
            deleted: Set(false),
            created_by: Set(actor),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(now),
        };
        model.insert(self.db.as_ref()).await?;

        info!(%id, %code, "storage created");
        self.events
            .send(Event::StorageCreated(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: StorageInput) -> Result<Uuid, ServiceError> {
        let (code, name) = self.validate(Some(id), &input).await?;
        let existing = self.get_single_by_id(id).await?;
        let actor = actor_or_default(&input.actor);

        let mut model: storage::ActiveModel = existing.into();
        model.code = Set(code);
        model.name = Set(name);
        model.address = Set(input.address);
        model.phone = Set(input.phone);
        model.updated_by = Set(Some(actor));
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;

        self.events
            .send(Event::StorageUpdated(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    /// Soft delete: flips the `deleted` flag, never removes the row.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, actor: Option<String>) -> Result<Uuid, ServiceError> {
        let existing = self.get_single_by_id(id).await?;

        let mut model: storage::ActiveModel = existing.into();
        model.deleted = Set(true);
        model.updated_by = Set(Some(actor_or_default(&actor)));
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;

        info!(%id, "storage deleted");
        self.events
            .send(Event::StorageDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    async fn validate(
        &self,
        exclude: Option<Uuid>,
        input: &StorageInput,
    ) -> Result<(String, String), ServiceError> {
        let mut errors = ValidationErrors::new();
        let code = input.code.as_deref().unwrap_or("").trim().to_string();
        let name = input.name.as_deref().unwrap_or("").trim().to_string();

        let duplicate = if code.is_empty() {
            None
        } else {
            let mut query = Storage::find()
                .filter(storage::Column::Code.eq(code.clone()))
                .filter(storage::Column::Deleted.eq(false));
            if let Some(id) = exclude {
                query = query.filter(storage::Column::Id.ne(id));
            }
            query.one(self.db.as_ref()).await?
        };

        if code.is_empty() {
            errors.add("code", "code is required");
        } else if duplicate.is_some() {
            errors.add("code", "code already exists");
        }
        if name.is_empty() {
            errors.add("name", "name is required");
        }

        errors.into_result()?;
        Ok((code, name))
    }

    fn order_column(name: &str) -> storage::Column {
        match name {
            "code" => storage::Column::Code,
            "name" => storage::Column::Name,
            "created_at" => storage::Column::CreatedAt,
            "updated_at" => storage::Column::UpdatedAt,
            _ => storage::Column::Id,
        }
    }
}
