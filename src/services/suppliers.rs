use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::supplier::{self, Entity as Supplier};
use crate::errors::{ServiceError, ValidationErrors};
use crate::events::{Event, EventSender};

use super::{actor_or_default, paginate, PagedResult, Paging};

/// Manager for supplier master data. Suppliers act as the source side of
/// transfer-in documents.
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DbPool>,
    events: EventSender,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplierInput {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

impl SupplierService {
    pub fn new(db: Arc<DbPool>, events: EventSender) -> Self {
        Self { db, events }
    }

    pub async fn read(
        &self,
        paging: &Paging,
    ) -> Result<PagedResult<supplier::Model>, ServiceError> {
        let mut query = Supplier::find().filter(supplier::Column::Deleted.eq(false));

        if let Some(keyword) = paging.keyword() {
            query = query.filter(
                Condition::any()
                    .add(supplier::Column::Code.contains(keyword))
                    .add(supplier::Column::Name.contains(keyword)),
            );
        }

        let query = query.order_by(Self::order_column(&paging.order), paging.sort_order());
        paginate(self.db.as_ref(), query, paging).await
    }

    pub async fn get_single_by_id(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        self.get_single_by_id_or_default(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier {} not found", id)))
    }

    pub async fn get_single_by_id_or_default(
        &self,
        id: Uuid,
    ) -> Result<Option<supplier::Model>, ServiceError> {
        let supplier = Supplier::find()
            .filter(supplier::Column::Id.eq(id))
            .filter(supplier::Column::Deleted.eq(false))
            .one(self.db.as_ref())
            .await?;
        Ok(supplier)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: SupplierInput) -> Result<Uuid, ServiceError> {
        let (code, name) = self.validate(None, &input).await?;
        let actor = actor_or_default(&input.actor);
        let id = Uuid::new_v4();
        let now = Utc::now();

        let model = supplier::ActiveModel {
            id: Set(id),
            code: Set(code.clone()),
            name: Set(name),
            contact: Set(input.contact),
            deleted: Set(false),
            created_by: Set(actor),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(now),
        };
        model.insert(self.db.as_ref()).await?;

        info!(%id, %code, "supplier created");
        self.events
            .send(Event::SupplierCreated(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: SupplierInput) -> Result<Uuid, ServiceError> {
        let (code, name) = self.validate(Some(id), &input).await?;
        let existing = self.get_single_by_id(id).await?;
        let actor = actor_or_default(&input.actor);

        let mut model: supplier::ActiveModel = existing.into();
        model.code = Set(code);
        model.name = Set(name);
        model.contact = Set(input.contact);
        model.updated_by = Set(Some(actor));
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;

        self.events
            .send(Event::SupplierUpdated(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, actor: Option<String>) -> Result<Uuid, ServiceError> {
        let existing = self.get_single_by_id(id).await?;

        let mut model: supplier::ActiveModel = existing.into();
        model.deleted = Set(true);
        model.updated_by = Set(Some(actor_or_default(&actor)));
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;

        info!(%id, "supplier deleted");
        self.events
            .send(Event::SupplierDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    async fn validate(
        &self,
        exclude: Option<Uuid>,
        input: &SupplierInput,
    ) -> Result<(String, String), ServiceError> {
        let mut errors = ValidationErrors::new();
        let code = input.code.as_deref().unwrap_or("").trim().to_string();
        let name = input.name.as_deref().unwrap_or("").trim().to_string();

        let duplicate = if code.is_empty() {
            None
        } else {
            let mut query = Supplier::find()
                .filter(supplier::Column::Code.eq(code.clone()))
                .filter(supplier::Column::Deleted.eq(false));
            if let Some(id) = exclude {
                query = query.filter(supplier::Column::Id.ne(id));
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

    fn order_column(name: &str) -> supplier::Column {
        match name {
            "code" => supplier::Column::Code,
            "name" => supplier::Column::Name,
            "created_at" => supplier::Column::CreatedAt,
            "updated_at" => supplier::Column::UpdatedAt,
            _ => supplier::Column::Id,
        }
    }
}
