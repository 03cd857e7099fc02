use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::item::{self, Entity as Item};
use crate::errors::{ServiceError, ValidationErrors};
use crate::events::{Event, EventSender};

use super::{actor_or_default, paginate, PagedResult, Paging};

/// Manager for article master data.
#[derive(Clone)]
pub struct ItemService {
    db: Arc<DbPool>,
    events: EventSender,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemInput {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub uom: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub actor: Option<String>,
}

impl ItemService {
    pub fn new(db: Arc<DbPool>, events: EventSender) -> Self {
        Self { db, events }
    }

    pub async fn read(&self, paging: &Paging) -> Result<PagedResult<item::Model>, ServiceError> {
        let mut query = Item::find().filter(item::Column::Deleted.eq(false));

        if let Some(keyword) = paging.keyword() {
            query = query.filter(
                Condition::any()
                    .add(item::Column::Code.contains(keyword))
                    .add(item::Column::Name.contains(keyword)),
            );
        }

        let query = query.order_by(Self::order_column(&paging.order), paging.sort_order());
        paginate(self.db.as_ref(), query, paging).await
    }

    pub async fn get_single_by_id(&self, id: Uuid) -> Result<item::Model, ServiceError> {
        self.get_single_by_id_or_default(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("item {} not found", id)))
    }

    pub async fn get_single_by_id_or_default(
        &self,
        id: Uuid,
    ) -> Result<Option<item::Model>, ServiceError> {
        let item = Item::find()
            .filter(item::Column::Id.eq(id))
            .filter(item::Column::Deleted.eq(false))
            .one(self.db.as_ref())
            .await?;
        Ok(item)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ItemInput) -> Result<Uuid, ServiceError> {
        let (code, name) = self.validate(None, &input).await?;
        let actor = actor_or_default(&input.actor);
        let id = Uuid::new_v4();
        let now = Utc::now();

        let model = item::ActiveModel {
            id: Set(id),
            code: Set(code.clone()),
            name: Set(name),
            uom: Set(input.uom),
            price: Set(input.price),
            deleted: Set(false),
            created_by: Set(actor),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(now),
        };
        model.insert(self.db.as_ref()).await?;

        info!(%id, %code, "item created");
        self.events
            .send(Event::ItemCreated(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: ItemInput) -> Result<Uuid, ServiceError> {
        let (code, name) = self.validate(Some(id), &input).await?;
        let existing = self.get_single_by_id(id).await?;
        let actor = actor_or_default(&input.actor);

        let mut model: item::ActiveModel = existing.into();
        model.code = Set(code);
        model.name = Set(name);
        model.uom = Set(input.uom);
        model.price = Set(input.price);
        model.updated_by = Set(Some(actor));
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;

        self.events
            .send(Event::ItemUpdated(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, actor: Option<String>) -> Result<Uuid, ServiceError> {
        let existing = self.get_single_by_id(id).await?;

        let mut model: item::ActiveModel = existing.into();
        model.deleted = Set(true);
        model.updated_by = Set(Some(actor_or_default(&actor)));
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;

        info!(%id, "item deleted");
        self.events
            .send(Event::ItemDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    async fn validate(
        &self,
        exclude: Option<Uuid>,
        input: &ItemInput,
    ) -> Result<(String, String), ServiceError> {
        let mut errors = ValidationErrors::new();
        let code = input.code.as_deref().unwrap_or("").trim().to_string();
        let name = input.name.as_deref().unwrap_or("").trim().to_string();

        let duplicate = if code.is_empty() {
            None
        } else {
            let mut query = Item::find()
                .filter(item::Column::Code.eq(code.clone()))
                .filter(item::Column::Deleted.eq(false));
            if let Some(id) = exclude {
                query = query.filter(item::Column::Id.ne(id));
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
        if input.price.is_some_and(|price| price < Decimal::ZERO) {
            errors.add("price", "price must not be negative");
        }

        errors.into_result()?;
        Ok((code, name))
    }

    fn order_column(name: &str) -> item::Column {
        match name {
            "code" => item::Column::Code,
            "name" => item::Column::Name,
            "created_at" => item::Column::CreatedAt,
            "updated_at" => item::Column::UpdatedAt,
            _ => item::Column::Id,
        }
    }
}
