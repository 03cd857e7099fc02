use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, Order, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::inventory_movement::MovementType;
use crate::entities::transfer_in_doc::{self, Entity as TransferInDoc};
use crate::entities::transfer_in_item;
use crate::errors::{ServiceError, ValidationErrors};
use crate::events::{Event, EventSender};

use super::inventory::InventoryService;
use super::items::ItemService;
use super::storages::StorageService;
use super::suppliers::SupplierService;
use super::{actor_or_default, paginate, PagedResult, Paging};

/// Manager for transfer-in documents: goods received from a supplier into a
/// storage. Creating a document cascades one IN movement per line.
#[derive(Clone)]
pub struct TransferInService {
    db: Arc<DbPool>,
    events: EventSender,
    inventory: InventoryService,
    storages: StorageService,
    items: ItemService,
    suppliers: SupplierService,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferInInput {
    pub code: Option<String>,
    #[serde(default)]
    pub transfer_date: Option<DateTime<Utc>>,
    pub source_id: Option<Uuid>,
    pub destination_id: Option<Uuid>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub items: Vec<TransferInLineInput>,
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferInLineInput {
    pub item_id: Option<Uuid>,
    pub quantity: Option<i32>,
    #[serde(default)]
    pub remark: Option<String>,
}

/// A document header together with its ordered lines.
#[derive(Debug, Clone, Serialize)]
pub struct TransferInDocDetail {
    #[serde(flatten)]
    pub doc: transfer_in_doc::Model,
    pub items: Vec<transfer_in_item::Model>,
}

impl TransferInService {
    /// Builds the manager and the sibling managers it consults during
    /// validation, all over the same pool.
    pub fn new(db: Arc<DbPool>, events: EventSender) -> Self {
        Self {
            inventory: InventoryService::new(db.clone(), events.clone()),
            storages: StorageService::new(db.clone(), events.clone()),
            items: ItemService::new(db.clone(), events.clone()),
            suppliers: SupplierService::new(db.clone(), events.clone()),
            db,
            events,
        }
    }

    /// Paginated listing. The keyword matches the document code.
    pub async fn read(
        &self,
        paging: &Paging,
    ) -> Result<PagedResult<transfer_in_doc::Model>, ServiceError> {
        let mut query = TransferInDoc::find().filter(transfer_in_doc::Column::Deleted.eq(false));

        if let Some(keyword) = paging.keyword() {
            query = query.filter(transfer_in_doc::Column::Code.contains(keyword));
        }

        let query = query.order_by(Self::order_column(&paging.order), paging.sort_order());
        paginate(self.db.as_ref(), query, paging).await
    }

    pub async fn get_single_by_id(&self, id: Uuid) -> Result<TransferInDocDetail, ServiceError> {
        self.get_single_by_id_or_default(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transfer-in document {} not found", id)))
    }

    pub async fn get_single_by_id_or_default(
        &self,
        id: Uuid,
    ) -> Result<Option<TransferInDocDetail>, ServiceError> {
        let doc = TransferInDoc::find()
            .filter(transfer_in_doc::Column::Id.eq(id))
            .filter(transfer_in_doc::Column::Deleted.eq(false))
            .one(self.db.as_ref())
            .await?;

        let Some(doc) = doc else {
            return Ok(None);
        };

        let items = doc
            .find_related(transfer_in_item::Entity)
            .order_by(transfer_in_item::Column::LineNumber, Order::Asc)
            .all(self.db.as_ref())
            .await?;

        Ok(Some(TransferInDocDetail { doc, items }))
    }

    /// Creates the document and, in the same transaction, one IN movement
    /// per line into the destination storage, referenced by the document
    /// code.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: TransferInInput) -> Result<Uuid, ServiceError> {
        let code = self.validate(None, &input).await?;
        let actor = actor_or_default(&input.actor);
        let (Some(source_id), Some(destination_id)) = (input.source_id, input.destination_id)
        else {
            return Err(ServiceError::Internal(
                "validated transfer-in input missing source or destination".to_string(),
            ));
        };

        let doc_id = Uuid::new_v4();
        let now = Utc::now();
        let transfer_date = input.transfer_date.unwrap_or(now);
        let line_count = input.items.len();

        let svc = self.clone();
        let doc_code = code.clone();
        let doc_actor = actor.clone();
        let remark = input.remark.clone();
        let lines = input.items.clone();

        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let doc = transfer_in_doc::ActiveModel {
                        id: Set(doc_id),
                        code: Set(doc_code.clone()),
                        transfer_date: Set(transfer_date),
                        source_id: Set(source_id),
                        destination_id: Set(destination_id),
                        remark: Set(remark),
                        deleted: Set(false),
                        created_by: Set(doc_actor.clone()),
                        created_at: Set(now),
                        updated_by: Set(None),
                        updated_at: Set(now),
                    };
                    doc.insert(txn).await?;

                    for (index, line) in lines.iter().enumerate() {
                        let (Some(item_id), Some(quantity)) = (line.item_id, line.quantity) else {
                            return Err(ServiceError::Internal(
                                "validated transfer-in line missing item or quantity".to_string(),
                            ));
                        };

                        let row = transfer_in_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            doc_id: Set(doc_id),
                            line_number: Set((index + 1) as i32),
                            item_id: Set(item_id),
                            quantity: Set(quantity),
                            remark: Set(line.remark.clone()),
                        };
                        row.insert(txn).await?;

                        svc.inventory
                            .apply_movement_on(
                                txn,
                                destination_id,
                                &doc_code,
                                MovementType::In,
                                item_id,
                                quantity.saturating_abs(),
                                line.remark.clone(),
                                &doc_actor,
                            )
                            .await?;
                    }

                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::Database(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(%doc_id, %code, lines = line_count, "transfer-in document created");
        self.events
            .send(Event::TransferInReceived {
                doc_id,
                code,
                lines: line_count,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(doc_id)
    }

    /// Updates the header and replaces the lines. No inventory movements are
    /// recorded here; only creation moves stock.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: TransferInInput) -> Result<Uuid, ServiceError> {
        let code = self.validate(Some(id), &input).await?;
        let detail = self.get_single_by_id(id).await?;
        let actor = actor_or_default(&input.actor);
        let (Some(source_id), Some(destination_id)) = (input.source_id, input.destination_id)
        else {
            return Err(ServiceError::Internal(
                "validated transfer-in input missing source or destination".to_string(),
            ));
        };

        let transfer_date = input.transfer_date.unwrap_or(detail.doc.transfer_date);
        let remark = input.remark.clone();
        let lines = input.items.clone();
        let doc_actor = actor.clone();
        let existing = detail.doc;

        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut model: transfer_in_doc::ActiveModel = existing.into();
                    model.code = Set(code);
                    model.transfer_date = Set(transfer_date);
                    model.source_id = Set(source_id);
                    model.destination_id = Set(destination_id);
                    model.remark = Set(remark);
                    model.updated_by = Set(Some(doc_actor));
                    model.updated_at = Set(Utc::now());
                    model.update(txn).await?;

                    transfer_in_item::Entity::delete_many()
                        .filter(transfer_in_item::Column::DocId.eq(id))
                        .exec(txn)
                        .await?;

                    for (index, line) in lines.iter().enumerate() {
                        let (Some(item_id), Some(quantity)) = (line.item_id, line.quantity) else {
                            return Err(ServiceError::Internal(
                                "validated transfer-in line missing item or quantity".to_string(),
                            ));
                        };

                        let row = transfer_in_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            doc_id: Set(id),
                            line_number: Set((index + 1) as i32),
                            item_id: Set(item_id),
                            quantity: Set(quantity),
                            remark: Set(line.remark.clone()),
                        };
                        row.insert(txn).await?;
                    }

                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::Database(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.events
            .send(Event::TransferInUpdated(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    /// Soft delete of the header. Lines stay attached; recorded movements
    /// are never unwound.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, actor: Option<String>) -> Result<Uuid, ServiceError> {
        let detail = self.get_single_by_id(id).await?;

        let mut model: transfer_in_doc::ActiveModel = detail.doc.into();
        model.deleted = Set(true);
        model.updated_by = Set(Some(actor_or_default(&actor)));
        model.updated_at = Set(Utc::now());
        model.update(self.db.as_ref()).await?;

        info!(%id, "transfer-in document deleted");
        self.events
            .send(Event::TransferInDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(id)
    }

    /// Cross-validates the document: code uniqueness, source supplier,
    /// destination storage, and every line. The independent lookups are
    /// issued concurrently and joined before the field checks run.
    async fn validate(
        &self,
        exclude: Option<Uuid>,
        input: &TransferInInput,
    ) -> Result<String, ServiceError> {
        let mut errors = ValidationErrors::new();
        let code = input.code.as_deref().unwrap_or("").trim().to_string();
        let db = self.db.as_ref();

        let duplicate_fut = async {
            if code.is_empty() {
                return Ok(None);
            }
            let mut query = TransferInDoc::find()
                .filter(transfer_in_doc::Column::Code.eq(code.clone()))
                .filter(transfer_in_doc::Column::Deleted.eq(false));
            if let Some(id) = exclude {
                query = query.filter(transfer_in_doc::Column::Id.ne(id));
            }
            query.one(db).await.map_err(ServiceError::Database)
        };
        let source_fut = async {
            match input.source_id {
                Some(id) => self.suppliers.get_single_by_id_or_default(id).await,
                None => Ok(None),
            }
        };
        let destination_fut = async {
            match input.destination_id {
                Some(id) => self.storages.get_single_by_id_or_default(id).await,
                None => Ok(None),
            }
        };

        let (duplicate, source, destination) =
            tokio::try_join!(duplicate_fut, source_fut, destination_fut)?;

        let line_items = try_join_all(input.items.iter().map(|line| async move {
            match line.item_id {
                Some(id) => self.items.get_single_by_id_or_default(id).await,
                None => Ok(None),
            }
        }))
        .await?;

        if code.is_empty() {
            errors.add("code", "code is required");
        } else if duplicate.is_some() {
            errors.add("code", "code already exists");
        }

        if input.source_id.is_none() {
            errors.add("source_id", "source_id is required");
        } else if source.is_none() {
            errors.add("source_id", "source_id not found");
        }

        if input.destination_id.is_none() {
            errors.add("destination_id", "destination_id is required");
        } else if destination.is_none() {
            errors.add("destination_id", "destination_id not found");
        }

        if input.items.is_empty() {
            errors.add("items", "items is required");
        }

        let mut line_errors = Vec::with_capacity(input.items.len());
        for (index, line) in input.items.iter().enumerate() {
            let mut line_error = ValidationErrors::new();

            match line.item_id {
                None => line_error.add("item_id", "item_id is required"),
                Some(item_id) => {
                    if input
                        .items
                        .iter()
                        .skip(index + 1)
                        .any(|other| other.item_id == Some(item_id))
                    {
                        line_error.add("item_id", "item_id already exists on another line");
                    }
                    if line_items[index].is_none() {
                        line_error.add("item_id", "item_id not found");
                    }
                }
            }

            match line.quantity {
                None => line_error.add("quantity", "quantity is required"),
                Some(quantity) if quantity <= 0 => {
                    line_error.add("quantity", "quantity must be greater than zero")
                }
                _ => {}
            }

            line_errors.push(line_error);
        }
        errors.set_items(line_errors);

        errors.into_result()?;
        Ok(code)
    }

    fn order_column(name: &str) -> transfer_in_doc::Column {
        match name {
            "code" => transfer_in_doc::Column::Code,
            "transfer_date" => transfer_in_doc::Column::TransferDate,
            "created_at" => transfer_in_doc::Column::CreatedAt,
            "updated_at" => transfer_in_doc::Column::UpdatedAt,
            _ => transfer_in_doc::Column::Id,
        }
    }
}
