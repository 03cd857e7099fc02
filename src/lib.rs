//! Stockroom API Library
//!
//! Inventory tracking and transfer-in document management: master data
//! (storages, items, suppliers), per-storage inventory rows, an append-only
//! movement ledger, and transfer-in documents whose creation cascades into
//! IN movements.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use axum::Router;
use serde::Serialize;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::inventory::InventoryService;
use crate::services::inventory_movements::InventoryMovementService;
use crate::services::items::ItemService;
use crate::services::storages::StorageService;
use crate::services::suppliers::SupplierService;
use crate::services::transfer_in::TransferInService;

/// Shared application state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: EventSender,
    pub storages: StorageService,
    pub items: ItemService,
    pub suppliers: SupplierService,
    pub inventory: InventoryService,
    pub movements: InventoryMovementService,
    pub transfer_in: TransferInService,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig, event_sender: EventSender) -> Self {
        Self {
            storages: StorageService::new(db.clone(), event_sender.clone()),
            items: ItemService::new(db.clone(), event_sender.clone()),
            suppliers: SupplierService::new(db.clone(), event_sender.clone()),
            inventory: InventoryService::new(db.clone(), event_sender.clone()),
            movements: InventoryMovementService::new(db.clone()),
            transfer_in: TransferInService::new(db.clone(), event_sender.clone()),
            db,
            config,
            event_sender,
        }
    }
}

/// Common success envelope for HTTP responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Composes the versioned API surface.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/inventory", handlers::inventory::router())
        .nest("/transfer-in", handlers::transfer_in::router())
        .nest("/storages", handlers::storages::router())
        .nest("/items", handlers::items::router())
        .nest("/suppliers", handlers::suppliers::router())
}
