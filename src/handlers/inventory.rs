use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::entities::inventory_movement::MovementType;
use crate::errors::ServiceError;
use crate::services::inventory::InventoryInput;
use crate::services::Paging;
use crate::{ApiResponse, AppState};

/// Request body for the stock-in/stock-out endpoints.
#[derive(Debug, Deserialize)]
pub struct StockMovementRequest {
    pub storage_id: Uuid,
    pub reference_no: String,
    pub item_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

/// Request body for the raw move endpoint: the caller supplies the
/// direction and the signed quantity.
#[derive(Debug, Deserialize)]
pub struct MoveStockRequest {
    pub storage_id: Uuid,
    pub reference_no: String,
    pub movement_type: MovementType,
    pub item_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory).post(create_inventory))
        .route("/in", post(stock_in))
        .route("/out", post(stock_out))
        .route("/move", post(move_stock))
        .route("/movements", get(list_movements))
        .route("/movements/:id", get(get_movement))
        .route("/by-storage/:storage_id", get(list_by_storage))
        .route(
            "/:id",
            get(get_inventory)
                .put(update_inventory)
                .delete(delete_inventory),
        )
        .route("/:id/movements", get(list_inventory_movements))
}

async fn list_inventory(
    State(state): State<AppState>,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.inventory.read(&paging).await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn list_by_storage(
    State(state): State<AppState>,
    Path(storage_id): Path<Uuid>,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.inventory.read_by_storage_id(storage_id, &paging).await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let inventory = state.inventory.get_single_by_id(id).await?;
    Ok(Json(ApiResponse::success(inventory)))
}

async fn create_inventory(
    State(state): State<AppState>,
    Json(input): Json<InventoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.inventory.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "id": id }))),
    ))
}

async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<InventoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.inventory.update(id, input).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}

async fn delete_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.inventory.delete(id, None).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}

async fn stock_in(
    State(state): State<AppState>,
    Json(request): Json<StockMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement_id = state
        .inventory
        .stock_in(
            request.storage_id,
            &request.reference_no,
            request.item_id,
            request.quantity,
            request.remark,
            request.actor,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "movement_id": movement_id }))),
    ))
}

async fn stock_out(
    State(state): State<AppState>,
    Json(request): Json<StockMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement_id = state
        .inventory
        .stock_out(
            request.storage_id,
            &request.reference_no,
            request.item_id,
            request.quantity,
            request.remark,
            request.actor,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "movement_id": movement_id }))),
    ))
}

async fn move_stock(
    State(state): State<AppState>,
    Json(request): Json<MoveStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement_id = state
        .inventory
        .move_stock(
            request.storage_id,
            &request.reference_no,
            request.movement_type,
            request.item_id,
            request.quantity,
            request.remark,
            request.actor,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "movement_id": movement_id }))),
    ))
}

async fn list_movements(
    State(state): State<AppState>,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.movements.read(&paging).await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement = state.movements.get_single_by_id(id).await?;
    Ok(Json(ApiResponse::success(movement)))
}

async fn list_inventory_movements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.movements.read_by_inventory_id(id, &paging).await?;
    Ok(Json(ApiResponse::success(result)))
}
