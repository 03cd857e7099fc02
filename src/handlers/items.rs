use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::items::ItemInput;
use crate::services::Paging;
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

async fn list_items(
    State(state): State<AppState>,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.items.read(&paging).await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.items.get_single_by_id(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<ItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.items.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "id": id }))),
    ))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.items.update(id, input).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.items.delete(id, None).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}
