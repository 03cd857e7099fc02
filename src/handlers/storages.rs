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
use crate::services::storages::StorageInput;
use crate::services::Paging;
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_storages).post(create_storage))
        .route(
            "/:id",
            get(get_storage).put(update_storage).delete(delete_storage),
        )
}

async fn list_storages(
    State(state): State<AppState>,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.storages.read(&paging).await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn get_storage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let storage = state.storages.get_single_by_id(id).await?;
    Ok(Json(ApiResponse::success(storage)))
}

async fn create_storage(
    State(state): State<AppState>,
    Json(input): Json<StorageInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.storages.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "id": id }))),
    ))
}

async fn update_storage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StorageInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.storages.update(id, input).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}

async fn delete_storage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.storages.delete(id, None).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}
