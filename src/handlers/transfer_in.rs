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
use crate::services::transfer_in::TransferInInput;
use crate::services::Paging;
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transfer_in).post(create_transfer_in))
        .route(
            "/:id",
            get(get_transfer_in)
                .put(update_transfer_in)
                .delete(delete_transfer_in),
        )
}

async fn list_transfer_in(
    State(state): State<AppState>,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.transfer_in.read(&paging).await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn get_transfer_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.transfer_in.get_single_by_id(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

async fn create_transfer_in(
    State(state): State<AppState>,
    Json(input): Json<TransferInInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.transfer_in.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "id": id }))),
    ))
}

async fn update_transfer_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<TransferInInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.transfer_in.update(id, input).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}

async fn delete_transfer_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.transfer_in.delete(id, None).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}
