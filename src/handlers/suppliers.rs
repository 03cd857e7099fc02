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
use crate::services::suppliers::SupplierInput;
use crate::services::Paging;
use crate::{ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier)
                .put(update_supplier)
                .delete(delete_supplier),
        )
}

async fn list_suppliers(
    State(state): State<AppState>,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.suppliers.read(&paging).await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.suppliers.get_single_by_id(id).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

async fn create_supplier(
    State(state): State<AppState>,
    Json(input): Json<SupplierInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.suppliers.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "id": id }))),
    ))
}

async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SupplierInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.suppliers.update(id, input).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}

async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.suppliers.delete(id, None).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}
