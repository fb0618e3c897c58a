use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::admin::{RecycleBinList, Recycled},
    error::AppResult,
    middleware::auth::AuthUser,
    models::RecycleBinItem,
    response::ApiResponse,
    routes::params::{Pagination, RecycleBinQuery},
    services::recycle_bin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items))
        .route("/{id}/restore", post(restore_item))
        .route("/{id}", delete(purge_item))
}

#[utoipa::path(
    get,
    path = "/api/admin/recycle-bin",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("table" = Option<String>, Query, description = "products or orders"),
    ),
    responses(
        (status = 200, description = "Deleted rows, newest first", body = ApiResponse<RecycleBinList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Recycle bin"
)]
pub async fn list_items(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<RecycleBinQuery>,
) -> AppResult<Json<ApiResponse<RecycleBinList>>> {
    let resp = recycle_bin_service::list_items(&state, &user, pagination, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/recycle-bin/{id}/restore",
    params(
        ("id" = Uuid, Path, description = "Recycle bin item ID")
    ),
    responses(
        (status = 200, description = "Row restored under its original id", body = ApiResponse<RecycleBinItem>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "A row with the original id exists again"),
    ),
    security(("bearer_auth" = [])),
    tag = "Recycle bin"
)]
pub async fn restore_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecycleBinItem>>> {
    let resp = recycle_bin_service::restore_item(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/recycle-bin/{id}",
    params(
        ("id" = Uuid, Path, description = "Recycle bin item ID")
    ),
    responses(
        (status = 200, description = "Item permanently deleted", body = ApiResponse<Recycled>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Recycle bin"
)]
pub async fn purge_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Recycled>>> {
    let resp = recycle_bin_service::purge_item(&state, &user, id).await?;
    Ok(Json(resp))
}
