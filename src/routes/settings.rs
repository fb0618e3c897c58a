use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::settings::{SettingList, SettingsHistoryList, UpdateSettingRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::AppSetting,
    response::ApiResponse,
    routes::params::{Pagination, SettingsHistoryQuery},
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_settings))
        .route("/history", get(list_history))
        .route("/{key}", get(get_setting).put(update_setting))
}

#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "All settings", body = ApiResponse<SettingList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SettingList>>> {
    let resp = settings_service::list_settings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/settings/history",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("key" = Option<String>, Query, description = "Only changes to this key"),
    ),
    responses(
        (status = 200, description = "Setting changes, newest first", body = ApiResponse<SettingsHistoryList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<SettingsHistoryQuery>,
) -> AppResult<Json<ApiResponse<SettingsHistoryList>>> {
    let resp = settings_service::list_history(&state, &user, pagination, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/settings/{key}",
    params(
        ("key" = String, Path, description = "Setting key, e.g. commission_rate")
    ),
    responses(
        (status = 200, description = "One setting", body = ApiResponse<AppSetting>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_setting(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<AppSetting>>> {
    let resp = settings_service::get_setting(&state, &user, &key).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings/{key}",
    params(
        ("key" = String, Path, description = "Setting key, e.g. commission_rate")
    ),
    request_body = UpdateSettingRequest,
    responses(
        (status = 200, description = "Setting saved and history recorded", body = ApiResponse<AppSetting>),
        (status = 400, description = "Invalid value"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_setting(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
    Json(payload): Json<UpdateSettingRequest>,
) -> AppResult<Json<ApiResponse<AppSetting>>> {
    let resp = settings_service::update_setting(&state, &user, &key, payload).await?;
    Ok(Json(resp))
}
