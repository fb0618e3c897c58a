use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::referrals::{
        ReferralSummary, ReferralTransactionList, ValidateCodeRequest, ValidateCodeResponse,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::ReferralCode,
    response::ApiResponse,
    routes::params::{Pagination, ReferralTransactionQuery},
    services::referral_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/code", post(create_code))
        .route("/me", get(my_summary))
        .route("/transactions", get(my_transactions))
        .route("/validate", post(validate_code))
}

#[utoipa::path(
    post,
    path = "/api/referrals/code",
    responses(
        (status = 200, description = "The caller's referral code, issued on first call", body = ApiResponse<ReferralCode>),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Code collision, retry"),
    ),
    security(("bearer_auth" = [])),
    tag = "Referrals"
)]
pub async fn create_code(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ReferralCode>>> {
    let resp = referral_service::create_code(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/referrals/me",
    responses(
        (status = 200, description = "Code and commission totals", body = ApiResponse<ReferralSummary>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Referrals"
)]
pub async fn my_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ReferralSummary>>> {
    let resp = referral_service::get_my_summary(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/referrals/transactions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "pending, paid, cancelled"),
    ),
    responses(
        (status = 200, description = "Commissions earned by the caller", body = ApiResponse<ReferralTransactionList>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Referrals"
)]
pub async fn my_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<ReferralTransactionQuery>,
) -> AppResult<Json<ApiResponse<ReferralTransactionList>>> {
    let resp = referral_service::list_my_transactions(&state, &user, pagination, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/referrals/validate",
    request_body = ValidateCodeRequest,
    responses(
        (status = 200, description = "Code can be used at checkout", body = ApiResponse<ValidateCodeResponse>),
        (status = 400, description = "Unknown, inactive or own code"),
    ),
    security((), ("bearer_auth" = [])),
    tag = "Referrals"
)]
pub async fn validate_code(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(payload): Json<ValidateCodeRequest>,
) -> AppResult<Json<ApiResponse<ValidateCodeResponse>>> {
    let resp = referral_service::validate_code(&state, user.as_ref(), payload).await?;
    Ok(Json(resp))
}
