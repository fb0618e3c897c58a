use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::cart::{CartQuote, QuoteRequest},
    error::AppResult,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/quote", post(quote))
}

#[utoipa::path(
    post,
    path = "/api/cart/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Cart repriced against the catalog", body = ApiResponse<CartQuote>),
    ),
    tag = "Cart"
)]
pub async fn quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> AppResult<Json<ApiResponse<CartQuote>>> {
    let resp = cart_service::quote(&state, payload).await?;
    Ok(Json(resp))
}
