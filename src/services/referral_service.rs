use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement, Value as DbValue,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::referrals::{
        ReferralCodeList, ReferralSummary, ReferralTransactionList, SetCodeActiveRequest,
        ValidateCodeRequest, ValidateCodeResponse,
    },
    entity::{
        referral_codes::{self, Column as CodeCol, Entity as ReferralCodes},
        referral_transactions::{self, Column as TxCol, Entity as ReferralTransactions},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ReferralCode, ReferralStatus, ReferralTransaction},
    pricing, referral_code,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ReferralTransactionQuery},
    services::settings_service,
    state::AppState,
};

/// Returns the caller's code, issuing one on first use.
pub async fn create_code(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ReferralCode>> {
    if let Some(existing) = ReferralCodes::find()
        .filter(CodeCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
    {
        return Ok(ApiResponse::success(
            "Referral code",
            code_from_entity(existing),
            None,
        ));
    }

    let orm = &state.orm;
    let code = referral_code::allocate(user.user_id, |candidate| async move {
        let taken = ReferralCodes::find()
            .filter(CodeCol::Code.eq(candidate))
            .count(orm)
            .await?
            > 0;
        Ok::<_, AppError>(taken)
    })
    .await?;

    let model = insert_code(&state.orm, user.user_id, code).await?;

    tracing::info!(user_id = %user.user_id, code = %model.code, "referral code issued");
    Ok(ApiResponse::success(
        "Referral code created",
        code_from_entity(model),
        Some(Meta::empty()),
    ))
}

pub async fn get_my_summary(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ReferralSummary>> {
    let code = ReferralCodes::find()
        .filter(CodeCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .map(code_from_entity);

    let rows = ReferralTransactions::find()
        .select_only()
        .column(TxCol::Status)
        .column(TxCol::CommissionAmount)
        .filter(TxCol::ReferrerId.eq(user.user_id))
        .into_tuple::<(String, i64)>()
        .all(&state.orm)
        .await?;

    let mut summary = ReferralSummary {
        code,
        pending_commission: 0,
        paid_commission: 0,
        transaction_count: rows.len() as i64,
    };
    for (status, amount) in rows {
        match status.parse::<ReferralStatus>()? {
            ReferralStatus::Pending => summary.pending_commission += amount,
            ReferralStatus::Paid => summary.paid_commission += amount,
            ReferralStatus::Cancelled => {}
        }
    }

    Ok(ApiResponse::success("Referral summary", summary, None))
}

pub async fn list_my_transactions(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: ReferralTransactionQuery,
) -> AppResult<ApiResponse<ReferralTransactionList>> {
    list_transactions_for(state, Some(user.user_id), pagination, query).await
}

/// Checks a code the way checkout will, so the cart page can show it early.
pub async fn validate_code(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: ValidateCodeRequest,
) -> AppResult<ApiResponse<ValidateCodeResponse>> {
    let model = resolve_code(&state.orm, &payload.code, user.map(|u| u.user_id)).await?;
    let rate =
        settings_service::commission_rate(&state.orm, &state.config.default_commission_rate)
            .await?;
    Ok(ApiResponse::success(
        "Referral code is valid",
        ValidateCodeResponse {
            code: model.code,
            valid: true,
            commission_rate: rate.normalize().to_string(),
        },
        None,
    ))
}

pub async fn list_codes(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReferralCodeList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = ReferralCodes::find().order_by_desc(CodeCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(code_from_entity)
        .collect();
    Ok(ApiResponse::paged(
        "Referral codes",
        ReferralCodeList { items },
        page,
        limit,
        total,
    ))
}

pub async fn set_code_active(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetCodeActiveRequest,
) -> AppResult<ApiResponse<ReferralCode>> {
    ensure_admin(user)?;
    let model = ReferralCodes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut active: referral_codes::ActiveModel = model.into();
    active.is_active = Set(payload.is_active);
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        if payload.is_active {
            "referral_code_activate"
        } else {
            "referral_code_deactivate"
        },
        "referral_codes",
        Some(id),
        serde_json::json!({ "code": updated.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Referral code updated",
        code_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_transactions(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: ReferralTransactionQuery,
) -> AppResult<ApiResponse<ReferralTransactionList>> {
    ensure_admin(user)?;
    list_transactions_for(state, None, pagination, query).await
}

async fn list_transactions_for(
    state: &AppState,
    referrer: Option<Uuid>,
    pagination: Pagination,
    query: ReferralTransactionQuery,
) -> AppResult<ApiResponse<ReferralTransactionList>> {
    let (page, limit, offset) = pagination.normalize();
    let mut finder = ReferralTransactions::find().order_by_desc(TxCol::CreatedAt);
    if let Some(referrer) = referrer {
        finder = finder.filter(TxCol::ReferrerId.eq(referrer));
    }
    if let Some(status) = query.status {
        finder = finder.filter(TxCol::Status.eq(status.as_str()));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(transaction_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::paged(
        "Referral transactions",
        ReferralTransactionList { items },
        page,
        limit,
        total,
    ))
}

/// Inserts a new active code. Losing a race on either unique column is a 409.
pub(crate) async fn insert_code<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    code: String,
) -> AppResult<referral_codes::Model> {
    referral_codes::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        code: Set(code),
        is_active: Set(true),
        total_uses: Set(0),
        total_commission: Set(0),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("referral code collision, try again".into())
        }
        _ => err.into(),
    })
}

/// Looks up an active code usable by `buyer`. Owners cannot use their own code.
pub(crate) async fn resolve_code<C: ConnectionTrait>(
    conn: &C,
    raw: &str,
    buyer: Option<Uuid>,
) -> AppResult<referral_codes::Model> {
    let code = referral_code::normalize(raw);
    if code.is_empty() {
        return Err(AppError::BadRequest("referral code is required".into()));
    }
    let model = ReferralCodes::find()
        .filter(CodeCol::Code.eq(code.as_str()))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("referral code '{code}' not found")))?;
    if !model.is_active {
        return Err(AppError::BadRequest(format!(
            "referral code '{code}' is inactive"
        )));
    }
    ensure_not_self(&model, buyer)?;
    Ok(model)
}

pub(crate) fn ensure_not_self(code: &referral_codes::Model, buyer: Option<Uuid>) -> AppResult<()> {
    if buyer == Some(code.user_id) {
        return Err(AppError::BadRequest(
            "you cannot use your own referral code".into(),
        ));
    }
    Ok(())
}

/// Inserts the pending commission for a new order.
pub(crate) async fn record_transaction<C: ConnectionTrait>(
    conn: &C,
    code: &referral_codes::Model,
    buyer: Option<Uuid>,
    order_id: Uuid,
    order_total: i64,
    rate: Decimal,
) -> AppResult<referral_transactions::Model> {
    ensure_not_self(code, buyer)?;
    let model = referral_transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        referrer_id: Set(code.user_id),
        referred_user_id: Set(buyer),
        code: Set(code.code.clone()),
        order_id: Set(order_id),
        commission_amount: Set(pricing::commission_for(order_total, rate)),
        order_total: Set(order_total),
        status: Set(ReferralStatus::Pending.as_str().to_string()),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(model)
}

/// Moves the order's pending transaction to `outcome`. Paid commissions are
/// added to the code's counters; anything already settled is left alone.
pub(crate) async fn settle_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    outcome: ReferralStatus,
) -> AppResult<Option<ReferralTransaction>> {
    let Some(model) = ReferralTransactions::find()
        .filter(TxCol::OrderId.eq(order_id))
        .lock(LockType::Update)
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    if model.status != ReferralStatus::Pending.as_str() {
        return transaction_from_entity(model).map(Some);
    }

    let code = model.code.clone();
    let commission = model.commission_amount;
    let mut active: referral_transactions::ActiveModel = model.into();
    active.status = Set(outcome.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(conn).await?;

    if outcome == ReferralStatus::Paid {
        increment_stats(conn, &code, commission).await?;
    }

    transaction_from_entity(updated).map(Some)
}

/// Puts a commission cancelled by order deletion back to `pending`.
pub(crate) async fn reopen_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<()> {
    ReferralTransactions::update_many()
        .col_expr(TxCol::Status, Expr::value(ReferralStatus::Pending.as_str()))
        .col_expr(TxCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(TxCol::OrderId.eq(order_id))
        .filter(TxCol::Status.eq(ReferralStatus::Cancelled.as_str()))
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) async fn find_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Option<ReferralTransaction>> {
    ReferralTransactions::find()
        .filter(TxCol::OrderId.eq(order_id))
        .one(conn)
        .await?
        .map(transaction_from_entity)
        .transpose()
}

/// Bumps `total_uses` by one and `total_commission` by `commission` in one statement.
pub(crate) async fn increment_stats<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    commission: i64,
) -> AppResult<()> {
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT increment_referral_stats($1, $2)",
        [DbValue::from(code), DbValue::from(commission)],
    ))
    .await?;
    Ok(())
}

pub(crate) fn transaction_from_entity(
    model: referral_transactions::Model,
) -> AppResult<ReferralTransaction> {
    Ok(ReferralTransaction {
        id: model.id,
        referrer_id: model.referrer_id,
        referred_user_id: model.referred_user_id,
        code: model.code,
        order_id: model.order_id,
        commission_amount: model.commission_amount,
        order_total: model.order_total,
        status: model.status.parse()?,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn code_from_entity(model: referral_codes::Model) -> ReferralCode {
    ReferralCode {
        id: model.id,
        user_id: model.user_id,
        code: model.code,
        is_active: model.is_active,
        total_uses: model.total_uses,
        total_commission: model.total_commission,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
