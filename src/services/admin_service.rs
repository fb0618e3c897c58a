use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    csv_io,
    dto::{
        admin::{AdminLogList, DashboardStats, InventoryAdjustRequest, Recycled},
        orders::{OrderList, OrderWithReferral, TrackingList},
        products::ProductList,
    },
    entity::{
        admin_logs::{self, Column as LogCol, Entity as AdminLogs},
        orders::{self, Column as OrderCol, Entity as Orders},
        orders_tracking::{Column as TrackCol, Entity as OrdersTracking},
        products::{self, Column as ProdCol, Entity as Products},
        referral_transactions::{Column as TxCol, Entity as ReferralTransactions},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{AdminLog, OrderStatus, Product, ProductStatus, ReferralStatus},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery, Pagination},
    services::{order_service, product_service, recycle_bin_service, referral_service},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    order_service::list_orders_where(state, Condition::all(), pagination, query).await
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithReferral>> {
    ensure_admin(user)?;
    let model = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let referral = referral_service::find_for_order(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Order",
        OrderWithReferral {
            order: order_service::order_from_entity(model)?,
            referral,
        },
        None,
    ))
}

/// Confirms a pending order and pays out its referral commission.
pub async fn confirm_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithReferral>> {
    transition_order(state, user, id, OrderStatus::Confirmed).await
}

/// Cancels a pending order. Stock is not put back.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithReferral>> {
    transition_order(state, user, id, OrderStatus::Cancelled).await
}

async fn transition_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    target: OrderStatus,
) -> AppResult<ApiResponse<OrderWithReferral>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let model = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let current: OrderStatus = model.status.parse()?;
    if current != OrderStatus::Pending {
        return Err(AppError::BadRequest(format!(
            "Order is already {current}, only pending orders can be {target}"
        )));
    }

    let mut active: orders::ActiveModel = model.into();
    active.status = Set(target.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    OrdersTracking::update_many()
        .col_expr(TrackCol::Status, Expr::value(target.as_str()))
        .col_expr(TrackCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(TrackCol::OrderId.eq(id))
        .exec(&txn)
        .await?;

    let outcome = match target {
        OrderStatus::Confirmed => ReferralStatus::Paid,
        _ => ReferralStatus::Cancelled,
    };
    let referral = referral_service::settle_for_order(&txn, id, outcome).await?;

    txn.commit().await?;

    tracing::info!(order_id = %id, status = %target, "order status changed");
    audit::record(
        &state.pool,
        user.user_id,
        match target {
            OrderStatus::Confirmed => "order_confirm",
            _ => "order_cancel",
        },
        "orders",
        Some(id),
        serde_json::json!({
            "from": current,
            "to": target,
            "commission": referral.as_ref().map(|r| r.commission_amount),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        OrderWithReferral {
            order: order_service::order_from_entity(updated)?,
            referral,
        },
        Some(Meta::empty()),
    ))
}

/// Moves the order into the recycle bin. A pending commission on it is
/// cancelled; restoring a pending order reopens it.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Recycled>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let model = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let order = order_service::order_from_entity(model)?;
    let bin_item = recycle_bin_service::stash(
        &txn,
        recycle_bin_service::ORDERS_TABLE,
        order.id,
        serde_json::to_value(&order)?,
        Some(user.user_id),
    )
    .await?;
    Orders::delete_by_id(id).exec(&txn).await?;
    let referral =
        referral_service::settle_for_order(&txn, id, ReferralStatus::Cancelled).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_delete",
        "orders",
        Some(id),
        serde_json::json!({
            "total_price": order.total_price,
            "recycle_bin_id": bin_item.id,
            "referral_status": referral.map(|r| r.status),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Moved to recycle bin",
        Recycled {
            recycle_bin_id: bin_item.id,
        },
        Some(Meta::empty()),
    ))
}

pub async fn export_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<String> {
    ensure_admin(user)?;
    let mut finder = Orders::find().order_by_desc(OrderCol::CreatedAt);
    if let Some(status) = query.status {
        finder = finder.filter(OrderCol::Status.eq(status.as_str()));
    }
    let orders = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_service::order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;
    csv_io::export_orders(&orders)
}

pub async fn list_tracking(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<TrackingList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = OrdersTracking::find().order_by_desc(TrackCol::UpdatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_service::tracking_from_entity)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(ApiResponse::paged(
        "Order tracking",
        TrackingList { items },
        page,
        limit,
        total,
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let threshold = query
        .threshold
        .unwrap_or(state.config.low_stock_threshold)
        .max(0);

    let finder = Products::find()
        .filter(low_stock_condition(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_asc(ProdCol::Name);
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = product_service::with_variants(&state.orm, models).await?;

    Ok(ApiResponse::paged(
        "Low stock products",
        ProductList { items },
        page,
        limit,
        total,
    ))
}

/// Adds `delta` (may be negative) to a product's stock. The result must stay non-negative.
pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let model = Products::find_by_id(product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let before = model.stock;
    let after = before
        .checked_add(payload.delta)
        .ok_or_else(|| AppError::BadRequest("Stock adjustment overflows".into()))?;
    if after < 0 {
        return Err(AppError::BadRequest(format!(
            "Stock cannot go below zero (current {before}, delta {})",
            payload.delta
        )));
    }

    let mut active: products::ActiveModel = model.into();
    active.stock = Set(after);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    let product = product_service::fetch_product(&txn, product_id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "inventory_adjust",
        "products",
        Some(product_id),
        serde_json::json!({ "before": before, "after": after, "delta": payload.delta }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn dashboard_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let count_orders = |status: OrderStatus| {
        Orders::find()
            .filter(OrderCol::Status.eq(status.as_str()))
            .count(&state.orm)
    };
    let pending_orders = count_orders(OrderStatus::Pending).await? as i64;
    let confirmed_orders = count_orders(OrderStatus::Confirmed).await? as i64;
    let cancelled_orders = count_orders(OrderStatus::Cancelled).await? as i64;

    let confirmed_revenue = Orders::find()
        .select_only()
        .column_as(
            Expr::cust("COALESCE(SUM(total_price), 0)::BIGINT"),
            "confirmed_revenue",
        )
        .filter(OrderCol::Status.eq(OrderStatus::Confirmed.as_str()))
        .into_tuple::<i64>()
        .one(&state.orm)
        .await?
        .unwrap_or(0);

    let active_products = Products::find()
        .filter(ProdCol::Status.eq(ProductStatus::Active.as_str()))
        .count(&state.orm)
        .await? as i64;
    let low_stock_products = Products::find()
        .filter(low_stock_condition(state.config.low_stock_threshold))
        .count(&state.orm)
        .await? as i64;

    let pending_commission = ReferralTransactions::find()
        .select_only()
        .column_as(
            Expr::cust("COALESCE(SUM(commission_amount), 0)::BIGINT"),
            "pending_commission",
        )
        .filter(TxCol::Status.eq(ReferralStatus::Pending.as_str()))
        .into_tuple::<i64>()
        .one(&state.orm)
        .await?
        .unwrap_or(0);

    Ok(ApiResponse::success(
        "Dashboard",
        DashboardStats {
            pending_orders,
            confirmed_orders,
            cancelled_orders,
            confirmed_revenue,
            active_products,
            low_stock_products,
            pending_commission,
        },
        None,
    ))
}

pub async fn list_admin_logs(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<AdminLogList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = AdminLogs::find().order_by_desc(LogCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(log_from_entity)
        .collect();
    Ok(ApiResponse::paged(
        "Admin logs",
        AdminLogList { items },
        page,
        limit,
        total,
    ))
}

/// Sellable products at or under `threshold` units. Inactive products are ignored.
fn low_stock_condition(threshold: i32) -> Condition {
    Condition::all()
        .add(ProdCol::Stock.lte(threshold))
        .add(ProdCol::Status.ne(ProductStatus::Inactive.as_str()))
}

fn log_from_entity(model: admin_logs::Model) -> AdminLog {
    AdminLog {
        id: model.id,
        actor_id: model.actor_id,
        action: model.action,
        target_table: model.target_table,
        target_id: model.target_id,
        detail: model.detail,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
