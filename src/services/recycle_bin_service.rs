use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    dto::admin::{RecycleBinList, Recycled},
    entity::recycle_bin::{self, Column, Entity as RecycleBin},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, Product, RecycleBinItem},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, RecycleBinQuery},
    services::{order_service, product_service},
    state::AppState,
};

pub const PRODUCTS_TABLE: &str = "products";
pub const ORDERS_TABLE: &str = "orders";

/// Snapshots a row about to be deleted. Runs inside the caller's transaction.
pub(crate) async fn stash<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    original_id: Uuid,
    data: Value,
    deleted_by: Option<Uuid>,
) -> AppResult<recycle_bin::Model> {
    let model = recycle_bin::ActiveModel {
        id: Set(Uuid::new_v4()),
        original_table: Set(table.to_string()),
        original_id: Set(original_id),
        data: Set(data),
        deleted_by: Set(deleted_by),
        deleted_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(model)
}

pub async fn list_items(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: RecycleBinQuery,
) -> AppResult<ApiResponse<RecycleBinList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let mut finder = RecycleBin::find().order_by_desc(Column::DeletedAt);
    if let Some(table) = query.table.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        finder = finder.filter(Column::OriginalTable.eq(table));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(item_from_entity)
        .collect();

    Ok(ApiResponse::paged(
        "Recycle bin",
        RecycleBinList { items },
        page,
        limit,
        total,
    ))
}

/// Puts the snapshot back under its original id and drops the bin entry.
pub async fn restore_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<RecycleBinItem>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let item = RecycleBin::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    match item.original_table.as_str() {
        PRODUCTS_TABLE => {
            let product: Product = serde_json::from_value(item.data.clone())?;
            product_service::restore_product(&txn, product).await?;
        }
        ORDERS_TABLE => {
            let order: Order = serde_json::from_value(item.data.clone())?;
            order_service::restore_order(&txn, order).await?;
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "cannot restore rows of table '{other}'"
            )));
        }
    }

    RecycleBin::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        table = %item.original_table,
        original_id = %item.original_id,
        "restored from recycle bin"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "recycle_bin_restore",
        &item.original_table,
        Some(item.original_id),
        serde_json::json!({ "recycle_bin_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Restored",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn purge_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Recycled>> {
    ensure_admin(user)?;
    let item = RecycleBin::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    RecycleBin::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "recycle_bin_purge",
        &item.original_table,
        Some(item.original_id),
        serde_json::json!({ "recycle_bin_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Permanently deleted",
        Recycled { recycle_bin_id: id },
        Some(Meta::empty()),
    ))
}

fn item_from_entity(model: recycle_bin::Model) -> RecycleBinItem {
    RecycleBinItem {
        id: model.id,
        original_table: model.original_table,
        original_id: model.original_id,
        data: model.data,
        deleted_by: model.deleted_by,
        deleted_at: model.deleted_at.with_timezone(&Utc),
    }
}
