use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    dto::settings::{SettingList, SettingsHistoryList, UpdateSettingRequest},
    entity::{
        app_settings::{self, Column, Entity as AppSettings},
        settings_history::{self, Column as HistoryCol, Entity as SettingsHistoryEntity},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{AppSetting, SettingsHistory},
    pricing::{self, COMMISSION_RATE_KEY},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, SettingsHistoryQuery},
    state::AppState,
};

pub async fn list_settings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SettingList>> {
    ensure_admin(user)?;
    let items = AppSettings::find()
        .order_by_asc(Column::Key)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(setting_from_entity)
        .collect::<Vec<_>>();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Settings",
        SettingList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn get_setting(
    state: &AppState,
    user: &AuthUser,
    key: &str,
) -> AppResult<ApiResponse<AppSetting>> {
    ensure_admin(user)?;
    let model = AppSettings::find_by_id(key.to_string())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Setting", setting_from_entity(model), None))
}

/// Upserts a setting and appends the change to `settings_history` in the same transaction.
pub async fn update_setting(
    state: &AppState,
    user: &AuthUser,
    key: &str,
    payload: UpdateSettingRequest,
) -> AppResult<ApiResponse<AppSetting>> {
    ensure_admin(user)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::BadRequest("setting key is required".into()));
    }
    if key == COMMISSION_RATE_KEY {
        pricing::parse_rate(&payload.value)?;
    }

    let txn = state.orm.begin().await?;
    let existing = AppSettings::find_by_id(key.to_string())
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let old_value = existing.as_ref().map(|m| m.value.clone());

    let saved = match existing {
        Some(model) => {
            let mut active: app_settings::ActiveModel = model.into();
            active.value = Set(payload.value.clone());
            if let Some(description) = payload.description.clone() {
                active.description = Set(Some(description));
            }
            active.updated_by = Set(Some(user.user_id));
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
        None => {
            app_settings::ActiveModel {
                key: Set(key.to_string()),
                value: Set(payload.value.clone()),
                description: Set(payload.description.clone()),
                updated_by: Set(Some(user.user_id)),
                updated_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?
        }
    };

    settings_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        setting_key: Set(key.to_string()),
        old_value: Set(old_value.clone()),
        new_value: Set(payload.value.clone()),
        note: Set(payload.note.clone()),
        changed_by: Set(Some(user.user_id)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(key, "setting updated");
    audit::record(
        &state.pool,
        user.user_id,
        "setting_update",
        "app_settings",
        None,
        serde_json::json!({
            "key": key,
            "old_value": old_value,
            "new_value": payload.value,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Setting saved",
        setting_from_entity(saved),
        Some(Meta::empty()),
    ))
}

pub async fn list_history(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: SettingsHistoryQuery,
) -> AppResult<ApiResponse<SettingsHistoryList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let mut finder = SettingsHistoryEntity::find().order_by_desc(HistoryCol::CreatedAt);
    if let Some(key) = query.key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        finder = finder.filter(HistoryCol::SettingKey.eq(key));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(history_from_entity)
        .collect();

    Ok(ApiResponse::paged(
        "Settings history",
        SettingsHistoryList { items },
        page,
        limit,
        total,
    ))
}

/// Stored `commission_rate`, or `fallback` when no admin has set one.
pub(crate) async fn commission_rate<C: ConnectionTrait>(
    conn: &C,
    fallback: &str,
) -> AppResult<Decimal> {
    match AppSettings::find_by_id(COMMISSION_RATE_KEY.to_string())
        .one(conn)
        .await?
    {
        Some(model) => pricing::parse_rate(&model.value),
        None => pricing::parse_rate(&Value::String(fallback.to_string())),
    }
}

fn setting_from_entity(model: app_settings::Model) -> AppSetting {
    AppSetting {
        key: model.key,
        value: model.value,
        description: model.description,
        updated_by: model.updated_by,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn history_from_entity(model: settings_history::Model) -> SettingsHistory {
    SettingsHistory {
        id: model.id,
        setting_key: model.setting_key,
        old_value: model.old_value,
        new_value: model.new_value,
        note: model.note,
        changed_by: model.changed_by,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
