use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Appends one row to `admin_logs`.
pub async fn log_admin_action(
    pool: &DbPool,
    actor_id: Option<Uuid>,
    action: &str,
    target_table: Option<&str>,
    target_id: Option<Uuid>,
    detail: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO admin_logs (id, actor_id, action, target_table, target_id, detail)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(actor_id)
    .bind(action)
    .bind(target_table)
    .bind(target_id)
    .bind(detail)
    .execute(pool)
    .await?;

    Ok(())
}

/// Same as [`log_admin_action`] but a failed write only warns; the admin
/// action it describes has already happened.
pub async fn record(
    pool: &DbPool,
    actor_id: Uuid,
    action: &str,
    target_table: &str,
    target_id: Option<Uuid>,
    detail: Value,
) {
    if let Err(err) = log_admin_action(
        pool,
        Some(actor_id),
        action,
        Some(target_table),
        target_id,
        Some(detail),
    )
    .await
    {
        tracing::warn!(error = %err, action, "admin log failed");
    }
}
