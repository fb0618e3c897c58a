use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{AdminLog, RecycleBinItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub pending_orders: i64,
    pub confirmed_orders: i64,
    pub cancelled_orders: i64,
    /// Sum of confirmed order totals, in yen.
    pub confirmed_revenue: i64,
    pub active_products: i64,
    pub low_stock_products: i64,
    pub pending_commission: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLogList {
    pub items: Vec<AdminLog>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecycleBinList {
    pub items: Vec<RecycleBinItem>,
}

/// Answer to a delete that went through the recycle bin.
#[derive(Debug, Serialize, ToSchema)]
pub struct Recycled {
    pub recycle_bin_id: Uuid,
}
