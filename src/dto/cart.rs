use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::CartItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteLine {
    pub key: String,
    pub product_id: Uuid,
    pub variant_name: Option<String>,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub subtotal: i64,
    pub available_stock: i32,
    /// False when the product is gone, inactive, or short on stock.
    pub available: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartQuote {
    pub lines: Vec<QuoteLine>,
    pub item_count: i64,
    /// Sum over available lines only.
    pub total: i64,
    pub checkout_ready: bool,
}
