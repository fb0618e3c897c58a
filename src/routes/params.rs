use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::{OrderStatus, ProductStatus, ReferralStatus};

/// Highest page number a listing will serve.
pub const MAX_PAGE: i64 = 1_000_000;

/// Extracted as its own `Query<Pagination>` next to the filter struct.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
    Stock,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReferralTransactionQuery {
    pub status: Option<ReferralStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RecycleBinQuery {
    pub table: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SettingsHistoryQuery {
    pub key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        assert_eq!(Pagination::new(3, 10).normalize(), (3, 10, 20));
        assert_eq!(Pagination::new(0, 1_000).normalize(), (1, 100, 0));
    }

    #[test]
    fn huge_page_numbers_are_clamped() {
        assert_eq!(
            Pagination::new(i64::MAX, 100).normalize(),
            (MAX_PAGE, 100, (MAX_PAGE - 1) * 100)
        );
        assert_eq!(Pagination::new(i64::MIN, i64::MIN).normalize(), (1, 1, 0));
    }
}
