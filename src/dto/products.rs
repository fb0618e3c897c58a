use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Product, ProductStatus};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VariantInput {
    pub name: String,
    #[serde(default)]
    pub price_delta: i64,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
    /// Defaults to `active` with stock, `out_of_stock` without.
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
    pub status: Option<ProductStatus>,
    /// Replaces the whole variant list when present.
    pub variants: Option<Vec<VariantInput>>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportResult {
    pub created: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<String>,
}
