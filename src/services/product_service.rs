use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    cart::slugify,
    csv_io,
    dto::admin::Recycled,
    dto::products::{
        CategoryList, CreateProductRequest, ImportResult, ProductList, UpdateProductRequest,
        VariantInput,
    },
    entity::{
        products::{self, ActiveModel, Column, Entity as Products},
        variant_options::{self, Column as VariantCol, Entity as VariantOptions},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, ProductStatus, ProductVariant},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery, ProductSortBy, SortOrder},
    services::recycle_bin_service,
    state::AppState,
};

pub const DEFAULT_CATEGORY: &str = "lainnya";

pub async fn list_products(
    state: &AppState,
    pagination: Pagination,
    query: ProductQuery,
    include_inactive: bool,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Category.eq(category.clone()));
    }

    match query.status {
        Some(ProductStatus::Inactive) if !include_inactive => {
            return Ok(ApiResponse::paged(
                "Products",
                ProductList { items: Vec::new() },
                page,
                limit,
                0,
            ));
        }
        Some(status) => condition = condition.add(Column::Status.eq(status.as_str())),
        None if !include_inactive => {
            condition = condition.add(Column::Status.ne(ProductStatus::Inactive.as_str()))
        }
        None => {}
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Stock => Column::Stock,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_variants(&state.orm, models).await?;

    Ok(ApiResponse::paged(
        "Products",
        ProductList { items },
        page,
        limit,
        total,
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Products::find()
        .select_only()
        .column(Column::Category)
        .distinct()
        .filter(Column::Status.ne(ProductStatus::Inactive.as_str()))
        .order_by_asc(Column::Category)
        .into_tuple::<String>()
        .all(&state.orm)
        .await?;
    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn get_product(
    state: &AppState,
    id: Uuid,
    include_inactive: bool,
) -> AppResult<ApiResponse<Product>> {
    let product = fetch_product(&state.orm, id).await?;
    if product.status == ProductStatus::Inactive && !include_inactive {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let product = insert_product(&txn, payload).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        Some(product.id),
        serde_json::json!({ "name": product.name, "price": product.price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let existing = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(required_name(&name)?);
    }
    if let Some(description) = payload.description {
        active.description = Set(non_empty(description));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price must not be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(category) = payload.category {
        active.category = Set(normalize_category(Some(category)));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(non_empty(image_url));
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::BadRequest("stock must not be negative".into()));
        }
        active.stock = Set(stock);
    }
    if let Some(status) = payload.status {
        active.status = Set(status.as_str().to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    if let Some(variants) = payload.variants {
        VariantOptions::delete_many()
            .filter(VariantCol::ProductId.eq(id))
            .exec(&txn)
            .await?;
        insert_variants(&txn, id, variants).await?;
    }

    let product = fetch_product(&txn, updated.id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        Some(product.id),
        serde_json::json!({
            "price": product.price,
            "stock": product.stock,
            "status": product.status,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    ))
}

/// Moves the product (with its variants) into the recycle bin.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Recycled>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let product = fetch_product(&txn, id).await?;
    let bin_item = recycle_bin_service::stash(
        &txn,
        recycle_bin_service::PRODUCTS_TABLE,
        product.id,
        serde_json::to_value(&product)?,
        Some(user.user_id),
    )
    .await?;
    Products::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_delete",
        "products",
        Some(id),
        serde_json::json!({ "name": product.name, "recycle_bin_id": bin_item.id }),
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

pub async fn import_products(
    state: &AppState,
    user: &AuthUser,
    bytes: &[u8],
) -> AppResult<ApiResponse<ImportResult>> {
    ensure_admin(user)?;
    let rows = csv_io::parse_products(bytes)?;

    let txn = state.orm.begin().await?;
    let mut created = 0usize;
    for row in rows {
        insert_product(&txn, row).await?;
        created += 1;
    }
    txn.commit().await?;

    tracing::info!(created, "products imported");
    audit::record(
        &state.pool,
        user.user_id,
        "product_import",
        "products",
        None,
        serde_json::json!({ "created": created }),
    )
    .await;

    Ok(ApiResponse::success(
        "Products imported",
        ImportResult { created },
        Some(Meta::empty()),
    ))
}

pub async fn export_products(state: &AppState, user: &AuthUser) -> AppResult<String> {
    ensure_admin(user)?;
    let models = Products::find()
        .order_by_asc(Column::Category)
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?;
    let products = with_variants(&state.orm, models).await?;
    csv_io::export_products(&products)
}

pub(crate) async fn insert_product<C: ConnectionTrait>(
    conn: &C,
    payload: CreateProductRequest,
) -> AppResult<Product> {
    let name = required_name(&payload.name)?;
    if payload.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    let status = payload
        .status
        .unwrap_or_else(|| ProductStatus::for_stock(payload.stock));

    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description.and_then(non_empty)),
        price: Set(payload.price),
        category: Set(normalize_category(payload.category)),
        image_url: Set(payload.image_url.and_then(non_empty)),
        stock: Set(payload.stock),
        status: Set(status.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    let variants = insert_variants(conn, model.id, payload.variants).await?;
    product_from_entity(model, variants)
}

/// Re-inserts a product captured by the recycle bin, keeping its ids and timestamps.
pub(crate) async fn restore_product<C: ConnectionTrait>(conn: &C, product: Product) -> AppResult<()> {
    if Products::find_by_id(product.id).one(conn).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "product {} already exists",
            product.id
        )));
    }

    ActiveModel {
        id: Set(product.id),
        name: Set(product.name),
        description: Set(product.description),
        price: Set(product.price),
        category: Set(product.category),
        image_url: Set(product.image_url),
        stock: Set(product.stock),
        status: Set(product.status.as_str().to_string()),
        created_at: Set(product.created_at.into()),
        updated_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    for variant in product.variants {
        variant_options::ActiveModel {
            id: Set(variant.id),
            product_id: Set(product.id),
            name: Set(variant.name),
            price_delta: Set(variant.price_delta),
            stock: Set(variant.stock),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn insert_variants<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    variants: Vec<VariantInput>,
) -> AppResult<Vec<variant_options::Model>> {
    let mut seen = HashSet::new();
    let mut inserted = Vec::with_capacity(variants.len());
    for variant in variants {
        let name = variant.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("variant name is required".into()));
        }
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(AppError::BadRequest(format!(
                "variant name '{name}' needs a letter or digit"
            )));
        }
        if !seen.insert(slug) {
            return Err(AppError::BadRequest(format!("duplicate variant '{name}'")));
        }
        if variant.stock < 0 {
            return Err(AppError::BadRequest(format!(
                "variant '{name}' stock must not be negative"
            )));
        }
        let model = variant_options::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            name: Set(name),
            price_delta: Set(variant.price_delta),
            stock: Set(variant.stock),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
        inserted.push(model);
    }
    Ok(inserted)
}

pub(crate) async fn fetch_product<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Product> {
    let model = Products::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    let variants = VariantOptions::find()
        .filter(VariantCol::ProductId.eq(id))
        .order_by_asc(VariantCol::Name)
        .all(conn)
        .await?;
    product_from_entity(model, variants)
}

pub(crate) async fn with_variants<C: ConnectionTrait>(
    conn: &C,
    models: Vec<products::Model>,
) -> AppResult<Vec<Product>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut grouped: HashMap<Uuid, Vec<variant_options::Model>> = HashMap::new();
    for variant in VariantOptions::find()
        .filter(VariantCol::ProductId.is_in(ids))
        .order_by_asc(VariantCol::Name)
        .all(conn)
        .await?
    {
        grouped.entry(variant.product_id).or_default().push(variant);
    }

    models
        .into_iter()
        .map(|model| {
            let variants = grouped.remove(&model.id).unwrap_or_default();
            product_from_entity(model, variants)
        })
        .collect()
}

pub(crate) fn product_from_entity(
    model: products::Model,
    variants: Vec<variant_options::Model>,
) -> AppResult<Product> {
    Ok(Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        category: model.category,
        image_url: model.image_url,
        stock: model.stock,
        status: model.status.parse()?,
        variants: variants.into_iter().map(variant_from_entity).collect(),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn variant_from_entity(model: variant_options::Model) -> ProductVariant {
    ProductVariant {
        id: model.id,
        product_id: model.product_id,
        name: model.name,
        price_delta: model.price_delta,
        stock: model.stock,
    }
}

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    Ok(name.to_string())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn normalize_category(category: Option<String>) -> String {
    category
        .and_then(non_empty)
        .map(|c| c.to_lowercase())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_trimmed_and_lowercased() {
        assert_eq!(normalize_category(Some("  Bumbu ".into())), "bumbu");
        assert_eq!(normalize_category(Some("   ".into())), DEFAULT_CATEGORY);
        assert_eq!(normalize_category(None), DEFAULT_CATEGORY);
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(required_name("  ").is_err());
        assert_eq!(required_name(" Tempe ").unwrap(), "Tempe");
    }
}
