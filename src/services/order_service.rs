use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    cart::slugify,
    dto::orders::{CheckoutRequest, CheckoutResponse, OrderList, OrderWithReferral},
    entity::{
        orders::{self, Column as OrderCol, Entity as Orders},
        orders_tracking::{self, Entity as OrdersTracking},
        products::{self, Column as ProdCol, Entity as Products},
        variant_options::{self, Column as VariantCol, Entity as VariantOptions},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CustomerInfo, Order, OrderLine, OrderStatus, OrderTracking, ProductStatus},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    services::{cart_service, referral_service, settings_service},
    state::AppState,
    whatsapp,
};

/// Places an order from a client-held cart.
///
/// Products and variants are locked for the whole transaction, so two
/// checkouts racing for the last unit cannot both succeed. Prices come from
/// the catalog, never from the cart.
pub async fn checkout(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let customer = validate_customer(payload.customer)?;
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    let cart = cart_service::cart_from_items(payload.items)?;
    let buyer = user.map(|u| u.user_id);

    let txn = state.orm.begin().await?;

    let referral = match payload
        .referral_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        Some(raw) => Some(referral_service::resolve_code(&txn, raw, buyer).await?),
        None => None,
    };

    let product_ids: Vec<Uuid> = cart.items().iter().map(|item| item.product_id).collect();
    let products: HashMap<Uuid, products::Model> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids.clone()))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|model| (model.id, model))
        .collect();
    let mut variants: HashMap<Uuid, Vec<variant_options::Model>> = HashMap::new();
    for variant in VariantOptions::find()
        .filter(VariantCol::ProductId.is_in(product_ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?
    {
        variants.entry(variant.product_id).or_default().push(variant);
    }

    let mut lines = Vec::with_capacity(cart.items().len());
    let mut total_price: i64 = 0;
    let mut product_taken: HashMap<Uuid, i32> = HashMap::new();
    let mut variant_taken: HashMap<Uuid, (variant_options::Model, i32)> = HashMap::new();

    for item in cart.items() {
        let product = products.get(&item.product_id).ok_or_else(|| {
            AppError::BadRequest(format!("Product {} not found", item.product_id))
        })?;
        if product.status == ProductStatus::Inactive.as_str() {
            return Err(AppError::BadRequest(format!(
                "{} is no longer available",
                product.name
            )));
        }

        let (unit_price, variant) = match item.variant_name.as_deref() {
            Some(variant_name) => {
                let wanted = slugify(variant_name);
                let variant = variants
                    .get(&product.id)
                    .and_then(|list| list.iter().find(|v| slugify(&v.name) == wanted))
                    .ok_or_else(|| {
                        AppError::BadRequest(format!(
                            "Variant '{}' of {} not found",
                            variant_name, product.name
                        ))
                    })?;
                let entry = variant_taken
                    .entry(variant.id)
                    .or_insert_with(|| (variant.clone(), 0));
                entry.1 += item.quantity;
                if variant.stock < entry.1 {
                    return Err(AppError::BadRequest(format!(
                        "Insufficient stock for {} ({})",
                        product.name, variant.name
                    )));
                }
                (
                    pricing::variant_price(product.price, variant.price_delta),
                    Some(variant),
                )
            }
            None => {
                let taken = product_taken.entry(product.id).or_insert(0);
                *taken += item.quantity;
                if product.stock < *taken {
                    return Err(AppError::BadRequest(format!(
                        "Insufficient stock for {}",
                        product.name
                    )));
                }
                (product.price, None)
            }
        };

        let subtotal = unit_price
            .checked_mul(i64::from(item.quantity))
            .ok_or_else(|| {
                AppError::BadRequest(format!("Line total for {} is too large", product.name))
            })?;
        total_price = total_price
            .checked_add(subtotal)
            .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;
        lines.push(OrderLine {
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
            name: product.name.clone(),
            variant_name: variant.map(|v| v.name.clone()),
            image_url: product.image_url.clone(),
            unit_price,
            quantity: item.quantity,
            subtotal,
        });
    }

    for (product_id, taken) in product_taken {
        let Some(model) = products.get(&product_id).cloned() else {
            continue;
        };
        let remaining = model.stock - taken;
        let mut active: products::ActiveModel = model.into();
        active.stock = Set(remaining);
        if remaining == 0 {
            active.status = Set(ProductStatus::OutOfStock.as_str().to_string());
        }
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
    }

    for (_, (model, taken)) in variant_taken {
        let remaining = model.stock - taken;
        let mut active: variant_options::ActiveModel = model.into();
        active.stock = Set(remaining);
        active.update(&txn).await?;
    }

    let order_id = Uuid::new_v4();
    let order_model = orders::ActiveModel {
        id: Set(order_id),
        user_id: Set(buyer),
        customer_info: Set(serde_json::to_value(&customer)?),
        items: Set(serde_json::to_value(&lines)?),
        total_price: Set(total_price),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        referral_code: Set(referral.as_ref().map(|code| code.code.clone())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    if let Some(user_id) = buyer {
        insert_tracking(&txn, order_id, user_id, total_price, OrderStatus::Pending).await?;
    }

    let referral = match &referral {
        Some(code) => {
            let rate =
                settings_service::commission_rate(&txn, &state.config.default_commission_rate)
                    .await?;
            let model =
                referral_service::record_transaction(&txn, code, buyer, order_id, total_price, rate)
                    .await?;
            Some(referral_service::transaction_from_entity(model)?)
        }
        None => None,
    };

    txn.commit().await?;

    let order = order_from_entity(order_model)?;
    let whatsapp_url = whatsapp::order_link(&state.config.whatsapp_number, &order);

    tracing::info!(
        order_id = %order.id,
        total = order.total_price,
        lines = order.items.len(),
        referral = ?order.referral_code,
        guest = buyer.is_none(),
        "order placed"
    );

    Ok(ApiResponse::success(
        "Checkout success",
        CheckoutResponse {
            order,
            referral,
            whatsapp_url,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    list_orders_where(
        state,
        Condition::all().add(OrderCol::UserId.eq(user.user_id)),
        pagination,
        query,
    )
    .await
}

pub async fn get_my_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithReferral>> {
    let model = Orders::find_by_id(id)
        .filter(OrderCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let referral = referral_service::find_for_order(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Order",
        OrderWithReferral {
            order: order_from_entity(model)?,
            referral,
        },
        None,
    ))
}

/// Shared by the customer history and the admin listing.
pub(crate) async fn list_orders_where(
    state: &AppState,
    mut condition: Condition,
    pagination: Pagination,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::paged("Orders", OrderList { items }, page, limit, total))
}

/// Re-inserts an order captured by the recycle bin along with its tracking row.
pub(crate) async fn restore_order<C: ConnectionTrait>(conn: &C, order: Order) -> AppResult<()> {
    if Orders::find_by_id(order.id).one(conn).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "order {} already exists",
            order.id
        )));
    }

    orders::ActiveModel {
        id: Set(order.id),
        user_id: Set(order.user_id),
        customer_info: Set(serde_json::to_value(&order.customer_info)?),
        items: Set(serde_json::to_value(&order.items)?),
        total_price: Set(order.total_price),
        status: Set(order.status.as_str().to_string()),
        referral_code: Set(order.referral_code.clone()),
        created_at: Set(order.created_at.into()),
        updated_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    if let Some(user_id) = order.user_id {
        insert_tracking(conn, order.id, user_id, order.total_price, order.status).await?;
    }
    if order.status == OrderStatus::Pending {
        referral_service::reopen_for_order(conn, order.id).await?;
    }
    Ok(())
}

async fn insert_tracking<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    user_id: Uuid,
    total_price: i64,
    status: OrderStatus,
) -> AppResult<orders_tracking::Model> {
    let model = orders_tracking::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        user_id: Set(user_id),
        total_price: Set(total_price),
        status: Set(status.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(model)
}

fn validate_customer(customer: CustomerInfo) -> AppResult<CustomerInfo> {
    let name = customer.name.trim().to_string();
    let phone = customer.phone.trim().to_string();
    let address = customer.address.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Customer name is required".into()));
    }
    if phone.is_empty() {
        return Err(AppError::BadRequest("Customer phone is required".into()));
    }
    if address.is_empty() {
        return Err(AppError::BadRequest("Delivery address is required".into()));
    }
    Ok(CustomerInfo {
        name,
        phone,
        address,
        notes: customer
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}

pub(crate) fn order_from_entity(model: orders::Model) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        customer_info: serde_json::from_value(model.customer_info)?,
        items: serde_json::from_value(model.items)?,
        total_price: model.total_price,
        status: model.status.parse()?,
        referral_code: model.referral_code,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn tracking_from_entity(model: orders_tracking::Model) -> AppResult<OrderTracking> {
    Ok(OrderTracking {
        id: model.id,
        order_id: model.order_id,
        user_id: model.user_id,
        total_price: model.total_price,
        status: model.status.parse()?,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(name: &str, phone: &str, address: &str, notes: Option<&str>) -> CustomerInfo {
        CustomerInfo {
            name: name.into(),
            phone: phone.into(),
            address: address.into(),
            notes: notes.map(str::to_string),
        }
    }

    #[test]
    fn customer_fields_are_trimmed() {
        let info = validate_customer(customer(" Budi ", " 080 ", " Osaka ", Some("   "))).unwrap();
        assert_eq!(info.name, "Budi");
        assert_eq!(info.phone, "080");
        assert_eq!(info.address, "Osaka");
        assert_eq!(info.notes, None);
    }

    #[test]
    fn customer_requires_name_phone_and_address() {
        assert!(validate_customer(customer("", "080", "Osaka", None)).is_err());
        assert!(validate_customer(customer("Budi", " ", "Osaka", None)).is_err());
        assert!(validate_customer(customer("Budi", "080", "", None)).is_err());
    }

    #[test]
    fn stored_order_rows_decode() {
        let lines = vec![OrderLine {
            product_id: Uuid::new_v4(),
            variant_id: None,
            name: "Tempe".into(),
            variant_name: None,
            image_url: None,
            unit_price: 300,
            quantity: 2,
            subtotal: 600,
        }];
        let model = orders::Model {
            id: Uuid::new_v4(),
            user_id: None,
            customer_info: serde_json::to_value(customer("Budi", "080", "Osaka", None)).unwrap(),
            items: serde_json::to_value(&lines).unwrap(),
            total_price: 600,
            status: "pending".into(),
            referral_code: Some("AB12CD34".into()),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let order = order_from_entity(model).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items, lines);
        assert_eq!(order.customer_info.name, "Budi");
    }
}
