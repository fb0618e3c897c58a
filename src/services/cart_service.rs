use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    cart::{Cart, CartItem, MAX_LINE_QUANTITY},
    dto::cart::{CartQuote, QuoteLine, QuoteRequest},
    entity::products::{Column, Entity as Products},
    error::{AppError, AppResult},
    models::{Product, ProductStatus},
    pricing,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

/// Reprices a client-held cart against the catalog without reserving anything.
pub async fn quote(state: &AppState, payload: QuoteRequest) -> AppResult<ApiResponse<CartQuote>> {
    let cart = cart_from_items(payload.items)?;
    let ids: Vec<Uuid> = cart.items().iter().map(|item| item.product_id).collect();

    let models = if ids.is_empty() {
        Vec::new()
    } else {
        Products::find()
            .filter(Column::Id.is_in(ids))
            .all(&state.orm)
            .await?
    };
    let products: HashMap<Uuid, Product> = product_service::with_variants(&state.orm, models)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    Ok(ApiResponse::success(
        "Cart quote",
        build_quote(&cart, &products),
        None,
    ))
}

/// Folds client rows into a [`Cart`], rejecting quantities outside
/// `1..=MAX_LINE_QUANTITY` both per row and after duplicate rows merge.
pub(crate) fn cart_from_items(items: Vec<CartItem>) -> AppResult<Cart> {
    check_quantities(&items)?;
    let cart = Cart::from_items(items);
    check_quantities(cart.items())?;
    Ok(cart)
}

fn check_quantities(items: &[CartItem]) -> AppResult<()> {
    match items
        .iter()
        .find(|item| !(1..=MAX_LINE_QUANTITY).contains(&item.quantity))
    {
        Some(item) => Err(AppError::BadRequest(format!(
            "Quantity of '{}' must be between 1 and {MAX_LINE_QUANTITY}",
            item.key
        ))),
        None => Ok(()),
    }
}

pub(crate) fn build_quote(cart: &Cart, products: &HashMap<Uuid, Product>) -> CartQuote {
    let lines: Vec<QuoteLine> = cart
        .items()
        .iter()
        .map(|item| quote_line(item, products.get(&item.product_id)))
        .collect();

    let item_count = lines
        .iter()
        .filter(|line| line.available)
        .map(|line| i64::from(line.quantity))
        .sum();
    let total = lines
        .iter()
        .filter(|line| line.available)
        .fold(0i64, |acc, line| acc.saturating_add(line.subtotal));
    let checkout_ready = !lines.is_empty() && lines.iter().all(|line| line.available);

    CartQuote {
        lines,
        item_count,
        total,
        checkout_ready,
    }
}

fn quote_line(item: &CartItem, product: Option<&Product>) -> QuoteLine {
    let mut line = QuoteLine {
        key: item.key.clone(),
        product_id: item.product_id,
        variant_name: item.variant_name.clone(),
        name: item.name.clone(),
        unit_price: item.price,
        quantity: item.quantity,
        subtotal: 0,
        available_stock: 0,
        available: false,
        warning: None,
    };

    let Some(product) = product else {
        line.warning = Some("Product is no longer available".into());
        return line;
    };
    line.name = product.name.clone();

    let (unit_price, stock) = match item.variant_name.as_deref() {
        Some(variant_name) => match product.variant(variant_name) {
            Some(variant) => (
                pricing::variant_price(product.price, variant.price_delta),
                variant.stock,
            ),
            None => {
                line.warning = Some(format!("Variant '{variant_name}' is not available"));
                return line;
            }
        },
        None => (product.price, product.stock),
    };

    line.unit_price = unit_price;
    line.available_stock = stock;
    let Some(subtotal) = unit_price.checked_mul(i64::from(item.quantity)) else {
        line.warning = Some("Line total is too large".into());
        return line;
    };
    line.subtotal = subtotal;

    line.warning = if product.status == ProductStatus::Inactive {
        Some("Product is no longer available".into())
    } else if stock <= 0 {
        Some("Out of stock".into())
    } else if stock < item.quantity {
        Some(format!("Only {stock} left in stock"))
    } else {
        None
    };
    line.available = line.warning.is_none();
    line
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::ProductVariant;

    fn product(price: i64, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Kecap Manis".into(),
            description: None,
            price,
            category: "bumbu".into(),
            image_url: None,
            stock,
            status: ProductStatus::for_stock(stock),
            variants: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<Uuid, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn quote_uses_catalog_prices_not_client_prices() {
        let kecap = product(620, 10);
        let cart = Cart::from_items([CartItem::new(kecap.id, "stale", 1, 3)]);
        let quote = build_quote(&cart, &catalog(vec![kecap]));

        assert_eq!(quote.lines[0].unit_price, 620);
        assert_eq!(quote.lines[0].name, "Kecap Manis");
        assert_eq!(quote.total, 1_860);
        assert_eq!(quote.item_count, 3);
        assert!(quote.checkout_ready);
    }

    #[test]
    fn variant_lines_add_the_price_delta() {
        let mut sambal = product(480, 0);
        sambal.status = ProductStatus::Active;
        sambal.variants = vec![ProductVariant {
            id: Uuid::new_v4(),
            product_id: sambal.id,
            name: "Extra Pedas".into(),
            price_delta: 40,
            stock: 5,
        }];
        let cart = Cart::from_items([
            CartItem::new(sambal.id, "Sambal", 480, 1).with_variant("extra pedas"),
            CartItem::new(sambal.id, "Sambal", 480, 1).with_variant("extra-pedas"),
        ]);
        let quote = build_quote(&cart, &catalog(vec![sambal]));

        assert_eq!(quote.lines.len(), 1);
        assert!(quote.lines[0].available);
        assert_eq!(quote.lines[0].variant_name.as_deref(), Some("extra pedas"));
        assert_eq!(quote.lines[0].unit_price, 520);
        assert_eq!(quote.total, 1_040);
    }

    #[test]
    fn short_stock_and_missing_products_block_checkout() {
        let tempe = product(300, 1);
        let cart = Cart::from_items([
            CartItem::new(tempe.id, "Tempe", 300, 2),
            CartItem::new(Uuid::new_v4(), "Gone", 100, 1),
        ]);
        let quote = build_quote(&cart, &catalog(vec![tempe]));

        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.lines[0].warning.as_deref(), Some("Only 1 left in stock"));
        assert!(!quote.lines[1].available);
        assert_eq!(quote.total, 0);
        assert!(!quote.checkout_ready);
    }

    #[test]
    fn empty_cart_is_not_ready() {
        let quote = build_quote(&Cart::new(), &HashMap::new());
        assert!(quote.lines.is_empty());
        assert!(!quote.checkout_ready);
    }

    #[test]
    fn client_price_never_feeds_the_quote() {
        let gone = Cart::from_items([CartItem::new(Uuid::new_v4(), "x", i64::MAX, 2)]);
        let quote = build_quote(&gone, &HashMap::new());
        assert_eq!(quote.lines[0].subtotal, 0);
        assert_eq!(quote.total, 0);

        let kecap = product(620, 10);
        let cart = Cart::from_items([CartItem::new(kecap.id, "x", i64::MAX, 2)]);
        let quote = build_quote(&cart, &catalog(vec![kecap]));
        assert_eq!(quote.lines[0].subtotal, 1_240);
    }

    #[test]
    fn overflowing_catalog_line_is_flagged() {
        let gold = product(i64::MAX / 2, 10);
        let cart = Cart::from_items([CartItem::new(gold.id, "Emas", 1, 3)]);
        let quote = build_quote(&cart, &catalog(vec![gold]));
        assert!(!quote.lines[0].available);
        assert_eq!(quote.lines[0].warning.as_deref(), Some("Line total is too large"));
    }

    #[test]
    fn quantities_outside_the_line_limit_are_rejected() {
        let id = Uuid::new_v4();
        for quantity in [0, -1, MAX_LINE_QUANTITY + 1, i32::MAX] {
            let err = cart_from_items(vec![CartItem::new(id, "Tempe", 300, quantity)]).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "quantity {quantity}");
        }

        let half = MAX_LINE_QUANTITY / 2 + 1;
        let merged = vec![
            CartItem::new(id, "Tempe", 300, half),
            CartItem::new(id, "Tempe", 300, half),
        ];
        assert!(matches!(
            cart_from_items(merged).unwrap_err(),
            AppError::BadRequest(_)
        ));

        let cart = cart_from_items(vec![CartItem::new(id, "Tempe", 300, MAX_LINE_QUANTITY)]).unwrap();
        assert_eq!(cart.items()[0].quantity, MAX_LINE_QUANTITY);
    }
}
