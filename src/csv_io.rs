//! CSV import/export for the back-office.
//!
//! Exports start with a UTF-8 byte order mark so spreadsheet tools pick the
//! right encoding. Text fields are always quoted; yen amounts and counts are
//! written bare.

use std::io::Cursor;

use csv::{QuoteStyle, StringRecord, Trim, WriterBuilder};

use crate::{
    dto::products::{CreateProductRequest, VariantInput},
    error::{AppError, AppResult},
    models::{Order, Product, ProductStatus},
};

pub const UTF8_BOM: &str = "\u{feff}";

pub const PRODUCT_HEADERS: [&str; 9] = [
    "id",
    "name",
    "description",
    "category",
    "price",
    "stock",
    "status",
    "image_url",
    "variants",
];

pub const ORDER_HEADERS: [&str; 9] = [
    "id",
    "created_at",
    "customer_name",
    "phone",
    "address",
    "items",
    "total_price",
    "status",
    "referral_code",
];

fn finish(writer: csv::Writer<Vec<u8>>) -> AppResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::Internal(anyhow::anyhow!(err.to_string())))?;
    let body = String::from_utf8(bytes).map_err(|err| AppError::Internal(err.into()))?;
    Ok(format!("{UTF8_BOM}{body}"))
}

fn writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new())
}

/// `name:delta:stock` entries joined with `|`.
fn format_variants(product: &Product) -> String {
    product
        .variants
        .iter()
        .map(|v| format!("{}:{}:{}", v.name, v.price_delta, v.stock))
        .collect::<Vec<_>>()
        .join("|")
}

fn parse_variants(raw: &str, row: usize) -> AppResult<Vec<VariantInput>> {
    raw.split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| -> AppResult<VariantInput> {
            let mut fields = part.rsplitn(3, ':');
            let stock = fields.next();
            let delta = fields.next();
            let name = fields.next();
            match (name, delta, stock) {
                (Some(name), Some(delta), Some(stock)) if !name.trim().is_empty() => {
                    Ok(VariantInput {
                        name: name.trim().to_string(),
                        price_delta: parse_number(delta, "variant price delta", row)?,
                        stock: parse_number(stock, "variant stock", row)?,
                    })
                }
                _ => Err(AppError::BadRequest(format!(
                    "row {row}: variant '{part}' must look like name:delta:stock"
                ))),
            }
        })
        .collect()
}

fn parse_number<T: std::str::FromStr>(raw: &str, field: &str, row: usize) -> AppResult<T> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '¥' | ' '))
        .collect();
    cleaned
        .parse::<T>()
        .map_err(|_| AppError::BadRequest(format!("row {row}: invalid {field} '{}'", raw.trim())))
}

pub fn export_products(products: &[Product]) -> AppResult<String> {
    let mut writer = writer();
    writer.write_record(PRODUCT_HEADERS)?;
    for product in products {
        writer.write_record([
            product.id.to_string(),
            product.name.clone(),
            product.description.clone().unwrap_or_default(),
            product.category.clone(),
            product.price.to_string(),
            product.stock.to_string(),
            product.status.as_str().to_string(),
            product.image_url.clone().unwrap_or_default(),
            format_variants(product),
        ])?;
    }
    finish(writer)
}

pub fn export_orders(orders: &[Order]) -> AppResult<String> {
    let mut writer = writer();
    writer.write_record(ORDER_HEADERS)?;
    for order in orders {
        let items = order
            .items
            .iter()
            .map(|line| match &line.variant_name {
                Some(variant) => format!("{} ({}) x{}", line.name, variant, line.quantity),
                None => format!("{} x{}", line.name, line.quantity),
            })
            .collect::<Vec<_>>()
            .join("; ");
        writer.write_record([
            order.id.to_string(),
            order.created_at.to_rfc3339(),
            order.customer_info.name.clone(),
            order.customer_info.phone.clone(),
            order.customer_info.address.clone(),
            items,
            order.total_price.to_string(),
            order.status.as_str().to_string(),
            order.referral_code.clone().unwrap_or_default(),
        ])?;
    }
    finish(writer)
}

struct ProductColumns {
    name: usize,
    price: usize,
    description: Option<usize>,
    category: Option<usize>,
    stock: Option<usize>,
    status: Option<usize>,
    image_url: Option<usize>,
    variants: Option<usize>,
}

fn locate(headers: &StringRecord, expected: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(expected))
}

fn field<'r>(record: &'r StringRecord, index: Option<usize>) -> Option<&'r str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Parses an uploaded product sheet. `name` and `price` columns are required;
/// row numbers in errors count the header as row 1.
pub fn parse_products(bytes: &[u8]) -> AppResult<Vec<CreateProductRequest>> {
    let bytes = bytes.strip_prefix(UTF8_BOM.as_bytes()).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(Cursor::new(bytes));

    let headers = reader.headers()?.clone();
    let (Some(name), Some(price)) = (locate(&headers, "name"), locate(&headers, "price")) else {
        return Err(AppError::BadRequest(
            "CSV must contain 'name' and 'price' columns".into(),
        ));
    };
    let columns = ProductColumns {
        name,
        price,
        description: locate(&headers, "description"),
        category: locate(&headers, "category"),
        stock: locate(&headers, "stock"),
        status: locate(&headers, "status"),
        image_url: locate(&headers, "image_url"),
        variants: locate(&headers, "variants"),
    };

    let mut products = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row = index + 2;
        let record = record?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        let name = field(&record, Some(columns.name))
            .ok_or_else(|| AppError::BadRequest(format!("row {row}: name is required")))?;
        let price_raw = field(&record, Some(columns.price))
            .ok_or_else(|| AppError::BadRequest(format!("row {row}: price is required")))?;
        let price: i64 = parse_number(price_raw, "price", row)?;
        let stock = field(&record, columns.stock)
            .map(|raw| parse_number::<i32>(raw, "stock", row))
            .transpose()?
            .unwrap_or(0);
        let status = field(&record, columns.status)
            .map(|raw| {
                raw.parse::<ProductStatus>()
                    .map_err(|_| AppError::BadRequest(format!("row {row}: invalid status '{raw}'")))
            })
            .transpose()?;
        let variants = field(&record, columns.variants)
            .map(|raw| parse_variants(raw, row))
            .transpose()?
            .unwrap_or_default();

        products.push(CreateProductRequest {
            name: name.to_string(),
            description: field(&record, columns.description).map(str::to_string),
            price,
            category: field(&record, columns.category).map(str::to_string),
            image_url: field(&record, columns.image_url).map(str::to_string),
            stock,
            status,
            variants,
        });
    }

    if products.is_empty() {
        return Err(AppError::BadRequest("CSV contains no products".into()));
    }
    Ok(products)
}
