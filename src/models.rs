use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{cart::slugify, error::AppError};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CUSTOMER: &str = "customer";

/// Parses the lowercase status strings stored in the database.
macro_rules! status_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::BadRequest(format!(
                        "invalid {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
    OutOfStock,
}

status_enum!(ProductStatus {
    Active => "active",
    Inactive => "inactive",
    OutOfStock => "out_of_stock",
});

impl ProductStatus {
    /// Status a product gets when nobody picked one explicitly.
    pub fn for_stock(stock: i32) -> Self {
        if stock > 0 {
            ProductStatus::Active
        } else {
            ProductStatus::OutOfStock
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

status_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    Paid,
    Cancelled,
}

status_enum!(ReferralStatus {
    Pending => "pending",
    Paid => "paid",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Composed option label, e.g. "Pedas / 5 pcs".
    pub name: String,
    pub price_delta: i64,
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Whole yen.
    pub price: i64,
    pub category: String,
    pub image_url: Option<String>,
    pub stock: i32,
    pub status: ProductStatus,
    pub variants: Vec<ProductVariant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Looks a variant up by slug, the same way cart keys are built.
    pub fn variant(&self, name: &str) -> Option<&ProductVariant> {
        let wanted = slugify(name);
        self.variants.iter().find(|v| slugify(&v.name) == wanted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub notes: Option<String>,
}

/// Snapshot of one purchased line, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub variant_name: Option<String>,
    pub image_url: Option<String>,
    pub unit_price: i64,
    pub quantity: i32,
    pub subtotal: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_info: CustomerInfo,
    pub items: Vec<OrderLine>,
    pub total_price: i64,
    pub status: OrderStatus,
    pub referral_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderTracking {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub is_active: bool,
    pub total_uses: i32,
    pub total_commission: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralTransaction {
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referred_user_id: Option<Uuid>,
    pub code: String,
    pub order_id: Uuid,
    pub commission_amount: i64,
    pub order_total: i64,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppSetting {
    pub key: String,
    pub value: Value,
    pub description: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingsHistory {
    pub id: Uuid,
    pub setting_key: String,
    pub old_value: Option<Value>,
    pub new_value: Value,
    pub note: Option<String>,
    pub changed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecycleBinItem {
    pub id: Uuid,
    pub original_table: String,
    pub original_id: Uuid,
    pub data: Value,
    pub deleted_by: Option<Uuid>,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub target_table: Option<String>,
    pub target_id: Option<Uuid>,
    pub detail: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip_through_database_form() {
        assert_eq!(ProductStatus::OutOfStock.as_str(), "out_of_stock");
        assert_eq!(
            "Out_Of_Stock".parse::<ProductStatus>().unwrap(),
            ProductStatus::OutOfStock
        );
        assert_eq!("paid".parse::<ReferralStatus>().unwrap(), ReferralStatus::Paid);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn default_status_follows_stock() {
        assert_eq!(ProductStatus::for_stock(3), ProductStatus::Active);
        assert_eq!(ProductStatus::for_stock(0), ProductStatus::OutOfStock);
    }

    #[test]
    fn variant_lookup_matches_cart_slugs() {
        let product_id = Uuid::new_v4();
        let product = Product {
            id: product_id,
            name: "Sambal Bawang".into(),
            description: None,
            price: 480,
            category: "bumbu".into(),
            image_url: None,
            stock: 0,
            status: ProductStatus::Active,
            variants: vec![ProductVariant {
                id: Uuid::new_v4(),
                product_id,
                name: "Extra Pedas".into(),
                price_delta: 40,
                stock: 5,
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        for name in ["Extra Pedas", "extra-pedas", " EXTRA  pedas "] {
            assert!(product.variant(name).is_some(), "{name}");
        }
        assert!(product.variant("Original").is_none());
    }
}
