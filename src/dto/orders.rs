use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    cart::CartItem,
    models::{CustomerInfo, Order, OrderTracking, ReferralTransaction},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub customer: CustomerInfo,
    pub items: Vec<CartItem>,
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
    pub referral: Option<ReferralTransaction>,
    pub whatsapp_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithReferral {
    pub order: Order,
    pub referral: Option<ReferralTransaction>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingList {
    pub items: Vec<OrderTracking>,
}
