use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ReferralCode, ReferralTransaction};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateCodeResponse {
    pub code: String,
    pub valid: bool,
    /// Current commission percentage, as a decimal string.
    pub commission_rate: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetCodeActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralSummary {
    pub code: Option<ReferralCode>,
    pub pending_commission: i64,
    pub paid_commission: i64,
    pub transaction_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralCodeList {
    pub items: Vec<ReferralCode>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralTransactionList {
    pub items: Vec<ReferralTransaction>,
}
