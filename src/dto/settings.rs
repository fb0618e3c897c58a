use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::{AppSetting, SettingsHistory};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingRequest {
    pub value: Value,
    pub description: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingList {
    pub items: Vec<AppSetting>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsHistoryList {
    pub items: Vec<SettingsHistory>,
}
