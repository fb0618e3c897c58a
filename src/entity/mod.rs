pub mod admin_logs;
pub mod app_settings;
pub mod orders;
pub mod orders_tracking;
pub mod products;
pub mod recycle_bin;
pub mod referral_codes;
pub mod referral_transactions;
pub mod settings_history;
pub mod variant_options;

pub use admin_logs::Entity as AdminLogs;
pub use app_settings::Entity as AppSettings;
pub use orders::Entity as Orders;
pub use orders_tracking::Entity as OrdersTracking;
pub use products::Entity as Products;
pub use recycle_bin::Entity as RecycleBin;
pub use referral_codes::Entity as ReferralCodes;
pub use referral_transactions::Entity as ReferralTransactions;
pub use settings_history::Entity as SettingsHistory;
pub use variant_options::Entity as VariantOptions;
