use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::CartItem,
    dto::{
        admin::{AdminLogList, DashboardStats, InventoryAdjustRequest, RecycleBinList, Recycled},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{CartQuote, QuoteLine, QuoteRequest},
        orders::{CheckoutRequest, CheckoutResponse, OrderList, OrderWithReferral, TrackingList},
        products::{
            CategoryList, CreateProductRequest, ImportResult, ProductList, UpdateProductRequest,
            VariantInput,
        },
        referrals::{
            ReferralCodeList, ReferralSummary, ReferralTransactionList, SetCodeActiveRequest,
            ValidateCodeRequest, ValidateCodeResponse,
        },
        settings::{SettingList, SettingsHistoryList, UpdateSettingRequest},
    },
    models::{
        AdminLog, AppSetting, CustomerInfo, Order, OrderLine, OrderStatus, OrderTracking, Product,
        ProductStatus, ProductVariant, Profile, RecycleBinItem, ReferralCode, ReferralStatus,
        ReferralTransaction, SettingsHistory,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, health, orders, params, products, recycle_bin, referrals, settings,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        products::list_products,
        products::list_categories,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::import_products,
        products::export_products,
        cart::quote,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        referrals::create_code,
        referrals::my_summary,
        referrals::my_transactions,
        referrals::validate_code,
        admin::dashboard,
        admin::list_all_orders,
        admin::export_orders,
        admin::get_order_admin,
        admin::confirm_order,
        admin::cancel_order,
        admin::delete_order,
        admin::list_tracking,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_referral_codes,
        admin::set_referral_code_active,
        admin::list_referral_transactions,
        admin::list_admin_logs,
        settings::list_settings,
        settings::list_history,
        settings::get_setting,
        settings::update_setting,
        recycle_bin::list_items,
        recycle_bin::restore_item,
        recycle_bin::purge_item,
    ),
    components(
        schemas(
            Profile,
            Product,
            ProductStatus,
            ProductVariant,
            CartItem,
            CustomerInfo,
            Order,
            OrderLine,
            OrderStatus,
            OrderTracking,
            ReferralCode,
            ReferralStatus,
            ReferralTransaction,
            AppSetting,
            SettingsHistory,
            RecycleBinItem,
            AdminLog,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            VariantInput,
            ProductList,
            CategoryList,
            ImportResult,
            QuoteRequest,
            QuoteLine,
            CartQuote,
            CheckoutRequest,
            CheckoutResponse,
            OrderList,
            OrderWithReferral,
            TrackingList,
            ValidateCodeRequest,
            ValidateCodeResponse,
            SetCodeActiveRequest,
            ReferralSummary,
            ReferralCodeList,
            ReferralTransactionList,
            UpdateSettingRequest,
            SettingList,
            SettingsHistoryList,
            InventoryAdjustRequest,
            DashboardStats,
            AdminLogList,
            RecycleBinList,
            Recycled,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CheckoutResponse>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithReferral>,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Products", description = "Catalog, variants and CSV import/export"),
        (name = "Cart", description = "Client cart quotes"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Referrals", description = "Referral codes and commissions"),
        (name = "Admin", description = "Back-office endpoints"),
        (name = "Settings", description = "Runtime settings and their history"),
        (name = "Recycle bin", description = "Restore or purge deleted rows"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
