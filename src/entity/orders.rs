use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_info: Json,
    pub items: Json,
    pub total_price: i64,
    pub status: String,
    pub referral_code: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::orders_tracking::Entity")]
    OrdersTracking,
}

impl Related<super::orders_tracking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrdersTracking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
