use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: String,
    pub image_url: Option<String>,
    pub stock: i32,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::variant_options::Entity")]
    VariantOptions,
}

impl Related<super::variant_options::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VariantOptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
