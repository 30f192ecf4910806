use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bundle")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub educator_id: String,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bundle_course::Entity")]
    BundleCourse,
}

impl Related<super::bundle_course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BundleCourse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
