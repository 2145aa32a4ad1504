use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "counties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sub_county::Entity")]
    SubCounties,
}

impl Related<super::sub_county::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubCounties.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
