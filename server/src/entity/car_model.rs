use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body style of a car model, stored as its display string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum CarType {
    #[sea_orm(string_value = "Sedan")]
    Sedan,
    #[sea_orm(string_value = "SUV")]
    #[serde(rename = "SUV")]
    Suv,
    #[sea_orm(string_value = "Wagon")]
    Wagon,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "car_model")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub car_make_id: Uuid,
    pub name: String,
    #[sea_orm(column_name = "type")]
    pub car_type: CarType,
    pub year: i32,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::car_make::Entity",
        from = "Column::CarMakeId",
        to = "super::car_make::Column::Id",
        on_delete = "Cascade"
    )]
    CarMake,
}

impl Related<super::car_make::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CarMake.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
