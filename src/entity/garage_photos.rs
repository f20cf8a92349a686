use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "garage_photos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub garage_id: Uuid,
    /// Embedded image bytes; `None` when the photo only points at `url`.
    pub data: Option<Vec<u8>>,
    pub mime_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub size: Option<i32>,
    pub url: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::garages::Entity",
        from = "Column::GarageId",
        to = "super::garages::Column::Id"
    )]
    Garages,
}

impl Related<super::garages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Garages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
