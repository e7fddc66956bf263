use sea_orm::entity::prelude::*;

/// Terminal device registered by a subscriber system.
///
/// `(external_system_id, device_id)` is unique; reports upsert on it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub external_system_id: Uuid,
    pub device_id: String,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub name: String,
    pub server_ip: Option<String>,
    pub server_name: Option<String>,
    pub model: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub address: Option<String>,
    pub note: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::external_systems::Entity",
        from = "Column::ExternalSystemId",
        to = "super::external_systems::Column::Id"
    )]
    ExternalSystem,
}

impl Related<super::external_systems::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExternalSystem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
