use sea_orm::entity::prelude::*;

/// Append-only device status observations from subscriber reports.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "device_status_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub external_system_id: Uuid,
    pub device_id: String,
    pub status: String,
    pub note: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
