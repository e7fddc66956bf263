use sea_orm::entity::prelude::*;

/// Append-only audit of every ingress call.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "api_receive_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub external_system_id: Uuid,
    pub request_path: String,
    #[sea_orm(column_type = "Text")]
    pub request_body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
