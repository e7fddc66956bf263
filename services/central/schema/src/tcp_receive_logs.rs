use sea_orm::entity::prelude::*;

/// Inbox of frames received on the upstream TCP link.
///
/// `(inbound_id, inbound_seq)` is unique — the primary dedup key for
/// redelivered notifications.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tcp_receive_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub inbound_id: String,
    pub inbound_seq: i32,
    #[sea_orm(column_type = "Text")]
    pub raw_message: String,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::disaster_publish_logs::Entity")]
    DisasterPublishLogs,
}

impl Related<super::disaster_publish_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisasterPublishLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
