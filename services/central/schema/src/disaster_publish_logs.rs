use sea_orm::entity::prelude::*;

/// Outbox of alerts staged for publication onto the bus.
///
/// `identifier` uniqueness is the system-wide idempotency key for the
/// disaster fan-out: duplicate alerts collapse here no matter how many
/// distinct frames carried them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "disaster_publish_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tcp_receive_log_id: i64,
    pub routing_key: String,
    #[sea_orm(unique)]
    pub identifier: String,
    pub event_code: String,
    #[sea_orm(column_type = "Text")]
    pub raw_message: String,
    pub status: String,
    pub retry_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tcp_receive_logs::Entity",
        from = "Column::TcpReceiveLogId",
        to = "super::tcp_receive_logs::Column::Id"
    )]
    TcpReceiveLog,
}

impl Related<super::tcp_receive_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TcpReceiveLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
