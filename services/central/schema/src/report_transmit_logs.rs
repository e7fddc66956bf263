use sea_orm::entity::prelude::*;

/// Outbox of subscriber reports bound for the upstream system over TCP.
///
/// `(outbound_id, report_sequence)` identifies one send attempt; the pair
/// is what acks correlate against.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "report_transmit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub mq_receive_log_id: i64,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub outbound_id: String,
    pub external_system_name: String,
    #[sea_orm(column_type = "Text")]
    pub raw_message: String,
    pub status: String,
    pub retry_count: i32,
    pub report_sequence: i32,
    pub error_detail: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mq_receive_logs::Entity",
        from = "Column::MqReceiveLogId",
        to = "super::mq_receive_logs::Column::Id"
    )]
    MqReceiveLog,
}

impl Related<super::mq_receive_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MqReceiveLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
