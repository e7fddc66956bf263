use sea_orm::entity::prelude::*;

/// Outbox of alert deliveries, one row per alert per subscriber.
///
/// `(external_system_id, identifier)` is unique — redelivered bus messages
/// collapse instead of fanning out twice.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "disaster_transmit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub mq_receive_log_id: i64,
    pub external_system_id: Uuid,
    pub identifier: String,
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
        belongs_to = "super::external_systems::Entity",
        from = "Column::ExternalSystemId",
        to = "super::external_systems::Column::Id"
    )]
    ExternalSystem,
    #[sea_orm(
        belongs_to = "super::mq_receive_logs::Entity",
        from = "Column::MqReceiveLogId",
        to = "super::mq_receive_logs::Column::Id"
    )]
    MqReceiveLog,
}

impl Related<super::external_systems::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExternalSystem.def()
    }
}

impl Related<super::mq_receive_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MqReceiveLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
