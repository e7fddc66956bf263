use sea_orm::entity::prelude::*;

/// Subscriber system registry — the source of truth for header auth,
/// origin checks and alert-fanout targeting.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "external_systems")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub system_name: String,
    #[sea_orm(unique)]
    pub api_key: String,
    /// JSON array of allowed origin URLs.
    pub origin_urls: Json,
    /// JSON array of subscribed event codes.
    pub subscribed_event_codes: Json,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::devices::Entity")]
    Devices,
    #[sea_orm(has_many = "super::disaster_transmit_logs::Entity")]
    DisasterTransmitLogs,
}

impl Related<super::devices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Devices.def()
    }
}

impl Related<super::disaster_transmit_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisasterTransmitLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
