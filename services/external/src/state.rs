use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::infra::db::{
    DbConnectionLogRepository, DbDisasterTransmitLogRepository, DbExternalSystemRepository,
    DbReportIngressRepository,
};
use crate::ws::WsSessionManager;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub sessions: Arc<WsSessionManager>,
}

impl AppState {
    pub fn systems(&self) -> DbExternalSystemRepository {
        DbExternalSystemRepository {
            db: self.db.clone(),
        }
    }

    pub fn ingress(&self) -> DbReportIngressRepository {
        DbReportIngressRepository {
            db: self.db.clone(),
        }
    }

    pub fn transmits(&self) -> DbDisasterTransmitLogRepository {
        DbDisasterTransmitLogRepository {
            db: self.db.clone(),
        }
    }

    pub fn connections(&self) -> DbConnectionLogRepository {
        DbConnectionLogRepository {
            db: self.db.clone(),
        }
    }
}
