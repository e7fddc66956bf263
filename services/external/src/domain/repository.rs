#![allow(async_fn_in_trait)]

use std::time::Duration;

use uuid::Uuid;

use crate::domain::types::{
    DisasterTransmitRow, ExternalSystem, NewDisasterTransmit, NewReportPublish, ReportPublishRow,
    ReportWrites,
};
use crate::error::ExternalError;

/// Subscriber registry lookups.
pub trait ExternalSystemRepository: Send + Sync {
    /// Active subscriber matching both auth headers, if any.
    fn find_active_by_auth(
        &self,
        system_name: &str,
        api_key: &str,
    ) -> impl std::future::Future<Output = Result<Option<ExternalSystem>, ExternalError>> + Send;

    fn list_active(&self) -> impl std::future::Future<Output = Result<Vec<ExternalSystem>, ExternalError>> + Send;
}

/// Transactional write path behind the report ingress: audit log + domain
/// rows + publish outbox row, atomically.
pub trait ReportIngressRepository: Send + Sync {
    fn record(
        &self,
        system: &ExternalSystem,
        request_path: &str,
        raw_body: &str,
        writes: &ReportWrites,
        publish: &NewReportPublish,
    ) -> impl std::future::Future<Output = Result<i64, ExternalError>> + Send;
}

/// Inbox of bus deliveries.
pub trait MqReceiveLogRepository: Send + Sync {
    fn insert_pending(&self, raw_message: &str) -> impl std::future::Future<Output = Result<i64, ExternalError>> + Send;

    fn mark_failed(&self, id: i64, message: &str) -> impl std::future::Future<Output = Result<(), ExternalError>> + Send;
}

/// Outbox of per-subscriber alert deliveries.
pub trait DisasterTransmitLogRepository: Send + Sync {
    /// Batch-insert the fanout rows (`ON CONFLICT DO NOTHING` on the
    /// per-subscriber key) and flip the inbox row to SUCCESS, atomically.
    /// Returns the number of fresh rows.
    fn stage_fanout(
        &self,
        inbox_id: i64,
        rows: &[NewDisasterTransmit],
    ) -> impl std::future::Future<Output = Result<u64, ExternalError>> + Send;

    /// Rows due for delivery: PENDING, or SENT whose last transition is
    /// older than `stale_after`.
    fn fetch_due(
        &self,
        limit: u64,
        stale_after: Duration,
    ) -> impl std::future::Future<Output = Result<Vec<DisasterTransmitRow>, ExternalError>> + Send;

    fn find(&self, id: i64) -> impl std::future::Future<Output = Result<Option<DisasterTransmitRow>, ExternalError>> + Send;

    /// Whether this subscriber was a target of the given alert. Backs the
    /// disaster-result ingress validator.
    fn exists_by_identifier(
        &self,
        external_system_id: Uuid,
        identifier: &str,
    ) -> impl std::future::Future<Output = Result<bool, ExternalError>> + Send;

    fn mark_sent(&self, id: i64) -> impl std::future::Future<Output = Result<(), ExternalError>> + Send;

    /// Guarded transition: no-op (returns `false`) when already terminal.
    fn mark_success(&self, id: i64) -> impl std::future::Future<Output = Result<bool, ExternalError>> + Send;

    /// Back to PENDING (keeps the retry counter), unless already terminal.
    fn mark_retry_pending(&self, id: i64) -> impl std::future::Future<Output = Result<bool, ExternalError>> + Send;

    /// Increment the retry counter; returns the new value, or `None` when
    /// the row is terminal or gone.
    fn bump_retry(&self, id: i64) -> impl std::future::Future<Output = Result<Option<i32>, ExternalError>> + Send;

    fn mark_failed(&self, id: i64) -> impl std::future::Future<Output = Result<(), ExternalError>> + Send;
}

/// Outbox of reports staged for the bus.
pub trait ReportPublishLogRepository: Send + Sync {
    fn fetch_pending(&self, limit: u64) -> impl std::future::Future<Output = Result<Vec<ReportPublishRow>, ExternalError>> + Send;

    fn mark_success(&self, id: i64) -> impl std::future::Future<Output = Result<(), ExternalError>> + Send;

    /// Bump the retry counter after a failed publish; returns the new count.
    fn record_publish_failure(&self, id: i64) -> impl std::future::Future<Output = Result<i32, ExternalError>> + Send;

    fn mark_failed(&self, id: i64) -> impl std::future::Future<Output = Result<(), ExternalError>> + Send;
}

/// Append-only subscriber socket lifecycle events.
pub trait ConnectionLogRepository: Send + Sync {
    fn record(
        &self,
        external_system_id: Option<Uuid>,
        event: &str,
        detail: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), ExternalError>> + Send;
}
