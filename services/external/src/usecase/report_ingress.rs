use tracing::info;

use dari_domain::report::ReportKind;

use crate::domain::repository::{DisasterTransmitLogRepository, ReportIngressRepository};
use crate::domain::types::{ExternalSystem, NewReportPublish, ReportWrites};
use crate::error::{ExternalError, FieldError};

/// Routing key every staged report is published under.
pub const REPORT_ROUTING_KEY: &str = "report.external";

/// Transactional back half of the report ingress: audit log + domain rows
/// + publish outbox row. Field validation has already happened at the
/// handler; only DB-backed rules live here.
pub struct ReportIngressUseCase<R: ReportIngressRepository, T: DisasterTransmitLogRepository> {
    pub repo: R,
    pub transmits: T,
}

impl<R: ReportIngressRepository, T: DisasterTransmitLogRepository> ReportIngressUseCase<R, T> {
    pub async fn submit_device_info(
        &self,
        system: &ExternalSystem,
        request_path: &str,
        raw_body: &str,
        writes: ReportWrites,
    ) -> Result<(), ExternalError> {
        self.record(system, request_path, raw_body, writes, ReportKind::DeviceInfo)
            .await
    }

    pub async fn submit_device_status(
        &self,
        system: &ExternalSystem,
        request_path: &str,
        raw_body: &str,
        writes: ReportWrites,
    ) -> Result<(), ExternalError> {
        self.record(
            system,
            request_path,
            raw_body,
            writes,
            ReportKind::DeviceStatus,
        )
        .await
    }

    /// Disaster results must reference an alert this subscriber was
    /// actually a target of.
    pub async fn submit_disaster_result(
        &self,
        system: &ExternalSystem,
        request_path: &str,
        raw_body: &str,
        identifier: &str,
    ) -> Result<(), ExternalError> {
        if !self
            .transmits
            .exists_by_identifier(system.id, identifier)
            .await?
        {
            return Err(ExternalError::Validation(vec![FieldError::new(
                "identifier",
                format!("no delivered alert with identifier {identifier}"),
            )]));
        }
        self.record(
            system,
            request_path,
            raw_body,
            ReportWrites::None,
            ReportKind::DisasterResult,
        )
        .await
    }

    async fn record(
        &self,
        system: &ExternalSystem,
        request_path: &str,
        raw_body: &str,
        writes: ReportWrites,
        kind: ReportKind,
    ) -> Result<(), ExternalError> {
        let publish = NewReportPublish {
            kind,
            external_system_name: system.system_name.clone(),
            routing_key: REPORT_ROUTING_KEY.to_owned(),
            raw_message: raw_body.to_owned(),
        };
        let publish_id = self
            .repo
            .record(system, request_path, raw_body, &writes, &publish)
            .await?;
        info!(
            system = %system.system_name,
            kind = %kind,
            publish_id,
            "report accepted"
        );
        Ok(())
    }
}
