use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use dari_domain::report::ReportKind;
use dari_domain::status::DeliveryStatus;
use dari_external_schema::{
    api_receive_logs, connection_logs, device_status_logs, devices, disaster_transmit_logs,
    external_systems, mq_receive_logs, report_publish_logs,
};

use crate::domain::repository::{
    ConnectionLogRepository, DisasterTransmitLogRepository, ExternalSystemRepository,
    MqReceiveLogRepository, ReportIngressRepository, ReportPublishLogRepository,
};
use crate::domain::types::{
    DeviceStatusEntry, DeviceUpsert, DisasterTransmitRow, ExternalSystem, NewDisasterTransmit,
    NewReportPublish, ReportPublishRow, ReportWrites,
};
use crate::error::ExternalError;

fn parse_status(raw: &str) -> Result<DeliveryStatus, ExternalError> {
    DeliveryStatus::parse(raw)
        .ok_or_else(|| ExternalError::Internal(anyhow::anyhow!("unknown status {raw}")))
}

fn parse_kind(raw: &str) -> Result<ReportKind, ExternalError> {
    ReportKind::parse(raw)
        .ok_or_else(|| ExternalError::Internal(anyhow::anyhow!("unknown report type {raw}")))
}

fn string_array(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

const NON_TERMINAL: [&str; 2] = ["PENDING", "SENT"];

// ── external_systems ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbExternalSystemRepository {
    pub db: DatabaseConnection,
}

impl ExternalSystemRepository for DbExternalSystemRepository {
    async fn find_active_by_auth(
        &self,
        system_name: &str,
        api_key: &str,
    ) -> Result<Option<ExternalSystem>, ExternalError> {
        let model = external_systems::Entity::find()
            .filter(external_systems::Column::SystemName.eq(system_name))
            .filter(external_systems::Column::ApiKey.eq(api_key))
            .filter(external_systems::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .context("find external system by auth")?;
        Ok(model.map(system_from_model))
    }

    async fn list_active(&self) -> Result<Vec<ExternalSystem>, ExternalError> {
        let models = external_systems::Entity::find()
            .filter(external_systems::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .context("list active external systems")?;
        Ok(models.into_iter().map(system_from_model).collect())
    }
}

fn system_from_model(model: external_systems::Model) -> ExternalSystem {
    ExternalSystem {
        id: model.id,
        system_name: model.system_name,
        api_key: model.api_key,
        origin_urls: string_array(&model.origin_urls),
        subscribed_event_codes: string_array(&model.subscribed_event_codes),
        is_active: model.is_active,
    }
}

// ── report ingress (transactional) ───────────────────────────────────────────

#[derive(Clone)]
pub struct DbReportIngressRepository {
    pub db: DatabaseConnection,
}

impl ReportIngressRepository for DbReportIngressRepository {
    async fn record(
        &self,
        system: &ExternalSystem,
        request_path: &str,
        raw_body: &str,
        writes: &ReportWrites,
        publish: &NewReportPublish,
    ) -> Result<i64, ExternalError> {
        let system_id = system.id;
        let publish_id = self
            .db
            .transaction::<_, i64, DbErr>(|txn| {
                let request_path = request_path.to_owned();
                let raw_body = raw_body.to_owned();
                let writes = writes.clone();
                let publish = publish.clone();
                Box::pin(async move {
                    let now = Utc::now();
                    let api_log = api_receive_logs::ActiveModel {
                        external_system_id: Set(system_id),
                        request_path: Set(request_path),
                        request_body: Set(raw_body),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    match &writes {
                        ReportWrites::Devices(entries) => {
                            upsert_devices(txn, system_id, entries).await?;
                        }
                        ReportWrites::DeviceStatuses(entries) => {
                            insert_status_logs(txn, system_id, entries).await?;
                        }
                        ReportWrites::None => {}
                    }

                    let publish_log = report_publish_logs::ActiveModel {
                        kind: Set(publish.kind.as_str().to_owned()),
                        external_system_name: Set(publish.external_system_name.clone()),
                        api_receive_log_id: Set(api_log.id),
                        routing_key: Set(publish.routing_key.clone()),
                        raw_message: Set(publish.raw_message.clone()),
                        status: Set(DeliveryStatus::Pending.as_str().to_owned()),
                        retry_count: Set(0),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(publish_log.id)
                })
            })
            .await
            .context("record ingress report")?;
        Ok(publish_id)
    }
}

async fn upsert_devices(
    txn: &DatabaseTransaction,
    system_id: Uuid,
    entries: &[DeviceUpsert],
) -> Result<(), DbErr> {
    if entries.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    let models: Vec<devices::ActiveModel> = entries
        .iter()
        .map(|d| devices::ActiveModel {
            id: Set(Uuid::new_v4()),
            external_system_id: Set(system_id),
            device_id: Set(d.device_id.clone()),
            kind: Set(d.kind.clone()),
            name: Set(d.name.clone()),
            server_ip: Set(d.server_ip.clone()),
            server_name: Set(d.server_name.clone()),
            model: Set(d.model.clone()),
            lat: Set(d.lat),
            lon: Set(d.lon),
            address: Set(d.address.clone()),
            note: Set(d.note.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .collect();

    devices::Entity::insert_many(models)
        .on_conflict(
            OnConflict::columns([
                devices::Column::ExternalSystemId,
                devices::Column::DeviceId,
            ])
            .update_columns([
                devices::Column::Kind,
                devices::Column::Name,
                devices::Column::ServerIp,
                devices::Column::ServerName,
                devices::Column::Model,
                devices::Column::Lat,
                devices::Column::Lon,
                devices::Column::Address,
                devices::Column::Note,
                devices::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;
    Ok(())
}

async fn insert_status_logs(
    txn: &DatabaseTransaction,
    system_id: Uuid,
    entries: &[DeviceStatusEntry],
) -> Result<(), DbErr> {
    if entries.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    let models: Vec<device_status_logs::ActiveModel> = entries
        .iter()
        .map(|e| device_status_logs::ActiveModel {
            external_system_id: Set(system_id),
            device_id: Set(e.device_id.clone()),
            status: Set(e.status.clone()),
            note: Set(e.note.clone()),
            created_at: Set(now),
            ..Default::default()
        })
        .collect();
    device_status_logs::Entity::insert_many(models)
        .exec_without_returning(txn)
        .await?;
    Ok(())
}

// ── mq_receive_logs ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbMqReceiveLogRepository {
    pub db: DatabaseConnection,
}

impl MqReceiveLogRepository for DbMqReceiveLogRepository {
    async fn insert_pending(&self, raw_message: &str) -> Result<i64, ExternalError> {
        let now = Utc::now();
        let model = mq_receive_logs::ActiveModel {
            raw_message: Set(raw_message.to_owned()),
            status: Set(DeliveryStatus::Pending.as_str().to_owned()),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("insert mq receive log")?;
        Ok(model.id)
    }

    async fn mark_failed(&self, id: i64, message: &str) -> Result<(), ExternalError> {
        mq_receive_logs::ActiveModel {
            id: Set(id),
            status: Set(DeliveryStatus::Failed.as_str().to_owned()),
            error_message: Set(Some(message.to_owned())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark mq receive log failed")?;
        Ok(())
    }
}

// ── disaster_transmit_logs ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbDisasterTransmitLogRepository {
    pub db: DatabaseConnection,
}

impl DisasterTransmitLogRepository for DbDisasterTransmitLogRepository {
    async fn stage_fanout(
        &self,
        inbox_id: i64,
        rows: &[NewDisasterTransmit],
    ) -> Result<u64, ExternalError> {
        let staged = self
            .db
            .transaction::<_, u64, DbErr>(|txn| {
                let rows = rows.to_vec();
                Box::pin(async move {
                    let now = Utc::now();
                    let staged = if rows.is_empty() {
                        0
                    } else {
                        let models: Vec<disaster_transmit_logs::ActiveModel> = rows
                            .iter()
                            .map(|r| disaster_transmit_logs::ActiveModel {
                                mq_receive_log_id: Set(r.mq_receive_log_id),
                                external_system_id: Set(r.external_system_id),
                                identifier: Set(r.identifier.clone()),
                                raw_message: Set(r.raw_message.clone()),
                                status: Set(DeliveryStatus::Pending.as_str().to_owned()),
                                retry_count: Set(0),
                                created_at: Set(now),
                                updated_at: Set(now),
                                ..Default::default()
                            })
                            .collect();
                        disaster_transmit_logs::Entity::insert_many(models)
                            .on_conflict(
                                OnConflict::columns([
                                    disaster_transmit_logs::Column::ExternalSystemId,
                                    disaster_transmit_logs::Column::Identifier,
                                ])
                                .do_nothing()
                                .to_owned(),
                            )
                            .exec_without_returning(txn)
                            .await?
                    };

                    mq_receive_logs::ActiveModel {
                        id: Set(inbox_id),
                        status: Set(DeliveryStatus::Success.as_str().to_owned()),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .update(txn)
                    .await?;

                    Ok(staged)
                })
            })
            .await
            .context("stage disaster fanout")?;
        Ok(staged)
    }

    async fn fetch_due(
        &self,
        limit: u64,
        stale_after: std::time::Duration,
    ) -> Result<Vec<DisasterTransmitRow>, ExternalError> {
        let stale_cutoff =
            Utc::now() - chrono::Duration::from_std(stale_after).context("stale window")?;
        let models = disaster_transmit_logs::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        disaster_transmit_logs::Column::Status
                            .eq(DeliveryStatus::Pending.as_str()),
                    )
                    .add(
                        Condition::all()
                            .add(
                                disaster_transmit_logs::Column::Status
                                    .eq(DeliveryStatus::Sent.as_str()),
                            )
                            .add(disaster_transmit_logs::Column::UpdatedAt.lt(stale_cutoff)),
                    ),
            )
            .order_by_asc(disaster_transmit_logs::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("fetch due disaster transmit logs")?;
        models.into_iter().map(transmit_from_model).collect()
    }

    async fn find(&self, id: i64) -> Result<Option<DisasterTransmitRow>, ExternalError> {
        let model = disaster_transmit_logs::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find disaster transmit log")?;
        model.map(transmit_from_model).transpose()
    }

    async fn exists_by_identifier(
        &self,
        external_system_id: Uuid,
        identifier: &str,
    ) -> Result<bool, ExternalError> {
        let count = disaster_transmit_logs::Entity::find()
            .filter(disaster_transmit_logs::Column::ExternalSystemId.eq(external_system_id))
            .filter(disaster_transmit_logs::Column::Identifier.eq(identifier))
            .count(&self.db)
            .await
            .context("count disaster transmit logs by identifier")?;
        Ok(count > 0)
    }

    async fn mark_sent(&self, id: i64) -> Result<(), ExternalError> {
        disaster_transmit_logs::Entity::update_many()
            .col_expr(
                disaster_transmit_logs::Column::Status,
                Expr::value(DeliveryStatus::Sent.as_str()),
            )
            .col_expr(
                disaster_transmit_logs::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(disaster_transmit_logs::Column::Id.eq(id))
            .filter(disaster_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark disaster transmit log sent")?;
        Ok(())
    }

    async fn mark_success(&self, id: i64) -> Result<bool, ExternalError> {
        let result = disaster_transmit_logs::Entity::update_many()
            .col_expr(
                disaster_transmit_logs::Column::Status,
                Expr::value(DeliveryStatus::Success.as_str()),
            )
            .col_expr(
                disaster_transmit_logs::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(disaster_transmit_logs::Column::Id.eq(id))
            .filter(disaster_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark disaster transmit log success")?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_retry_pending(&self, id: i64) -> Result<bool, ExternalError> {
        let result = disaster_transmit_logs::Entity::update_many()
            .col_expr(
                disaster_transmit_logs::Column::Status,
                Expr::value(DeliveryStatus::Pending.as_str()),
            )
            .col_expr(
                disaster_transmit_logs::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(disaster_transmit_logs::Column::Id.eq(id))
            .filter(disaster_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark disaster transmit log pending")?;
        Ok(result.rows_affected > 0)
    }

    async fn bump_retry(&self, id: i64) -> Result<Option<i32>, ExternalError> {
        let result = disaster_transmit_logs::Entity::update_many()
            .col_expr(
                disaster_transmit_logs::Column::RetryCount,
                Expr::col(disaster_transmit_logs::Column::RetryCount).add(1),
            )
            .col_expr(
                disaster_transmit_logs::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(disaster_transmit_logs::Column::Id.eq(id))
            .filter(disaster_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("bump disaster transmit retry count")?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        Ok(self.find(id).await?.map(|row| row.retry_count))
    }

    async fn mark_failed(&self, id: i64) -> Result<(), ExternalError> {
        disaster_transmit_logs::Entity::update_many()
            .col_expr(
                disaster_transmit_logs::Column::Status,
                Expr::value(DeliveryStatus::Failed.as_str()),
            )
            .col_expr(
                disaster_transmit_logs::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(disaster_transmit_logs::Column::Id.eq(id))
            .filter(disaster_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark disaster transmit log failed")?;
        Ok(())
    }
}

fn transmit_from_model(
    model: disaster_transmit_logs::Model,
) -> Result<DisasterTransmitRow, ExternalError> {
    Ok(DisasterTransmitRow {
        id: model.id,
        external_system_id: model.external_system_id,
        identifier: model.identifier,
        raw_message: model.raw_message,
        status: parse_status(&model.status)?,
        retry_count: model.retry_count,
    })
}

// ── report_publish_logs ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbReportPublishLogRepository {
    pub db: DatabaseConnection,
}

impl ReportPublishLogRepository for DbReportPublishLogRepository {
    async fn fetch_pending(&self, limit: u64) -> Result<Vec<ReportPublishRow>, ExternalError> {
        let models = report_publish_logs::Entity::find()
            .filter(report_publish_logs::Column::Status.eq(DeliveryStatus::Pending.as_str()))
            .order_by_asc(report_publish_logs::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("fetch pending report publish logs")?;
        models.into_iter().map(publish_from_model).collect()
    }

    async fn mark_success(&self, id: i64) -> Result<(), ExternalError> {
        report_publish_logs::Entity::update_many()
            .col_expr(
                report_publish_logs::Column::Status,
                Expr::value(DeliveryStatus::Success.as_str()),
            )
            .col_expr(
                report_publish_logs::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(report_publish_logs::Column::Id.eq(id))
            .filter(report_publish_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark report publish log success")?;
        Ok(())
    }

    async fn record_publish_failure(&self, id: i64) -> Result<i32, ExternalError> {
        let model = report_publish_logs::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("load report publish log")?
            .ok_or_else(|| ExternalError::Internal(anyhow::anyhow!("publish log {id} missing")))?;

        let next = model.retry_count + 1;
        report_publish_logs::ActiveModel {
            id: Set(id),
            retry_count: Set(next),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("bump report publish retry count")?;
        Ok(next)
    }

    async fn mark_failed(&self, id: i64) -> Result<(), ExternalError> {
        report_publish_logs::Entity::update_many()
            .col_expr(
                report_publish_logs::Column::Status,
                Expr::value(DeliveryStatus::Failed.as_str()),
            )
            .col_expr(
                report_publish_logs::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(report_publish_logs::Column::Id.eq(id))
            .filter(report_publish_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark report publish log failed")?;
        Ok(())
    }
}

fn publish_from_model(model: report_publish_logs::Model) -> Result<ReportPublishRow, ExternalError> {
    Ok(ReportPublishRow {
        id: model.id,
        kind: parse_kind(&model.kind)?,
        external_system_name: model.external_system_name,
        routing_key: model.routing_key,
        raw_message: model.raw_message,
        status: parse_status(&model.status)?,
        retry_count: model.retry_count,
    })
}

// ── connection_logs ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbConnectionLogRepository {
    pub db: DatabaseConnection,
}

impl ConnectionLogRepository for DbConnectionLogRepository {
    async fn record(
        &self,
        external_system_id: Option<Uuid>,
        event: &str,
        detail: Option<&str>,
    ) -> Result<(), ExternalError> {
        connection_logs::ActiveModel {
            external_system_id: Set(external_system_id),
            event: Set(event.to_owned()),
            detail: Set(detail.map(str::to_owned)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("insert connection log")?;
        Ok(())
    }
}
