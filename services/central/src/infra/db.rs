use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};

use dari_central_schema::{
    connection_logs, disaster_publish_logs, mq_receive_logs, report_transmit_logs,
    tcp_receive_logs,
};
use dari_domain::report::ReportKind;
use dari_domain::status::DeliveryStatus;

use crate::domain::repository::{
    ConnectionLogRepository, DisasterPublishLogRepository, MqReceiveLogRepository,
    ReportTransmitLogRepository, TcpReceiveLogRepository,
};
use crate::domain::types::{
    DisasterPublishRow, NewDisasterPublish, NewReportTransmit, NewTcpReceiveLog, ReportTransmitRow,
};
use crate::error::CentralError;

fn parse_status(raw: &str) -> Result<DeliveryStatus, CentralError> {
    DeliveryStatus::parse(raw)
        .ok_or_else(|| CentralError::Storage(anyhow::anyhow!("unknown status {raw}")))
}

fn parse_kind(raw: &str) -> Result<ReportKind, CentralError> {
    ReportKind::parse(raw)
        .ok_or_else(|| CentralError::Storage(anyhow::anyhow!("unknown report type {raw}")))
}

const NON_TERMINAL: [&str; 2] = ["PENDING", "SENT"];

// ── tcp_receive_logs ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTcpReceiveLogRepository {
    pub db: DatabaseConnection,
}

impl TcpReceiveLogRepository for DbTcpReceiveLogRepository {
    async fn exists(&self, inbound_id: &str, inbound_seq: i32) -> Result<bool, CentralError> {
        let count = tcp_receive_logs::Entity::find()
            .filter(tcp_receive_logs::Column::InboundId.eq(inbound_id))
            .filter(tcp_receive_logs::Column::InboundSeq.eq(inbound_seq))
            .count(&self.db)
            .await
            .context("count tcp receive logs")?;
        Ok(count > 0)
    }

    async fn insert_pending(&self, log: &NewTcpReceiveLog) -> Result<i64, CentralError> {
        let now = Utc::now();
        let model = tcp_receive_logs::ActiveModel {
            inbound_id: Set(log.inbound_id.clone()),
            inbound_seq: Set(log.inbound_seq),
            raw_message: Set(log.raw_message.clone()),
            status: Set(DeliveryStatus::Pending.as_str().to_owned()),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("insert tcp receive log")?;
        Ok(model.id)
    }

    async fn mark_failed(&self, id: i64, message: &str) -> Result<(), CentralError> {
        tcp_receive_logs::ActiveModel {
            id: Set(id),
            status: Set(DeliveryStatus::Failed.as_str().to_owned()),
            error_message: Set(Some(message.to_owned())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark tcp receive log failed")?;
        Ok(())
    }
}

// ── disaster_publish_logs ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbDisasterPublishLogRepository {
    pub db: DatabaseConnection,
}

impl DisasterPublishLogRepository for DbDisasterPublishLogRepository {
    async fn stage_and_complete(
        &self,
        inbox_id: i64,
        publish: &NewDisasterPublish,
    ) -> Result<bool, CentralError> {
        let staged = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                let publish = publish.clone();
                Box::pin(async move {
                    let staged = insert_publish_row(txn, &publish).await?;
                    complete_tcp_inbox(txn, inbox_id).await?;
                    Ok(staged)
                })
            })
            .await
            .context("stage disaster publish")?;
        Ok(staged)
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<DisasterPublishRow>, CentralError> {
        let model = disaster_publish_logs::Entity::find()
            .filter(disaster_publish_logs::Column::Identifier.eq(identifier))
            .one(&self.db)
            .await
            .context("find disaster publish log by identifier")?;
        model.map(publish_from_model).transpose()
    }

    async fn fetch_pending(&self, limit: u64) -> Result<Vec<DisasterPublishRow>, CentralError> {
        let models = disaster_publish_logs::Entity::find()
            .filter(
                disaster_publish_logs::Column::Status.eq(DeliveryStatus::Pending.as_str()),
            )
            .order_by_asc(disaster_publish_logs::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("fetch pending disaster publish logs")?;
        models.into_iter().map(publish_from_model).collect()
    }

    async fn mark_success(&self, id: i64) -> Result<(), CentralError> {
        disaster_publish_logs::Entity::update_many()
            .col_expr(
                disaster_publish_logs::Column::Status,
                Expr::value(DeliveryStatus::Success.as_str()),
            )
            .col_expr(disaster_publish_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(disaster_publish_logs::Column::Id.eq(id))
            .filter(disaster_publish_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark disaster publish log success")?;
        Ok(())
    }

    async fn record_publish_failure(&self, id: i64) -> Result<i32, CentralError> {
        let model = disaster_publish_logs::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("load disaster publish log")?
            .ok_or_else(|| CentralError::Storage(anyhow::anyhow!("publish log {id} missing")))?;

        let next = model.retry_count + 1;
        disaster_publish_logs::ActiveModel {
            id: Set(id),
            retry_count: Set(next),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("bump disaster publish retry count")?;
        Ok(next)
    }

    async fn mark_failed(&self, id: i64) -> Result<(), CentralError> {
        disaster_publish_logs::Entity::update_many()
            .col_expr(
                disaster_publish_logs::Column::Status,
                Expr::value(DeliveryStatus::Failed.as_str()),
            )
            .col_expr(disaster_publish_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(disaster_publish_logs::Column::Id.eq(id))
            .filter(disaster_publish_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark disaster publish log failed")?;
        Ok(())
    }
}

async fn insert_publish_row(
    txn: &DatabaseTransaction,
    publish: &NewDisasterPublish,
) -> Result<bool, DbErr> {
    let now = Utc::now();
    let inserted = disaster_publish_logs::Entity::insert(disaster_publish_logs::ActiveModel {
        tcp_receive_log_id: Set(publish.tcp_receive_log_id),
        routing_key: Set(publish.routing_key.clone()),
        identifier: Set(publish.identifier.clone()),
        event_code: Set(publish.event_code.clone()),
        raw_message: Set(publish.raw_message.clone()),
        status: Set(DeliveryStatus::Pending.as_str().to_owned()),
        retry_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(disaster_publish_logs::Column::Identifier)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;
    Ok(inserted > 0)
}

async fn complete_tcp_inbox(txn: &DatabaseTransaction, inbox_id: i64) -> Result<(), DbErr> {
    tcp_receive_logs::ActiveModel {
        id: Set(inbox_id),
        status: Set(DeliveryStatus::Success.as_str().to_owned()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}

fn publish_from_model(
    model: disaster_publish_logs::Model,
) -> Result<DisasterPublishRow, CentralError> {
    Ok(DisasterPublishRow {
        id: model.id,
        routing_key: model.routing_key,
        identifier: model.identifier,
        event_code: model.event_code,
        raw_message: model.raw_message,
        status: parse_status(&model.status)?,
        retry_count: model.retry_count,
    })
}

// ── mq_receive_logs ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbMqReceiveLogRepository {
    pub db: DatabaseConnection,
}

impl MqReceiveLogRepository for DbMqReceiveLogRepository {
    async fn insert_pending(&self, raw_message: &str) -> Result<i64, CentralError> {
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

    async fn mark_failed(&self, id: i64, message: &str) -> Result<(), CentralError> {
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

// ── report_transmit_logs ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbReportTransmitLogRepository {
    pub db: DatabaseConnection,
}

impl ReportTransmitLogRepository for DbReportTransmitLogRepository {
    async fn stage_and_complete(
        &self,
        inbox_id: i64,
        report: &NewReportTransmit,
    ) -> Result<i64, CentralError> {
        let id = self
            .db
            .transaction::<_, i64, DbErr>(|txn| {
                let report = report.clone();
                Box::pin(async move {
                    let now = Utc::now();
                    let model = report_transmit_logs::ActiveModel {
                        mq_receive_log_id: Set(report.mq_receive_log_id),
                        kind: Set(report.kind.as_str().to_owned()),
                        outbound_id: Set(report.outbound_id.clone()),
                        external_system_name: Set(report.external_system_name.clone()),
                        raw_message: Set(report.raw_message.clone()),
                        status: Set(DeliveryStatus::Pending.as_str().to_owned()),
                        retry_count: Set(0),
                        report_sequence: Set(1),
                        error_detail: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    mq_receive_logs::ActiveModel {
                        id: Set(inbox_id),
                        status: Set(DeliveryStatus::Success.as_str().to_owned()),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .update(txn)
                    .await?;

                    Ok(model.id)
                })
            })
            .await
            .context("stage report transmit")?;
        Ok(id)
    }

    async fn fetch_due(
        &self,
        limit: u64,
        stale_after: std::time::Duration,
    ) -> Result<Vec<ReportTransmitRow>, CentralError> {
        let stale_cutoff =
            Utc::now() - chrono::Duration::from_std(stale_after).context("stale window")?;
        let models = report_transmit_logs::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        report_transmit_logs::Column::Status.eq(DeliveryStatus::Pending.as_str()),
                    )
                    .add(
                        Condition::all()
                            .add(
                                report_transmit_logs::Column::Status
                                    .eq(DeliveryStatus::Sent.as_str()),
                            )
                            .add(report_transmit_logs::Column::UpdatedAt.lt(stale_cutoff)),
                    ),
            )
            .order_by_asc(report_transmit_logs::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("fetch due report transmit logs")?;
        models.into_iter().map(report_from_model).collect()
    }

    async fn find(&self, id: i64) -> Result<Option<ReportTransmitRow>, CentralError> {
        let model = report_transmit_logs::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find report transmit log")?;
        model.map(report_from_model).transpose()
    }

    async fn find_by_attempt(
        &self,
        outbound_id: &str,
        report_sequence: i32,
    ) -> Result<Option<ReportTransmitRow>, CentralError> {
        let model = report_transmit_logs::Entity::find()
            .filter(report_transmit_logs::Column::OutboundId.eq(outbound_id))
            .filter(report_transmit_logs::Column::ReportSequence.eq(report_sequence))
            .one(&self.db)
            .await
            .context("find report transmit log by attempt")?;
        model.map(report_from_model).transpose()
    }

    async fn bump_attempt(&self, id: i64) -> Result<Option<ReportTransmitRow>, CentralError> {
        report_transmit_logs::Entity::update_many()
            .col_expr(
                report_transmit_logs::Column::RetryCount,
                Expr::col(report_transmit_logs::Column::RetryCount).add(1),
            )
            .col_expr(
                report_transmit_logs::Column::ReportSequence,
                Expr::col(report_transmit_logs::Column::ReportSequence).add(1),
            )
            .col_expr(report_transmit_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(report_transmit_logs::Column::Id.eq(id))
            .filter(report_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("bump report transmit attempt")?;
        self.find(id).await
    }

    async fn mark_sent(&self, id: i64) -> Result<(), CentralError> {
        report_transmit_logs::Entity::update_many()
            .col_expr(
                report_transmit_logs::Column::Status,
                Expr::value(DeliveryStatus::Sent.as_str()),
            )
            .col_expr(report_transmit_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(report_transmit_logs::Column::Id.eq(id))
            .filter(report_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark report transmit log sent")?;
        Ok(())
    }

    async fn mark_success(&self, id: i64) -> Result<bool, CentralError> {
        let result = report_transmit_logs::Entity::update_many()
            .col_expr(
                report_transmit_logs::Column::Status,
                Expr::value(DeliveryStatus::Success.as_str()),
            )
            .col_expr(report_transmit_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(report_transmit_logs::Column::Id.eq(id))
            .filter(report_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark report transmit log success")?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_retry_pending(&self, id: i64, reason: &str) -> Result<bool, CentralError> {
        let result = report_transmit_logs::Entity::update_many()
            .col_expr(
                report_transmit_logs::Column::Status,
                Expr::value(DeliveryStatus::Pending.as_str()),
            )
            .col_expr(
                report_transmit_logs::Column::ErrorDetail,
                Expr::value(Some(reason.to_owned())),
            )
            .col_expr(report_transmit_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(report_transmit_logs::Column::Id.eq(id))
            .filter(report_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark report transmit log pending")?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_failed(&self, id: i64, reason: &str) -> Result<(), CentralError> {
        report_transmit_logs::Entity::update_many()
            .col_expr(
                report_transmit_logs::Column::Status,
                Expr::value(DeliveryStatus::Failed.as_str()),
            )
            .col_expr(
                report_transmit_logs::Column::ErrorDetail,
                Expr::value(Some(reason.to_owned())),
            )
            .col_expr(report_transmit_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(report_transmit_logs::Column::Id.eq(id))
            .filter(report_transmit_logs::Column::Status.is_in(NON_TERMINAL))
            .exec(&self.db)
            .await
            .context("mark report transmit log failed")?;
        Ok(())
    }
}

fn report_from_model(model: report_transmit_logs::Model) -> Result<ReportTransmitRow, CentralError> {
    Ok(ReportTransmitRow {
        id: model.id,
        kind: parse_kind(&model.kind)?,
        outbound_id: model.outbound_id,
        external_system_name: model.external_system_name,
        raw_message: model.raw_message,
        status: parse_status(&model.status)?,
        retry_count: model.retry_count,
        report_sequence: model.report_sequence,
        error_detail: model.error_detail,
    })
}

// ── connection_logs ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbConnectionLogRepository {
    pub db: DatabaseConnection,
}

impl ConnectionLogRepository for DbConnectionLogRepository {
    async fn record(&self, event: &str, detail: Option<&str>) -> Result<(), CentralError> {
        connection_logs::ActiveModel {
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
