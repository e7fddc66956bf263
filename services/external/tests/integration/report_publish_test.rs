use dari_domain::report::ReportKind;
use dari_domain::status::DeliveryStatus;
use dari_external::domain::types::ReportPublishRow;
use dari_external::usecase::report_publish::ReportPublishEngine;

use crate::helpers::{MockBus, MockReportOutbox};

fn pending_row(id: i64) -> ReportPublishRow {
    ReportPublishRow {
        id,
        kind: ReportKind::DeviceInfo,
        external_system_name: "ess-one".to_owned(),
        routing_key: "report.external".to_owned(),
        raw_message: "{\"devices\":[]}".to_owned(),
        status: DeliveryStatus::Pending,
        retry_count: 0,
    }
}

#[tokio::test]
async fn publish_success_settles_the_row() {
    let outbox = MockReportOutbox::with_rows(vec![pending_row(1)]);
    let rows = outbox.rows_handle();
    let bus = MockBus::reliable();
    let published = bus.published_handle();

    let engine = ReportPublishEngine {
        outbox,
        bus,
        max_retries: 3,
    };
    let row = rows.lock().unwrap()[0].clone();
    engine.drive(row).await.unwrap();

    assert_eq!(rows.lock().unwrap()[0].status, DeliveryStatus::Success);
    let published = published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "report.external");
    assert_eq!(published[0].1.kind, ReportKind::DeviceInfo);
    assert_eq!(published[0].1.external_system_name, "ess-one");
}

#[tokio::test]
async fn publish_failure_bumps_the_retry_counter() {
    let outbox = MockReportOutbox::with_rows(vec![pending_row(1)]);
    let rows = outbox.rows_handle();

    let engine = ReportPublishEngine {
        outbox,
        bus: MockBus::failing(1),
        max_retries: 3,
    };
    let row = rows.lock().unwrap()[0].clone();
    engine.drive(row).await.unwrap();

    {
        let rows = rows.lock().unwrap();
        assert_eq!(rows[0].status, DeliveryStatus::Pending);
        assert_eq!(rows[0].retry_count, 1);
    }

    // Next drive succeeds.
    let row = rows.lock().unwrap()[0].clone();
    engine.drive(row).await.unwrap();
    assert_eq!(rows.lock().unwrap()[0].status, DeliveryStatus::Success);
}

#[tokio::test]
async fn exhausted_retries_fail_the_row() {
    let mut row = pending_row(1);
    row.retry_count = 3;
    let outbox = MockReportOutbox::with_rows(vec![row]);
    let rows = outbox.rows_handle();

    let engine = ReportPublishEngine {
        outbox,
        bus: MockBus::failing(10),
        max_retries: 3,
    };
    let row = rows.lock().unwrap()[0].clone();
    engine.drive(row).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].status, DeliveryStatus::Failed);
    assert_eq!(rows[0].retry_count, 4);
}

#[tokio::test]
async fn terminal_rows_are_skipped() {
    let mut row = pending_row(1);
    row.status = DeliveryStatus::Success;
    let outbox = MockReportOutbox::with_rows(vec![row]);
    let rows = outbox.rows_handle();
    let bus = MockBus::reliable();
    let published = bus.published_handle();

    let engine = ReportPublishEngine {
        outbox,
        bus,
        max_retries: 3,
    };
    let row = rows.lock().unwrap()[0].clone();
    engine.drive(row).await.unwrap();

    assert_eq!(rows.lock().unwrap()[0].status, DeliveryStatus::Success);
    assert!(published.lock().unwrap().is_empty());
}
