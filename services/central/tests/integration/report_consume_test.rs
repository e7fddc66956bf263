use dari_central::error::CentralError;
use dari_central::usecase::report_consume::ReportConsumeUseCase;
use dari_central::domain::types::DisasterPublishRow;
use dari_domain::report::ReportKind;
use dari_domain::status::DeliveryStatus;

use crate::helpers::{MockMqInbox, MockPublishOutbox, MockReportOutbox, notify_body};

fn usecase(
    inbox: MockMqInbox,
    outbox: MockReportOutbox,
    publishes: MockPublishOutbox,
) -> ReportConsumeUseCase<MockMqInbox, MockReportOutbox, MockPublishOutbox> {
    ReportConsumeUseCase {
        inbox,
        outbox,
        publishes,
        dest_id: "GW01".to_owned(),
    }
}

fn published_alert(identifier: &str) -> DisasterPublishRow {
    DisasterPublishRow {
        id: 1,
        routing_key: "disaster.HTW".to_owned(),
        identifier: identifier.to_owned(),
        event_code: "HTW".to_owned(),
        raw_message: notify_body("T1", 1, identifier, "HTW"),
        status: DeliveryStatus::Success,
        retry_count: 0,
    }
}

#[tokio::test]
async fn should_stage_device_info_with_minted_outbound_id() {
    let outbox = MockReportOutbox::new();
    let rows = outbox.rows_handle();
    let uc = usecase(MockMqInbox::new(), outbox, MockPublishOutbox::new());

    let payload = "{\"type\":\"DEVICE_INFO\",\"externalSystemName\":\"ess-one\",\
                   \"rawMessage\":\"{\\\"devices\\\":[]}\"}";
    let outcome = uc.execute(payload).await.unwrap();
    assert_eq!(outcome.inbox_id, 1);

    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, ReportKind::DeviceInfo);
    assert_eq!(rows[0].external_system_name, "ess-one");
    assert_eq!(rows[0].status, DeliveryStatus::Pending);
    assert_eq!(rows[0].report_sequence, 1);
    assert!(
        rows[0].outbound_id.starts_with("KR.GW01_"),
        "outbound id was {}",
        rows[0].outbound_id
    );
}

#[tokio::test]
async fn minted_outbound_ids_are_unique() {
    let outbox = MockReportOutbox::new();
    let rows = outbox.rows_handle();
    let uc = usecase(MockMqInbox::new(), outbox, MockPublishOutbox::new());

    let payload = "{\"type\":\"DEVICE_STATUS\",\"externalSystemName\":\"ess-one\",\
                   \"rawMessage\":\"{}\"}";
    uc.execute(payload).await.unwrap();
    uc.execute(payload).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_ne!(rows[0].outbound_id, rows[1].outbound_id);
}

#[tokio::test]
async fn disaster_result_requires_a_published_alert() {
    let uc = usecase(
        MockMqInbox::new(),
        MockReportOutbox::new(),
        MockPublishOutbox::new(),
    );

    let payload = "{\"type\":\"DISASTER_RESULT\",\"externalSystemName\":\"ess-one\",\
                   \"rawMessage\":\"{\\\"identifier\\\":\\\"A1\\\"}\"}";
    let failure = uc.execute(payload).await.unwrap_err();

    // Inbox row was written before the check; the retry path can mark it.
    assert_eq!(failure.inbox_id, Some(1));
    assert!(matches!(failure.error, CentralError::Validation(_)));
}

#[tokio::test]
async fn disaster_result_outbound_id_derives_from_the_identifier() {
    let outbox = MockReportOutbox::new();
    let rows = outbox.rows_handle();
    let uc = usecase(
        MockMqInbox::new(),
        outbox,
        MockPublishOutbox::with_rows(vec![published_alert("A1")]),
    );

    let payload = "{\"type\":\"DISASTER_RESULT\",\"externalSystemName\":\"ess-one\",\
                   \"rawMessage\":\"{\\\"identifier\\\":\\\"A1\\\",\\\"resultCode\\\":\\\"200\\\"}\"}";
    uc.execute(payload).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].outbound_id, "A1_RPT_1");
    assert_eq!(rows[0].kind, ReportKind::DisasterResult);
}

#[tokio::test]
async fn malformed_payload_fails_with_the_inbox_id() {
    let uc = usecase(
        MockMqInbox::new(),
        MockReportOutbox::new(),
        MockPublishOutbox::new(),
    );

    let failure = uc.execute("not json").await.unwrap_err();
    assert_eq!(failure.inbox_id, Some(1));
    assert!(matches!(failure.error, CentralError::Parsing(_)));
}

#[tokio::test]
async fn inbox_insert_failure_carries_no_inbox_id() {
    let inbox = MockMqInbox {
        fail_insert: true,
        ..Default::default()
    };
    let uc = usecase(inbox, MockReportOutbox::new(), MockPublishOutbox::new());

    let failure = uc.execute("{}").await.unwrap_err();
    assert_eq!(failure.inbox_id, None);
}
