use dari_central::usecase::disaster_intake::DisasterIntakeUseCase;
use dari_domain::status::DeliveryStatus;

use crate::helpers::{MockPublishOutbox, MockTcpInbox, notify_body};

fn usecase(
    inbox: MockTcpInbox,
    outbox: MockPublishOutbox,
) -> DisasterIntakeUseCase<MockTcpInbox, MockPublishOutbox> {
    DisasterIntakeUseCase {
        inbox,
        outbox,
        dest_id: "KR.GW01".to_owned(),
    }
}

#[tokio::test]
async fn should_ack_valid_notification_and_stage_publish() {
    let inbox = MockTcpInbox::new();
    let tcp_rows = inbox.rows_handle();
    let outbox = MockPublishOutbox::sharing_inbox(inbox.rows_handle());
    let publish_rows = outbox.rows_handle();
    let uc = usecase(inbox, outbox);

    let reply = uc.execute(&notify_body("T1", 1, "A1", "HTW")).await;

    assert_eq!(reply.result_code.as_deref(), Some("200"));
    assert_eq!(reply.trans_msg_id.as_deref(), Some("T1"));
    assert_eq!(reply.trans_msg_seq, Some(1));

    let ack = reply.alert.expect("ack cap present");
    assert_eq!(ack.msg_type.as_deref(), Some("Ack"));
    assert_eq!(ack.identifier.as_deref(), Some("A1_ACK"));
    assert_eq!(ack.note.as_deref(), Some("000|OK"));
    assert_eq!(
        ack.references.as_deref(),
        Some("cas.go.kr,A1,2024-07-01T09:00:00+09:00")
    );

    let publishes = publish_rows.lock().unwrap();
    assert_eq!(publishes.len(), 1);
    assert_eq!(publishes[0].identifier, "A1");
    assert_eq!(publishes[0].routing_key, "disaster.HTW");
    assert_eq!(publishes[0].status, DeliveryStatus::Pending);

    let inbox_rows = tcp_rows.lock().unwrap();
    assert_eq!(inbox_rows.len(), 1);
    assert_eq!(inbox_rows[0].status, DeliveryStatus::Success);
}

#[tokio::test]
async fn should_nack_unknown_event_code_with_note_220() {
    let inbox = MockTcpInbox::new();
    let tcp_rows = inbox.rows_handle();
    let outbox = MockPublishOutbox::new();
    let publish_rows = outbox.rows_handle();
    let uc = usecase(inbox, outbox);

    let reply = uc.execute(&notify_body("T2", 1, "A2", "XYZ")).await;

    assert_eq!(reply.result_code.as_deref(), Some("400"));
    let note = reply.alert.unwrap().note.unwrap();
    assert!(note.starts_with("220|"), "note was {note}");

    // Inbox row exists and is FAILED; nothing staged.
    let inbox_rows = tcp_rows.lock().unwrap();
    assert_eq!(inbox_rows.len(), 1);
    assert_eq!(inbox_rows[0].status, DeliveryStatus::Failed);
    assert!(publish_rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_nack_duplicate_frame_with_note_300() {
    let inbox = MockTcpInbox::new();
    let tcp_rows = inbox.rows_handle();
    let outbox = MockPublishOutbox::new();
    let publish_rows = outbox.rows_handle();
    let uc = usecase(inbox, outbox);

    let body = notify_body("T1", 1, "A1", "HTW");
    let first = uc.execute(&body).await;
    assert_eq!(first.result_code.as_deref(), Some("200"));

    let second = uc.execute(&body).await;
    assert_eq!(second.result_code.as_deref(), Some("400"));
    let note = second.alert.unwrap().note.unwrap();
    assert!(note.starts_with("300|"), "note was {note}");

    // No new rows anywhere.
    assert_eq!(tcp_rows.lock().unwrap().len(), 1);
    assert_eq!(publish_rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_collapse_same_identifier_under_a_new_frame_id() {
    let inbox = MockTcpInbox::new();
    let outbox = MockPublishOutbox::new();
    let publish_rows = outbox.rows_handle();
    let uc = usecase(inbox, outbox);

    let first = uc.execute(&notify_body("T1", 1, "A1", "HTW")).await;
    assert_eq!(first.result_code.as_deref(), Some("200"));

    // Same alert identifier arrives under a different frame id: passes the
    // frame-level dedup but collapses on the identifier key — still acked.
    let second = uc.execute(&notify_body("T9", 1, "A1", "HTW")).await;
    assert_eq!(second.result_code.as_deref(), Some("200"));

    assert_eq!(publish_rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_nack_unparseable_body_with_note_810() {
    let uc = usecase(MockTcpInbox::new(), MockPublishOutbox::new());

    let reply = uc.execute("this is not xml <<<").await;

    assert_eq!(reply.result_code.as_deref(), Some("400"));
    let ack = reply.alert.unwrap();
    assert!(ack.note.unwrap().starts_with("810|"));
    // Nothing to reference.
    assert!(ack.references.is_none());
    assert!(reply.trans_msg_id.is_none());
}

#[tokio::test]
async fn should_nack_missing_alert_with_note_810() {
    let uc = usecase(MockTcpInbox::new(), MockPublishOutbox::new());

    let reply = uc
        .execute("<data><transMsgId>T3</transMsgId><transMsgSeq>1</transMsgSeq></data>")
        .await;

    assert_eq!(reply.result_code.as_deref(), Some("400"));
    assert!(reply.alert.unwrap().note.unwrap().starts_with("810|"));
    // Correlators echo back even on failure.
    assert_eq!(reply.trans_msg_id.as_deref(), Some("T3"));
    assert_eq!(reply.trans_msg_seq, Some(1));
}

#[tokio::test]
async fn should_nack_missing_cap_field_with_note_210() {
    let inbox = MockTcpInbox::new();
    let tcp_rows = inbox.rows_handle();
    let uc = usecase(inbox, MockPublishOutbox::new());

    // Alert without a sender.
    let body = "<data><transMsgId>T4</transMsgId><transMsgSeq>2</transMsgSeq><capInfo>\
                <alert><identifier>A4</identifier>\
                <sent>2024-07-01T09:00:00+09:00</sent>\
                <info><eventCode><valueName>EVENT_CODE</valueName><value>HTW</value>\
                </eventCode></info></alert></capInfo></data>";
    let reply = uc.execute(body).await;

    assert_eq!(reply.result_code.as_deref(), Some("400"));
    assert!(reply.alert.unwrap().note.unwrap().starts_with("210|"));
    assert_eq!(tcp_rows.lock().unwrap()[0].status, DeliveryStatus::Failed);
}
