use dari_external::error::ExternalError;
use dari_external::usecase::disaster_fanout::DisasterFanoutUseCase;
use dari_domain::status::DeliveryStatus;

use crate::helpers::{MockMqInbox, MockSystems, MockTransmits, test_system};

fn payload(identifier: &str, event_code: &str) -> String {
    serde_json::json!({
        "identifier": identifier,
        "eventCode": event_code,
        "rawMessage": "<data><capInfo/></data>",
    })
    .to_string()
}

#[tokio::test]
async fn should_stage_one_row_per_subscribed_system() {
    let s1 = test_system("ess-one", &["HTW", "EQK"]);
    let s2 = test_system("ess-two", &["HTW"]);
    let s3 = test_system("ess-three", &["EQK"]);

    let inbox = MockMqInbox::new();
    let inbox_rows = inbox.rows_handle();
    let transmits = MockTransmits::sharing_inbox(inbox.rows_handle());
    let transmit_rows = transmits.rows_handle();

    let uc = DisasterFanoutUseCase {
        inbox,
        systems: MockSystems::new(vec![s1.clone(), s2.clone(), s3.clone()]),
        transmits,
    };

    let outcome = uc.execute(&payload("A1", "HTW")).await.unwrap();
    assert_eq!(outcome.staged, 2);

    let rows = transmit_rows.lock().unwrap();
    assert_eq!(rows.len(), 2);
    let targets: Vec<_> = rows.iter().map(|r| r.external_system_id).collect();
    assert!(targets.contains(&s1.id));
    assert!(targets.contains(&s2.id));
    assert!(!targets.contains(&s3.id));
    assert!(rows.iter().all(|r| r.identifier == "A1"));
    assert!(rows.iter().all(|r| r.status == DeliveryStatus::Pending));

    // The inbox row settled inside the same staging step.
    assert_eq!(inbox_rows.lock().unwrap()[0].status, DeliveryStatus::Success);
}

#[tokio::test]
async fn redelivery_collapses_on_the_per_subscriber_key() {
    let s1 = test_system("ess-one", &["HTW"]);

    let inbox = MockMqInbox::new();
    let transmits = MockTransmits::new();
    let transmit_rows = transmits.rows_handle();

    let uc = DisasterFanoutUseCase {
        inbox,
        systems: MockSystems::new(vec![s1]),
        transmits,
    };

    let first = uc.execute(&payload("A1", "HTW")).await.unwrap();
    assert_eq!(first.staged, 1);

    // The broker redelivers the same alert: a second inbox row, zero new
    // delivery rows.
    let second = uc.execute(&payload("A1", "HTW")).await.unwrap();
    assert_eq!(second.staged, 0);
    assert_ne!(first.inbox_id, second.inbox_id);

    assert_eq!(transmit_rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn no_subscriber_means_zero_rows_but_success() {
    let uc = DisasterFanoutUseCase {
        inbox: MockMqInbox::new(),
        systems: MockSystems::new(vec![test_system("ess-one", &["EQK"])]),
        transmits: MockTransmits::new(),
    };

    let outcome = uc.execute(&payload("A2", "HTW")).await.unwrap();
    assert_eq!(outcome.staged, 0);
}

#[tokio::test]
async fn malformed_payload_fails_with_the_inbox_id() {
    let uc = DisasterFanoutUseCase {
        inbox: MockMqInbox::new(),
        systems: MockSystems::new(vec![]),
        transmits: MockTransmits::new(),
    };

    let failure = uc.execute("not json").await.unwrap_err();
    assert_eq!(failure.inbox_id, Some(1));
    assert!(matches!(failure.error, ExternalError::Parsing(_)));
}
