use std::time::Duration;

use uuid::Uuid;

use dari_domain::status::DeliveryStatus;
use dari_external::usecase::disaster_emit::DisasterEmitEngine;
use dari_external::ws::EmitOutcome;

use crate::helpers::{MockEmitter, MockTransmits, transmit_row};

fn engine(
    transmits: MockTransmits,
    emitter: MockEmitter,
) -> DisasterEmitEngine<MockTransmits, MockEmitter> {
    DisasterEmitEngine {
        transmits,
        emitter,
        max_retries: 3,
        ack_timeout: Duration::from_millis(50),
    }
}

#[tokio::test]
async fn ack_settles_the_row() {
    let subscriber = Uuid::new_v4();
    let transmits = MockTransmits::with_rows(vec![transmit_row(1, subscriber, "A1")]);
    let rows = transmits.rows_handle();
    let emitter = MockEmitter::new(&[subscriber], vec![EmitOutcome::Ack]);
    let emitted = emitter.emitted_handle();

    engine(transmits, emitter).drive(1).await.unwrap();

    assert_eq!(rows.lock().unwrap()[0].status, DeliveryStatus::Success);
    let emitted = emitted.lock().unwrap();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].1.log_id, 1);
    assert_eq!(emitted[0].1.identifier, "A1");
}

#[tokio::test]
async fn offline_subscriber_leaves_the_row_pending_without_an_attempt() {
    let subscriber = Uuid::new_v4();
    let transmits = MockTransmits::with_rows(vec![transmit_row(1, subscriber, "A1")]);
    let rows = transmits.rows_handle();
    let emitter = MockEmitter::new(&[], vec![]);
    let emitted = emitter.emitted_handle();

    engine(transmits, emitter).drive(1).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].status, DeliveryStatus::Pending);
    assert_eq!(rows[0].retry_count, 0);
    assert!(emitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stale_sent_row_downgrades_to_pending_when_offline() {
    let subscriber = Uuid::new_v4();
    let mut row = transmit_row(1, subscriber, "A1");
    row.status = DeliveryStatus::Sent;
    let transmits = MockTransmits::with_rows(vec![row]);
    let rows = transmits.rows_handle();

    engine(transmits, MockEmitter::new(&[], vec![]))
        .drive(1)
        .await
        .unwrap();

    assert_eq!(rows.lock().unwrap()[0].status, DeliveryStatus::Pending);
}

#[tokio::test]
async fn timeout_charges_a_retry_and_returns_to_pending() {
    let subscriber = Uuid::new_v4();
    let transmits = MockTransmits::with_rows(vec![transmit_row(1, subscriber, "A1")]);
    let rows = transmits.rows_handle();
    let emitter = MockEmitter::new(&[subscriber], vec![EmitOutcome::Timeout]);

    engine(transmits, emitter).drive(1).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].status, DeliveryStatus::Pending);
    assert_eq!(rows[0].retry_count, 1);
}

#[tokio::test]
async fn nack_charges_a_retry_and_returns_to_pending() {
    let subscriber = Uuid::new_v4();
    let transmits = MockTransmits::with_rows(vec![transmit_row(1, subscriber, "A1")]);
    let rows = transmits.rows_handle();
    let emitter = MockEmitter::new(
        &[subscriber],
        vec![EmitOutcome::Nack("storage full".to_owned())],
    );

    engine(transmits, emitter).drive(1).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].status, DeliveryStatus::Pending);
    assert_eq!(rows[0].retry_count, 1);
}

#[tokio::test]
async fn row_at_the_retry_limit_fails_without_an_attempt() {
    let subscriber = Uuid::new_v4();
    let mut row = transmit_row(1, subscriber, "A1");
    row.retry_count = 3;
    let transmits = MockTransmits::with_rows(vec![row]);
    let rows = transmits.rows_handle();
    let emitter = MockEmitter::new(&[subscriber], vec![EmitOutcome::Ack]);
    let emitted = emitter.emitted_handle();

    engine(transmits, emitter).drive(1).await.unwrap();

    assert_eq!(rows.lock().unwrap()[0].status, DeliveryStatus::Failed);
    assert!(emitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn three_timeouts_then_the_next_poll_fails_the_row() {
    let subscriber = Uuid::new_v4();
    let transmits = MockTransmits::with_rows(vec![transmit_row(1, subscriber, "A1")]);
    let rows = transmits.rows_handle();
    let emitter = MockEmitter::new(
        &[subscriber],
        vec![
            EmitOutcome::Timeout,
            EmitOutcome::Timeout,
            EmitOutcome::Timeout,
        ],
    );
    let engine = engine(transmits, emitter);

    for _ in 0..3 {
        engine.drive(1).await.unwrap();
    }
    {
        let rows = rows.lock().unwrap();
        assert_eq!(rows[0].retry_count, 3);
        assert_eq!(rows[0].status, DeliveryStatus::Pending);
    }

    // Fourth poll: the counter is at the limit; no further send happens.
    engine.drive(1).await.unwrap();
    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].status, DeliveryStatus::Failed);
    assert_eq!(rows[0].retry_count, 3);
}

#[tokio::test]
async fn terminal_rows_are_never_touched() {
    let subscriber = Uuid::new_v4();
    let mut success = transmit_row(1, subscriber, "A1");
    success.status = DeliveryStatus::Success;
    let mut failed = transmit_row(2, subscriber, "A2");
    failed.status = DeliveryStatus::Failed;
    let transmits = MockTransmits::with_rows(vec![success, failed]);
    let rows = transmits.rows_handle();
    let emitter = MockEmitter::new(&[subscriber], vec![EmitOutcome::Ack]);
    let emitted = emitter.emitted_handle();

    let engine = engine(transmits, emitter);
    engine.drive(1).await.unwrap();
    engine.drive(2).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].status, DeliveryStatus::Success);
    assert_eq!(rows[1].status, DeliveryStatus::Failed);
    assert!(emitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn socket_lost_between_check_and_emit_charges_no_retry() {
    let subscriber = Uuid::new_v4();
    let transmits = MockTransmits::with_rows(vec![transmit_row(1, subscriber, "A1")]);
    let rows = transmits.rows_handle();
    // Connected per the map, but the emit itself reports NoSocket.
    let emitter = MockEmitter::new(&[subscriber], vec![EmitOutcome::NoSocket]);

    engine(transmits, emitter).drive(1).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].status, DeliveryStatus::Pending);
    assert_eq!(rows[0].retry_count, 0);
}
