use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{Channel, ExchangeKind};

/// One side's complete queue topology.
///
/// The wait queue has no consumer: messages republished to the retry
/// exchange sit there until `retry_ttl_ms` expires, then dead-letter back
/// into the main exchange and re-enter the normal flow. Terminal failures
/// are nacked off the main queue into the DLX.
#[derive(Debug, Clone)]
pub struct TopologySpec {
    pub main_exchange: String,
    pub exchange_kind: ExchangeKind,
    pub main_queue: String,
    pub binding_key: String,
    pub retry_exchange: String,
    pub wait_queue: String,
    pub dlx: String,
    pub dlq: String,
    /// Routing key stamped on messages dead-lettered off the main queue,
    /// and the DLQ's binding key on the (direct) DLX.
    pub dead_letter_key: String,
    /// For direct main exchanges the wait queue must pin the routing key
    /// explicitly or expiry would drop it. Topic exchanges preserve the
    /// original key and leave this unset.
    pub retry_routing_key: Option<String>,
    pub retry_ttl_ms: i32,
}

fn durable() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        ..Default::default()
    }
}

fn durable_exchange() -> ExchangeDeclareOptions {
    ExchangeDeclareOptions {
        durable: true,
        ..Default::default()
    }
}

/// Declare the full topology on `channel`. Idempotent.
pub async fn declare_topology(channel: &Channel, spec: &TopologySpec) -> Result<(), lapin::Error> {
    channel
        .exchange_declare(
            &spec.main_exchange,
            spec.exchange_kind.clone(),
            durable_exchange(),
            FieldTable::default(),
        )
        .await?;
    channel
        .exchange_declare(
            &spec.retry_exchange,
            spec.exchange_kind.clone(),
            durable_exchange(),
            FieldTable::default(),
        )
        .await?;
    channel
        .exchange_declare(
            &spec.dlx,
            ExchangeKind::Direct,
            durable_exchange(),
            FieldTable::default(),
        )
        .await?;

    let mut main_args = FieldTable::default();
    main_args.insert(
        ShortString::from("x-dead-letter-exchange"),
        AMQPValue::LongString(spec.dlx.clone().into()),
    );
    main_args.insert(
        ShortString::from("x-dead-letter-routing-key"),
        AMQPValue::LongString(spec.dead_letter_key.clone().into()),
    );
    channel
        .queue_declare(&spec.main_queue, durable(), main_args)
        .await?;
    channel
        .queue_bind(
            &spec.main_queue,
            &spec.main_exchange,
            &spec.binding_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    let mut wait_args = FieldTable::default();
    wait_args.insert(
        ShortString::from("x-message-ttl"),
        AMQPValue::LongInt(spec.retry_ttl_ms),
    );
    wait_args.insert(
        ShortString::from("x-dead-letter-exchange"),
        AMQPValue::LongString(spec.main_exchange.clone().into()),
    );
    if let Some(key) = &spec.retry_routing_key {
        wait_args.insert(
            ShortString::from("x-dead-letter-routing-key"),
            AMQPValue::LongString(key.clone().into()),
        );
    }
    channel
        .queue_declare(&spec.wait_queue, durable(), wait_args)
        .await?;
    channel
        .queue_bind(
            &spec.wait_queue,
            &spec.retry_exchange,
            &spec.binding_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_declare(&spec.dlq, durable(), FieldTable::default())
        .await?;
    channel
        .queue_bind(
            &spec.dlq,
            &spec.dlx,
            &spec.dead_letter_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    Ok(())
}
