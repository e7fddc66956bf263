use std::time::Duration;

use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions};
use lapin::types::FieldTable;
use lapin::Channel;
use tracing::{error, info, warn};

use dari_core::shutdown::ShutdownSignal;

use crate::publisher::{BusPublisher, retry_count};
use crate::topology::{TopologySpec, declare_topology};

/// Failure of one delivery, carrying the inbox row the handler managed to
/// write (if any) so the terminal path can mark it.
#[derive(Debug)]
pub struct HandleError {
    pub inbox_id: Option<i64>,
    pub reason: anyhow::Error,
}

impl HandleError {
    pub fn new(inbox_id: Option<i64>, reason: anyhow::Error) -> Self {
        Self { inbox_id, reason }
    }
}

/// Side-specific processing of one delivery.
#[async_trait::async_trait]
pub trait ConsumeHandler: Send + Sync {
    /// Process one delivery end to end. `Ok` acks it; `Err` enters the
    /// retry choreography.
    async fn handle(&self, payload: &[u8], retry_count: u32) -> Result<(), HandleError>;

    /// Called after a delivery has been nacked to the DLQ for good.
    /// Best-effort; must not fail the consumer loop.
    async fn on_dead_letter(&self, inbox_id: Option<i64>, reason: &str);
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    #[error(transparent)]
    Amqp(#[from] lapin::Error),
    #[error("consumer stream ended")]
    StreamEnded,
}

/// Reconnecting wrapper: runs the consumer until shutdown, re-declaring the
/// topology and re-subscribing after transport failures with a fixed pause.
pub async fn supervise_consumer<H: ConsumeHandler>(
    url: &str,
    spec: &TopologySpec,
    consumer_tag: &str,
    handler: &H,
    policy: RetryPolicy,
    mut shutdown: ShutdownSignal,
    reconnect_delay: Duration,
) {
    loop {
        if shutdown.is_triggered() {
            return;
        }
        match run_consumer(url, spec, consumer_tag, handler, policy, shutdown.clone()).await {
            Ok(()) => return,
            Err(err) => {
                error!(queue = %spec.main_queue, error = %err, "consumer failed; reconnecting");
            }
        }
        tokio::select! {
            _ = shutdown.recv() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

async fn run_consumer<H: ConsumeHandler>(
    url: &str,
    spec: &TopologySpec,
    consumer_tag: &str,
    handler: &H,
    policy: RetryPolicy,
    mut shutdown: ShutdownSignal,
) -> Result<(), ConsumerError> {
    let connection = crate::connect(url).await?;
    let channel = connection.create_channel().await?;
    declare_topology(&channel, spec).await?;
    channel
        .basic_qos(1, BasicQosOptions::default())
        .await?;

    let mut consumer = channel
        .basic_consume(
            &spec.main_queue,
            consumer_tag,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await?;
    info!(queue = %spec.main_queue, "consumer started");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                let _ = connection.close(0, "shutdown").await;
                return Ok(());
            }
            next = consumer.next() => match next {
                Some(Ok(delivery)) => {
                    process_delivery(&channel, spec, handler, policy, delivery).await?;
                }
                Some(Err(err)) => return Err(err.into()),
                None => return Err(ConsumerError::StreamEnded),
            }
        }
    }
}

async fn process_delivery<H: ConsumeHandler>(
    channel: &Channel,
    spec: &TopologySpec,
    handler: &H,
    policy: RetryPolicy,
    delivery: Delivery,
) -> Result<(), lapin::Error> {
    let attempt = retry_count(&delivery.properties);

    let failure = match handler.handle(&delivery.data, attempt).await {
        Ok(()) => {
            delivery.ack(BasicAckOptions::default()).await?;
            return Ok(());
        }
        Err(failure) => failure,
    };

    if attempt < policy.max_retries {
        // Republish a fresh copy with a bumped counter, preserving the
        // original routing key, then ack the original delivery.
        let publisher = BusPublisher::new(channel.clone());
        let republish = publisher
            .publish(
                &spec.retry_exchange,
                delivery.routing_key.as_str(),
                &delivery.data,
                Some(attempt + 1),
            )
            .await;
        match republish {
            Ok(()) => {
                warn!(
                    queue = %spec.main_queue,
                    retry = attempt + 1,
                    error = %failure.reason,
                    "delivery failed; scheduled for retry"
                );
                delivery.ack(BasicAckOptions::default()).await?;
            }
            Err(publish_err) => {
                error!(
                    queue = %spec.main_queue,
                    error = %publish_err,
                    "retry republish failed; dead-lettering"
                );
                delivery
                    .nack(BasicNackOptions {
                        requeue: false,
                        ..Default::default()
                    })
                    .await?;
                handler
                    .on_dead_letter(
                        failure.inbox_id,
                        &format!("[Final Failed] retry publish failed: {}", failure.reason),
                    )
                    .await;
            }
        }
    } else {
        error!(
            queue = %spec.main_queue,
            retries = attempt,
            error = %failure.reason,
            "delivery exhausted retries; dead-lettering"
        );
        delivery
            .nack(BasicNackOptions {
                requeue: false,
                ..Default::default()
            })
            .await?;
        handler
            .on_dead_letter(
                failure.inbox_id,
                &format!("[Final Failed] {}", failure.reason),
            )
            .await;
    }

    Ok(())
}
