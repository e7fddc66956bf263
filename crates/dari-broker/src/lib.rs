//! AMQP plumbing shared by both Dari services.
//!
//! Each side of the bus runs the same shape: a main exchange/queue pair, a
//! retry exchange whose wait queue dead-letters expired messages back into
//! the main exchange, and a DLX/DLQ pair for terminal failures. Consumers
//! run in manual-ack mode and drive the retry choreography through the
//! `x-retry-count` header.

pub mod consumer;
pub mod publisher;
pub mod topology;

pub use consumer::{ConsumeHandler, ConsumerError, HandleError, RetryPolicy, supervise_consumer};
pub use publisher::BusPublisher;
pub use topology::{TopologySpec, declare_topology};

use lapin::{Connection, ConnectionProperties};

/// Open an AMQP connection.
pub async fn connect(url: &str) -> Result<Connection, lapin::Error> {
    Connection::connect(url, ConnectionProperties::default()).await
}
