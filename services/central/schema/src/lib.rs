//! sea-orm entities for the central service's inbox/outbox tables.

pub mod connection_logs;
pub mod disaster_publish_logs;
pub mod mq_receive_logs;
pub mod report_transmit_logs;
pub mod tcp_receive_logs;
