//! sea-orm entities for the external service: the subscriber registry and
//! its inbox/outbox tables.

pub mod api_receive_logs;
pub mod connection_logs;
pub mod device_status_logs;
pub mod devices;
pub mod disaster_transmit_logs;
pub mod external_systems;
pub mod mq_receive_logs;
pub mod report_publish_logs;
