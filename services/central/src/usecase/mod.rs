pub mod disaster_intake;
pub mod disaster_publish;
pub mod report_consume;
pub mod report_transmit;
