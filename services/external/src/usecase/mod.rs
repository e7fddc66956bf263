pub mod disaster_emit;
pub mod disaster_fanout;
pub mod report_ingress;
pub mod report_publish;
