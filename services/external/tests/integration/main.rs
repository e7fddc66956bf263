mod helpers;

mod disaster_emit_test;
mod disaster_fanout_test;
mod report_publish_test;
