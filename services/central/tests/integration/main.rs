mod helpers;

mod disaster_intake_test;
mod report_consume_test;
