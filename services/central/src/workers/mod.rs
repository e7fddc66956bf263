//! Outbox pollers. Fixed period, bounded batch, bounded concurrency, and a
//! full settle before the next tick — ticks never overlap themselves.

pub mod disaster_publish;
pub mod report_transmit;

/// Rows fetched per tick.
pub const BATCH_SIZE: u64 = 50;

/// Concurrent deliveries per worker.
pub const CONCURRENCY: usize = 5;
