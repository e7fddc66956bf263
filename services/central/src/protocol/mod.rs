//! Wire protocol for the upstream alerting link: 16-byte framed header,
//! XML envelope with a nested CAP 1.2 alert, digest authentication.

pub mod cap;
pub mod digest;
pub mod envelope;
pub mod event_codes;
pub mod frame;
pub mod message;
