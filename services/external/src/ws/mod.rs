pub mod session;

pub use session::{AckMessage, AlertEmitter, DisasterEvent, EmitOutcome, WsSessionManager};
