//! Attendance reconciliation engine.
//!
//! The engine owns all writes to the attendance store and is the only
//! component that reads reaction data from the messaging transport. Every
//! store mutation is either an insert-if-absent or a keyed update, so any
//! operation here is safe to retry; convergent retry is the sole recovery
//! mechanism (there is no rollback log).

pub mod config;
pub mod engine;
pub mod error;
pub mod transport;

pub use config::EngineConfig;
pub use engine::{AttendanceSheet, DATE_FORMAT, Engine, ReconcileOutcome};
pub use error::EngineError;
pub use transport::ChatTransport;
