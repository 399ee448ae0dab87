//! Observability: structured JSON logging.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # use hookrelay_server::observability;
//! // In main(), before any logging:
//! observability::init("info");
//! ```

pub mod tracing;

pub use self::tracing::init;
