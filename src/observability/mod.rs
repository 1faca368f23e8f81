//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → TraceLayer spans per request, tagged with x-request-id
//!
//! Consumers:
//!     → stderr
//! ```

pub mod logging;
