//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Apply arguments → Resolve bind → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal or fatal error → Cancel root scope → Drain tasks → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Logged only
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then arguments, then listener
//! - One cancellation scope for the whole process

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::spawn_signal_handler;
pub use startup::{apply_arguments, bind_listener};
