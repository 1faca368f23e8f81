//! Reload supervision and hot-swap subsystem.
//!
//! # Data Flow
//! ```text
//! supervisor.rs (loop)
//!     → watcher.rs: baselines for the always-watched files
//!     → session.rs: SessionBuilder::build() → (Router, watch set + baselines)
//!     → watcher.rs: one FileWatcher per always-watched and mapped file
//!     → tasks.rs: run_set() fans the watchers into one ErrorStream
//!     → registry.rs: HandlerRegistry::set(Router)      ◀── HTTP server reads
//!     → wait on the ErrorStream:
//!         error   → forwarded to the process ErrorSink
//!         closed  → "reloading..." → build again
//!         shutdown → drain and stop
//! ```
//!
//! # Design Decisions
//! - Stream closure is the reload signal; an error value is always a fault
//! - The registry is the only state shared between tasks
//! - Each session runs in a child cancellation scope of the process scope

pub mod registry;
pub mod session;
pub mod supervisor;
pub mod tasks;
pub mod watcher;

pub use registry::HandlerRegistry;
pub use session::{BuildError, HandlerSession, SessionBuilder};
pub use supervisor::ReloadSupervisor;
pub use tasks::{forward, run_set, ErrorSender, ErrorSink, ErrorStream, Task, TaskError, TaskFn};
pub use watcher::{detect_change, Change, FileWatcher, Snapshot};
