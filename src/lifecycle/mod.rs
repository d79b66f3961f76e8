//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Load graph → Seed cache → Spawn update task → Serve admin
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Update task and admin server stop → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the cache holds a generation before anything serves it
//! - Every long-running task subscribes to one shutdown broadcast

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
