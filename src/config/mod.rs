//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! control plane config (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ControlPlaneConfig (validated, immutable)
//!
//! routing graph snapshot (TOML)
//!     → loader.rs → validation.rs → Dag
//!
//! On graph file change:
//!     watcher.rs detects change
//!     → loader.rs loads new graph
//!     → validation.rs validates
//!     → Dag sent to the route cache observer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - An invalid graph never reaches the cache; the last good one stays

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_graph, ConfigError};
pub use schema::{AdminConfig, ControlPlaneConfig, GraphConfig, LogFormat, ObservabilityConfig};
pub use watcher::GraphWatcher;
