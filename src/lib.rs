//! Route discovery control plane library.
//!
//! Turns routing graph snapshots into versioned route configuration
//! resources for a proxy's route discovery service.

pub mod admin;
pub mod config;
pub mod dag;
pub mod lifecycle;
pub mod observability;
pub mod protocol;
pub mod sorter;
pub mod xdscache;

pub use config::schema::ControlPlaneConfig;
pub use dag::Dag;
pub use lifecycle::Shutdown;
pub use xdscache::{Observer, ResourceCache, RouteCache};
