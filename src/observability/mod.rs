//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing subsystem produces:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (dispatch / decline counters, route gauges)
//!
//! Consumers:
//!     → Log aggregation (stderr, pretty or JSON)
//!     → Whatever metrics recorder the application installs
//! ```

pub mod logging;
pub mod metrics;
