//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr (text or JSON lines)
//!     → whatever metrics recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Structured fields, never interpolated credentials
//! - Each logical upload runs inside a span carrying its upload id
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
