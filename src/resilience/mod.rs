//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Store request to backend:
//!     → backend enforces its request timeout
//!     → On transport failure: retries.rs (attempt budget, delay before next attempt)
//!     → backoff.rs (exponential delay, capped)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Only the binary store is retried; metadata writes are not
//! - Backoff is capped so a single upload never waits unboundedly

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
