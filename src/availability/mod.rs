//! Backend availability subsystem.
//!
//! # Data Flow
//! ```text
//! Caller polls "is the backend up?" (status display, upload preflight):
//!     → cache.rs: fresh entry for the backend identity? return it
//!     → otherwise run backend.probe() once
//!     → store (reachable, now), overwriting any previous entry
//!
//! Explicit refresh:
//!     → invalidate(identity), then the next lookup probes live
//! ```
//!
//! # Design Decisions
//! - Fixed freshness window decouples polling frequency from network I/O
//! - Probe failures are cached as unreachable, so failures never cause request storms
//! - The cache is an explicit object, cloned cheaply via an inner Arc, never a global
//! - No eviction; the map holds at most one entry per configured backend

pub mod cache;

pub use cache::{AvailabilityCache, CachedStatus, DEFAULT_FRESHNESS};
