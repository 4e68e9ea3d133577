//! Upload subsystem.
//!
//! # Data Flow
//! ```text
//! UploadRequest (name, GLB bytes, placement)
//!     → session.rs: cached availability preflight
//!     → pipeline.rs:
//!         size ceiling, SHA-256 content hash
//!         store attempt 1..=N (backoff between, transport errors only)
//!         component record (once)
//!         entity record (once)
//!     → UploadOutcome | UploadError
//!
//! batch.rs runs many requests through the same uploader, in order.
//! ```

pub mod batch;
pub mod outcome;
pub mod pipeline;
pub mod placement;
pub mod session;

pub use batch::{BatchFailure, BatchReport, BatchSummary};
pub use outcome::{UploadError, UploadOutcome, UploadStage};
pub use pipeline::{content_hash, ProgressCallback, UploadRequest, Uploader};
pub use placement::{ParseVectorError, Placement, Quat, Vec3};
pub use session::UploadSession;
