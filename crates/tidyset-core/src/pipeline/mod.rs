//! Image batch pipeline components.
//!
//! - **discovery**: Find image files by extension
//! - **decode**: Decode with safety limits and an oversize fallback
//! - **transform**: Copy, convert or letterbox one file
//! - **hash**: Pixel fingerprints
//! - **dedup**: Group and remove duplicates
//! - **naming**: Number allocation and rule-based stems
//! - **rename**: The serialized copy-then-delete rename pass
//! - **retry**: Retry policy for permission errors
//! - **sidecar**: Empty label files
//! - **progress**: Shared progress counter
//! - **channel**: Bounded work queue
//! - **batch**: Orchestrates a run

pub mod batch;
pub mod channel;
pub mod decode;
pub mod dedup;
pub mod discovery;
pub mod hash;
pub mod naming;
pub mod progress;
pub mod rename;
pub mod retry;
pub mod sidecar;
pub mod transform;

// Re-exports for convenient access
pub use batch::{BatchPipeline, RunState};
pub use decode::{DecodedImage, ImageDecoder};
pub use dedup::DuplicateDetector;
pub use discovery::{Depth, FileDiscovery};
pub use hash::Hasher;
pub use naming::{NameAllocator, NamingPolicy, RuleSet};
pub use progress::{ProgressState, ProgressTracker};
pub use rename::{FileOps, LocalFs, Renamer};
pub use retry::RetryPolicy;
pub use sidecar::SidecarWriter;
pub use transform::{ImageTransformer, TransformMode};
