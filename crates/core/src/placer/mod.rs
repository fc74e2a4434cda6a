//! Placer module: the copy/move capability behind plan execution.
//!
//! The plan executor hands one [`PlannedOperation`] at a time to a
//! [`Placer`]. The file system implementation guarantees that a destination
//! is either absent or fully written, and that nothing pre-existing is ever
//! replaced.
//!
//! # Features
//!
//! - Copies staged in a temporary sibling and committed atomically
//! - Same-volume moves by link-and-unlink, copy-then-delete across volumes
//! - Optional checksum verification against the source fingerprint
//! - Permission and timestamp preservation
//! - Automatic parent directory creation
//!
//! # Example
//!
//! ```ignore
//! use shelver_core::placer::{FsPlacer, Placer, PlannedOperation};
//!
//! let placer = FsPlacer::with_defaults();
//! let placed = placer.place(&operation).await?;
//! println!("Placed {} ({} bytes)", placed.destination.display(), placed.size_bytes);
//! ```

mod config;
mod error;
mod fs_placer;
mod traits;
mod types;

pub use config::PlacerConfig;
pub use error::PlacerError;
pub use fs_placer::FsPlacer;
pub use traits::Placer;
pub use types::{PlacedFile, PlannedOperation};
