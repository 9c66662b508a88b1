//! File system abstraction for depscout.
//!
//! Resolution reads manifests (package.json, Podfile.lock) and discovers them
//! under a project folder. Both operations go through the [`FileSystem`] trait
//! so the orchestrator can run against the real disk or an in-memory tree.
//!
//! # Example
//!
//! ```no_run
//! use depscout_fs::{DiscoveryOptions, FileSystem, NativeFileSystem};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let fs = NativeFileSystem::new(".")?;
//! let manifests = fs
//!     .find_files(Path::new("."), &["package.json"], &[], &DiscoveryOptions::default())
//!     .await?;
//! println!("{} manifests", manifests.len());
//! # Ok(())
//! # }
//! ```

mod file_system;
pub use file_system::{build_exclude_set, DiscoveryOptions, FileSystem};

pub mod memory;
pub use memory::MemoryFileSystem;

#[cfg(feature = "native")]
pub mod native;
#[cfg(feature = "native")]
pub use native::NativeFileSystem;
