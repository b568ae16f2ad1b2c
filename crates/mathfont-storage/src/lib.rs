//! mathfont-storage
//!
//! Key/value storage areas with change notifications. An in-memory area for
//! tests and embedding, and a JSON-file area for the host.

pub mod area;
pub mod change;
pub mod error;
pub mod file;
pub mod memory;

pub use crate::area::{BoxFuture, StorageArea, StorageMap};
pub use crate::change::{AreaName, StorageChange, ValueChange};
pub use crate::error::StorageError;
pub use crate::file::FileStorage;
pub use crate::memory::MemoryStorage;
