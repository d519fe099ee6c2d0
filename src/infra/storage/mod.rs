//! Durable storage backends for published meshes.

pub mod file;
pub mod memory;

pub use file::FileBlobStore;
pub use memory::InMemoryBlobStore;
