//! Storage backend implementations.

pub mod filesystem;
pub mod memory;
pub mod s3;

pub use filesystem::FilesystemBackend;
pub use memory::MemoryBackend;
pub use s3::S3Backend;
