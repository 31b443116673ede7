pub mod filesystem;
pub mod memory;

pub use filesystem::FileSystemBackend;
pub use memory::MemoryBackend;
