//! Host-interface implementations.

mod memory;

pub use memory::MemoryStore;
