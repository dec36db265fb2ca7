//! In-process adapters for the outbound ports.

pub mod memory_keystore;

pub use memory_keystore::MemoryKeyStore;
