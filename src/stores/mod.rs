//! Storage layer for accounts. Provides:
//! - The key-value contract the platform must satisfy ([`KeyValueStore`])
//! - An in-memory backend ([`MemoryStore`]) and a directory-backed one ([`FileStore`])
//! - The user registry and current-session pointer on top of them ([`AccountStore`])
//!
//! Values are JSON strings, always replaced whole.

mod accounts;
mod file;
mod kv;
mod memory;

pub use accounts::{AccountStore, SESSION_KEY, USERS_KEY};
pub use file::FileStore;
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
