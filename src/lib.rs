pub mod config;
mod csv_utils;
mod dto;
mod engine;
mod error;
mod password;
mod runner;
mod stores;
pub mod validation;

pub use dto::{NewUser, SessionRecord, UserRecord, UserRow};
pub use engine::{AuthEngine, AuthError, LoginOutcome};
pub use error::{Error, StorageError};
pub use runner::{run, Command};
pub use stores::{AccountStore, FileStore, KeyValueStore, MemoryStore, SESSION_KEY, USERS_KEY};
