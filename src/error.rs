//! Errors for the account store and its persistence backends.
//!
//! [`Error`] is what the account store returns:
//! - Uniqueness violations (duplicate username, duplicate email)
//! - Storage failures, split by direction (read vs write)
//!
//! [`StorageError`] is the generic failure kind of a key-value backend.
//! Credential mismatches are not errors; see
//! [`AccountStore::validate_credentials`](crate::AccountStore::validate_credentials).

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("an account with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("failed to read from storage: {0}")]
    StorageRead(#[source] StorageError),

    #[error("failed to write to storage: {0}")]
    StorageWrite(#[source] StorageError),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode value for key `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed value under key `{key}`: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid key `{0}`")]
    InvalidKey(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
