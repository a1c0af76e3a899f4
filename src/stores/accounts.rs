use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::KeyValueStore;
use crate::dto::{NewUser, SessionRecord, UserRecord};
use crate::password::{burn, hash_password, offload, verify_password};
use crate::{Error, StorageError};

/// Key holding the JSON array of every [`UserRecord`], in insertion order.
pub const USERS_KEY: &str = "users";
/// Key holding the JSON object of the single active [`SessionRecord`].
pub const SESSION_KEY: &str = "current_session";

/// Owns the user registry and the current-session pointer.
///
/// Both collections are always replaced wholesale. Absent data reads as empty;
/// unreadable data is reported as [`Error::StorageRead`] and the caller picks
/// the fallback.
pub struct AccountStore<B> {
    backend: B,
    /// Held across the read-check-write of the registry so that concurrent
    /// creates cannot both pass the uniqueness checks.
    registry_lock: Mutex<()>,
}

impl<B: KeyValueStore> AccountStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            registry_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// All registered users, insertion order preserved.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, Error> {
        Ok(self.read_json(USERS_KEY).await?.unwrap_or_default())
    }

    /// Registers a new user and returns it with its freshly assigned `id`.
    ///
    /// Username uniqueness is checked before email uniqueness. Both are exact,
    /// case-sensitive matches. The registry is not touched unless every check
    /// passes, and an unreadable registry is never overwritten.
    pub async fn create_user(&self, candidate: NewUser) -> Result<UserRecord, Error> {
        let NewUser {
            username,
            email,
            password,
        } = candidate;
        // Hashed before taking the lock so concurrent creates don't queue
        // behind each other's hashing
        let password_hash = offload(move || hash_password(&password)).await??;

        let _guard = self.registry_lock.lock().await;
        let mut users = self.list_users().await?;

        if users.iter().any(|u| u.username == username) {
            return Err(Error::DuplicateUsername(username));
        }
        if users.iter().any(|u| u.email == email) {
            return Err(Error::DuplicateEmail(email));
        }

        let user = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
        };
        users.push(user.clone());
        self.write_json(USERS_KEY, &users).await?;

        info!(id = %user.id, username = %user.username, "created user");
        Ok(user)
    }

    /// First user whose email matches exactly, if any.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, Error> {
        Ok(self.list_users().await?.into_iter().find(|u| u.email == email))
    }

    /// Returns the user whose email and password both match, or `None`.
    ///
    /// `None` does not say whether the email was unknown or the password was
    /// wrong.
    pub async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, Error> {
        let matching_email: Vec<UserRecord> = self
            .list_users()
            .await?
            .into_iter()
            .filter(|u| u.email == email)
            .collect();
        if matching_email.is_empty() {
            debug!("no user with that email");
        }

        let password = password.to_owned();
        offload(move || {
            if matching_email.is_empty() {
                burn(&password);
                return None;
            }
            matching_email
                .into_iter()
                .find(|u| verify_password(&password, &u.password_hash))
        })
        .await
    }

    /// Replaces any previous session unconditionally. The session is not
    /// checked against the registry.
    pub async fn set_current_session(&self, session: &SessionRecord) -> Result<(), Error> {
        self.write_json(SESSION_KEY, session).await?;
        info!(id = %session.id, username = %session.username, "session started");
        Ok(())
    }

    pub async fn get_current_session(&self) -> Result<Option<SessionRecord>, Error> {
        self.read_json(SESSION_KEY).await
    }

    /// Idempotent.
    pub async fn clear_current_session(&self) -> Result<(), Error> {
        self.backend
            .remove(SESSION_KEY)
            .await
            .map_err(Error::StorageWrite)?;
        info!("session cleared");
        Ok(())
    }

    /// Removes the registry and the session. Meant for reset tooling.
    pub async fn reset_all_state(&self) -> Result<(), Error> {
        let _guard = self.registry_lock.lock().await;
        self.backend
            .remove_many(&[USERS_KEY, SESSION_KEY])
            .await
            .map_err(Error::StorageWrite)?;
        info!("all account state removed");
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        let Some(raw) = self.backend.get(key).await.map_err(Error::StorageRead)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| {
                Error::StorageRead(StorageError::Malformed {
                    key: key.to_string(),
                    source,
                })
            })
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), Error> {
        let raw = serde_json::to_string(value).map_err(|source| {
            Error::StorageWrite(StorageError::Encode {
                key: key.to_string(),
                source,
            })
        })?;
        self.backend
            .set(key, raw)
            .await
            .map_err(Error::StorageWrite)
    }
}
