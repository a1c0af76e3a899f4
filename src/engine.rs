//! Sign-up, log-in, resume and log-out flows on top of [`AccountStore`].
//!
//! The store's credential check deliberately answers only "match" or "no
//! match". The log-in flow adds a secondary lookup to tell the user whether
//! the password was wrong or the email is unknown.

use tracing::{info, warn};

use crate::dto::{NewUser, SessionRecord};
use crate::stores::{AccountStore, KeyValueStore};
use crate::validation::{FormError, LoginForm, SignupForm};
use crate::Error;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error(transparent)]
    Store(#[from] Error),
}

impl AuthError {
    /// Message suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(e) => e.to_string(),
            Self::Store(Error::DuplicateUsername(name)) => format!(
                "Username '{name}' already exists. Please choose a different username."
            ),
            Self::Store(Error::DuplicateEmail(email)) => format!(
                "An account with email '{email}' already exists. Please use a different email or try logging in."
            ),
            Self::Store(Error::StorageRead(_) | Error::StorageWrite(_)) => {
                "Unable to save your information. Please check your device storage and try again."
                    .to_string()
            }
            Self::Store(Error::PasswordHash(_)) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn(SessionRecord),
    /// An account with this email exists but the password did not match.
    WrongPassword,
    /// No account uses this email, but other accounts exist.
    UnknownEmail,
    /// The registry is empty.
    NoAccounts,
}

pub struct AuthEngine<B> {
    store: AccountStore<B>,
}

impl<B: KeyValueStore> AuthEngine<B> {
    pub fn new(store: AccountStore<B>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AccountStore<B> {
        &self.store
    }

    /// Creates the account and signs it in.
    pub async fn sign_up(&self, form: &SignupForm) -> Result<SessionRecord, AuthError> {
        let valid = form.validate()?;
        let user = self
            .store
            .create_user(NewUser::new(valid.username, valid.email, valid.password))
            .await?;

        let session = SessionRecord::from(&user);
        self.store.set_current_session(&session).await?;
        Ok(session)
    }

    pub async fn log_in(&self, form: &LoginForm) -> Result<LoginOutcome, AuthError> {
        let valid = form.validate()?;

        if let Some(user) = self
            .store
            .validate_credentials(&valid.email, &valid.password)
            .await?
        {
            let session = SessionRecord::from(&user);
            self.store.set_current_session(&session).await?;
            return Ok(LoginOutcome::SignedIn(session));
        }

        let users = self.store.list_users().await?;
        let outcome = if users.iter().any(|u| u.email == valid.email) {
            LoginOutcome::WrongPassword
        } else if users.is_empty() {
            LoginOutcome::NoAccounts
        } else {
            LoginOutcome::UnknownEmail
        };
        info!(?outcome, "login rejected");
        Ok(outcome)
    }

    /// Session to resume at start-up. An unreadable session counts as signed
    /// out.
    pub async fn resume(&self) -> Option<SessionRecord> {
        match self.store.get_current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("could not read saved session, starting signed out: {e}");
                None
            }
        }
    }

    pub async fn log_out(&self) -> Result<(), AuthError> {
        self.store.clear_current_session().await?;
        Ok(())
    }

    pub async fn reset(&self) -> Result<(), AuthError> {
        self.store.reset_all_state().await?;
        Ok(())
    }
}
