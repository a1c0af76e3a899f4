use clap::Subcommand;
use std::error::Error;
use std::io::Write;
use tracing::debug;

use crate::{
    csv_utils::write_csv,
    dto::UserRow,
    engine::{AuthEngine, AuthError, LoginOutcome},
    stores::KeyValueStore,
    validation::{LoginForm, SignupForm},
};

type Result<T, E = Box<dyn Error + Send + Sync>> = std::result::Result<T, E>;

/// Read when `--password`/`--confirm-password` are omitted, keeping secrets
/// out of the process list and shell history.
pub const PASSWORD_ENV: &str = "LOCAL_ACCOUNTS_PASSWORD";

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an account and sign in to it
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: String,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        confirm_password: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List registered accounts as CSV
    Users,
    /// Remove every account and the current session
    Reset,
}

/// Runs one command against the engine and writes the result to the provided writer.
///
/// # Errors
/// Returns an error if:
/// * The form is invalid or the account already exists
/// * Log-in was rejected
/// * Storage could not be read or written
/// * Writing to the output fails
pub async fn run<B, W>(engine: &AuthEngine<B>, command: Command, mut writer: W) -> Result<()>
where
    B: KeyValueStore,
    W: Write,
{
    match command {
        Command::Signup {
            username,
            email,
            password,
            confirm_password,
        } => {
            let form = SignupForm {
                username,
                email,
                password,
                confirm_password,
            };
            let session = engine.sign_up(&form).await.map_err(user_facing)?;
            writeln!(
                writer,
                "Welcome, {}! Signed in as {}.",
                session.username, session.email
            )?;
        }
        Command::Login { email, password } => {
            let form = LoginForm { email, password };
            match engine.log_in(&form).await.map_err(user_facing)? {
                LoginOutcome::SignedIn(session) => {
                    writeln!(writer, "Welcome back, {}!", session.username)?;
                }
                LoginOutcome::WrongPassword => {
                    return Err("The password you entered is incorrect. \
                        Please check your password and try again."
                        .into());
                }
                LoginOutcome::UnknownEmail => {
                    return Err(format!(
                        "We couldn't find an account with email \"{}\". \
                         Check the spelling or create a new account with `signup`.",
                        form.email.trim()
                    )
                    .into());
                }
                LoginOutcome::NoAccounts => {
                    return Err(format!(
                        "No accounts exist yet. Create one for \"{}\" with `signup`.",
                        form.email.trim()
                    )
                    .into());
                }
            }
        }
        Command::Logout => {
            engine.log_out().await.map_err(user_facing)?;
            writeln!(writer, "Signed out.")?;
        }
        Command::Whoami => match engine.resume().await {
            Some(session) => writeln!(
                writer,
                "{} <{}> (id {})",
                session.username, session.email, session.id
            )?,
            None => writeln!(writer, "Not signed in.")?,
        },
        Command::Users => {
            let users = engine
                .store()
                .list_users()
                .await
                .map_err(|e| user_facing(e.into()))?;
            if users.is_empty() {
                writeln!(writer, "No accounts.")?;
            } else {
                write_csv(&mut writer, users.iter().map(UserRow::from))?;
            }
        }
        Command::Reset => {
            engine.reset().await.map_err(user_facing)?;
            writeln!(writer, "All account data removed.")?;
        }
    }
    Ok(())
}

fn user_facing(err: AuthError) -> Box<dyn Error + Send + Sync> {
    debug!("command failed: {err}");
    err.user_message().into()
}
