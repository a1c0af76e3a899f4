//! Field checks run before anything reaches the account store.
//!
//! Rules are checked in a fixed order and the first failure is reported.

/// Minimum accepted password length, in UTF-16 code units.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Username is required")]
    UsernameRequired,
    #[error("Email address is required")]
    EmailRequired,
    #[error("Email is required")]
    LoginEmailRequired,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Please confirm your password")]
    ConfirmationRequired,
    #[error("Passwords do not match. Please check and try again.")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Sign-up fields after validation: username and email trimmed, password
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLogin {
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<ValidSignup, FormError> {
        let username = self.username.trim();
        let email = self.email.trim();

        if username.is_empty() {
            return Err(FormError::UsernameRequired);
        }
        if email.is_empty() {
            return Err(FormError::EmailRequired);
        }
        if self.password.trim().is_empty() {
            return Err(FormError::PasswordRequired);
        }
        if self.confirm_password.trim().is_empty() {
            return Err(FormError::ConfirmationRequired);
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        if self.password.encode_utf16().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort);
        }
        if !is_valid_email(email) {
            return Err(FormError::InvalidEmail);
        }

        Ok(ValidSignup {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

impl LoginForm {
    pub fn validate(&self) -> Result<ValidLogin, FormError> {
        let email = self.email.trim();

        if email.is_empty() {
            return Err(FormError::LoginEmailRequired);
        }
        if self.password.trim().is_empty() {
            return Err(FormError::PasswordRequired);
        }
        if !is_valid_email(email) {
            return Err(FormError::InvalidEmail);
        }

        Ok(ValidLogin {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

/// `local@domain.tld` shape: exactly one `@`, no whitespace, non-empty local
/// part, and some `.` in the domain with something on both sides of it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, email: &str, password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_valid_signup_is_trimmed() {
        let valid = signup("  alice ", " alice@x.com ", " secret1", " secret1")
            .validate()
            .unwrap();
        assert_eq!(
            valid,
            ValidSignup {
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                password: " secret1".to_string(),
            }
        );
    }

    #[test]
    fn test_signup_rule_order() {
        assert_eq!(
            signup(" ", "", "", "").validate(),
            Err(FormError::UsernameRequired)
        );
        assert_eq!(
            signup("alice", " ", "", "").validate(),
            Err(FormError::EmailRequired)
        );
        assert_eq!(
            signup("alice", "bad", "   ", "").validate(),
            Err(FormError::PasswordRequired)
        );
        assert_eq!(
            signup("alice", "bad", "abc", "").validate(),
            Err(FormError::ConfirmationRequired)
        );
        assert_eq!(
            signup("alice", "bad", "abc", "abd").validate(),
            Err(FormError::PasswordMismatch)
        );
        assert_eq!(
            signup("alice", "bad", "abc", "abc").validate(),
            Err(FormError::PasswordTooShort)
        );
        assert_eq!(
            signup("alice", "bad", "secret1", "secret1").validate(),
            Err(FormError::InvalidEmail)
        );
    }

    #[test]
    fn test_password_length_boundary() {
        assert!(signup("a", "a@x.co", "123456", "123456").validate().is_ok());
        assert_eq!(
            signup("a", "a@x.co", "12345", "12345").validate(),
            Err(FormError::PasswordTooShort)
        );
    }

    #[test]
    fn test_password_length_counts_utf16_units() {
        // Each emoji is a surrogate pair, so three of them make six units
        let emoji = "\u{1F600}\u{1F601}\u{1F602}";
        assert!(signup("a", "a@x.co", emoji, emoji).validate().is_ok());

        // Two are still too short
        let emoji = "\u{1F600}\u{1F601}";
        assert_eq!(
            signup("a", "a@x.co", emoji, emoji).validate(),
            Err(FormError::PasswordTooShort)
        );
    }

    #[test]
    fn test_login_rules() {
        let form = |email: &str, password: &str| LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        };

        assert_eq!(form("", "x").validate(), Err(FormError::LoginEmailRequired));
        assert_eq!(form("a@x.com", " ").validate(), Err(FormError::PasswordRequired));
        assert_eq!(form("nope", "x").validate(), Err(FormError::InvalidEmail));
        // No length rule on login
        assert_eq!(
            form(" a@x.com ", "x").validate(),
            Ok(ValidLogin {
                email: "a@x.com".to_string(),
                password: "x".to_string(),
            })
        );
    }

    #[test]
    fn test_email_shape() {
        for good in [
            "a@b.c",
            "alice@x.com",
            "first.last@mail.example.org",
            "a+b@c.io",
            "alice@a.b.",
        ] {
            assert!(is_valid_email(good), "{good} should be valid");
        }
        for bad in [
            "", "alice", "alice@", "@x.com", "alice@x", "alice@.com", "alice@x.",
            "al ice@x.com", "a@b@c.com", "alice@x .com",
        ] {
            assert!(!is_valid_email(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn test_form_error_messages() {
        assert_eq!(FormError::UsernameRequired.to_string(), "Username is required");
        assert_eq!(FormError::EmailRequired.to_string(), "Email address is required");
        assert_eq!(FormError::LoginEmailRequired.to_string(), "Email is required");
        assert_eq!(
            FormError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters long"
        );
    }
}
