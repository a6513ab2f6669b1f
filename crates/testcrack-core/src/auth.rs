//! The signed-in user, as an explicit object.
//!
//! [`AuthSession`] is loaded once at start-up, updated at login and logout,
//! and passed by reference to whatever needs the token.

use crate::error::{AuthError, CredentialError, ValidationError};
use crate::storage::{CredentialStore, Credentials, Preferences, UserProfile};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Client-side checks run before a sign-up request is sent.
///
/// # Errors
/// Returns the first failed rule.
pub fn validate_signup(email: &str, password: &str, confirm: &str) -> Result<(), ValidationError> {
    validate_email(email)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// # Errors
/// Returns [`ValidationError::InvalidEmail`] unless the address has text on
/// both sides of a single `@`.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidEmail(email.to_string())),
    }
}

pub struct AuthSession {
    store: Box<dyn CredentialStore>,
    current: Option<Credentials>,
}

impl AuthSession {
    /// Read whatever the store holds. Corrupt records are discarded so a
    /// broken file never locks the user out.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read at all.
    pub fn load(store: Box<dyn CredentialStore>) -> Result<Self, CredentialError> {
        let current = match store.load() {
            Ok(current) => current,
            Err(CredentialError::Corrupt(e)) => {
                tracing::warn!(error = %e, "discarding unreadable credentials");
                store.clear()?;
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self { store, current })
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|c| !c.token.is_empty())
    }

    pub fn token(&self) -> Option<&str> {
        self.current
            .as_ref()
            .map(|c| c.token.as_str())
            .filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.current.as_ref().map(|c| &c.user)
    }

    pub fn preferences(&self) -> Preferences {
        self.current
            .as_ref()
            .map(|c| c.preferences.clone())
            .unwrap_or_default()
    }

    /// Persist a fresh sign-in. Preferences from an earlier login are not
    /// carried over.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write; the in-memory state
    /// is left unchanged in that case.
    pub fn login(&mut self, token: &str, user: UserProfile) -> Result<(), CredentialError> {
        let credentials = Credentials::new(token, user);
        self.store.save(&credentials)?;
        tracing::info!(email = %credentials.user.email, "signed in");
        self.current = Some(credentials);
        Ok(())
    }

    /// Forget the token, profile and preferences.
    ///
    /// # Errors
    /// Returns an error if the store cannot be cleared.
    pub fn logout(&mut self) -> Result<(), CredentialError> {
        self.store.clear()?;
        if self.current.take().is_some() {
            tracing::info!("signed out");
        }
        Ok(())
    }

    /// Remember subject/level for the next attempt. No-op when signed out.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write.
    pub fn set_preferences(&mut self, preferences: Preferences) -> Result<(), CredentialError> {
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        if current.preferences == preferences {
            return Ok(());
        }
        current.preferences = preferences;
        self.store.save(current)
    }

    /// Guard for commands that need a signed-in user.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] when signed out.
    pub fn require_authenticated(&self) -> Result<&Credentials, AuthError> {
        match &self.current {
            Some(c) if !c.token.is_empty() => Ok(c),
            _ => Err(AuthError::NotAuthenticated),
        }
    }

    /// Guard for sign-in / sign-up.
    ///
    /// # Errors
    /// Returns [`AuthError::AlreadyAuthenticated`] when signed in.
    pub fn require_anonymous(&self) -> Result<(), AuthError> {
        match self.user() {
            Some(user) if self.is_authenticated() => {
                Err(AuthError::AlreadyAuthenticated(user.display_name().to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileCredentialStore, MemoryCredentialStore};

    fn user() -> UserProfile {
        UserProfile {
            email: "reader@example.com".into(),
            ..UserProfile::default()
        }
    }

    #[test]
    fn signup_validation_rules() {
        assert!(validate_signup("a@b.co", "secret", "secret").is_ok());
        assert_eq!(
            validate_signup("a@b.co", "secret", "secreT"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_signup("a@b.co", "short", "short"),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
        assert!(matches!(
            validate_signup("nobody", "secret", "secret"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn login_persists_and_logout_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let mut session = AuthSession::load(Box::new(FileCredentialStore::new(&path))).unwrap();
        assert!(!session.is_authenticated());
        session.login("tok", user()).unwrap();
        session
            .set_preferences(Preferences {
                subject: Some("history".into()),
                level: Some("easy".into()),
            })
            .unwrap();

        // Survives a restart.
        let mut reloaded = AuthSession::load(Box::new(FileCredentialStore::new(&path))).unwrap();
        assert_eq!(reloaded.token(), Some("tok"));
        assert_eq!(reloaded.preferences().subject.as_deref(), Some("history"));

        reloaded.logout().unwrap();
        assert!(!reloaded.is_authenticated());
        assert_eq!(reloaded.preferences(), Preferences::default());
        assert!(!path.exists());

        let after = AuthSession::load(Box::new(FileCredentialStore::new(&path))).unwrap();
        assert!(after.user().is_none());
    }

    #[test]
    fn corrupt_credentials_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "garbage").unwrap();
        let session = AuthSession::load(Box::new(FileCredentialStore::new(&path))).unwrap();
        assert!(!session.is_authenticated());
        assert!(!path.exists());
    }

    #[test]
    fn guards_follow_authentication_state() {
        let mut session = AuthSession::load(Box::new(MemoryCredentialStore::new())).unwrap();
        assert!(matches!(
            session.require_authenticated(),
            Err(AuthError::NotAuthenticated)
        ));
        assert!(session.require_anonymous().is_ok());

        session.login("tok", user()).unwrap();
        assert_eq!(session.require_authenticated().unwrap().token, "tok");
        assert!(matches!(
            session.require_anonymous(),
            Err(AuthError::AlreadyAuthenticated(name)) if name == "reader@example.com"
        ));
    }

    #[test]
    fn preferences_need_a_signed_in_user() {
        let mut session = AuthSession::load(Box::new(MemoryCredentialStore::new())).unwrap();
        session
            .set_preferences(Preferences {
                subject: Some("math".into()),
                level: None,
            })
            .unwrap();
        assert_eq!(session.preferences(), Preferences::default());
    }
}
