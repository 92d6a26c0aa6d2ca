//! Password validation and hashing.

use std::fmt::Display;

use bcrypt::{DEFAULT_COST, hash, verify};
use zxcvbn::{Score, zxcvbn};

use crate::Error;

/// The minimum number of characters a password must have.
const MIN_PASSWORD_LENGTH: usize = 8;

/// A password that passed the length and strength checks but has not been
/// hashed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Validate a raw password.
    ///
    /// `user_inputs` should contain strings associated with the user such
    /// as their email address, so that a password built from them scores
    /// poorly.
    ///
    /// # Errors
    /// Returns an [Error::TooWeak] if the password is shorter than
    /// [MIN_PASSWORD_LENGTH] or scores below 3 out of 4 with zxcvbn.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        if raw_password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::TooWeak(format!(
                "passwords must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        let entropy = zxcvbn(raw_password, user_inputs);

        if entropy.score() < Score::Three {
            let reason = entropy
                .feedback()
                .and_then(|feedback| feedback.warning())
                .map(|warning| warning.to_string())
                .unwrap_or_else(|| "use a longer, less predictable password".to_owned());

            return Err(Error::TooWeak(reason));
        }

        Ok(Self(raw_password.to_owned()))
    }

    /// Create a `ValidatedPassword` without running the strength checks.
    ///
    /// This is intended for tests and trusted call sites where the checks
    /// have already happened.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl AsRef<str> for ValidatedPassword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A bcrypt hash of a user's password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a validated password with bcrypt.
    ///
    /// # Errors
    /// Returns an [Error::HashingError] if the underlying hashing library
    /// fails.
    pub fn new(password: ValidatedPassword) -> Result<Self, Error> {
        hash(password.as_ref(), DEFAULT_COST)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Create a new `PasswordHash` from a string that is already a bcrypt
    /// hash.
    ///
    /// This should only be used for strings coming from a trusted source
    /// such as the application's database.
    pub fn new_unchecked(raw_hash: &str) -> Self {
        Self(raw_hash.to_owned())
    }

    /// Check that `raw_password` matches the stored password.
    ///
    /// # Errors
    /// Returns an [Error::HashingError] if the stored string is not a
    /// valid bcrypt hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod validated_password_tests {
    use crate::Error;

    use super::ValidatedPassword;

    #[test]
    fn rejects_short_password() {
        assert!(matches!(
            ValidatedPassword::new("hunter2", &[]),
            Err(Error::TooWeak(_))
        ));
    }

    #[test]
    fn rejects_common_password() {
        assert!(matches!(
            ValidatedPassword::new("password123", &[]),
            Err(Error::TooWeak(_))
        ));
    }

    #[test]
    fn rejects_password_built_from_user_inputs() {
        assert!(matches!(
            ValidatedPassword::new("foo@bar.baz", &["foo@bar.baz"]),
            Err(Error::TooWeak(_))
        ));
    }

    #[test]
    fn accepts_strong_password() {
        assert!(ValidatedPassword::new("correct horse battery staple", &[]).is_ok());
    }
}

#[cfg(test)]
mod password_hash_tests {
    use super::{PasswordHash, ValidatedPassword};

    #[test]
    fn verify_password_succeeds_for_valid_password() {
        let hash = PasswordHash::new_unchecked(
            "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm",
        );

        assert!(hash.verify("okon").unwrap());
    }

    #[test]
    fn verify_password_fails_for_invalid_password() {
        let hash = PasswordHash::new_unchecked(
            "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm",
        );

        assert!(!hash.verify("thewrongpassword").unwrap());
    }

    #[test]
    fn hash_password_produces_verifiable_hash() {
        let password = ValidatedPassword::new_unchecked("a fine strong passphrase");
        let hash = PasswordHash::new(password).unwrap();

        assert!(hash.verify("a fine strong passphrase").unwrap());
        assert!(!hash.verify("the wrong passphrase").unwrap());
    }

    #[test]
    fn hash_duplicate_password_produces_unique_hash() {
        let password = ValidatedPassword::new_unchecked("a fine strong passphrase");
        let hash = PasswordHash::new(password.clone()).unwrap();
        let dupe_hash = PasswordHash::new(password).unwrap();

        assert_ne!(hash, dupe_hash);
    }
}
