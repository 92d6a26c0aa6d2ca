//! A thin wrapper that validates email addresses at construction time.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An email address that was checked for shape when it was created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// The check is deliberately loose (a non-empty local part and domain
    /// around a single '@'): the only authority on whether an address is
    /// real is the mail system, so anything stricter just rejects valid
    /// addresses.
    ///
    /// # Errors
    /// Returns an [Error::InvalidEmail] if `raw_email` does not look like
    /// an email address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let is_valid = match raw_email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !raw_email.contains(char::is_whitespace)
            }
            None => false,
        };

        if is_valid {
            Ok(Self(raw_email.to_owned()))
        } else {
            Err(Error::InvalidEmail(raw_email.to_owned()))
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// This should only be used for strings coming from a trusted source
    /// such as the application's database.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod email_tests {
    use crate::Error;

    use super::Email;

    #[test]
    fn create_email_succeeds() {
        assert!(Email::new("foo@bar.baz").is_ok());
    }

    #[test]
    fn create_email_fails_with_no_at_symbol() {
        assert!(matches!(
            Email::new("foobar.baz"),
            Err(Error::InvalidEmail(_))
        ));
    }

    #[test]
    fn create_email_fails_with_empty_string() {
        assert!(matches!(Email::new(""), Err(Error::InvalidEmail(_))));
    }

    #[test]
    fn create_email_fails_with_empty_domain() {
        assert!(matches!(Email::new("foo@"), Err(Error::InvalidEmail(_))));
    }

    #[test]
    fn create_email_fails_with_whitespace() {
        assert!(matches!(
            Email::new("foo bar@baz.qux"),
            Err(Error::InvalidEmail(_))
        ));
    }
}
