//! Account email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty or whitespace only.
    #[error("email cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not of the form `local@domain`.
    #[error("enter a valid email address")]
    Malformed,
}

/// A normalized email address used as the login identifier.
///
/// Surrounding whitespace is trimmed and the domain part is lowercased, so
/// `Cook@Example.COM` and `Cook@example.com` are the same account. The local
/// part keeps its case.
///
/// ```
/// use foodgram_core::Email;
///
/// let email = Email::parse("  Cook@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "Cook@example.com");
///
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("two@@example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an `Email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or does not split into a non-empty local part
    /// and a non-empty domain around exactly one `@`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.rsplit_once('@').ok_or(EmailError::Malformed)?;
        if local.is_empty() || domain.is_empty() || local.contains('@') {
            return Err(EmailError::Malformed);
        }
        if local.chars().any(char::is_whitespace) || domain.chars().any(char::is_whitespace) {
            return Err(EmailError::Malformed);
        }

        Ok(Self(format!("{local}@{}", domain.to_lowercase())))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_is_lowercased() {
        let email = Email::parse("Chef.Anna@Mail.RU").unwrap();
        assert_eq!(email.as_str(), "Chef.Anna@mail.ru");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let email = Email::parse("\tcook@example.com \n").unwrap();
        assert_eq!(email.to_string(), "cook@example.com");
    }

    #[test]
    fn test_rejects_blank() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_rejects_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { max: 254 })
        ));
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["no-at", "@example.com", "cook@", "a@b@c", "co ok@example.com"] {
            assert_eq!(Email::parse(input), Err(EmailError::Malformed), "{input}");
        }
    }

    #[test]
    fn test_deserializes_from_plain_string() {
        let email: Email = serde_json::from_str("\"cook@example.com\"").unwrap();
        assert_eq!(email.into_inner(), "cook@example.com");
    }
}
