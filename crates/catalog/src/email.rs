//! Author email address.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use library_core::{DomainError, DomainResult, ValueObject};

const FIELD: &str = "Email";
const INVALID: &str = "Invalid email format.";

/// Local part (quoted or dot-atom), `@`, then a dotted domain with an
/// alphabetic top-level label. The dot rules of the local part are checked
/// separately in [`dot_atom_is_well_formed`].
static PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^(?P<local>"(?:[^"\r\\]|\\["\r\\])*"|[-a-z0-9!#$%&'*+/=?^_`{|}~.]*)@[a-z0-9][\w.-]*[a-z0-9]\.[a-z][a-z.]*[a-z]$"#,
    )
});

/// A syntactically valid email address.
///
/// Matching is case-insensitive and the address is stored exactly as given,
/// so equality is by the original string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email {
    value: String,
}

impl ValueObject for Email {}

impl Email {
    pub fn create(value: &str) -> DomainResult<Self> {
        // Whitespace-only input is not empty; the pattern rejects it.
        if value.is_empty() {
            return Err(DomainError::null_or_empty(FIELD));
        }

        let pattern = PATTERN
            .as_ref()
            .map_err(|e| DomainError::invalid_format(FIELD, format!("email pattern: {e}")))?;
        let Some(captures) = pattern.captures(value) else {
            return Err(DomainError::invalid_format(FIELD, INVALID));
        };
        let local = captures.name("local").map(|m| m.as_str()).unwrap_or_default();
        if !local.starts_with('"') && !dot_atom_is_well_formed(local) {
            return Err(DomainError::invalid_format(FIELD, INVALID));
        }

        Ok(Self {
            value: value.to_string(),
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// No leading dot, no trailing dot, no two dots in a row.
fn dot_atom_is_well_formed(local: &str) -> bool {
    !local.starts_with('.') && !local.ends_with('.') && !local.contains("..")
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::create(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use library_core::DomainErrorKind;

    #[test]
    fn accepts_well_formed_addresses() {
        for raw in [
            "jdoe@test.com",
            "janesmiht1@mailinator.com",
            "djones12@test.edu.org",
            "First.Last@Example.COM",
            "\"quoted name\"@example.org",
        ] {
            let email = Email::create(raw).unwrap();
            assert_eq!(email.value(), raw);
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in [
            "jdeo$!2@.com",
            "johndoe",
            "janesmith@",
            "1234567.com",
            ".leading@example.com",
            "trailing.@example.com",
            "double..dot@example.com",
            "someone@example.c0m",
        ] {
            let err = Email::create(raw).unwrap_err();
            assert_eq!(err.kind(), DomainErrorKind::InvalidFormat, "{raw}");
            assert_eq!(err.to_string(), "Invalid email format.");
        }
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(
            Email::create("").unwrap_err(),
            DomainError::null_or_empty("Email")
        );
    }

    #[test]
    fn whitespace_only_input_is_a_format_error() {
        let err = Email::create("   ").unwrap_err();
        assert_eq!(err.kind(), DomainErrorKind::InvalidFormat);
        assert_eq!(err.to_string(), "Invalid email format.");
    }

    #[test]
    fn long_addresses_keep_their_value() {
        let raw = format!("{}@example.com", "a".repeat(250));
        let email = Email::create(&raw).unwrap();
        assert_eq!(email.value(), raw);
    }

    #[test]
    fn equality_is_by_value() {
        assert_eq!(
            Email::create("jdoe@test.com").unwrap(),
            Email::create("jdoe@test.com").unwrap()
        );
        assert_ne!(
            Email::create("jdoe@test.com").unwrap(),
            Email::create("JDOE@test.com").unwrap()
        );
    }

    #[test]
    fn deserializes_through_the_factory() {
        let ok: Email = serde_json::from_str("\"jdoe@test.com\"").unwrap();
        assert_eq!(ok.to_string(), "jdoe@test.com");
        assert!(serde_json::from_str::<Email>("\"johndoe\"").is_err());
    }
}
