//! International Standard Book Number.

use core::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use library_core::{DomainError, DomainResult, ValueObject};

const FIELD: &str = "ISBN";
const INVALID: &str = "Invalid ISBN format.";

/// A checksum-valid ISBN-10 or ISBN-13.
///
/// The input is kept verbatim (hyphens included) for display. Comparison and
/// hashing use the canonical form with hyphens and whitespace removed, so
/// `978-0-306-40615-7` and `9780306406157` identify the same book.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookIdentifier {
    value: String,
    canonical: String,
}

impl ValueObject for BookIdentifier {}

impl BookIdentifier {
    pub fn create(value: &str) -> DomainResult<Self> {
        if value.trim().is_empty() {
            return Err(DomainError::null_or_empty(FIELD));
        }

        let canonical: String = value
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect();

        let valid = match canonical.chars().count() {
            10 => isbn10_checksum_holds(&canonical),
            13 => isbn13_checksum_holds(&canonical),
            _ => {
                return Err(DomainError::out_of_range(
                    FIELD,
                    "ISBN must be 10 or 13 characters long.",
                ));
            }
        };
        if !valid {
            return Err(DomainError::invalid_format(FIELD, INVALID));
        }

        Ok(Self {
            value: value.to_string(),
            canonical,
        })
    }

    /// The identifier as it was given.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Digits only (plus a trailing `X` for some ISBN-10s).
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn is_isbn13(&self) -> bool {
        self.canonical.len() == 13
    }
}

/// Weights 10 down to 1; the last character may be an uppercase `X` (ten).
fn isbn10_checksum_holds(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().enumerate() {
        let value = match c {
            '0'..='9' => c as u32 - '0' as u32,
            'X' if i == 9 => 10,
            _ => return false,
        };
        sum += (10 - i as u32) * value;
    }
    sum % 11 == 0
}

/// 978/979 prefix, alternating weights 1 and 3.
fn isbn13_checksum_holds(digits: &str) -> bool {
    if !(digits.starts_with("978") || digits.starts_with("979")) {
        return false;
    }
    let mut sum = 0u32;
    for (i, c) in digits.chars().enumerate() {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        sum += if i % 2 == 0 { d } else { d * 3 };
    }
    sum % 10 == 0
}

impl PartialEq for BookIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for BookIdentifier {}

impl Hash for BookIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl core::fmt::Display for BookIdentifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for BookIdentifier {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::create(&value)
    }
}

impl From<BookIdentifier> for String {
    fn from(value: BookIdentifier) -> Self {
        value.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use library_core::DomainErrorKind;
    use proptest::prelude::*;

    #[test]
    fn accepts_valid_isbns() {
        for raw in [
            "978-0-306-40615-7",
            "978-0-306-40613-3",
            "0-30640-615-2",
            "0-30640-613-6",
            "978-1-4028-9462-6",
            "978-3-16-148410-0",
            "080442957X",
        ] {
            let isbn = BookIdentifier::create(raw).unwrap();
            assert_eq!(isbn.value(), raw);
        }
    }

    #[test]
    fn rejects_bad_checksums_and_prefixes() {
        for raw in ["978-0-306-40615-8", "1-30640-615-2", "940-1-86197-876-9"] {
            let err = BookIdentifier::create(raw).unwrap_err();
            assert_eq!(err.kind(), DomainErrorKind::InvalidFormat, "{raw}");
            assert_eq!(err.to_string(), "Invalid ISBN format.");
        }
    }

    #[test]
    fn rejects_wrong_lengths() {
        let err = BookIdentifier::create("1-314-1-30640-413-2").unwrap_err();
        assert_eq!(err.kind(), DomainErrorKind::OutOfRange);
        assert_eq!(err.to_string(), "ISBN must be 10 or 13 characters long.");
    }

    #[test]
    fn rejects_blank_input() {
        let err = BookIdentifier::create("  ").unwrap_err();
        assert_eq!(err.to_string(), "ISBN cannot be empty.");
    }

    #[test]
    fn x_is_only_allowed_as_the_isbn10_check_character() {
        assert!(BookIdentifier::create("X804429570").is_err());
    }

    #[test]
    fn lowercase_check_character_is_rejected() {
        let err = BookIdentifier::create("080442957x").unwrap_err();
        assert_eq!(err.kind(), DomainErrorKind::InvalidFormat);

        let upper = BookIdentifier::create("080442957X").unwrap();
        let hyphenated = BookIdentifier::create("0-8044-2957-X").unwrap();
        assert_eq!(upper, hyphenated);
    }

    #[test]
    fn equality_ignores_hyphens() {
        let hyphenated = BookIdentifier::create("978-0-306-40615-7").unwrap();
        let bare = BookIdentifier::create("9780306406157").unwrap();
        assert_eq!(hyphenated, bare);
        assert!(hyphenated.is_isbn13());
        assert!(!BookIdentifier::create("0-30640-615-2").unwrap().is_isbn13());
    }

    fn isbn13_check_digit(body: &[u32]) -> u32 {
        let sum: u32 = body
            .iter()
            .enumerate()
            .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
            .sum();
        (10 - sum % 10) % 10
    }

    fn isbn10_check(body: &[u32]) -> u32 {
        let sum: u32 = body.iter().enumerate().map(|(i, d)| (10 - i as u32) * d).sum();
        (11 - sum % 11) % 11
    }

    fn render(digits: &[u32]) -> String {
        digits
            .iter()
            .map(|d| if *d == 10 { "X".to_string() } else { d.to_string() })
            .collect()
    }

    /// Replace the value at `position` with a different digit.
    fn mutate(digits: &mut [u32], position: usize, bump: u32) {
        let current = digits[position] % 10;
        digits[position] = (current + bump) % 10;
    }

    proptest! {
        #[test]
        fn computed_isbn13s_are_accepted(rest in proptest::collection::vec(0u32..10, 9), prefix in prop::sample::select(vec![978u32, 979])) {
            let mut body = vec![prefix / 100, (prefix / 10) % 10, prefix % 10];
            body.extend(rest);
            let check = isbn13_check_digit(&body);
            let raw: String = body.iter().chain(std::iter::once(&check)).map(|d| d.to_string()).collect();
            prop_assert!(BookIdentifier::create(&raw).is_ok());
        }

        #[test]
        fn any_single_digit_change_breaks_an_isbn13(
            rest in proptest::collection::vec(0u32..10, 9),
            prefix in prop::sample::select(vec![978u32, 979]),
            position in 0usize..13,
            bump in 1u32..10,
        ) {
            let mut digits = vec![prefix / 100, (prefix / 10) % 10, prefix % 10];
            digits.extend(rest);
            let check = isbn13_check_digit(&digits);
            digits.push(check);
            prop_assert!(BookIdentifier::create(&render(&digits)).is_ok());

            mutate(&mut digits, position, bump);
            let err = BookIdentifier::create(&render(&digits)).unwrap_err();
            prop_assert_eq!(err.kind(), DomainErrorKind::InvalidFormat);
        }

        #[test]
        fn any_single_digit_change_breaks_an_isbn10(
            body in proptest::collection::vec(0u32..10, 9),
            position in 0usize..10,
            bump in 1u32..10,
        ) {
            let mut digits = body;
            let check = isbn10_check(&digits);
            digits.push(check);
            prop_assert!(BookIdentifier::create(&render(&digits)).is_ok());

            // An `X` check character becomes a plain digit, which also differs.
            mutate(&mut digits, position, bump);
            let err = BookIdentifier::create(&render(&digits)).unwrap_err();
            prop_assert_eq!(err.kind(), DomainErrorKind::InvalidFormat);
        }
    }
}
