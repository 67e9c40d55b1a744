//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier the registry handles. Type-level
//! distinction keeps an account id from being accepted where a license id
//! or chip id is expected.
//!
//! All types serialize as plain JSON strings and run their validating
//! constructor on deserialization, so a snapshot or request body cannot
//! smuggle in a malformed identifier.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum length of an animal (chip) identifier.
pub const MAX_ANIMAL_ID_LEN: usize = 64;

/// Maximum length of an account identifier.
pub const MAX_ACCOUNT_ID_LEN: usize = 128;

/// Character that marks a directory handle rather than an account id.
pub const HANDLE_MARKER: char = '@';

/// Maximum length of a license identifier.
pub const MAX_LICENSE_ID_LEN: usize = 64;

/// Maximum length of an opaque content reference.
pub const MAX_CONTENT_REF_LEN: usize = 2048;

/// Externally supplied animal identifier, typically a microchip number.
///
/// Allowed alphabet: ASCII alphanumerics plus `.`, `_`, `:` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnimalId(String);

/// A caller identity: owner, veterinarian, or operator.
///
/// `@` is reserved for directory handles and never appears in an account id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

/// Identifier of a professional license held in the license directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseId(String);

/// Opaque reference into the external blob store (metadata, descriptions,
/// death certificates). Never interpreted by the ledger; may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentRef(String);

fn require_non_empty(kind: &'static str, raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty { kind });
    }
    Ok(())
}

fn require_max_len(kind: &'static str, raw: &str, max: usize) -> Result<(), ValidationError> {
    let len = raw.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { kind, max, len });
    }
    Ok(())
}

fn reject_whitespace(kind: &'static str, raw: &str) -> Result<(), ValidationError> {
    match raw.chars().find(|c| c.is_whitespace() || c.is_control()) {
        Some(ch) => Err(ValidationError::InvalidCharacter { kind, ch }),
        None => Ok(()),
    }
}

impl AnimalId {
    /// Validate and wrap a chip identifier. Surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        const KIND: &str = "animal id";
        let raw = raw.as_ref().trim();
        require_non_empty(KIND, raw)?;
        require_max_len(KIND, raw, MAX_ANIMAL_ID_LEN)?;
        if let Some(ch) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-')))
        {
            return Err(ValidationError::InvalidCharacter { kind: KIND, ch });
        }
        Ok(Self(raw.to_string()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AccountId {
    /// Validate and wrap an account identifier. Surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        const KIND: &str = "account id";
        let raw = raw.as_ref().trim();
        require_non_empty(KIND, raw)?;
        require_max_len(KIND, raw, MAX_ACCOUNT_ID_LEN)?;
        reject_whitespace(KIND, raw)?;
        if raw.contains(HANDLE_MARKER) {
            return Err(ValidationError::InvalidCharacter {
                kind: KIND,
                ch: HANDLE_MARKER,
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl LicenseId {
    /// Validate and wrap a license identifier. Surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        const KIND: &str = "license id";
        let raw = raw.as_ref().trim();
        require_non_empty(KIND, raw)?;
        require_max_len(KIND, raw, MAX_LICENSE_ID_LEN)?;
        reject_whitespace(KIND, raw)?;
        Ok(Self(raw.to_string()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ContentRef {
    /// Wrap an opaque content reference. Only the length is checked.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        require_max_len("content reference", &raw, MAX_CONTENT_REF_LEN)?;
        Ok(Self(raw))
    }

    /// The empty reference.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Borrow the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no content is referenced.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

macro_rules! string_newtype_conversions {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = ValidationError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.0
                }
            }

            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl std::str::FromStr for $ty {
                type Err = ValidationError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::new(s)
                }
            }
        )+
    };
}

string_newtype_conversions!(AnimalId, AccountId, LicenseId, ContentRef);
