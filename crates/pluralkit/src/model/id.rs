use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// Normalizes a short ID (`abcde`, `abcdef`, `abc-def`) or a UUID.
fn normalize(kind: &'static str, input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();

    if let Ok(uuid) = Uuid::try_parse(trimmed) {
        return Ok(uuid.hyphenated().to_string());
    }

    let compact = match trimmed.as_bytes() {
        [a, b, c, b'-', rest @ ..] if rest.len() == 3 => {
            let mut s = String::with_capacity(6);
            s.extend([*a, *b, *c].map(char::from));
            s.push_str(&trimmed[4..]);
            s
        }
        _ => trimmed.to_string(),
    };

    if matches!(compact.len(), 5 | 6) && compact.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(compact.to_ascii_lowercase())
    } else {
        Err(ValidationError::InvalidId {
            kind,
            input: input.to_string(),
        })
    }
}

macro_rules! short_id {
    ($ty:ident, $kind:literal) => {
        #[doc = concat!("A ", $kind, " reference: a 5 or 6 letter ID, or (API v2) the ", $kind, "'s UUID.")]
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $ty(String);

        impl $ty {
            pub fn parse(input: &str) -> Result<Self, ValidationError> {
                normalize($kind, input).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_uuid(&self) -> bool {
                self.0.len() > 6
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = ValidationError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl From<&$ty> for $ty {
            fn from(id: &$ty) -> Self {
                id.clone()
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> String {
                id.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

short_id!(SystemId, "system");
short_id!(MemberId, "member");
short_id!(GroupId, "group");

/// Switches only have UUIDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchId(pub Uuid);

impl SwitchId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Uuid::try_parse(input.trim())
            .map(Self)
            .map_err(|_| ValidationError::InvalidId {
                kind: "switch",
                input: input.to_string(),
            })
    }
}

impl TryFrom<&str> for SwitchId {
    type Error = ValidationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<&SwitchId> for SwitchId {
    fn from(id: &SwitchId) -> Self {
        *id
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SwitchId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
