use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Error;

pub mod color;
pub mod group;
pub mod id;
pub mod member;
pub mod message;
pub mod privacy;
pub mod proxy;
pub mod switch;
pub mod system;
pub mod time;
pub mod timezone;
pub(crate) mod wire;

pub use color::Color;
pub use group::Group;
pub use id::{GroupId, MemberId, SwitchId, SystemId};
pub use member::{Member, MemberGuildSettings};
pub use message::Message;
pub use privacy::{AutoproxyMode, Privacy};
pub use proxy::{ProxyTag, ProxyTags};
pub use switch::{Switch, SwitchMembers};
pub use system::{AutoproxySettings, System, SystemGuildSettings, SystemSettings};
pub use time::{Birthday, Timestamp};
pub use timezone::Timezone;

/// Input that was rejected before anything was sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("`{input}` is not a valid {kind} ID")]
    InvalidId { kind: &'static str, input: String },
    #[error("a proxy tag needs a prefix or a suffix")]
    EmptyProxyTag,
    #[error("`{0}` is not a valid color")]
    InvalidColor(String),
    #[error("`{0}` is not a tz database time zone")]
    InvalidTimezone(String),
    #[error("`{0}` is not a valid timestamp")]
    InvalidTimestamp(String),
    #[error("`{0}` is not a valid YYYY-MM-DD birthday")]
    InvalidBirthday(String),
    #[error("`{field}` is {len} characters long, the limit is {max}")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },
    #[error("`{0}` cannot be empty")]
    Required(&'static str),
    #[error("`{0}` needs at least one entry")]
    EmptyList(&'static str),
    #[error("the token is not a valid header value")]
    InvalidToken,
    #[error("the user agent is not a valid header value")]
    InvalidUserAgent,
    #[error("{operation} is not available in API {version}")]
    Unsupported {
        operation: &'static str,
        version: ApiVersion,
    },
    #[error("{0} needs an explicit system ID in API v1")]
    SystemIdRequired(&'static str),
}

/// The two incompatible generations of the PluralKit API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    #[default]
    V2,
}

impl ApiVersion {
    pub fn base_url(self) -> &'static str {
        match self {
            ApiVersion::V1 => "https://api.pluralkit.me/v1",
            ApiVersion::V2 => "https://api.pluralkit.me/v2",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVersion::V1 => f.write_str("v1"),
            ApiVersion::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for ApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(ApiVersion::V1),
            "v2" | "2" => Ok(ApiVersion::V2),
            other => Err(format!("unknown API version `{other}`")),
        }
    }
}

/// Which system a request is about.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SystemRef {
    /// The system owning the client's token.
    Me,
    Id(SystemId),
    /// A Discord account linked to the system.
    Account(u64),
}

impl fmt::Display for SystemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemRef::Me => f.write_str("@me"),
            SystemRef::Id(id) => write!(f, "{id}"),
            SystemRef::Account(account) => write!(f, "{account}"),
        }
    }
}

impl FromStr for SystemRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("@me") {
            return Ok(SystemRef::Me);
        }
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return s.parse().map(SystemRef::Account).map_err(|_| ValidationError::InvalidId {
                kind: "account",
                input: s.to_string(),
            });
        }
        SystemId::parse(s).map(SystemRef::Id)
    }
}

impl TryFrom<&str> for SystemRef {
    type Error = ValidationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SystemId> for SystemRef {
    fn from(id: SystemId) -> Self {
        SystemRef::Id(id)
    }
}

impl From<&SystemId> for SystemRef {
    fn from(id: &SystemId) -> Self {
        SystemRef::Id(id.clone())
    }
}

/// Decoding from the JSON the API sends back.
pub trait FromWire: Sized {
    fn from_wire(value: Value, version: ApiVersion) -> Result<Self, Error>;
}

impl FromWire for () {
    fn from_wire(_: Value, _: ApiVersion) -> Result<Self, Error> {
        Ok(())
    }
}

impl FromWire for Value {
    fn from_wire(value: Value, _: ApiVersion) -> Result<Self, Error> {
        Ok(value)
    }
}

impl<T: FromWire> FromWire for Option<T> {
    fn from_wire(value: Value, version: ApiVersion) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(None),
            value => T::from_wire(value, version).map(Some),
        }
    }
}

impl<T: FromWire> FromWire for Vec<T> {
    fn from_wire(value: Value, version: ApiVersion) -> Result<Self, Error> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| T::from_wire(item, version))
                .collect(),
            other => Err(Error::malformed("list", format!("expected an array, got {other}"))),
        }
    }
}

/// Wire state a model was last synced with.
#[derive(Clone, Debug, Default)]
pub struct Synced(Map<String, Value>);

/// A record that can be written back with a partial update.
///
/// Every model remembers the state it was decoded in (or last written with).
/// [`Model::to_patch`] only emits what changed since then.
pub trait Model: Serialize + serde::de::DeserializeOwned + crate::private::Sealed {
    const NAME: &'static str;
    /// Keys the API accepts in a create or update payload.
    const PATCHABLE: &'static [&'static str];

    #[doc(hidden)]
    fn synced(&self) -> &Synced;
    #[doc(hidden)]
    fn synced_mut(&mut self) -> &mut Synced;

    /// Checks that go beyond what serde enforces.
    #[doc(hidden)]
    fn check_decoded(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn decode(value: Value, version: ApiVersion) -> Result<Self, Error> {
        let mut model: Self = serde_json::from_value(wire::normalize(value, version))
            .map_err(|e| Error::malformed(Self::NAME, e))?;
        model.check_decoded()?;
        model.mark_synced();
        Ok(model)
    }

    /// The full wire representation for `version`.
    fn to_wire(&self, version: ApiVersion) -> Value {
        wire::denormalize(wire::canonical(self), version)
    }

    /// The fields changed since the last sync, shaped for `version`.
    fn to_patch(&self, version: ApiVersion) -> Result<Value, ValidationError> {
        let patch = wire::diff(&self.synced().0, &wire::canonical(self), Self::PATCHABLE)?;
        Ok(wire::denormalize(patch, version))
    }

    /// Every set patchable field, for creating the record.
    fn to_payload(&self, version: ApiVersion) -> Result<Value, ValidationError> {
        let payload = wire::diff(&Map::new(), &wire::canonical(self), Self::PATCHABLE)?;
        Ok(wire::denormalize(payload, version))
    }

    fn is_dirty(&self) -> bool {
        self.to_patch(ApiVersion::V2)
            .map(|patch| patch.as_object().is_some_and(|o| !o.is_empty()))
            .unwrap_or(true)
    }

    /// Treats the current state as written.
    fn mark_synced(&mut self) {
        let current = wire::canonical(self);
        *self.synced_mut() = Synced(current);
    }
}

macro_rules! model_impl {
    ($ty:ty, $name:literal, [$($key:literal),* $(,)?] $(, check = $check:path)?) => {
        impl crate::private::Sealed for $ty {}

        impl crate::model::Model for $ty {
            const NAME: &'static str = $name;
            const PATCHABLE: &'static [&'static str] = &[$($key),*];

            fn synced(&self) -> &crate::model::Synced {
                &self.synced
            }

            fn synced_mut(&mut self) -> &mut crate::model::Synced {
                &mut self.synced
            }

            $(
                fn check_decoded(&mut self) -> Result<(), crate::Error> {
                    $check(self)
                }
            )?
        }

        impl crate::model::FromWire for $ty {
            fn from_wire(
                value: ::serde_json::Value,
                version: crate::model::ApiVersion,
            ) -> Result<Self, crate::Error> {
                <$ty as crate::model::Model>::decode(value, version)
            }
        }
    };
}

pub(crate) use model_impl;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_ref_parse() {
        assert_eq!("@me".parse::<SystemRef>().unwrap(), SystemRef::Me);
        assert_eq!(
            "466378653216014359".parse::<SystemRef>().unwrap(),
            SystemRef::Account(466378653216014359)
        );
        assert_eq!(
            "ABCDE".parse::<SystemRef>().unwrap(),
            SystemRef::Id(SystemId::parse("abcde").unwrap())
        );
        assert!("ab1".parse::<SystemRef>().is_err());
    }

    #[test]
    fn test_api_version() {
        assert_eq!("V1".parse::<ApiVersion>().unwrap(), ApiVersion::V1);
        assert_eq!(ApiVersion::default().base_url(), "https://api.pluralkit.me/v2");
        assert_eq!(serde_json::to_string(&ApiVersion::V1).unwrap(), "\"v1\"");
    }

    #[test]
    fn test_vec_from_wire_rejects_objects() {
        let err = Vec::<Value>::from_wire(serde_json::json!({}), ApiVersion::V2).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}
