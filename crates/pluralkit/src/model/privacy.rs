use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A privacy setting.
///
/// The API sends `null` (or leaves the field out) when the caller may not
/// see the setting, which is [`Privacy::Unknown`]. Unknown values are never
/// written back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Privacy {
    Public,
    Private,
    #[default]
    Unknown,
}

impl Privacy {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Privacy::Unknown)
    }

    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Privacy::Public => Some("public"),
            Privacy::Private => Some("private"),
            Privacy::Unknown => None,
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("unknown"))
    }
}

impl FromStr for Privacy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Privacy::Public),
            "private" => Ok(Privacy::Private),
            other => Err(format!("unknown privacy level `{other}`")),
        }
    }
}

impl Serialize for Privacy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_str() {
            Some(s) => serializer.serialize_str(s),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Privacy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Privacy::Unknown),
            Some(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// How a system's messages get proxied without tags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoproxyMode {
    #[default]
    Off,
    Front,
    Latch,
    Member,
}

impl fmt::Display for AutoproxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AutoproxyMode::Off => "off",
            AutoproxyMode::Front => "front",
            AutoproxyMode::Latch => "latch",
            AutoproxyMode::Member => "member",
        })
    }
}

impl FromStr for AutoproxyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(AutoproxyMode::Off),
            "front" => Ok(AutoproxyMode::Front),
            "latch" => Ok(AutoproxyMode::Latch),
            "member" => Ok(AutoproxyMode::Member),
            other => Err(format!("unknown autoproxy mode `{other}`")),
        }
    }
}
