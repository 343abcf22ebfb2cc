use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ValidationError;

/// A tz database time zone, sent by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timezone(pub Tz);

impl Timezone {
    pub const UTC: Timezone = Timezone(Tz::UTC);

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        input
            .parse::<Tz>()
            .or_else(|_| Tz::from_str_insensitive(input))
            .map(Self)
            .map_err(|_| ValidationError::InvalidTimezone(input.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn tz(&self) -> Tz {
        self.0
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self::UTC
    }
}

impl From<Tz> for Timezone {
    fn from(tz: Tz) -> Self {
        Self(tz)
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Timezone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timezone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Timezone::parse("Europe/Paris").unwrap().name(), "Europe/Paris");
        assert_eq!(Timezone::parse("america/new_york").unwrap().name(), "America/New_York");
        assert_eq!(Timezone::default(), Timezone::UTC);
        assert!(matches!(
            Timezone::parse("Mars/Olympus_Mons"),
            Err(ValidationError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_serde() {
        let tz: Timezone = serde_json::from_str("\"Asia/Tokyo\"").unwrap();
        assert_eq!(tz.tz(), Tz::Asia__Tokyo);
        assert_eq!(serde_json::to_string(&tz).unwrap(), "\"Asia/Tokyo\"");
    }
}
