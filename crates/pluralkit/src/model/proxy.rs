use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Text around a message that marks it as sent by a member.
///
/// At least one of prefix and suffix is set; empty strings count as unset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawProxyTag")]
pub struct ProxyTag {
    prefix: Option<String>,
    suffix: Option<String>,
}

#[derive(Deserialize)]
struct RawProxyTag {
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    suffix: Option<String>,
}

impl TryFrom<RawProxyTag> for ProxyTag {
    type Error = ValidationError;

    fn try_from(raw: RawProxyTag) -> Result<Self, Self::Error> {
        Self::new(raw.prefix, raw.suffix)
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

impl ProxyTag {
    pub fn new(
        prefix: Option<impl Into<String>>,
        suffix: Option<impl Into<String>>,
    ) -> Result<Self, ValidationError> {
        let prefix = non_empty(prefix.map(Into::into));
        let suffix = non_empty(suffix.map(Into::into));
        if prefix.is_none() && suffix.is_none() {
            return Err(ValidationError::EmptyProxyTag);
        }
        Ok(Self { prefix, suffix })
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Whether `text` would be proxied by this tag.
    pub fn matches(&self, text: &str) -> bool {
        let prefix = self.prefix().unwrap_or_default();
        let suffix = self.suffix().unwrap_or_default();
        text.len() >= prefix.len() + suffix.len()
            && text.starts_with(prefix)
            && text.ends_with(suffix)
    }
}

impl fmt::Display for ProxyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}text{}",
            self.prefix().unwrap_or_default(),
            self.suffix().unwrap_or_default()
        )
    }
}

/// A member's proxy tags. Order is kept, equality ignores it.
#[derive(Clone, Debug, Default, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyTags(Vec<ProxyTag>);

impl ProxyTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: ProxyTag) {
        if !self.0.contains(&tag) {
            self.0.push(tag);
        }
    }

    pub fn remove(&mut self, tag: &ProxyTag) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProxyTag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any tag matches `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.0.iter().any(|tag| tag.matches(text))
    }
}

impl PartialEq for ProxyTags {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().all(|t| other.0.contains(t)) && other.0.iter().all(|t| self.0.contains(t))
    }
}

impl FromIterator<ProxyTag> for ProxyTags {
    fn from_iter<I: IntoIterator<Item = ProxyTag>>(iter: I) -> Self {
        let mut tags = Self::new();
        for tag in iter {
            tags.push(tag);
        }
        tags
    }
}

impl IntoIterator for ProxyTags {
    type Item = ProxyTag;
    type IntoIter = std::vec::IntoIter<ProxyTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ProxyTags {
    type Item = &'a ProxyTag;
    type IntoIter = std::slice::Iter<'a, ProxyTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
