use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use uuid::Uuid;

use super::{
    model_impl, Birthday, Color, MemberId, Privacy, ProxyTags, Synced, SystemId, Timestamp,
    ValidationError,
};
use crate::Error;

/// A system member.
///
/// Members built with [`Member::new`] have no ID until they are created.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Member {
    #[serde(default)]
    pub id: Option<MemberId>,
    #[serde(default)]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub system: Option<SystemId>,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
    #[serde(default)]
    pub birthday: Option<Birthday>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub webhook_avatar_url: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub proxy_tags: ProxyTags,
    #[serde(default)]
    pub keep_proxy: Option<bool>,
    #[serde(default)]
    pub tts: Option<bool>,
    #[serde(default)]
    pub autoproxy_enabled: Option<bool>,
    #[serde(default)]
    pub created: Option<Timestamp>,
    /// Only visible to the member's own system.
    #[serde(default)]
    pub message_count: Option<u64>,
    #[serde(default)]
    pub last_message_timestamp: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub visibility: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub name_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub description_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub birthday_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub pronoun_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub avatar_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub metadata_privacy: Privacy,

    #[serde(skip)]
    synced: Synced,
}

model_impl!(
    Member,
    "member",
    [
        "name",
        "display_name",
        "description",
        "pronouns",
        "birthday",
        "avatar_url",
        "webhook_avatar_url",
        "banner",
        "color",
        "proxy_tags",
        "keep_proxy",
        "tts",
        "autoproxy_enabled",
        "visibility",
        "name_privacy",
        "description_privacy",
        "birthday_privacy",
        "pronoun_privacy",
        "avatar_privacy",
        "metadata_privacy",
    ],
    check = Member::require_id
);

impl Member {
    /// A member that does not exist yet, for [`create_member`](crate::Client::create_member).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn check_new(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required("name"));
        }
        Ok(())
    }

    fn require_id(&mut self) -> Result<(), Error> {
        if self.id.is_none() {
            return Err(Error::malformed("member", "missing field `id`"));
        }
        Ok(())
    }

    /// The name shown on proxied messages.
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => std::ptr::eq(self, other),
        }
    }
}

/// Per-guild overrides for a member.
#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub struct MemberGuildSettings {
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub guild_id: Option<u64>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,

    #[serde(skip)]
    synced: Synced,
}

model_impl!(
    MemberGuildSettings,
    "member guild settings",
    ["display_name", "avatar_url"]
);
