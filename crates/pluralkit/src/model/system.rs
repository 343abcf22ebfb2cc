use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use uuid::Uuid;

use super::{
    model_impl, AutoproxyMode, Color, MemberId, Privacy, Synced, SystemId, Timestamp, Timezone,
};

/// A PluralKit system.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub struct System {
    pub id: SystemId,
    #[serde(default)]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub created: Option<Timestamp>,
    /// Only part of the system object in API v1; v2 keeps it in [`SystemSettings`].
    #[serde(default)]
    pub timezone: Option<Timezone>,

    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub description_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub pronoun_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub member_list_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub group_list_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub front_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub front_history_privacy: Privacy,

    #[serde(skip)]
    synced: Synced,
}

model_impl!(
    System,
    "system",
    [
        "name",
        "description",
        "tag",
        "pronouns",
        "avatar_url",
        "banner",
        "color",
        "timezone",
        "description_privacy",
        "pronoun_privacy",
        "member_list_privacy",
        "group_list_privacy",
        "front_privacy",
        "front_history_privacy",
    ]
);

impl PartialEq for System {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for System {}

/// Account-wide settings of the token's system.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub struct SystemSettings {
    #[serde(default)]
    pub timezone: Timezone,
    #[serde(default)]
    pub pings_enabled: Option<bool>,
    /// Hours before a latched autoproxy expires.
    #[serde(default)]
    pub latch_timeout: Option<u32>,
    #[serde(default)]
    pub member_default_private: Option<bool>,
    #[serde(default)]
    pub group_default_private: Option<bool>,
    #[serde(default)]
    pub show_private_info: Option<bool>,
    #[serde(default)]
    pub member_limit: Option<u32>,
    #[serde(default)]
    pub group_limit: Option<u32>,

    #[serde(skip)]
    synced: Synced,
}

model_impl!(
    SystemSettings,
    "system settings",
    [
        "timezone",
        "pings_enabled",
        "latch_timeout",
        "member_default_private",
        "group_default_private",
        "show_private_info",
    ]
);

/// Per-guild settings of the token's system.
#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub struct SystemGuildSettings {
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub guild_id: Option<u64>,
    #[serde(default)]
    pub proxying_enabled: Option<bool>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub tag_enabled: Option<bool>,

    #[serde(skip)]
    synced: Synced,
}

model_impl!(
    SystemGuildSettings,
    "system guild settings",
    ["proxying_enabled", "tag", "tag_enabled"]
);

/// Autoproxy state of the token's system in one guild.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AutoproxySettings {
    #[serde(default)]
    pub autoproxy_mode: AutoproxyMode,
    #[serde(default)]
    pub autoproxy_member: Option<MemberId>,
    #[serde(default)]
    pub last_latch_timestamp: Option<Timestamp>,

    #[serde(skip)]
    synced: Synced,
}

model_impl!(
    AutoproxySettings,
    "autoproxy settings",
    ["autoproxy_mode", "autoproxy_member"]
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{ApiVersion, FromWire, Model};

    fn v2_system() -> serde_json::Value {
        json!({
            "id": "exmpl",
            "uuid": "a8e2c1f0-9b7d-4c3e-8f6a-1d2b3c4e5f60",
            "name": "Example System",
            "description": null,
            "tag": "| Ex",
            "pronouns": null,
            "avatar_url": null,
            "banner": null,
            "color": "FF0000",
            "created": "2020-01-12T02:21:26.274746Z",
            "privacy": {
                "description_privacy": "public",
                "pronoun_privacy": "private",
                "member_list_privacy": "public",
                "group_list_privacy": "public",
                "front_privacy": "public",
                "front_history_privacy": "private"
            }
        })
    }

    #[test]
    fn test_decode_v2() {
        let system = System::from_wire(v2_system(), ApiVersion::V2).unwrap();
        assert_eq!(system.id, "exmpl");
        assert_eq!(system.name.as_deref(), Some("Example System"));
        assert_eq!(system.color.unwrap().hex(), "ff0000");
        assert_eq!(system.pronoun_privacy, Privacy::Private);
        assert!(!system.is_dirty());
    }

    #[test]
    fn test_decode_unauthenticated_v2() {
        let mut raw = v2_system();
        raw["privacy"] = serde_json::Value::Null;
        let system = System::from_wire(raw, ApiVersion::V2).unwrap();
        assert!(system.front_privacy.is_unknown());
        assert_eq!(system.to_patch(ApiVersion::V2).unwrap(), json!({}));
    }

    #[test]
    fn test_decode_v1() {
        let raw = json!({
            "id": "exmpl",
            "name": "Example System",
            "tz": "Europe/Berlin",
            "created": "2020-01-12T02:21:26.274746Z",
            "front_privacy": "private"
        });
        let mut system = System::from_wire(raw, ApiVersion::V1).unwrap();
        assert_eq!(system.timezone.unwrap().name(), "Europe/Berlin");
        assert_eq!(system.front_privacy, Privacy::Private);

        system.timezone = Some(Timezone::parse("UTC").unwrap());
        system.front_privacy = Privacy::Public;
        assert_eq!(
            system.to_patch(ApiVersion::V1).unwrap(),
            json!({ "tz": "UTC", "front_privacy": "public" })
        );
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let err = System::from_wire(json!({ "name": "x" }), ApiVersion::V2).unwrap_err();
        assert!(matches!(err, crate::Error::MalformedResponse { model: "system", .. }));
    }

    #[test]
    fn test_patch_privacy_is_nested_in_v2() {
        let mut system = System::from_wire(v2_system(), ApiVersion::V2).unwrap();
        system.description = Some("hello".to_string());
        system.front_privacy = Privacy::Private;
        system.tag = None;
        assert_eq!(
            system.to_patch(ApiVersion::V2).unwrap(),
            json!({
                "description": "hello",
                "tag": null,
                "privacy": { "front_privacy": "private" }
            })
        );
    }

    #[test]
    fn test_guild_settings_snowflake() {
        let raw = json!({ "guild_id": "466707357099884544", "proxying_enabled": true, "tag": null, "tag_enabled": true });
        let settings = SystemGuildSettings::from_wire(raw, ApiVersion::V2).unwrap();
        assert_eq!(settings.guild_id, Some(466707357099884544));

        let numeric = json!({ "guild_id": 466707357099884544u64 });
        let settings = SystemGuildSettings::from_wire(numeric, ApiVersion::V2).unwrap();
        assert_eq!(settings.guild_id, Some(466707357099884544));
    }

    #[test]
    fn test_autoproxy_patch() {
        let raw = json!({ "autoproxy_mode": "front", "autoproxy_member": null, "last_latch_timestamp": null });
        let mut settings = AutoproxySettings::from_wire(raw, ApiVersion::V2).unwrap();
        settings.autoproxy_mode = AutoproxyMode::Member;
        settings.autoproxy_member = Some(MemberId::parse("abcde").unwrap());
        assert_eq!(
            settings.to_patch(ApiVersion::V2).unwrap(),
            json!({ "autoproxy_mode": "member", "autoproxy_member": "abcde" })
        );
    }
}
