use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{model_impl, Color, GroupId, MemberId, Privacy, Synced, SystemId, Timestamp, ValidationError};
use crate::Error;

/// A group of members (API v2 only).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Group {
    #[serde(default)]
    pub id: Option<GroupId>,
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
    pub icon: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub created: Option<Timestamp>,
    /// Only filled in when groups are listed with their members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<MemberId>>,

    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub name_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub description_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub icon_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub list_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub metadata_privacy: Privacy,
    #[serde(default, skip_serializing_if = "Privacy::is_unknown")]
    pub visibility: Privacy,

    #[serde(skip)]
    synced: Synced,
}

model_impl!(
    Group,
    "group",
    [
        "name",
        "display_name",
        "description",
        "icon",
        "banner",
        "color",
        "name_privacy",
        "description_privacy",
        "icon_privacy",
        "list_privacy",
        "metadata_privacy",
        "visibility",
    ],
    check = Group::require_id
);

impl Group {
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
            return Err(Error::malformed("group", "missing field `id`"));
        }
        Ok(())
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => std::ptr::eq(self, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{ApiVersion, FromWire, Model};

    #[test]
    fn test_decode_with_members() {
        let raw = json!({
            "id": "grpaa",
            "uuid": "0e4f7c2a-3b1d-4e5f-a6b7-c8d9e0f1a2b3",
            "system": "exmpl",
            "name": "Band",
            "display_name": null,
            "icon": null,
            "color": null,
            "members": ["1b9faf7d-9a10-4e2c-9d31-1c0e3f5b6e2a", "gaznz"],
            "privacy": null
        });
        let group = Group::from_wire(raw, ApiVersion::V2).unwrap();
        assert_eq!(group.id.as_ref().unwrap(), "grpaa");
        let members = group.members.as_ref().unwrap();
        assert!(members[0].is_uuid());
        assert_eq!(members[1], "gaznz");
        assert!(group.visibility.is_unknown());
    }

    #[test]
    fn test_new_group_patch() {
        let mut group = Group::new("Band");
        group.color = Some(Color::parse("teal").unwrap());
        group.list_privacy = Privacy::Private;
        assert_eq!(
            group.to_patch(ApiVersion::V2).unwrap(),
            json!({ "name": "Band", "color": "008080", "privacy": { "list_privacy": "private" } })
        );
    }

    #[test]
    fn test_description_limit() {
        let mut group = Group::new("Band");
        group.description = Some("d".repeat(1001));
        assert!(matches!(
            group.to_patch(ApiVersion::V2),
            Err(ValidationError::TooLong { field: "description", .. })
        ));
    }
}
