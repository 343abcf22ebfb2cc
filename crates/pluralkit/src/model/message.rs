use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use super::{model_impl, Member, Model, Synced, System, Timestamp};
use crate::Error;

/// A message proxied by PluralKit. Read-only.
///
/// `system` and `member` are snapshots taken when the message was looked up;
/// either is `None` if it has since been deleted.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Message {
    pub timestamp: Timestamp,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub id: u64,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub original: Option<u64>,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub sender: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub channel: u64,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub guild: Option<u64>,
    #[serde(default)]
    pub system: Option<System>,
    #[serde(default)]
    pub member: Option<Member>,

    #[serde(skip)]
    synced: Synced,
}

model_impl!(Message, "message", [], check = Message::sync_snapshots);

impl Message {
    fn sync_snapshots(&mut self) -> Result<(), Error> {
        if let Some(system) = &mut self.system {
            system.mark_synced();
        }
        if let Some(member) = &mut self.member {
            if member.id.is_none() {
                return Err(Error::malformed("message", "member without an `id`"));
            }
            member.mark_synced();
        }
        Ok(())
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{ApiVersion, FromWire};

    #[test]
    fn test_decode_v2() {
        let raw = json!({
            "timestamp": "2021-06-14T01:48:54.123456Z",
            "id": "854173442397503498",
            "original": "854173440157220875",
            "sender": "466378653216014359",
            "channel": "466707357099884546",
            "guild": "466707357099884544",
            "system": { "id": "exmpl", "name": "Example System", "privacy": null },
            "member": { "id": "gaznz", "name": "Myriad", "privacy": null }
        });
        let message = Message::from_wire(raw, ApiVersion::V2).unwrap();
        assert_eq!(message.id, 854173442397503498);
        assert_eq!(message.original, Some(854173440157220875));
        assert_eq!(message.guild, Some(466707357099884544));
        assert_eq!(message.system.as_ref().unwrap().id, "exmpl");
        assert!(!message.member.as_ref().unwrap().is_dirty());
        assert_eq!(message.timestamp.microsecond(), 123456);
    }

    #[test]
    fn test_numeric_snowflakes_and_deleted_member() {
        let raw = json!({
            "timestamp": "2021-06-14T01:48:54Z",
            "id": 854173442397503498u64,
            "original": null,
            "sender": 466378653216014359u64,
            "channel": 466707357099884546u64,
            "system": null,
            "member": null
        });
        let message = Message::from_wire(raw, ApiVersion::V1).unwrap();
        assert_eq!(message.sender, 466378653216014359);
        assert_eq!(message.guild, None);
        assert!(message.system.is_none() && message.member.is_none());
    }

    #[test]
    fn test_bad_snowflake() {
        let raw = json!({
            "timestamp": "2021-06-14T01:48:54Z",
            "id": "not a snowflake",
            "sender": "1",
            "channel": "2"
        });
        assert!(matches!(
            Message::from_wire(raw, ApiVersion::V2),
            Err(Error::MalformedResponse { model: "message", .. })
        ));
    }
}
