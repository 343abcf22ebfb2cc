use serde::{Deserialize, Serialize};

use super::{model_impl, Member, MemberId, Model, SwitchId, Synced, Timestamp};
use crate::Error;

/// Who was fronting in a switch.
///
/// Switch listings only carry member IDs; fronters and single switches come
/// with the full members.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SwitchMembers {
    Ids(Vec<MemberId>),
    Members(Vec<Member>),
}

impl Default for SwitchMembers {
    fn default() -> Self {
        SwitchMembers::Ids(Vec::new())
    }
}

impl SwitchMembers {
    pub fn ids(&self) -> Vec<MemberId> {
        match self {
            SwitchMembers::Ids(ids) => ids.clone(),
            SwitchMembers::Members(members) => {
                members.iter().filter_map(|m| m.id.clone()).collect()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SwitchMembers::Ids(ids) => ids.len(),
            SwitchMembers::Members(members) => members.len(),
        }
    }

    /// An empty switch is a switch-out.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An entry in a system's front history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Switch {
    /// Switches have no ID in API v1.
    #[serde(default)]
    pub id: Option<SwitchId>,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub members: SwitchMembers,

    #[serde(skip)]
    synced: Synced,
}

model_impl!(Switch, "switch", ["timestamp"], check = Switch::sync_members);

impl Switch {
    fn sync_members(&mut self) -> Result<(), Error> {
        if let SwitchMembers::Members(members) = &mut self.members {
            for member in members {
                if member.id.is_none() {
                    return Err(Error::malformed("switch", "fronting member without an `id`"));
                }
                member.mark_synced();
            }
        }
        Ok(())
    }
}
