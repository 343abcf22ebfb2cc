//! Paths, methods and local checks for every operation, for both API
//! versions. Nothing in here touches the network.

use reqwest::Method;
use serde_json::{json, Map, Value};

use super::pages::Pager;
use super::request::{ApiRequest, Resource};
use crate::model::{
    ApiVersion, AutoproxySettings, Group, GroupId, Member, MemberGuildSettings, MemberId,
    Message, Switch, SwitchId, System, SystemGuildSettings, SystemRef, SystemSettings, Timestamp,
    ValidationError,
};
use crate::Error;

/// How a membership edit treats the given list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Membership {
    Add,
    Remove,
    /// Replace the whole membership; an empty list clears it.
    Overwrite,
}

impl Membership {
    fn as_str(self) -> &'static str {
        match self {
            Membership::Add => "add",
            Membership::Remove => "remove",
            Membership::Overwrite => "overwrite",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Routes {
    pub version: ApiVersion,
    pub authenticated: bool,
    pub page_size: u32,
}

type Request<T> = Result<ApiRequest<T>, Error>;

impl Routes {
    fn require_token(&self) -> Result<(), Error> {
        if self.authenticated {
            Ok(())
        } else {
            Err(Error::Authorization)
        }
    }

    fn require_v2(&self, operation: &'static str) -> Result<(), Error> {
        match self.version {
            ApiVersion::V2 => Ok(()),
            version => Err(ValidationError::Unsupported { operation, version }.into()),
        }
    }

    /// v1 only knows short IDs.
    fn short_only(&self, id: &str, is_uuid: bool) -> Result<(), Error> {
        if self.version == ApiVersion::V1 && is_uuid {
            log::debug!("refusing UUID reference `{id}` in API v1");
            return Err(ValidationError::Unsupported {
                operation: "UUID references",
                version: self.version,
            }
            .into());
        }
        Ok(())
    }

    fn own_system(&self) -> &'static str {
        match self.version {
            ApiVersion::V1 => "s",
            ApiVersion::V2 => "systems/@me",
        }
    }

    fn system_path(&self, system: &SystemRef) -> Result<String, Error> {
        match (system, self.version) {
            (SystemRef::Me, _) => {
                self.require_token()?;
                Ok(self.own_system().to_string())
            }
            (SystemRef::Id(id), ApiVersion::V1) => {
                self.short_only(id.as_str(), id.is_uuid())?;
                Ok(format!("s/{id}"))
            }
            (SystemRef::Id(id), ApiVersion::V2) => Ok(format!("systems/{id}")),
            (SystemRef::Account(account), ApiVersion::V1) => Ok(format!("a/{account}")),
            (SystemRef::Account(account), ApiVersion::V2) => Ok(format!("systems/{account}")),
        }
    }

    /// Path of a system's sub-collection; v1 only has these under an explicit ID.
    fn system_collection(
        &self,
        system: &SystemRef,
        operation: &'static str,
        collection: &str,
    ) -> Result<String, Error> {
        match (system, self.version) {
            (SystemRef::Id(id), ApiVersion::V1) => {
                self.short_only(id.as_str(), id.is_uuid())?;
                Ok(format!("s/{id}/{collection}"))
            }
            (_, ApiVersion::V1) => Err(ValidationError::SystemIdRequired(operation).into()),
            (system, ApiVersion::V2) => Ok(format!("{}/{collection}", self.system_path(system)?)),
        }
    }

    fn member_path(&self, id: &MemberId) -> Result<String, Error> {
        self.short_only(id.as_str(), id.is_uuid())?;
        Ok(match self.version {
            ApiVersion::V1 => format!("m/{id}"),
            ApiVersion::V2 => format!("members/{id}"),
        })
    }

    fn system_resource(system: &SystemRef) -> Resource {
        match system {
            SystemRef::Account(account) => Resource::Account(*account),
            system => Resource::System(system.to_string()),
        }
    }

    fn me() -> Resource {
        Resource::System(SystemRef::Me.to_string())
    }

    fn id_list<I: ToString>(ids: &[I]) -> Value {
        Value::Array(ids.iter().map(|id| Value::String(id.to_string())).collect())
    }

    // systems

    pub fn get_system(&self, system: &SystemRef) -> Request<System> {
        Ok(ApiRequest::get(self.system_path(system)?, Self::system_resource(system)))
    }

    pub fn update_system(&self, patch: Value) -> Request<System> {
        self.require_token()?;
        // v2 keeps the time zone in the system settings
        if self.version == ApiVersion::V2 && patch.get("timezone").is_some() {
            return Err(ValidationError::Unsupported {
                operation: "changing the time zone through the system",
                version: self.version,
            }
            .into());
        }
        Ok(ApiRequest::new(Method::PATCH, self.own_system(), Self::me()).body(patch))
    }

    pub fn get_system_settings(&self) -> Request<SystemSettings> {
        self.require_v2("system settings")?;
        self.require_token()?;
        Ok(ApiRequest::get("systems/@me/settings", Self::me()))
    }

    pub fn update_system_settings(&self, patch: Value) -> Request<SystemSettings> {
        self.require_v2("system settings")?;
        self.require_token()?;
        Ok(ApiRequest::new(Method::PATCH, "systems/@me/settings", Self::me()).body(patch))
    }

    pub fn get_system_guild_settings(&self, guild: u64) -> Request<SystemGuildSettings> {
        self.require_v2("guild settings")?;
        self.require_token()?;
        Ok(ApiRequest::get(format!("systems/@me/guilds/{guild}"), Resource::Guild(guild)))
    }

    pub fn update_system_guild_settings(&self, guild: u64, patch: Value) -> Request<SystemGuildSettings> {
        self.require_v2("guild settings")?;
        self.require_token()?;
        Ok(ApiRequest::new(Method::PATCH, format!("systems/@me/guilds/{guild}"), Resource::Guild(guild))
            .body(patch))
    }

    pub fn get_autoproxy_settings(&self, guild: u64) -> Request<AutoproxySettings> {
        self.require_v2("autoproxy settings")?;
        self.require_token()?;
        Ok(ApiRequest::get("systems/@me/autoproxy", Resource::Guild(guild)).query("guild_id", guild))
    }

    pub fn update_autoproxy_settings(&self, guild: u64, patch: Value) -> Request<AutoproxySettings> {
        self.require_v2("autoproxy settings")?;
        self.require_token()?;
        Ok(ApiRequest::new(Method::PATCH, "systems/@me/autoproxy", Resource::Guild(guild))
            .query("guild_id", guild)
            .body(patch))
    }

    // members

    pub fn get_members(&self, system: &SystemRef) -> Result<Pager<Member>, Error> {
        let path = self.system_collection(system, "member listing", "members")?;
        let request = ApiRequest::<()>::get(path, Self::system_resource(system));
        Ok(match self.version {
            ApiVersion::V1 => Pager::unpaged(request),
            ApiVersion::V2 => Pager::offset(request, self.page_size),
        })
    }

    pub fn get_member(&self, id: &MemberId) -> Request<Member> {
        Ok(ApiRequest::get(self.member_path(id)?, Resource::Member(id.to_string())))
    }

    pub fn create_member(&self, payload: Value) -> Request<Member> {
        self.require_token()?;
        let path = match self.version {
            ApiVersion::V1 => "m",
            ApiVersion::V2 => "members",
        };
        Ok(ApiRequest::new(Method::POST, path, Self::me()).body(payload))
    }

    pub fn update_member(&self, id: &MemberId, patch: Value) -> Request<Member> {
        self.require_token()?;
        Ok(ApiRequest::new(Method::PATCH, self.member_path(id)?, Resource::Member(id.to_string()))
            .body(patch))
    }

    pub fn delete_member(&self, id: &MemberId) -> Request<()> {
        self.require_token()?;
        Ok(ApiRequest::new(Method::DELETE, self.member_path(id)?, Resource::Member(id.to_string())))
    }

    pub fn get_member_groups(&self, id: &MemberId) -> Result<Pager<Group>, Error> {
        self.require_v2("member groups")?;
        let request = ApiRequest::<()>::get(format!("members/{id}/groups"), Resource::Member(id.to_string()));
        Ok(Pager::offset(request, self.page_size))
    }

    pub fn edit_member_groups(&self, id: &MemberId, edit: Membership, groups: &[GroupId]) -> Request<()> {
        self.require_v2("member groups")?;
        self.require_token()?;
        if groups.is_empty() && edit != Membership::Overwrite {
            return Err(ValidationError::EmptyList("groups").into());
        }
        Ok(ApiRequest::new(
            Method::POST,
            format!("members/{id}/groups/{}", edit.as_str()),
            Resource::Member(id.to_string()),
        )
        .body(Self::id_list(groups)))
    }

    pub fn get_member_guild_settings(&self, id: &MemberId, guild: u64) -> Request<MemberGuildSettings> {
        self.require_v2("guild settings")?;
        self.require_token()?;
        Ok(ApiRequest::get(format!("members/{id}/guilds/{guild}"), Resource::Guild(guild)))
    }

    pub fn update_member_guild_settings(
        &self,
        id: &MemberId,
        guild: u64,
        patch: Value,
    ) -> Request<MemberGuildSettings> {
        self.require_v2("guild settings")?;
        self.require_token()?;
        Ok(ApiRequest::new(Method::PATCH, format!("members/{id}/guilds/{guild}"), Resource::Guild(guild))
            .body(patch))
    }

    // groups

    pub fn get_groups(&self, system: &SystemRef, with_members: bool) -> Result<Pager<Group>, Error> {
        self.require_v2("groups")?;
        let path = self.system_collection(system, "group listing", "groups")?;
        let mut request = ApiRequest::<()>::get(path, Self::system_resource(system));
        if with_members {
            request = request.query("with_members", true);
        }
        Ok(Pager::offset(request, self.page_size))
    }

    pub fn get_group(&self, id: &GroupId) -> Request<Group> {
        self.require_v2("groups")?;
        Ok(ApiRequest::get(format!("groups/{id}"), Resource::Group(id.to_string())))
    }

    pub fn create_group(&self, payload: Value) -> Request<Group> {
        self.require_v2("groups")?;
        self.require_token()?;
        Ok(ApiRequest::new(Method::POST, "groups", Self::me()).body(payload))
    }

    pub fn update_group(&self, id: &GroupId, patch: Value) -> Request<Group> {
        self.require_v2("groups")?;
        self.require_token()?;
        Ok(ApiRequest::new(Method::PATCH, format!("groups/{id}"), Resource::Group(id.to_string()))
            .body(patch))
    }

    pub fn delete_group(&self, id: &GroupId) -> Request<()> {
        self.require_v2("groups")?;
        self.require_token()?;
        Ok(ApiRequest::new(Method::DELETE, format!("groups/{id}"), Resource::Group(id.to_string())))
    }

    pub fn get_group_members(&self, id: &GroupId) -> Result<Pager<Member>, Error> {
        self.require_v2("groups")?;
        let request = ApiRequest::<()>::get(format!("groups/{id}/members"), Resource::Group(id.to_string()));
        Ok(Pager::offset(request, self.page_size))
    }

    pub fn edit_group_members(&self, id: &GroupId, edit: Membership, members: &[MemberId]) -> Request<()> {
        self.require_v2("groups")?;
        self.require_token()?;
        if members.is_empty() && edit != Membership::Overwrite {
            return Err(ValidationError::EmptyList("members").into());
        }
        Ok(ApiRequest::new(
            Method::POST,
            format!("groups/{id}/members/{}", edit.as_str()),
            Resource::Group(id.to_string()),
        )
        .body(Self::id_list(members)))
    }

    // switches

    pub fn get_switches(&self, system: &SystemRef, before: Option<Timestamp>) -> Result<Pager<Switch>, Error> {
        let path = self.system_collection(system, "switch listing", "switches")?;
        let request = ApiRequest::<()>::get(path, Self::system_resource(system));
        Ok(Pager::before(request, self.page_size, before.map(|ts| ts.to_wire())))
    }

    pub fn get_fronters(&self, system: &SystemRef) -> Request<Option<Switch>> {
        let path = self.system_collection(system, "fronters", "fronters")?;
        Ok(ApiRequest::get(path, Self::system_resource(system)))
    }

    pub fn create_switch(&self, members: &[MemberId], at: Option<Timestamp>) -> Request<Option<Switch>> {
        self.require_token()?;
        for id in members {
            self.short_only(id.as_str(), id.is_uuid())?;
        }

        let mut body = Map::new();
        body.insert("members".to_string(), Self::id_list(members));
        let path = match (self.version, at) {
            (ApiVersion::V1, Some(_)) => {
                return Err(ValidationError::Unsupported {
                    operation: "switch timestamps",
                    version: self.version,
                }
                .into())
            }
            (ApiVersion::V1, None) => "s/switches",
            (ApiVersion::V2, at) => {
                if let Some(at) = at {
                    body.insert("timestamp".to_string(), Value::String(at.to_wire()));
                }
                "systems/@me/switches"
            }
        };

        Ok(ApiRequest::new(Method::POST, path, Self::me()).body(Value::Object(body)))
    }

    fn switch_request<T>(&self, method: Method, id: &SwitchId, suffix: &str) -> Request<T> {
        self.require_v2("switch editing")?;
        self.require_token()?;
        Ok(ApiRequest::new(
            method,
            format!("systems/@me/switches/{id}{suffix}"),
            Resource::Switch(id.to_string()),
        ))
    }

    pub fn get_switch(&self, id: &SwitchId) -> Request<Switch> {
        self.switch_request(Method::GET, id, "")
    }

    pub fn update_switch_timestamp(&self, id: &SwitchId, at: Timestamp) -> Request<Switch> {
        Ok(self
            .switch_request(Method::PATCH, id, "")?
            .body(json!({ "timestamp": at.to_wire() })))
    }

    pub fn update_switch_members(&self, id: &SwitchId, members: &[MemberId]) -> Request<Switch> {
        Ok(self
            .switch_request(Method::PATCH, id, "/members")?
            .body(Self::id_list(members)))
    }

    pub fn delete_switch(&self, id: &SwitchId) -> Request<()> {
        self.switch_request(Method::DELETE, id, "")
    }

    // messages

    pub fn get_message(&self, id: u64) -> Request<Message> {
        let path = match self.version {
            ApiVersion::V1 => format!("msg/{id}"),
            ApiVersion::V2 => format!("messages/{id}"),
        };
        Ok(ApiRequest::get(path, Resource::Message(id)))
    }
}
