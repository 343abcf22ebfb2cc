use serde_json::Value;

use crate::model::{
    ApiVersion, AutoproxySettings, FromWire, Group, GroupId, Member, MemberGuildSettings, MemberId,
    Message, Model, Switch, SwitchId, System, SystemGuildSettings, SystemRef, SystemSettings,
    Timestamp, ValidationError,
};
use crate::{private, Error};
use pages::Pager;
use request::ApiRequest;
use routes::{Membership, Routes};

pub use blocking::{BlockingHttp, PageIter};
pub use config::{default_user_agent, ClientConfig};
pub use http::Http;

/// How a [`Client`] talks to the network. Implemented by [`Http`] (async) and
/// [`BlockingHttp`]; sealed.
pub trait Transport: private::Sealed + Sized {
    /// What a single operation returns: a future, or the value itself.
    type Output<'a, T: 'a>
    where
        Self: 'a;
    /// What a listing returns: a stream, or an iterator.
    type Pages<'a, T: 'a>
    where
        Self: 'a;

    #[doc(hidden)]
    fn connect(config: &ClientConfig) -> Result<Self, Error>;

    #[doc(hidden)]
    fn execute<'a, T: FromWire + Send + 'a>(&'a self, request: ApiRequest<T>) -> Self::Output<'a, T>;

    #[doc(hidden)]
    fn paginate<'a, T: FromWire + Send + 'a>(&'a self, pager: Pager<T>) -> Self::Pages<'a, T>;

    #[doc(hidden)]
    fn ready<'a, T: Send + 'a>(result: Result<T, Error>) -> Self::Output<'a, T>
    where
        Self: 'a;

    #[doc(hidden)]
    fn map<'a, T, U, F>(output: Self::Output<'a, T>, f: F) -> Self::Output<'a, U>
    where
        Self: 'a,
        T: Send + 'a,
        U: Send + 'a,
        F: FnOnce(T) -> Result<U, Error> + Send + 'a;

    #[doc(hidden)]
    fn fail_pages<'a, T: Send + 'a>(&'a self, error: Error) -> Self::Pages<'a, T>;
}

/// Anything that can name a `T`: the typed ID itself, a reference to it, or a
/// string that still has to be parsed.
pub trait IntoRef<T> {
    fn into_ref(self) -> Result<T, Error>;
}

impl<T, S> IntoRef<T> for S
where
    S: TryInto<T>,
    S::Error: Into<Error>,
{
    fn into_ref(self) -> Result<T, Error> {
        self.try_into().map_err(Into::into)
    }
}

fn collect_refs<T, I>(items: I) -> Result<Vec<T>, Error>
where
    I: IntoIterator,
    I::Item: IntoRef<T>,
{
    items.into_iter().map(IntoRef::into_ref).collect()
}

fn is_empty_patch(patch: &Value) -> bool {
    patch.as_object().is_some_and(|o| o.is_empty())
}

/// A PluralKit API client.
///
/// Every operation checks its input locally first and fails without sending
/// anything if the request could not succeed. All requests of one client go
/// through one rate limiter.
///
/// Update operations take the model by `&mut`, send only the fields changed
/// since it was fetched and replace it with the server's version on success.
/// A model with no changes is not sent at all.
#[derive(Debug)]
pub struct Client<X: Transport = Http> {
    transport: X,
    routes: Routes,
}

/// A client whose operations are futures and whose listings are streams.
pub type AsyncClient = Client<Http>;
/// A client whose operations block and whose listings are iterators.
pub type BlockingClient = Client<BlockingHttp>;

impl<X: Transport> Client<X> {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let transport = X::connect(&config)?;
        log::debug!("created {} client for {}", config.version, config.resolved_base_url()?);

        Ok(Self {
            transport,
            routes: Routes {
                version: config.version,
                authenticated: config.has_token(),
                page_size: config.page_size,
            },
        })
    }

    pub fn version(&self) -> ApiVersion {
        self.routes.version
    }

    fn run<'a, T: FromWire + Send + 'a>(&'a self, request: Result<ApiRequest<T>, Error>) -> X::Output<'a, T> {
        match request {
            Ok(request) => self.transport.execute(request),
            Err(e) => X::ready(Err(e)),
        }
    }

    fn list<'a, T: FromWire + Send + 'a>(&'a self, pager: Result<Pager<T>, Error>) -> X::Pages<'a, T> {
        match pager {
            Ok(pager) => self.transport.paginate(pager),
            Err(e) => self.transport.fail_pages(e),
        }
    }

    /// Sends `model`'s changes with `route` and replaces it with the result.
    fn write_back<'a, M, R>(&'a self, model: &'a mut M, route: R) -> X::Output<'a, ()>
    where
        M: Model + FromWire + Send + 'a,
        R: FnOnce(&Routes, Value) -> Result<ApiRequest<M>, Error>,
    {
        let patch = match model.to_patch(self.routes.version) {
            Ok(patch) => patch,
            Err(e) => return X::ready(Err(e.into())),
        };
        if is_empty_patch(&patch) {
            log::debug!("{} has no changes, nothing to send", M::NAME);
            return X::ready(Ok(()));
        }

        let request = match route(&self.routes, patch) {
            Ok(request) => request,
            Err(e) => return X::ready(Err(e)),
        };
        X::map(self.transport.execute(request), move |fresh| {
            *model = fresh;
            Ok(())
        })
    }

    /// Posts a model that does not exist yet and replaces it with the created one.
    fn create<'a, M, R>(&'a self, model: &'a mut M, route: R) -> X::Output<'a, ()>
    where
        M: Model + FromWire + Send + 'a,
        R: FnOnce(&Routes, Value) -> Result<ApiRequest<M>, Error>,
    {
        let request = model
            .to_payload(self.routes.version)
            .map_err(Error::from)
            .and_then(|payload| route(&self.routes, payload));
        match request {
            Ok(request) => X::map(self.transport.execute(request), move |created| {
                *model = created;
                Ok(())
            }),
            Err(e) => X::ready(Err(e)),
        }
    }

    // systems

    /// Fetches a system. Private fields are only filled in for the token's own system.
    pub fn get_system(&self, system: impl IntoRef<SystemRef>) -> X::Output<'_, System> {
        self.run(system.into_ref().and_then(|system| self.routes.get_system(&system)))
    }

    /// Writes the changes of the token's own system.
    pub fn update_system<'a>(&'a self, system: &'a mut System) -> X::Output<'a, ()> {
        self.write_back(system, |routes, patch| routes.update_system(patch))
    }

    pub fn get_system_settings(&self) -> X::Output<'_, SystemSettings> {
        self.run(self.routes.get_system_settings())
    }

    pub fn update_system_settings<'a>(&'a self, settings: &'a mut SystemSettings) -> X::Output<'a, ()> {
        self.write_back(settings, |routes, patch| routes.update_system_settings(patch))
    }

    pub fn get_system_guild_settings(&self, guild: u64) -> X::Output<'_, SystemGuildSettings> {
        self.run(self.routes.get_system_guild_settings(guild))
    }

    /// Writes guild settings back to the guild they were fetched for.
    pub fn update_system_guild_settings<'a>(
        &'a self,
        settings: &'a mut SystemGuildSettings,
    ) -> X::Output<'a, ()> {
        let Some(guild) = settings.guild_id else {
            return X::ready(Err(ValidationError::Required("guild_id").into()));
        };
        self.write_back(settings, move |routes, patch| {
            routes.update_system_guild_settings(guild, patch)
        })
    }

    pub fn get_autoproxy_settings(&self, guild: u64) -> X::Output<'_, AutoproxySettings> {
        self.run(self.routes.get_autoproxy_settings(guild))
    }

    pub fn update_autoproxy_settings<'a>(
        &'a self,
        guild: u64,
        settings: &'a mut AutoproxySettings,
    ) -> X::Output<'a, ()> {
        self.write_back(settings, move |routes, patch| {
            routes.update_autoproxy_settings(guild, patch)
        })
    }

    // members

    /// Lists a system's members, fetching pages as they are consumed.
    pub fn get_members(&self, system: impl IntoRef<SystemRef>) -> X::Pages<'_, Member> {
        self.list(system.into_ref().and_then(|system| self.routes.get_members(&system)))
    }

    pub fn get_member(&self, id: impl IntoRef<MemberId>) -> X::Output<'_, Member> {
        self.run(id.into_ref().and_then(|id| self.routes.get_member(&id)))
    }

    /// Creates `member` in the token's system. On success `member` is the
    /// created member, ID included.
    pub fn create_member<'a>(&'a self, member: &'a mut Member) -> X::Output<'a, ()> {
        if let Err(e) = member.check_new() {
            return X::ready(Err(e.into()));
        }
        self.create(member, |routes, payload| routes.create_member(payload))
    }

    pub fn update_member<'a>(&'a self, member: &'a mut Member) -> X::Output<'a, ()> {
        let Some(id) = member.id.clone() else {
            return X::ready(Err(ValidationError::Required("id").into()));
        };
        self.write_back(member, move |routes, patch| routes.update_member(&id, patch))
    }

    pub fn delete_member(&self, id: impl IntoRef<MemberId>) -> X::Output<'_, ()> {
        self.run(id.into_ref().and_then(|id| self.routes.delete_member(&id)))
    }

    pub fn get_member_groups(&self, id: impl IntoRef<MemberId>) -> X::Pages<'_, Group> {
        self.list(id.into_ref().and_then(|id| self.routes.get_member_groups(&id)))
    }

    fn edit_member_groups<I>(&self, id: impl IntoRef<MemberId>, edit: Membership, groups: I) -> X::Output<'_, ()>
    where
        I: IntoIterator,
        I::Item: IntoRef<GroupId>,
    {
        let request = id.into_ref().and_then(|id| {
            let groups = collect_refs(groups)?;
            self.routes.edit_member_groups(&id, edit, &groups)
        });
        self.run(request)
    }

    pub fn add_member_groups<I>(&self, id: impl IntoRef<MemberId>, groups: I) -> X::Output<'_, ()>
    where
        I: IntoIterator,
        I::Item: IntoRef<GroupId>,
    {
        self.edit_member_groups(id, Membership::Add, groups)
    }

    pub fn remove_member_groups<I>(&self, id: impl IntoRef<MemberId>, groups: I) -> X::Output<'_, ()>
    where
        I: IntoIterator,
        I::Item: IntoRef<GroupId>,
    {
        self.edit_member_groups(id, Membership::Remove, groups)
    }

    /// Makes `groups` the member's only groups. An empty list removes it from all of them.
    pub fn set_member_groups<I>(&self, id: impl IntoRef<MemberId>, groups: I) -> X::Output<'_, ()>
    where
        I: IntoIterator,
        I::Item: IntoRef<GroupId>,
    {
        self.edit_member_groups(id, Membership::Overwrite, groups)
    }

    pub fn get_member_guild_settings(
        &self,
        id: impl IntoRef<MemberId>,
        guild: u64,
    ) -> X::Output<'_, MemberGuildSettings> {
        self.run(id.into_ref().and_then(|id| self.routes.get_member_guild_settings(&id, guild)))
    }

    pub fn update_member_guild_settings<'a>(
        &'a self,
        id: impl IntoRef<MemberId>,
        settings: &'a mut MemberGuildSettings,
    ) -> X::Output<'a, ()> {
        let target = id.into_ref().and_then(|id| match settings.guild_id {
            Some(guild) => Ok((id, guild)),
            None => Err(ValidationError::Required("guild_id").into()),
        });
        match target {
            Ok((id, guild)) => self.write_back(settings, move |routes, patch| {
                routes.update_member_guild_settings(&id, guild, patch)
            }),
            Err(e) => X::ready(Err(e)),
        }
    }

    // groups

    /// Lists a system's groups. With `with_members`, each group carries its member IDs.
    pub fn get_groups(&self, system: impl IntoRef<SystemRef>, with_members: bool) -> X::Pages<'_, Group> {
        self.list(
            system
                .into_ref()
                .and_then(|system| self.routes.get_groups(&system, with_members)),
        )
    }

    pub fn get_group(&self, id: impl IntoRef<GroupId>) -> X::Output<'_, Group> {
        self.run(id.into_ref().and_then(|id| self.routes.get_group(&id)))
    }

    pub fn create_group<'a>(&'a self, group: &'a mut Group) -> X::Output<'a, ()> {
        if let Err(e) = group.check_new() {
            return X::ready(Err(e.into()));
        }
        self.create(group, |routes, payload| routes.create_group(payload))
    }

    pub fn update_group<'a>(&'a self, group: &'a mut Group) -> X::Output<'a, ()> {
        let Some(id) = group.id.clone() else {
            return X::ready(Err(ValidationError::Required("id").into()));
        };
        self.write_back(group, move |routes, patch| routes.update_group(&id, patch))
    }

    pub fn delete_group(&self, id: impl IntoRef<GroupId>) -> X::Output<'_, ()> {
        self.run(id.into_ref().and_then(|id| self.routes.delete_group(&id)))
    }

    pub fn get_group_members(&self, id: impl IntoRef<GroupId>) -> X::Pages<'_, Member> {
        self.list(id.into_ref().and_then(|id| self.routes.get_group_members(&id)))
    }

    fn edit_group_members<I>(&self, id: impl IntoRef<GroupId>, edit: Membership, members: I) -> X::Output<'_, ()>
    where
        I: IntoIterator,
        I::Item: IntoRef<MemberId>,
    {
        let request = id.into_ref().and_then(|id| {
            let members = collect_refs(members)?;
            self.routes.edit_group_members(&id, edit, &members)
        });
        self.run(request)
    }

    pub fn add_group_members<I>(&self, id: impl IntoRef<GroupId>, members: I) -> X::Output<'_, ()>
    where
        I: IntoIterator,
        I::Item: IntoRef<MemberId>,
    {
        self.edit_group_members(id, Membership::Add, members)
    }

    pub fn remove_group_members<I>(&self, id: impl IntoRef<GroupId>, members: I) -> X::Output<'_, ()>
    where
        I: IntoIterator,
        I::Item: IntoRef<MemberId>,
    {
        self.edit_group_members(id, Membership::Remove, members)
    }

    pub fn set_group_members<I>(&self, id: impl IntoRef<GroupId>, members: I) -> X::Output<'_, ()>
    where
        I: IntoIterator,
        I::Item: IntoRef<MemberId>,
    {
        self.edit_group_members(id, Membership::Overwrite, members)
    }

    // switches

    /// Lists switches newest first, starting before `before` if given.
    pub fn get_switches(
        &self,
        system: impl IntoRef<SystemRef>,
        before: Option<Timestamp>,
    ) -> X::Pages<'_, Switch> {
        self.list(
            system
                .into_ref()
                .and_then(|system| self.routes.get_switches(&system, before)),
        )
    }

    /// The latest switch with full member objects, `None` if the system never switched.
    pub fn get_fronters(&self, system: impl IntoRef<SystemRef>) -> X::Output<'_, Option<Switch>> {
        self.run(system.into_ref().and_then(|system| self.routes.get_fronters(&system)))
    }

    /// Logs a switch to `members` (none means switched out), now or at `at`.
    ///
    /// API v1 answers with an empty body, so the result is `None` there.
    pub fn create_switch<I>(&self, members: I, at: Option<Timestamp>) -> X::Output<'_, Option<Switch>>
    where
        I: IntoIterator,
        I::Item: IntoRef<MemberId>,
    {
        self.run(collect_refs(members).and_then(|members| self.routes.create_switch(&members, at)))
    }

    pub fn get_switch(&self, id: impl IntoRef<SwitchId>) -> X::Output<'_, Switch> {
        self.run(id.into_ref().and_then(|id| self.routes.get_switch(&id)))
    }

    pub fn update_switch_timestamp(&self, id: impl IntoRef<SwitchId>, at: Timestamp) -> X::Output<'_, Switch> {
        self.run(id.into_ref().and_then(|id| self.routes.update_switch_timestamp(&id, at)))
    }

    pub fn update_switch_members<I>(&self, id: impl IntoRef<SwitchId>, members: I) -> X::Output<'_, Switch>
    where
        I: IntoIterator,
        I::Item: IntoRef<MemberId>,
    {
        let request = id.into_ref().and_then(|id| {
            let members = collect_refs(members)?;
            self.routes.update_switch_members(&id, &members)
        });
        self.run(request)
    }

    pub fn delete_switch(&self, id: impl IntoRef<SwitchId>) -> X::Output<'_, ()> {
        self.run(id.into_ref().and_then(|id| self.routes.delete_switch(&id)))
    }

    // messages

    /// Looks up a proxied message by the ID of either the original or the proxied message.
    pub fn get_message(&self, id: u64) -> X::Output<'_, Message> {
        self.run(self.routes.get_message(id))
    }
}

pub mod blocking;
pub mod config;
pub mod http;
pub(crate) mod dispatch;
pub(crate) mod pages;
pub(crate) mod ratelimit;
pub(crate) mod request;
pub(crate) mod routes;

#[cfg(test)]
mod tests {
    use super::*;

    fn blocking(config: ClientConfig) -> BlockingClient {
        BlockingClient::new(config.base_url("http://127.0.0.1:9/".parse().unwrap())).unwrap()
    }

    #[test]
    fn test_into_ref() {
        let id: MemberId = "gaznz".into_ref().unwrap();
        assert_eq!(id.as_str(), "gaznz");
        let copy: MemberId = (&id).into_ref().unwrap();
        assert_eq!(copy, id);
        assert!(matches!(
            IntoRef::<MemberId>::into_ref("not an id!"),
            Err(Error::Validation(ValidationError::InvalidId { .. }))
        ));

        let me: SystemRef = "@me".into_ref().unwrap();
        assert_eq!(me, SystemRef::Me);
    }

    #[test]
    fn test_collect_refs() {
        let ids: Vec<MemberId> = collect_refs(["gaznz", "abcde"]).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(collect_refs::<MemberId, _>(["gaznz", ""]).is_err());
    }

    // the port is never listened on, so anything that reaches the network fails
    // with `Error::Request`

    #[test]
    fn test_fails_fast() {
        let client = blocking(ClientConfig::new());
        assert!(matches!(client.get_system(SystemRef::Me), Err(Error::Authorization)));
        assert!(matches!(client.get_member("!!"), Err(Error::Validation(_))));
        assert!(matches!(
            client.add_group_members("grpaa", Vec::<MemberId>::new()),
            Err(Error::Authorization)
        ));

        let mut member = Member::new("  ");
        assert!(matches!(
            client.create_member(&mut member),
            Err(Error::Validation(ValidationError::Required("name")))
        ));
    }

    #[test]
    fn test_empty_patch_is_not_sent() {
        let client = blocking(ClientConfig::new().token("token"));
        let mut system: System = System::decode(
            serde_json::json!({ "id": "exmpl", "name": "Example" }),
            ApiVersion::V2,
        )
        .unwrap();
        assert!(client.update_system(&mut system).is_ok());

        system.name = Some("Changed".to_string());
        assert!(matches!(client.update_system(&mut system), Err(Error::Request(_))));
        assert_eq!(system.name.as_deref(), Some("Changed"));
    }

    #[test]
    fn test_update_needs_id() {
        let client = blocking(ClientConfig::new().token("token"));
        let mut member = Member::new("Draft");
        assert!(matches!(
            client.update_member(&mut member),
            Err(Error::Validation(ValidationError::Required("id")))
        ));

        let mut settings = SystemGuildSettings::default();
        assert!(matches!(
            client.update_system_guild_settings(&mut settings),
            Err(Error::Validation(ValidationError::Required("guild_id")))
        ));
    }

    #[test]
    fn test_listing_error_is_yielded_once() {
        let client = blocking(ClientConfig::new().version(ApiVersion::V1));
        let mut members = client.get_members(SystemRef::Me);
        assert!(matches!(
            members.next(),
            Some(Err(Error::Validation(ValidationError::SystemIdRequired(_))))
        ));
        assert!(members.next().is_none());
    }
}
