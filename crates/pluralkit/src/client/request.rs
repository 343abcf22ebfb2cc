use std::fmt;
use std::marker::PhantomData;

use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::model::{ApiVersion, FromWire};
use crate::Error;

/// What a request is about, for mapping a 404.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    System(String),
    Account(u64),
    Member(String),
    Group(String),
    Switch(String),
    Message(u64),
    Guild(u64),
}

impl Resource {
    fn not_found(&self) -> Error {
        match self {
            Resource::System(id) => Error::SystemNotFound(id.clone()),
            Resource::Account(id) => Error::AccountNotFound(*id),
            Resource::Member(id) => Error::MemberNotFound(id.clone()),
            Resource::Group(id) => Error::GroupNotFound(id.clone()),
            Resource::Switch(id) => Error::SwitchNotFound(id.clone()),
            Resource::Message(id) => Error::MessageNotFound(*id),
            Resource::Guild(id) => Error::GuildNotFound(*id),
        }
    }
}

/// A fully validated request, decoding to `T`.
pub struct ApiRequest<T> {
    pub(crate) method: Method,
    /// Relative to the base URL, `/`-separated.
    pub(crate) path: String,
    pub(crate) query: Vec<(&'static str, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) resource: Resource,
    _output: PhantomData<fn() -> T>,
}

impl<T> ApiRequest<T> {
    pub(crate) fn new(method: Method, path: impl Into<String>, resource: Resource) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            resource,
            _output: PhantomData,
        }
    }

    pub(crate) fn get(path: impl Into<String>, resource: Resource) -> Self {
        Self::new(Method::GET, path, resource)
    }

    pub(crate) fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.retain(|(k, _)| *k != key);
        self.query.push((key, value.to_string()));
        self
    }

    /// The same request, decoding to something else.
    pub(crate) fn cast<U>(self) -> ApiRequest<U> {
        ApiRequest {
            method: self.method,
            path: self.path,
            query: self.query,
            body: self.body,
            resource: self.resource,
            _output: PhantomData,
        }
    }
}

impl<T: FromWire> ApiRequest<T> {
    /// Maps a final (non-429) response to the request's outcome.
    pub(crate) fn decode(&self, status: StatusCode, body: &[u8], version: ApiVersion) -> Result<T, Error> {
        match status {
            s if s.is_success() => {
                let value = if body.iter().all(u8::is_ascii_whitespace) {
                    Value::Null
                } else {
                    serde_json::from_slice(body).map_err(|e| Error::malformed("response", e))?
                };
                T::from_wire(value, version)
            }
            StatusCode::UNAUTHORIZED => Err(Error::Authorization),
            StatusCode::FORBIDDEN => Err(Error::AccessForbidden),
            StatusCode::NOT_FOUND => Err(self.resource.not_found()),
            status => Err(Error::Http {
                status,
                body: String::from_utf8_lossy(body).into_owned(),
            }),
        }
    }
}

impl<T> Clone for ApiRequest<T> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            body: self.body.clone(),
            resource: self.resource.clone(),
            _output: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ApiRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::Member;

    fn member_request() -> ApiRequest<Member> {
        ApiRequest::get("members/zzzzz", Resource::Member("zzzzz".to_string()))
    }

    #[test]
    fn test_status_mapping() {
        let req = member_request();
        let v = ApiVersion::V2;
        assert!(matches!(req.decode(StatusCode::UNAUTHORIZED, b"", v), Err(Error::Authorization)));
        assert!(matches!(req.decode(StatusCode::FORBIDDEN, b"", v), Err(Error::AccessForbidden)));
        assert!(matches!(
            req.decode(StatusCode::NOT_FOUND, b"{}", v),
            Err(Error::MemberNotFound(id)) if id == "zzzzz"
        ));
        match req.decode(StatusCode::INTERNAL_SERVER_ERROR, b"oops", v) {
            Err(Error::Http { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "oops");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_no_content() {
        let req: ApiRequest<()> = member_request().cast();
        assert!(req.decode(StatusCode::NO_CONTENT, b"", ApiVersion::V2).is_ok());

        let req: ApiRequest<Option<Member>> = member_request().cast();
        assert!(req.decode(StatusCode::OK, b"", ApiVersion::V2).unwrap().is_none());
    }

    #[test]
    fn test_success_decodes() {
        let body = serde_json::to_vec(&json!({ "id": "zzzzz", "name": "Z" })).unwrap();
        let member = member_request().decode(StatusCode::OK, &body, ApiVersion::V2).unwrap();
        assert_eq!(member.name, "Z");

        assert!(matches!(
            member_request().decode(StatusCode::OK, b"not json", ApiVersion::V2),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_query_replaces() {
        let req = member_request().query("offset", 0).query("offset", 100);
        assert_eq!(req.query, vec![("offset", "100".to_string())]);
    }
}
