use std::convert::Infallible;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::model::ValidationError;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Rejected locally, no request was made.
    #[error("invalid input")]
    Validation(#[from] ValidationError),
    #[error("malformed {model} in response: {reason}")]
    MalformedResponse { model: &'static str, reason: String },
    #[error("authorization token missing or invalid")]
    Authorization,
    #[error("the token does not grant access to this resource")]
    AccessForbidden,
    #[error("system `{0}` not found")]
    SystemNotFound(String),
    #[error("no system is linked to account `{0}`")]
    AccountNotFound(u64),
    #[error("member `{0}` not found")]
    MemberNotFound(String),
    #[error("group `{0}` not found")]
    GroupNotFound(String),
    #[error("switch `{0}` not found")]
    SwitchNotFound(String),
    #[error("message `{0}` not found")]
    MessageNotFound(u64),
    #[error("no settings for guild `{0}`")]
    GuildNotFound(u64),
    #[error("unexpected HTTP status {status}: {body}")]
    Http { status: StatusCode, body: String },
    /// Only returned when a retry cap is configured.
    #[error("still rate limited after retrying (server asked to wait {retry_after:?})")]
    RateLimited { retry_after: Duration },
    #[error("request failed")]
    Request(#[from] reqwest::Error),
    #[error("invalid API URL: {0}")]
    InvalidUrl(Url),
    #[error("invalid API URL")]
    UrlParse(#[from] url::ParseError),
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl Error {
    pub(crate) fn malformed(model: &'static str, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            model,
            reason: reason.to_string(),
        }
    }

    /// The HTTP status behind this error, if it came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Authorization => Some(StatusCode::UNAUTHORIZED),
            Error::AccessForbidden => Some(StatusCode::FORBIDDEN),
            Error::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Error::Http { status, .. } => Some(*status),
            Error::Request(e) => e.status(),
            e if e.is_not_found() => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::SystemNotFound(_)
                | Error::AccountNotFound(_)
                | Error::MemberNotFound(_)
                | Error::GroupNotFound(_)
                | Error::SwitchNotFound(_)
                | Error::MessageNotFound(_)
                | Error::GuildNotFound(_)
        )
    }
}
