use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use url::Url;

use super::config::ClientConfig;
use super::ratelimit::{RateLimiter, RetryPolicy};
use super::request::ApiRequest;
use crate::model::{ApiVersion, ValidationError};
use crate::Error;

/// The part of a transport that does not care how it waits.
#[derive(Debug)]
pub struct Dispatch {
    base_url: Url,
    pub(crate) version: ApiVersion,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

/// What a transport should do with a response.
pub(crate) enum Verdict {
    Done,
    /// The limiter has already been pushed back; reserve again and resend.
    Retry,
}

impl Dispatch {
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let base_url = config.resolved_base_url()?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(base_url));
        }

        Ok(Self {
            base_url,
            version: config.version,
            limiter: RateLimiter::new(config.min_interval),
            policy: RetryPolicy {
                margin: config.retry_margin,
                max_retries: config.max_rate_limit_retries,
            },
        })
    }

    /// Headers sent with every request.
    pub fn default_headers(config: &ClientConfig) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        let user_agent =
            HeaderValue::from_str(&config.user_agent).map_err(|_| ValidationError::InvalidUserAgent)?;
        headers.insert(USER_AGENT, user_agent);

        if let Some(token) = &config.token {
            let mut value =
                HeaderValue::from_str(token).map_err(|_| ValidationError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    pub fn url<T>(&self, request: &ApiRequest<T>) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(request.path.split('/'));
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    /// Claims a start slot; returns how long to wait for it.
    pub fn reserve(&self) -> Duration {
        self.limiter.reserve()
    }

    /// Looks at a response before its body is read.
    ///
    /// `rate_limited` counts the 429s this request has had so far, including
    /// this one if it is a 429.
    pub(crate) fn inspect(
        &self,
        url: &Url,
        status: StatusCode,
        headers: &HeaderMap,
        rate_limited: u32,
    ) -> Result<Verdict, Error> {
        self.limiter.observe(headers);

        if status != StatusCode::TOO_MANY_REQUESTS {
            log::debug!("{url} -> {status}");
            return Ok(Verdict::Done);
        }

        let wait = self.policy.backoff(rate_limited, headers)?;
        log::warn!("rate limited on {url}, retrying in {wait:?} (retry {rate_limited})");
        self.limiter.defer_for(wait);
        Ok(Verdict::Retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::request::Resource;

    fn request(path: &str) -> ApiRequest<()> {
        ApiRequest::get(path, Resource::System("@me".to_string()))
    }

    #[test]
    fn test_url_building() {
        let dispatch = Dispatch::new(&ClientConfig::new()).unwrap();
        let url = dispatch.url(&request("systems/@me/members").query("limit", 100)).unwrap();
        assert_eq!(url.as_str(), "https://api.pluralkit.me/v2/systems/@me/members?limit=100");

        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        let dispatch = Dispatch::new(&ClientConfig::new().base_url(base)).unwrap();
        assert_eq!(
            dispatch.url(&request("members/abcde")).unwrap().as_str(),
            "http://127.0.0.1:8080/members/abcde"
        );
    }

    #[test]
    fn test_rejects_unusable_base() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(matches!(
            Dispatch::new(&ClientConfig::new().base_url(base)),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_headers() {
        let headers = Dispatch::default_headers(&ClientConfig::new()).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("pluralkit-rs/v"));

        let headers = Dispatch::default_headers(&ClientConfig::new().token("tok")).unwrap();
        assert_eq!(headers[AUTHORIZATION], "tok");
        assert!(headers[AUTHORIZATION].is_sensitive());

        assert!(matches!(
            Dispatch::default_headers(&ClientConfig::new().token("bad\ntoken")),
            Err(Error::Validation(ValidationError::InvalidToken))
        ));
    }

    #[test]
    fn test_rate_limited_verdict() {
        let dispatch = Dispatch::new(&ClientConfig::new().max_rate_limit_retries(0)).unwrap();
        let url = dispatch.url(&request("systems/@me")).unwrap();
        assert!(matches!(
            dispatch.inspect(&url, StatusCode::OK, &HeaderMap::new(), 0),
            Ok(Verdict::Done)
        ));
        assert!(matches!(
            dispatch.inspect(&url, StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), 1),
            Err(Error::RateLimited { .. })
        ));
    }
}
