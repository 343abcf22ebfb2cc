use std::thread;

use reqwest::blocking::Client as ReqwestClient;
use reqwest::StatusCode;
use serde_json::Value;

use super::dispatch::{Dispatch, Verdict};
use super::pages::Pager;
use super::request::ApiRequest;
use super::{ClientConfig, Transport};
use crate::model::FromWire;
use crate::Error;

/// The blocking transport. Every wait blocks the calling thread.
///
/// Must not be created or used from inside an async runtime.
#[derive(Debug)]
pub struct BlockingHttp {
    client: ReqwestClient,
    dispatch: Dispatch,
}

impl BlockingHttp {
    fn build(config: &ClientConfig) -> Result<Self, Error> {
        let mut builder = ReqwestClient::builder().default_headers(Dispatch::default_headers(config)?);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            dispatch: Dispatch::new(config)?,
        })
    }

    fn send<T: FromWire>(&self, request: &ApiRequest<T>) -> Result<T, Error> {
        let url = self.dispatch.url(request)?;
        let mut rate_limited = 0;

        loop {
            let wait = self.dispatch.reserve();
            if !wait.is_zero() {
                thread::sleep(wait);
            }

            log::debug!("{} {url}", request.method);
            let mut builder = self.client.request(request.method.clone(), url.clone());
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            let response = builder.send()?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                rate_limited += 1;
            }
            match self.dispatch.inspect(&url, status, response.headers(), rate_limited)? {
                Verdict::Retry => continue,
                Verdict::Done => {
                    let body = response.bytes()?;
                    return request.decode(status, &body, self.dispatch.version);
                }
            }
        }
    }
}

/// A lazy listing in blocking mode. Fetches the next page only when the
/// current one is used up; ends after the first error.
pub struct PageIter<'a, T> {
    http: &'a BlockingHttp,
    pager: Option<Pager<T>>,
    buffer: std::vec::IntoIter<Value>,
    error: Option<Error>,
}

impl<T: FromWire> Iterator for PageIter<'_, T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.error.take() {
            self.pager = None;
            return Some(Err(error));
        }

        loop {
            if let Some(item) = self.buffer.next() {
                return Some(T::from_wire(item, self.http.dispatch.version));
            }

            let request = self.pager.as_ref()?.next_request()?;
            match self.http.send(&request) {
                Ok(mut page) => {
                    if let Some(pager) = &mut self.pager {
                        let kept = pager.advance(&page);
                        page.truncate(kept);
                    }
                    self.buffer = page.into_iter();
                }
                Err(error) => {
                    self.pager = None;
                    return Some(Err(error));
                }
            }
        }
    }
}

impl<T: FromWire> std::iter::FusedIterator for PageIter<'_, T> {}

impl crate::private::Sealed for BlockingHttp {}

impl Transport for BlockingHttp {
    type Output<'a, T: 'a> = Result<T, Error> where Self: 'a;
    type Pages<'a, T: 'a> = PageIter<'a, T> where Self: 'a;

    fn connect(config: &ClientConfig) -> Result<Self, Error> {
        Self::build(config)
    }

    fn execute<'a, T: FromWire + Send + 'a>(&'a self, request: ApiRequest<T>) -> Self::Output<'a, T> {
        self.send(&request)
    }

    fn paginate<'a, T: FromWire + Send + 'a>(&'a self, pager: Pager<T>) -> Self::Pages<'a, T> {
        PageIter {
            http: self,
            pager: Some(pager),
            buffer: Vec::new().into_iter(),
            error: None,
        }
    }

    fn ready<'a, T: Send + 'a>(result: Result<T, Error>) -> Self::Output<'a, T>
    where
        Self: 'a,
    {
        result
    }

    fn map<'a, T, U, F>(output: Self::Output<'a, T>, f: F) -> Self::Output<'a, U>
    where
        Self: 'a,
        T: Send + 'a,
        U: Send + 'a,
        F: FnOnce(T) -> Result<U, Error> + Send + 'a,
    {
        output.and_then(f)
    }

    fn fail_pages<'a, T: Send + 'a>(&'a self, error: Error) -> Self::Pages<'a, T> {
        PageIter {
            http: self,
            pager: None,
            buffer: Vec::new().into_iter(),
            error: Some(error),
        }
    }
}
