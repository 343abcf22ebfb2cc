use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt, TryStreamExt};
use reqwest::{Client as ReqwestClient, StatusCode};

use super::dispatch::{Dispatch, Verdict};
use super::pages::Pager;
use super::request::ApiRequest;
use super::{ClientConfig, Transport};
use crate::model::FromWire;
use crate::Error;

/// The async transport. Waits are tokio sleeps, so nothing blocks the runtime.
#[derive(Debug)]
pub struct Http {
    client: ReqwestClient,
    dispatch: Dispatch,
}

impl Http {
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

    async fn send<T: FromWire>(&self, request: &ApiRequest<T>) -> Result<T, Error> {
        let url = self.dispatch.url(request)?;
        let mut rate_limited = 0;

        loop {
            let wait = self.dispatch.reserve();
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }

            log::debug!("{} {url}", request.method);
            let mut builder = self.client.request(request.method.clone(), url.clone());
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            let response = builder.send().await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                rate_limited += 1;
            }
            match self.dispatch.inspect(&url, status, response.headers(), rate_limited)? {
                Verdict::Retry => continue,
                Verdict::Done => {
                    let body = response.bytes().await?;
                    return request.decode(status, &body, self.dispatch.version);
                }
            }
        }
    }
}

impl crate::private::Sealed for Http {}

impl Transport for Http {
    type Output<'a, T: 'a> = BoxFuture<'a, Result<T, Error>> where Self: 'a;
    type Pages<'a, T: 'a> = BoxStream<'a, Result<T, Error>> where Self: 'a;

    fn connect(config: &ClientConfig) -> Result<Self, Error> {
        Self::build(config)
    }

    fn execute<'a, T: FromWire + Send + 'a>(&'a self, request: ApiRequest<T>) -> Self::Output<'a, T> {
        async move { self.send(&request).await }.boxed()
    }

    fn paginate<'a, T: FromWire + Send + 'a>(&'a self, pager: Pager<T>) -> Self::Pages<'a, T> {
        let version = self.dispatch.version;

        stream::try_unfold(pager, move |mut pager| async move {
            let Some(request) = pager.next_request() else {
                return Ok(None);
            };
            let mut page = self.send(&request).await?;
            let kept = pager.advance(&page);
            page.truncate(kept);

            // decoded one by one as the consumer pulls
            let items = page.into_iter().map(move |item| T::from_wire(item, version));
            Ok::<_, Error>(Some((stream::iter(items), pager)))
        })
        .try_flatten()
        .boxed()
    }

    fn ready<'a, T: Send + 'a>(result: Result<T, Error>) -> Self::Output<'a, T>
    where
        Self: 'a,
    {
        future::ready(result).boxed()
    }

    fn map<'a, T, U, F>(output: Self::Output<'a, T>, f: F) -> Self::Output<'a, U>
    where
        Self: 'a,
        T: Send + 'a,
        U: Send + 'a,
        F: FnOnce(T) -> Result<U, Error> + Send + 'a,
    {
        async move { f(output.await?) }.boxed()
    }

    fn fail_pages<'a, T: Send + 'a>(&'a self, error: Error) -> Self::Pages<'a, T> {
        stream::once(future::ready(Err(error))).boxed()
    }
}
