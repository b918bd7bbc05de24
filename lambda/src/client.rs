use crate::{requests::NextEventRequest, Error, RuntimeError};
use bytes::Bytes;
use futures::{
    future::BoxFuture,
    prelude::*,
    task::{Context, Poll},
};
use http::{
    uri::{Authority, Scheme},
    Request, Response, Uri,
};
use http_body_util::{BodyExt, Empty, Full};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client as HyperClient},
    rt::TokioExecutor,
};
use std::pin::Pin;
use tracing::trace;

/// A client responsible for interacting with the [Lambda Runtime API](https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html).
pub trait EventClient: Send + Sync {
    /// Sends a `GET` request, returning the response with its body fully read.
    fn get(&self, req: Request<()>) -> BoxFuture<'_, Result<Response<Bytes>, Error>>;
    /// Sends a `POST` request, returning the response with its body fully read.
    fn post(&self, req: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, Error>>;
}

/// Runtime API client over HTTP/1.1.
#[derive(Debug, Clone)]
pub struct Client {
    base: (Scheme, Authority),
    get: HyperClient<HttpConnector, Empty<Bytes>>,
    post: HyperClient<HttpConnector, Full<Bytes>>,
}

impl Client {
    /// Creates a client for a Runtime API listening on `endpoint` (`host:port`).
    pub fn new(endpoint: &str) -> Result<Self, Error> {
        let authority = Authority::try_from(endpoint)?;
        let get = HyperClient::builder(TokioExecutor::new()).build_http();
        let post = HyperClient::builder(TokioExecutor::new()).build_http();
        Ok(Self {
            base: (Scheme::HTTP, authority),
            get,
            post,
        })
    }

    fn add_origin(&self, uri: &Uri) -> Result<Uri, Error> {
        let path_and_query = uri
            .path_and_query()
            .cloned()
            .ok_or(RuntimeError::MissingPath)?;
        let uri = Uri::builder()
            .scheme(self.base.0.clone())
            .authority(self.base.1.clone())
            .path_and_query(path_and_query)
            .build()?;
        Ok(uri)
    }
}

async fn collect<B>(res: Response<B>) -> Result<Response<Bytes>, Error>
where
    B: hyper::body::Body,
    B::Error: Into<Error>,
{
    let (parts, body) = res.into_parts();
    let body = body.collect().await.map_err(Into::<Error>::into)?.to_bytes();
    if !parts.status.is_success() {
        return Err(RuntimeError::Api {
            status: parts.status,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
        .into());
    }
    Ok(Response::from_parts(parts, body))
}

impl EventClient for Client {
    fn get(&self, req: Request<()>) -> BoxFuture<'_, Result<Response<Bytes>, Error>> {
        let fut = async move {
            let (mut parts, ()) = req.into_parts();
            parts.uri = self.add_origin(&parts.uri)?;
            trace!(uri = %parts.uri, "GET");
            let res = self
                .get
                .request(Request::from_parts(parts, Empty::new()))
                .await?;
            collect(res).await
        };
        fut.boxed()
    }

    fn post(&self, req: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, Error>> {
        let fut = async move {
            let (mut parts, body) = req.into_parts();
            parts.uri = self.add_origin(&parts.uri)?;
            trace!(uri = %parts.uri, "POST");
            let res = self
                .post
                .request(Request::from_parts(parts, Full::new(body)))
                .await?;
            collect(res).await
        };
        fut.boxed()
    }
}

/// The `Stream` implementation for `EventStream` converts a `Future`
/// containing the next event from the Lambda Runtime into a continuous
/// stream of events. While _this_ stream will continue to produce
/// events indefinitely, AWS Lambda will only run the Lambda function attached
/// to this runtime *if and only if* there is an event available for it to process.
/// For Lambda functions that receive a “warm wakeup”—i.e., the function is
/// readily available in the Lambda service's cache—this runtime is able
/// to immediately fetch the next event.
#[must_use = "streams do nothing unless you `.await` or poll them"]
pub struct EventStream<'a, T>
where
    T: EventClient,
{
    current: Option<BoxFuture<'a, Result<Response<Bytes>, Error>>>,
    client: &'a T,
}

impl<'a, T> EventStream<'a, T>
where
    T: EventClient,
{
    /// Creates a stream of events fetched through `client`.
    pub fn new(client: &'a T) -> Self {
        Self {
            current: None,
            client,
        }
    }

    fn next_event(&self) -> BoxFuture<'a, Result<Response<Bytes>, Error>> {
        let client = self.client;
        async move {
            let req = Request::<()>::try_from(NextEventRequest::new())?;
            client.get(req).await
        }
        .boxed()
    }
}

impl<'a, T> Stream for EventStream<'a, T>
where
    T: EventClient,
{
    type Item = Result<Response<Bytes>, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // The inner future is created lazily on the first poll, then replaced
        // only after it resolves, so at most one next-event request is in flight.
        loop {
            if let Some(current) = &mut self.current {
                match current.as_mut().poll(cx) {
                    Poll::Ready(res) => {
                        self.current = None;
                        return Poll::Ready(Some(res));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            } else {
                self.current = Some(self.next_event());
            }
        }
    }
}

#[test]
fn add_origin_rewrites_relative_uri() {
    let client = Client::new("127.0.0.1:9001").unwrap();
    let uri = client
        .add_origin(&Uri::from_static("/2018-06-01/runtime/invocation/next"))
        .unwrap();
    assert_eq!(uri, "http://127.0.0.1:9001/2018-06-01/runtime/invocation/next");
}

#[test]
fn endpoint_must_be_an_authority() {
    assert!(Client::new("not a host").is_err());
}
