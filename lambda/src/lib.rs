#![deny(clippy::all)]
#![warn(missing_docs, nonstandard_style, rust_2018_idioms)]

//! A runtime for AWS Lambda functions written in Rust. Lambda functions
//! written in Rust are executable binaries that include this runtime as a
//! dependency: the binary polls the [Lambda Runtime API](https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html)
//! for events, hands each one to a [`Handler`], and reports the outcome.
//!
//! ```no_run
//! use lambda::{handler_fn, Error, LambdaCtx};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     lambda::logging::init_default_subscriber();
//!     lambda::run(handler_fn(func)).await
//! }
//!
//! async fn func(event: String, _: LambdaCtx) -> Result<String, Error> {
//!     Ok(event)
//! }
//! ```
use bytes::Bytes;
use futures::prelude::*;
use http::{Request, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info_span, Instrument};

pub use crate::{
    client::{Client, EventClient, EventStream},
    types::{ClientApplication, ClientContext, CognitoIdentity, LambdaCtx},
};
use crate::requests::{InitErrRequest, InvocationErrRequest, InvocationRequest};

mod client;
/// Mechanism to provide a custom error reporting hook.
pub mod error_hook;
/// Log output setup for the Lambda execution environment.
pub mod logging;
/// Requests sent to the Lambda Runtime API.
pub mod requests;
/// Types available to a Lambda function.
mod types;

/// Error type returned by handlers and by the runtime.
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures in the conversation with the Runtime API.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A header Lambda always sends with an event was absent.
    #[error("missing header `{0}` on the next-event response")]
    MissingHeader(&'static str),
    /// A header was present but could not be interpreted.
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A request had no path to send to the Runtime API.
    #[error("request URI has no path")]
    MissingPath,
    /// The Runtime API answered with a non-success status.
    #[error("runtime API responded with {status}: {body}")]
    Api {
        /// Response status.
        status: StatusCode,
        /// Response body, lossily decoded.
        body: String,
    },
}

/// A struct containing configuration values derived from environment variables.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// The host and port of the [runtime API](https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html).
    #[serde(rename = "aws_lambda_runtime_api")]
    pub endpoint: String,
    /// The name of the function.
    #[serde(rename = "aws_lambda_function_name", default)]
    pub function_name: String,
    /// The amount of memory available to the function in MB.
    #[serde(rename = "aws_lambda_function_memory_size", default)]
    pub memory: i32,
    /// The version of the function being executed.
    #[serde(rename = "aws_lambda_function_version", default)]
    pub version: String,
    /// The name of the Amazon CloudWatch Logs stream for the function.
    #[serde(rename = "aws_lambda_log_stream_name", default)]
    pub log_stream: String,
    /// The name of the Amazon CloudWatch Logs group for the function.
    #[serde(rename = "aws_lambda_log_group_name", default)]
    pub log_group: String,
}

impl Config {
    /// Attempts to read configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<Config>()
    }

    /// Reads configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
    }
}

/// A trait describing an asynchronous function from `Event` to `Output`. `Event` and `Output`
/// must implement [`Deserialize`](serde::Deserialize) and [`Serialize`](serde::Serialize).
pub trait Handler<Event, Output>
where
    Event: for<'de> Deserialize<'de>,
    Output: Serialize,
{
    /// Errors returned by this handler.
    type Err: Into<Error>;
    /// The future response value of this handler.
    type Fut: Future<Output = Result<Output, Self::Err>>;
    /// Process the incoming event and return the response asynchronously.
    fn call(&mut self, event: Event, ctx: LambdaCtx) -> Self::Fut;
}

/// Returns a new `HandlerFn` with the given closure.
pub fn handler_fn<Function>(f: Function) -> HandlerFn<Function> {
    HandlerFn { f }
}

/// A `Handler` implemented by a closure.
#[derive(Copy, Clone, Debug)]
pub struct HandlerFn<Function> {
    f: Function,
}

impl<Function, Event, Output, E, Fut> Handler<Event, Output> for HandlerFn<Function>
where
    Function: FnMut(Event, LambdaCtx) -> Fut,
    Event: for<'de> Deserialize<'de>,
    Output: Serialize,
    E: Into<Error>,
    Fut: Future<Output = Result<Output, E>>,
{
    type Err = E;
    type Fut = Fut;
    fn call(&mut self, event: Event, ctx: LambdaCtx) -> Self::Fut {
        (self.f)(event, ctx)
    }
}

/// Drives a [`Handler`] against the Runtime API through an [`EventClient`].
#[derive(Debug)]
pub struct Runtime<C = Client> {
    client: C,
    config: Arc<Config>,
}

impl Runtime<Client> {
    /// Builds a runtime from the reserved Lambda environment variables.
    pub fn from_env() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let client = Client::new(&config.endpoint)?;
        Ok(Self::with_client(client, config))
    }
}

impl<C> Runtime<C>
where
    C: EventClient,
{
    /// Builds a runtime that talks to Lambda through `client`.
    pub fn with_client(client: C, config: Config) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// The client used to reach the Runtime API.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The environment configuration handed to every invocation.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reports a failure to initialize the function. Call this instead of
    /// [`Runtime::run`] when setup fails; Lambda will then fail the pending
    /// invocation and discard the execution environment.
    pub async fn init_error(&self, err: &Error) -> Result<(), Error> {
        let report = error_hook::generate_report(err);
        error!(error_type = %report.error_type, "{}", report.error_message);
        let req = Request::<Bytes>::try_from(InitErrRequest::new(report))?;
        self.client.post(req).await?;
        Ok(())
    }

    /// Starts polling for events and feeding them to `handler`. Only returns
    /// when the Runtime API can no longer be reached.
    pub async fn run<Function, Event, Output>(&self, mut handler: Function) -> Result<(), Error>
    where
        Function: Handler<Event, Output>,
        Event: for<'de> Deserialize<'de>,
        Output: Serialize,
    {
        let mut stream = EventStream::new(&self.client);

        while let Some(event) = stream.next().await {
            let (parts, body) = event?.into_parts();
            let ctx = LambdaCtx::try_from(&parts.headers)?.with_config(Arc::clone(&self.config));
            let request_id = ctx.request_id.clone();
            let span = info_span!(
                "invocation",
                request_id = %request_id,
                xray_trace_id = ctx.xray_trace_id.as_deref().unwrap_or_default()
            );

            let outcome = async {
                debug!(bytes = body.len(), "received event");
                let event = serde_json::from_slice::<Event>(&body)?;
                let output = handler.call(event, ctx).await.map_err(Into::<Error>::into)?;
                Ok::<_, Error>(serde_json::to_vec(&output)?)
            }
            .instrument(span.clone())
            .await;

            let req = match outcome {
                Ok(output) => {
                    let req = InvocationRequest::from_components(&request_id, Bytes::from(output))?;
                    Request::<Bytes>::try_from(req)?
                }
                Err(err) => {
                    let report = error_hook::generate_report(&err);
                    span.in_scope(|| error!(error_type = %report.error_type, "{}", report.error_message));
                    let req = InvocationErrRequest::from_components(&request_id, report)?;
                    Request::<Bytes>::try_from(req)?
                }
            };
            self.client.post(req).instrument(span).await?;
        }

        Ok(())
    }
}

/// Starts the Lambda Rust runtime and begins polling for events on the [Lambda
/// Runtime APIs](https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html).
///
/// # Arguments
/// * `handler` - A function or closure that conforms to the `Handler` trait
///
/// # Example
/// ```no_run
/// use lambda::{handler_fn, Error, LambdaCtx};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let func = handler_fn(func);
///     lambda::run(func).await?;
///     Ok(())
/// }
///
/// async fn func(event: String, _: LambdaCtx) -> Result<String, Error> {
///     Ok(event)
/// }
/// ```
pub async fn run<Function, Event, Output>(handler: Function) -> Result<(), Error>
where
    Function: Handler<Event, Output>,
    Event: for<'de> Deserialize<'de>,
    Output: Serialize,
{
    Runtime::from_env()?.run(handler).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use http::Response;
    use std::{collections::VecDeque, sync::Mutex};

    /// Replays a fixed list of events and records everything posted back.
    #[derive(Default)]
    struct MockClient {
        events: Mutex<VecDeque<(String, &'static str)>>,
        posted: Mutex<Vec<Request<Bytes>>>,
    }

    impl MockClient {
        fn with_events(events: &[(&str, &'static str)]) -> Self {
            Self {
                events: Mutex::new(events.iter().map(|(id, body)| (id.to_string(), *body)).collect()),
                posted: Mutex::default(),
            }
        }

        fn posted(&self) -> Vec<(String, serde_json::Value)> {
            self.posted
                .lock()
                .unwrap()
                .iter()
                .map(|req| {
                    let body = serde_json::from_slice(req.body()).unwrap();
                    (req.uri().path().to_owned(), body)
                })
                .collect()
        }
    }

    impl EventClient for MockClient {
        fn get(&self, _req: Request<()>) -> BoxFuture<'_, Result<Response<Bytes>, Error>> {
            let next = self.events.lock().unwrap().pop_front();
            async move {
                let (id, body) = next.ok_or("no more events")?;
                let res = Response::builder()
                    .header("lambda-runtime-aws-request-id", id)
                    .header("lambda-runtime-deadline-ms", "1542409706888")
                    .header("lambda-runtime-trace-id", "Root=1-5bef4de7-ad49b0e87f6ef6c87fc2e700")
                    .body(Bytes::from_static(body.as_bytes()))?;
                Ok::<_, Error>(res)
            }
            .boxed()
        }

        fn post(&self, req: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>, Error>> {
            self.posted.lock().unwrap().push(req);
            async { Ok(Response::new(Bytes::new())) }.boxed()
        }
    }

    fn runtime(client: MockClient) -> Runtime<MockClient> {
        let config = Config::from_vars(vec![
            ("AWS_LAMBDA_RUNTIME_API".to_string(), "127.0.0.1:9001".to_string()),
            ("AWS_LAMBDA_FUNCTION_NAME".to_string(), "tickets".to_string()),
        ])
        .unwrap();
        Runtime::with_client(client, config)
    }

    #[test]
    fn config_from_vars() {
        let config = Config::from_vars(vec![
            ("AWS_LAMBDA_RUNTIME_API".to_string(), "127.0.0.1:9001".to_string()),
            ("AWS_LAMBDA_FUNCTION_NAME".to_string(), "tickets".to_string()),
            ("AWS_LAMBDA_FUNCTION_MEMORY_SIZE".to_string(), "128".to_string()),
            ("AWS_LAMBDA_FUNCTION_VERSION".to_string(), "$LATEST".to_string()),
        ])
        .unwrap();
        assert_eq!(config.endpoint, "127.0.0.1:9001");
        assert_eq!(config.function_name, "tickets");
        assert_eq!(config.memory, 128);
        assert_eq!(config.version, "$LATEST");
        assert_eq!(config.log_group, "");
    }

    #[test]
    fn config_requires_endpoint() {
        assert!(Config::from_vars(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn echoes_events() {
        let rt = runtime(MockClient::with_events(&[("a", r#"{"n":1}"#), ("b", r#""two""#)]));

        async fn echo(event: serde_json::Value, ctx: LambdaCtx) -> Result<serde_json::Value, Error> {
            assert_eq!(ctx.env_config.function_name, "tickets");
            Ok(serde_json::json!({ "id": ctx.request_id, "event": event }))
        }

        let err = rt.run(handler_fn(echo)).await.unwrap_err();
        assert_eq!(err.to_string(), "no more events");

        assert_eq!(
            rt.client.posted(),
            vec![
                (
                    "/2018-06-01/runtime/invocation/a/response".to_owned(),
                    serde_json::json!({"id": "a", "event": {"n": 1}})
                ),
                (
                    "/2018-06-01/runtime/invocation/b/response".to_owned(),
                    serde_json::json!({"id": "b", "event": "two"})
                ),
            ]
        );
    }

    #[tokio::test]
    async fn handler_errors_are_reported() {
        let rt = runtime(MockClient::with_events(&[("a", "{}")]));

        async fn fail(_: serde_json::Value, _: LambdaCtx) -> Result<String, Error> {
            Err("ticket booth closed".into())
        }

        rt.run(handler_fn(fail)).await.unwrap_err();
        assert_eq!(
            rt.client.posted(),
            vec![(
                "/2018-06-01/runtime/invocation/a/error".to_owned(),
                serde_json::json!({"errorType": "UnknownError", "errorMessage": "ticket booth closed"})
            )]
        );
    }

    #[tokio::test]
    async fn undecodable_events_are_reported() {
        let rt = runtime(MockClient::with_events(&[("a", "not json"), ("b", "3")]));

        async fn double(n: u32, _: LambdaCtx) -> Result<u32, Error> {
            Ok(n * 2)
        }

        rt.run(handler_fn(double)).await.unwrap_err();
        let posted = rt.client.posted();
        assert_eq!(posted[0].0, "/2018-06-01/runtime/invocation/a/error");
        assert_eq!(posted[0].1["errorType"], "UnknownError");
        assert_eq!(posted[1], ("/2018-06-01/runtime/invocation/b/response".to_owned(), serde_json::json!(6)));
    }

    #[tokio::test]
    async fn init_errors_are_reported() {
        let rt = runtime(MockClient::default());
        let err: Error = "TABLE_NAME is not set".into();
        rt.init_error(&err).await.unwrap();
        assert_eq!(
            rt.client.posted(),
            vec![(
                "/2018-06-01/runtime/init/error".to_owned(),
                serde_json::json!({"errorType": "UnknownError", "errorMessage": "TABLE_NAME is not set"})
            )]
        );
    }
}
