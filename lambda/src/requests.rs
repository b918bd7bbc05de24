use crate::{error_hook::ErrorReport, Error};
use bytes::Bytes;
use http::{header::CONTENT_TYPE, uri::PathAndQuery, HeaderValue, Method, Request, Uri};

const FUNCTION_ERROR_TYPE: &str = "lambda-runtime-function-error-type";

/// Represents a request that retrieves an invocation event. The response body contains
/// the payload from the invocation, which is a JSON document that contains event data
/// from the function trigger. The response headers contain additional data about the invocation.
///
/// ```
/// use http::Request;
/// use lambda::requests::NextEventRequest;
///
/// let req = Request::<()>::try_from(NextEventRequest::new())?;
/// assert_eq!(req.uri().path(), "/2018-06-01/runtime/invocation/next");
/// # Ok::<(), http::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextEventRequest {
    path_and_query: PathAndQuery,
}

impl NextEventRequest {
    /// Constructs a new `NextEventRequest`.
    pub fn new() -> Self {
        Self {
            path_and_query: PathAndQuery::from_static("/2018-06-01/runtime/invocation/next"),
        }
    }
}

impl Default for NextEventRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<NextEventRequest> for Request<()> {
    type Error = http::Error;

    fn try_from(req: NextEventRequest) -> Result<Self, Self::Error> {
        let uri = Uri::builder().path_and_query(req.path_and_query).build()?;
        Request::builder().method(Method::GET).uri(uri).body(())
    }
}

/// A request that returns a successful response to Lambda. The body is the
/// serialized output of the handler.
///
/// ```
/// use bytes::Bytes;
/// use http::Request;
/// use lambda::requests::InvocationRequest;
///
/// let req = InvocationRequest::from_components("123", Bytes::from("bye!"))?;
/// let req = Request::<Bytes>::try_from(req)?;
/// assert_eq!(req.uri().path(), "/2018-06-01/runtime/invocation/123/response");
/// # Ok::<(), lambda::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    path_and_query: PathAndQuery,
    response: Bytes,
}

impl InvocationRequest {
    /// Fallibly constructs an `InvocationRequest`.
    pub fn from_components(request_id: &str, response: Bytes) -> Result<Self, Error> {
        let path = format!("/2018-06-01/runtime/invocation/{}/response", request_id);
        let path_and_query = PathAndQuery::try_from(path)?;
        Ok(InvocationRequest {
            path_and_query,
            response,
        })
    }
}

impl TryFrom<InvocationRequest> for Request<Bytes> {
    type Error = http::Error;

    fn try_from(req: InvocationRequest) -> Result<Self, Self::Error> {
        let uri = Uri::builder().path_and_query(req.path_and_query).build()?;
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(req.response)
    }
}

/// A request that reports a failed invocation to Lambda.
///
/// ```
/// use bytes::Bytes;
/// use http::Request;
/// use lambda::{error_hook::ErrorReport, requests::InvocationErrRequest};
///
/// let report = ErrorReport::new("CustomError", "bye!");
/// let req = InvocationErrRequest::from_components("123", report)?;
/// let req = Request::<Bytes>::try_from(req)?;
/// assert_eq!(req.uri().path(), "/2018-06-01/runtime/invocation/123/error");
/// # Ok::<(), lambda::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct InvocationErrRequest {
    path_and_query: PathAndQuery,
    report: ErrorReport,
}

impl InvocationErrRequest {
    /// Fallibly constructs an `InvocationErrRequest`.
    pub fn from_components(request_id: &str, report: ErrorReport) -> Result<Self, Error> {
        let path = format!("/2018-06-01/runtime/invocation/{}/error", request_id);
        let path_and_query = PathAndQuery::try_from(path)?;
        Ok(InvocationErrRequest {
            path_and_query,
            report,
        })
    }
}

impl TryFrom<InvocationErrRequest> for Request<Bytes> {
    type Error = Error;

    fn try_from(req: InvocationErrRequest) -> Result<Self, Self::Error> {
        error_request(req.path_and_query, &req.report)
    }
}

/// A request that reports a failure to initialize the function. Lambda
/// marks the execution environment as failed and does not route events to it.
#[derive(Debug, Clone)]
pub struct InitErrRequest {
    path_and_query: PathAndQuery,
    report: ErrorReport,
}

impl InitErrRequest {
    /// Constructs a new `InitErrRequest`.
    pub fn new(report: ErrorReport) -> Self {
        Self {
            path_and_query: PathAndQuery::from_static("/2018-06-01/runtime/init/error"),
            report,
        }
    }
}

impl TryFrom<InitErrRequest> for Request<Bytes> {
    type Error = Error;

    fn try_from(req: InitErrRequest) -> Result<Self, Self::Error> {
        error_request(req.path_and_query, &req.report)
    }
}

fn error_request(path_and_query: PathAndQuery, report: &ErrorReport) -> Result<Request<Bytes>, Error> {
    let uri = Uri::builder().path_and_query(path_and_query).build()?;
    let body = serde_json::to_vec(report)?;
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(FUNCTION_ERROR_TYPE, HeaderValue::from_static("Unhandled"))
        .body(Bytes::from(body))?;
    Ok(req)
}

#[test]
fn next_event_is_a_get() {
    let req = Request::<()>::try_from(NextEventRequest::new()).unwrap();
    assert_eq!(req.method(), Method::GET);
    assert_eq!(req.uri(), "/2018-06-01/runtime/invocation/next");
}

#[test]
fn invocation_error_carries_report() {
    let report = ErrorReport::new("std::io::Error", "disk on fire");
    let req = InvocationErrRequest::from_components("abc-123", report).unwrap();
    let req = Request::<Bytes>::try_from(req).unwrap();

    assert_eq!(req.method(), Method::POST);
    assert_eq!(req.uri(), "/2018-06-01/runtime/invocation/abc-123/error");
    assert_eq!(req.headers()[FUNCTION_ERROR_TYPE], "Unhandled");

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"errorType": "std::io::Error", "errorMessage": "disk on fire"})
    );
}

#[test]
fn init_error_path() {
    let req = InitErrRequest::new(ErrorReport::new("InitError", "boom"));
    let req = Request::<Bytes>::try_from(req).unwrap();
    assert_eq!(req.uri(), "/2018-06-01/runtime/init/error");
}

#[test]
fn request_id_must_be_a_valid_path() {
    assert!(InvocationRequest::from_components("bad id", Bytes::new()).is_err());
}
