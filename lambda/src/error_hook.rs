use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::Error;

static HOOK: RwLock<Option<fn(&Error) -> ErrorReport>> = RwLock::new(None);

/// A computer-readable report of an unhandled error, in the shape the Lambda
/// Runtime API expects on its error endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// The type of the error passed to the Lambda APIs.
    pub error_type: String,
    /// The [std::fmt::Display] output of the error.
    pub error_message: String,
}

impl ErrorReport {
    /// Builds a report from a type name and a message.
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
        }
    }
}

fn default_error_hook(err: &Error) -> ErrorReport {
    ErrorReport::new("UnknownError", err.to_string())
}

/// Transforms an error returned by a handler into the report sent to Lambda,
/// using the registered hook if there is one.
pub(crate) fn generate_report(err: &Error) -> ErrorReport {
    let hook = match HOOK.read() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    };
    hook.unwrap_or(default_error_hook)(err)
}

/// Registers a custom error hook, replacing any that was previously registered.
///
/// The Lambda error hook is invoked when a [`Handler`](crate::Handler) returns an error, but
/// prior to the runtime reporting the error to the Lambda Runtime APIs. This hook is intended
/// to be used by those interested in reporting richer error types than `UnknownError`.
///
/// # Example
/// ```no_run
/// use lambda::{error_hook, handler_fn, Error, LambdaCtx};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     error_hook::set_error_hook(error_hook);
///     lambda::run(handler_fn(func)).await
/// }
///
/// async fn func(event: String, _: LambdaCtx) -> Result<String, Error> {
///     Ok(event)
/// }
///
/// fn error_hook(e: &Error) -> error_hook::ErrorReport {
///     error_hook::ErrorReport::new("CustomError", e.to_string())
/// }
/// ```
pub fn set_error_hook(hook: fn(&Error) -> ErrorReport) {
    match HOOK.write() {
        Ok(mut guard) => *guard = Some(hook),
        Err(poisoned) => *poisoned.into_inner() = Some(hook),
    }
}

#[test]
fn default_report_uses_display() {
    let err: Error = "An error".into();
    let report = default_error_hook(&err);
    assert_eq!(report, ErrorReport::new("UnknownError", "An error"));
}

#[test]
fn set_err_hook() {
    set_error_hook(|err: &Error| {
        if let Some(e) = err.downcast_ref::<std::io::Error>() {
            ErrorReport::new("std::io::Error", e.to_string())
        } else {
            default_error_hook(err)
        }
    });

    let io: Error = std::io::Error::new(std::io::ErrorKind::Other, "gone").into();
    assert_eq!(generate_report(&io).error_type, "std::io::Error");

    let other: Error = "An error".into();
    assert_eq!(generate_report(&other).error_type, "UnknownError");
}

#[test]
fn report_wire_format() {
    let report = ErrorReport::new("InitError", "TABLE_NAME is not set");
    let json = serde_json::to_string(&report).unwrap();
    assert_eq!(
        json,
        r#"{"errorType":"InitError","errorMessage":"TABLE_NAME is not set"}"#
    );
}
