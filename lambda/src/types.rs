use crate::{Config, RuntimeError};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

const REQUEST_ID: &str = "lambda-runtime-aws-request-id";
const DEADLINE_MS: &str = "lambda-runtime-deadline-ms";
const FUNCTION_ARN: &str = "lambda-runtime-invoked-function-arn";
const TRACE_ID: &str = "lambda-runtime-trace-id";
const CLIENT_CONTEXT: &str = "lambda-runtime-client-context";
const COGNITO_IDENTITY: &str = "lambda-runtime-cognito-identity";

/// Client context sent by the AWS Mobile SDK.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    /// Information about the mobile application invoking the function.
    #[serde(default)]
    pub client: ClientApplication,
    /// Custom properties attached to the mobile event context.
    #[serde(default)]
    pub custom: HashMap<String, String>,
    /// Environment settings from the mobile client.
    #[serde(default)]
    pub environment: HashMap<String, String>,
}

/// AWS Mobile SDK client fields.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientApplication {
    /// The mobile app installation id.
    #[serde(default)]
    pub installation_id: String,
    /// The app title for the mobile app as registered with AWS' mobile services.
    #[serde(default)]
    pub app_title: String,
    /// The version name of the application as registered with AWS' mobile services.
    #[serde(default)]
    pub app_version_name: String,
    /// The app version code.
    #[serde(default)]
    pub app_version_code: String,
    /// The package name for the mobile application invoking the function.
    #[serde(default)]
    pub app_package_name: String,
}

/// Cognito identity information sent with the event.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CognitoIdentity {
    /// The unique identity id for the Cognito credentials invoking the function.
    #[serde(default)]
    pub identity_id: String,
    /// The identity pool id the caller is "registered" with.
    #[serde(default)]
    pub identity_pool_id: String,
}

/// The Lambda function execution context. The values in this struct
/// are populated using the [Lambda environment variables](https://docs.aws.amazon.com/lambda/latest/dg/current-supported-versions.html)
/// and the headers returned by the poll request to the Runtime APIs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LambdaCtx {
    /// The AWS request ID generated by the Lambda service.
    pub request_id: String,
    /// The execution deadline for the current invocation in milliseconds since the epoch.
    pub deadline_ms: u64,
    /// The ARN of the Lambda function being invoked.
    pub invoked_function_arn: String,
    /// The X-Ray trace ID for the current invocation.
    pub xray_trace_id: Option<String>,
    /// The client context object sent by the AWS mobile SDK.
    pub client_context: Option<ClientContext>,
    /// The Cognito identity that invoked the function.
    pub identity: Option<CognitoIdentity>,
    /// Lambda function configuration from the local environment variables.
    pub env_config: Arc<Config>,
}

impl LambdaCtx {
    /// The point in time at which Lambda will stop the current invocation.
    pub fn deadline(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.deadline_ms)
    }

    pub(crate) fn with_config(mut self, config: Arc<Config>) -> Self {
        self.env_config = config;
        self
    }
}

fn required<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, RuntimeError> {
    optional(headers, name)?.ok_or(RuntimeError::MissingHeader(name))
}

fn optional<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<Option<&'a str>, RuntimeError> {
    headers
        .get(name)
        .map(|value| {
            value.to_str().map_err(|e| RuntimeError::InvalidHeader {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn json<T: for<'de> Deserialize<'de>>(
    headers: &HeaderMap,
    name: &'static str,
) -> Result<Option<T>, RuntimeError> {
    optional(headers, name)?
        .map(|raw| {
            serde_json::from_str(raw).map_err(|e| RuntimeError::InvalidHeader {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

impl TryFrom<&HeaderMap> for LambdaCtx {
    type Error = RuntimeError;

    fn try_from(headers: &HeaderMap) -> Result<Self, Self::Error> {
        let deadline_ms = required(headers, DEADLINE_MS)?
            .parse::<u64>()
            .map_err(|e| RuntimeError::InvalidHeader {
                name: DEADLINE_MS,
                reason: e.to_string(),
            })?;

        Ok(LambdaCtx {
            request_id: required(headers, REQUEST_ID)?.to_owned(),
            deadline_ms,
            invoked_function_arn: optional(headers, FUNCTION_ARN)?.unwrap_or_default().to_owned(),
            xray_trace_id: optional(headers, TRACE_ID)?.map(str::to_owned),
            client_context: json(headers, CLIENT_CONTEXT)?,
            identity: json(headers, COGNITO_IDENTITY)?,
            env_config: Arc::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID, HeaderValue::from_static("8476a536-e9f4-11e8-9739-2dfe598c3fcd"));
        headers.insert(DEADLINE_MS, HeaderValue::from_static("1542409706888"));
        headers.insert(
            FUNCTION_ARN,
            HeaderValue::from_static("arn:aws:lambda:us-east-2:123456789012:function:tickets"),
        );
        headers.insert(
            TRACE_ID,
            HeaderValue::from_static("Root=1-5bef4de7-ad49b0e87f6ef6c87fc2e700;Parent=9a9197af755a6419;Sampled=1"),
        );
        headers
    }

    #[test]
    fn context_from_headers() {
        let ctx = LambdaCtx::try_from(&headers()).unwrap();
        assert_eq!(ctx.request_id, "8476a536-e9f4-11e8-9739-2dfe598c3fcd");
        assert_eq!(ctx.deadline_ms, 1_542_409_706_888);
        assert_eq!(ctx.invoked_function_arn, "arn:aws:lambda:us-east-2:123456789012:function:tickets");
        assert!(ctx.xray_trace_id.as_deref().unwrap().starts_with("Root=1-5bef4de7"));
        assert_eq!(ctx.client_context, None);
        assert_eq!(ctx.identity, None);
        assert_eq!(ctx.deadline(), UNIX_EPOCH + Duration::from_millis(1_542_409_706_888));
    }

    #[test]
    fn missing_request_id() {
        let mut headers = headers();
        headers.remove(REQUEST_ID);
        let err = LambdaCtx::try_from(&headers).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingHeader(REQUEST_ID)));
    }

    #[test]
    fn bad_deadline() {
        let mut headers = headers();
        headers.insert(DEADLINE_MS, HeaderValue::from_static("soon"));
        let err = LambdaCtx::try_from(&headers).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidHeader { name: DEADLINE_MS, .. }));
    }

    #[test]
    fn identity_and_client_context() {
        let mut headers = headers();
        headers.insert(
            COGNITO_IDENTITY,
            HeaderValue::from_static(r#"{"identityId":"id-1","identityPoolId":"pool-1"}"#),
        );
        headers.insert(
            CLIENT_CONTEXT,
            HeaderValue::from_static(r#"{"client":{"appTitle":"tickets"},"custom":{"k":"v"}}"#),
        );

        let ctx = LambdaCtx::try_from(&headers).unwrap();
        let identity = ctx.identity.unwrap();
        assert_eq!(identity.identity_id, "id-1");
        assert_eq!(identity.identity_pool_id, "pool-1");

        let client = ctx.client_context.unwrap();
        assert_eq!(client.client.app_title, "tickets");
        assert_eq!(client.custom["k"], "v");
        assert!(client.environment.is_empty());
    }
}
