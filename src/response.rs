use serde::{Deserialize, Serialize};

/// Response for an API Gateway Lambda proxy integration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayResponse {
    /// HTTP status code returned to the caller.
    pub status_code: u16,
    /// Response body, passed through verbatim by API Gateway.
    pub body: String,
}

impl ApiGatewayResponse {
    /// Builds a response whose body is `value` encoded as JSON.
    pub fn json<T: Serialize + ?Sized>(status_code: u16, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status_code,
            body: serde_json::to_string(value)?,
        })
    }
}

#[test]
fn wire_shape() {
    let res = ApiGatewayResponse::json(200, "hi").unwrap();
    assert_eq!(serde_json::to_string(&res).unwrap(), r#"{"statusCode":200,"body":"\"hi\""}"#);
}

#[test]
fn body_is_json_encoded() {
    let res = ApiGatewayResponse::json(404, &serde_json::json!({"missing": ["ticket"]})).unwrap();
    assert_eq!(res.status_code, 404);
    assert_eq!(res.body, r#"{"missing":["ticket"]}"#);
}
