use hyper::{Body, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{BadRequestSnafu, Error, Result};

/// Reads and parses a request body as JSON. An empty body parses as
/// `T::default()`-shaped only if `T` itself tolerates an empty object;
/// callers that require fields should expect a [`Error::BadRequest`] on a
/// genuinely empty body.
pub async fn parse_json<T: DeserializeOwned>(body: Body) -> Result<T> {
    let bytes = hyper::body::to_bytes(body).await.map_err(|e| Error::BadRequest {
        detail: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        BadRequestSnafu {
            detail: e.to_string(),
        }
        .build()
    })
}

/// Serializes `value` as the `200 OK` JSON body of a handler.
pub fn json_ok<T: Serialize>(value: &T) -> Response<Body> {
    let bytes = serde_json::to_vec(value).expect("response value always serializes");
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .expect("building a 200 response from a byte body never fails")
}

/// Renders an [`Error`] as its mapped status code and `{error, details}`
/// body.
pub fn json_error(error: &Error) -> Response<Body> {
    let bytes = serde_json::to_vec(&error.body()).expect("error body always serializes");
    Response::builder()
        .status(StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .expect("building an error response from a byte body never fails")
}
