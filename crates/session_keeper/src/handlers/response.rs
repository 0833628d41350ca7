use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

pub type HandlerResponse = Response<BoxBody<Bytes, hyper::Error>>;

pub fn empty() -> BoxBody<Bytes, hyper::Error> {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

pub fn status_response(status: StatusCode) -> HandlerResponse {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}

pub fn error_response(status: StatusCode, message: &str) -> HandlerResponse {
    let body = serde_json::json!({ "error": message });
    json_response(status, &body)
}

pub fn json_response(status: StatusCode, body: &serde_json::Value) -> HandlerResponse {
    let body_bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(full_body_bytes(body_bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn full_body_bytes(bytes: Vec<u8>) -> BoxBody<Bytes, hyper::Error> {
    Full::new(Bytes::from(bytes))
        .map_err(|never| match never {})
        .boxed()
}
