use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Longest caller-supplied id that is trusted as-is
const MAX_INBOUND_ID_LEN: usize = 128;

/// Correlation id for one request; pipeline logs and cleanup warnings carry it.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

fn inbound_id(request: &Request) -> Option<String> {
    let value = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    (!value.is_empty() && value.len() <= MAX_INBOUND_ID_LEN).then(|| value.to_string())
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = inbound_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
