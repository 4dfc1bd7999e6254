//! Helpers for replying to requests.
use super::Response;
use headers::{ContentType, HeaderMapExt};
use http::HeaderValue;
use hyper::{header::X_CONTENT_TYPE_OPTIONS, Body, StatusCode};
use serde::Serialize;
use std::convert::Infallible;

/// A type that can be converted into an http [Response].
pub trait Reply: Sized + Send {
    /// Perform the conversion.
    fn into_response(self) -> Response;

    /// Change the status code to `code`.
    ///
    /// ```
    /// use hyper::StatusCode;
    /// use hypercalc::{reply::Reply, Response};
    ///
    /// let _: Response = "some message" //
    ///     .with_status(StatusCode::OK);
    /// ```
    #[inline]
    fn with_status(self, code: StatusCode) -> Response {
        let mut resp = self.into_response();
        *resp.status_mut() = code;
        resp
    }
}

impl Reply for Infallible {
    #[inline]
    fn into_response(self) -> Response {
        match self {}
    }
}

impl Reply for Response {
    #[inline]
    fn into_response(self) -> Response {
        self
    }

    #[inline]
    fn with_status(mut self, code: StatusCode) -> Response {
        *self.status_mut() = code;
        self
    }
}

impl<R: Reply, E: Reply> Reply for Result<R, E> {
    #[inline]
    fn into_response(self) -> Response {
        self.map_or_else(E::into_response, R::into_response)
    }
}

fn with_content_type<B: Into<Body>>(ctype: ContentType, body: B) -> Response {
    let mut resp = hyper::Response::new(body.into());
    let headers = resp.headers_mut();
    headers.typed_insert(ctype);
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    resp
}

impl Reply for String {
    #[inline]
    fn into_response(self) -> Response {
        with_content_type(ContentType::text_utf8(), self)
    }
}

impl Reply for &'static str {
    #[inline]
    fn into_response(self) -> Response {
        with_content_type(ContentType::text_utf8(), self)
    }
}

/// A rendered html document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Html(pub String);

impl Reply for Html {
    #[inline]
    fn into_response(self) -> Response {
        with_content_type(ContentType::from(mime::TEXT_HTML_UTF_8), self.0)
    }
}

/// Returns a json [Response] from an arbitrary serializable value.
///
/// Values that fail to serialize (maps with non-string keys, for instance) produce an empty
/// `500` instead.
#[inline]
pub fn json<T: Serialize + ?Sized>(value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(ser) => with_content_type(ContentType::json(), ser),
        Err(e) => {
            tracing::error!("failed to serialize json reply: {}", e);
            hyper::Response::new(Body::empty()).with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Returns a json [Response] of the form `{"error": message}` with status `code`.
///
/// ```
/// use hyper::StatusCode;
/// use hypercalc::reply;
///
/// let resp = reply::error(StatusCode::BAD_REQUEST, "Invalid operation");
/// assert_eq!(StatusCode::BAD_REQUEST, resp.status());
/// ```
#[inline]
pub fn error(code: StatusCode, message: &str) -> Response {
    json(&ErrorBody { error: message }).with_status(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{body::to_bytes, header::CONTENT_TYPE};

    async fn body_of(resp: Response) -> String {
        let raw = to_bytes(resp.into_body()).await.unwrap();
        String::from_utf8_lossy(&raw).into_owned()
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let resp = error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");

        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, resp.status());
        assert_eq!("application/json", resp.headers()[CONTENT_TYPE]);
        assert_eq!(r#"{"error":"Internal server error"}"#, body_of(resp).await);
    }

    #[tokio::test]
    async fn test_html_content_type() {
        let resp = Html("<p>hi</p>".into()).into_response();

        assert_eq!(StatusCode::OK, resp.status());
        assert_eq!("text/html; charset=utf-8", resp.headers()[CONTENT_TYPE]);
        assert_eq!("nosniff", resp.headers()[X_CONTENT_TYPE_OPTIONS]);
        assert_eq!("<p>hi</p>", body_of(resp).await);
    }

    #[tokio::test]
    async fn test_result_picks_branch() {
        let ok: Result<&'static str, Response> = Ok("fine");
        let err: Result<&'static str, Response> = Err(error(StatusCode::BAD_REQUEST, "nope"));

        assert_eq!(StatusCode::OK, ok.into_response().status());
        assert_eq!(StatusCode::BAD_REQUEST, err.into_response().status());
    }
}
