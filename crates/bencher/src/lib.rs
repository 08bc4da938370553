//! Request bodies used as benchmark input.

use bytes::Bytes;
use http::Request;
use http_body_util::Full;

/// A named request body and the content type it is sent with
#[derive(Debug, Copy, Clone)]
pub struct BodyCase {
    name: &'static str,
    content_type: &'static str,
    content: &'static str,
}

impl BodyCase {
    pub const fn new(name: &'static str, content_type: &'static str, content: &'static str) -> Self {
        Self { name, content_type, content }
    }

    pub const fn json(name: &'static str, content: &'static str) -> Self {
        Self::new(name, "application/json", content)
    }

    pub const fn urlencoded(name: &'static str, content: &'static str) -> Self {
        Self::new(name, "application/x-www-form-urlencoded", content)
    }

    /// A `multipart/form-data` body delimited by `--BENCH`
    pub const fn multipart(name: &'static str, content: &'static str) -> Self {
        Self::new(name, "multipart/form-data; boundary=BENCH", content)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Body size in bytes, for throughput reporting
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Builds a fresh `POST` request carrying this body
    pub fn request(&self) -> Request<Full<Bytes>> {
        let mut req = Request::new(Full::new(Bytes::from_static(self.content.as_bytes())));
        *req.method_mut() = http::Method::POST;
        if let Ok(content_type) = http::HeaderValue::from_str(self.content_type) {
            req.headers_mut().insert(http::header::CONTENT_TYPE, content_type);
        }
        req
    }
}
